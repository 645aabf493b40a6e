//! Decides when the local setpoint is put on the wire.
//!
//! Discrete actions (start, stop, direction) dispatch at once. Speed changes
//! from the slider and the step buttons only arm a quiet-period window; the
//! periodic [`Dispatcher::poll`] sends once that window has elapsed without a
//! further change. A newer change always supersedes the pending one, so there
//! is never more than one outstanding packet.

use std::time::Duration;

use shared::{
    domain::{Direction, MotorState, Speed, Step},
    error::InvalidArgument,
    protocol::MotorCommand,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{error::TransportError, intent::Intent, state_store::StateStore, transport::Transport};

const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(1);
const DEFAULT_START_SPEED: Speed = Speed::saturating(40);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Time without a speed change before the pending value is sent.
    pub quiet_period: Duration,
    /// Speed applied by the start action.
    pub start_speed: Speed,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            start_speed: DEFAULT_START_SPEED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    PendingAutoSend,
}

/// Debounce bookkeeping. A disarmed timer is the "suppressed" state: nothing
/// is sent automatically until the next speed change arms it again.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebounceTimer {
    last_mutation: Option<Instant>,
}

impl DebounceTimer {
    pub fn arm(&mut self, now: Instant) {
        self.last_mutation = Some(now);
    }

    pub fn disarm(&mut self) {
        self.last_mutation = None;
    }

    pub fn last_mutation(&self) -> Option<Instant> {
        self.last_mutation
    }

    pub fn deadline(&self, quiet_period: Duration) -> Option<Instant> {
        self.last_mutation.map(|at| at + quiet_period)
    }

    pub fn is_due(&self, now: Instant, quiet_period: Duration) -> bool {
        self.deadline(quiet_period).is_some_and(|deadline| now >= deadline)
    }
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Sent,
    /// The transport refused the packet; state is kept and nothing is retried.
    Dropped(TransportError),
}

#[derive(Debug)]
pub struct Dispatch {
    pub command: MotorCommand,
    pub outcome: DispatchOutcome,
}

impl Dispatch {
    pub fn is_sent(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Sent)
    }
}

#[derive(Debug)]
pub struct Dispatcher<T> {
    store: StateStore,
    timer: DebounceTimer,
    policy: DispatchPolicy,
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, policy: DispatchPolicy) -> Self {
        Self {
            store: StateStore::new(),
            timer: DebounceTimer::default(),
            policy,
            transport,
        }
    }

    pub fn motor_state(&self) -> MotorState {
        self.store.snapshot()
    }

    pub fn state(&self) -> DispatcherState {
        if self.timer.last_mutation().is_some() {
            DispatcherState::PendingAutoSend
        } else {
            DispatcherState::Idle
        }
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    /// When the pending auto-send becomes due, if one is pending.
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.timer.deadline(self.policy.quiet_period)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn on_slider_moved(&mut self, value: i64, now: Instant) -> Result<(), InvalidArgument> {
        self.store.set_speed(value)?;
        self.timer.arm(now);
        debug!(speed = value, "slider moved; debounce window restarted");
        Ok(())
    }

    pub fn on_increment(&mut self, now: Instant) -> bool {
        self.step(Step::Up, now)
    }

    pub fn on_decrement(&mut self, now: Instant) -> bool {
        self.step(Step::Down, now)
    }

    pub fn on_start(&mut self) -> Dispatch {
        self.store.put_speed(self.policy.start_speed);
        self.dispatch_now("start")
    }

    pub fn on_stop(&mut self) -> Dispatch {
        self.store.put_speed(Speed::MIN);
        self.dispatch_now("stop")
    }

    pub fn on_set_forward(&mut self) -> Dispatch {
        self.on_set_direction(Direction::Forward)
    }

    pub fn on_set_reverse(&mut self) -> Dispatch {
        self.on_set_direction(Direction::Reverse)
    }

    pub fn on_set_direction(&mut self, direction: Direction) -> Dispatch {
        self.store.set_direction(direction);
        self.dispatch_now("direction")
    }

    /// Periodic check. Sends the pending value once the quiet period has
    /// elapsed since the last speed change, then returns to idle.
    pub fn poll(&mut self, now: Instant) -> Option<Dispatch> {
        if !self.timer.is_due(now, self.policy.quiet_period) {
            return None;
        }
        self.timer.disarm();
        Some(self.dispatch("debounce"))
    }

    /// Routes an operator intent. Only immediate intents return a dispatch.
    pub fn apply(
        &mut self,
        intent: Intent,
        now: Instant,
    ) -> Result<Option<Dispatch>, InvalidArgument> {
        let dispatch = match intent {
            Intent::SliderMoved(value) => {
                self.on_slider_moved(value, now)?;
                None
            }
            Intent::Increment => {
                self.on_increment(now);
                None
            }
            Intent::Decrement => {
                self.on_decrement(now);
                None
            }
            Intent::Start => Some(self.on_start()),
            Intent::Stop => Some(self.on_stop()),
            Intent::SetForward => Some(self.on_set_forward()),
            Intent::SetReverse => Some(self.on_set_reverse()),
        };
        Ok(dispatch)
    }

    fn step(&mut self, step: Step, now: Instant) -> bool {
        let changed = self.store.adjust_speed(step);
        if changed {
            self.timer.arm(now);
            debug!(speed = %self.store.snapshot().speed, ?step, "speed stepped");
        }
        changed
    }

    fn dispatch_now(&mut self, trigger: &'static str) -> Dispatch {
        if self.timer.last_mutation().is_some() {
            debug!(trigger, "pending auto-send superseded");
        }
        self.timer.disarm();
        self.dispatch(trigger)
    }

    fn dispatch(&mut self, trigger: &'static str) -> Dispatch {
        let command = MotorCommand::from(self.store.snapshot());
        let packet = command.encode();

        let outcome = match self.transport.send(packet.as_bytes()) {
            Ok(()) => {
                info!(%packet, trigger, "sent");
                DispatchOutcome::Sent
            }
            Err(err) => {
                warn!(%packet, trigger, error = %err, "send failed; dropping packet");
                DispatchOutcome::Dropped(err)
            }
        };

        Dispatch { command, outcome }
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;

//! Single-task event loop tying operator intents and the periodic debounce
//! check to a [`Dispatcher`].

use std::time::Duration;

use shared::domain::MotorState;
use tokio::{
    sync::{mpsc, watch},
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    dispatcher::{Dispatch, Dispatcher, DispatcherState},
    intent::Intent,
    transport::Transport,
};

/// Counters reported when the panel loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelSummary {
    pub intents: u64,
    pub rejected: u64,
    pub dispatches: u64,
    pub dropped: u64,
}

impl PanelSummary {
    fn record(&mut self, dispatch: &Dispatch) {
        self.dispatches += 1;
        if !dispatch.is_sent() {
            self.dropped += 1;
        }
    }
}

pub struct Panel<T> {
    dispatcher: Dispatcher<T>,
    check_interval: Duration,
    state_tx: watch::Sender<MotorState>,
}

impl<T: Transport> Panel<T> {
    pub fn new(dispatcher: Dispatcher<T>, check_interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(dispatcher.motor_state());
        Self {
            dispatcher,
            check_interval,
            state_tx,
        }
    }

    /// Observe the motor state as the loop mutates it.
    pub fn subscribe(&self) -> watch::Receiver<MotorState> {
        self.state_tx.subscribe()
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Runs until the intent channel closes. The periodic check is re-armed
    /// on every tick; late ticks are delayed rather than bursted.
    pub async fn run(mut self, mut intents: mpsc::Receiver<Intent>) -> PanelSummary {
        let mut ticker = time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut summary = PanelSummary::default();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(dispatch) = self.dispatcher.poll(Instant::now()) {
                        summary.record(&dispatch);
                    }
                }
                intent = intents.recv() => {
                    let Some(intent) = intent else {
                        break;
                    };
                    summary.intents += 1;
                    match self.dispatcher.apply(intent, Instant::now()) {
                        Ok(Some(dispatch)) => summary.record(&dispatch),
                        Ok(None) => {}
                        Err(err) => {
                            summary.rejected += 1;
                            warn!(?intent, error = %err, "intent rejected");
                        }
                    }
                    self.state_tx.send_replace(self.dispatcher.motor_state());
                }
            }
        }

        if self.dispatcher.state() == DispatcherState::PendingAutoSend {
            info!(
                state = ?self.dispatcher.motor_state(),
                "intent stream closed with an unsent speed change"
            );
        }
        debug!(?summary, "panel loop finished");
        summary
    }
}

#[cfg(test)]
#[path = "tests/panel_tests.rs"]
mod tests;

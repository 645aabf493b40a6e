use shared::{
    domain::{Direction, MotorState, Speed, Step},
    error::InvalidArgument,
};

/// Holder of the single [`MotorState`] instance.
#[derive(Debug, Default)]
pub struct StateStore {
    state: MotorState,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MotorState {
        self.state
    }

    /// Sets the speed from raw input, rejecting anything outside `0..=100`.
    pub fn set_speed(&mut self, value: i64) -> Result<(), InvalidArgument> {
        self.state.speed = Speed::new(value)?;
        Ok(())
    }

    pub fn put_speed(&mut self, speed: Speed) {
        self.state.speed = speed;
    }

    /// Moves the speed one step. Returns `false` and leaves state alone at the
    /// bounds.
    pub fn adjust_speed(&mut self, step: Step) -> bool {
        match self.state.speed.step(step) {
            Some(speed) => {
                self.state.speed = speed;
                true
            }
            None => false,
        }
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.state.direction = direction;
    }
}

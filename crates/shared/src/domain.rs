use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidArgument;

/// Motor speed as a percentage of full duty, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Speed(u8);

impl Speed {
    pub const MIN: Speed = Speed(0);
    pub const MAX: Speed = Speed(100);

    pub fn new(value: i64) -> Result<Self, InvalidArgument> {
        if (0..=i64::from(Self::MAX.0)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(InvalidArgument::SpeedOutOfRange { value })
        }
    }

    /// Builds a speed from a percentage, capping anything above 100.
    pub const fn saturating(percent: u8) -> Self {
        if percent > Self::MAX.0 {
            Self::MAX
        } else {
            Self(percent)
        }
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// Returns the speed one step up or down, or `None` when the step would
    /// leave the valid range.
    pub fn step(self, step: Step) -> Option<Self> {
        match step {
            Step::Up if self < Self::MAX => Some(Self(self.0 + 1)),
            Step::Down if self > Self::MIN => Some(Self(self.0 - 1)),
            _ => None,
        }
    }
}

impl TryFrom<i64> for Speed {
    type Error = InvalidArgument;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Speed> for u8 {
    fn from(value: Speed) -> Self {
        value.0
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub const FORWARD_TOKEN: &'static str = "fwd";
    pub const REVERSE_TOKEN: &'static str = "rev";

    pub fn token(self) -> &'static str {
        match self {
            Direction::Forward => Self::FORWARD_TOKEN,
            Direction::Reverse => Self::REVERSE_TOKEN,
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            Self::FORWARD_TOKEN => Some(Direction::Forward),
            Self::REVERSE_TOKEN => Some(Direction::Reverse),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Locally held motor setpoint. Starts at `0,fwd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotorState {
    pub speed: Speed,
    pub direction: Direction,
}

impl MotorState {
    pub fn new(speed: Speed, direction: Direction) -> Self {
        Self { speed, direction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_rejects_values_outside_percent_range() {
        assert_eq!(Speed::new(0).map(Speed::percent), Ok(0));
        assert_eq!(Speed::new(100).map(Speed::percent), Ok(100));
        assert_eq!(
            Speed::new(101),
            Err(InvalidArgument::SpeedOutOfRange { value: 101 })
        );
        assert_eq!(
            Speed::new(-1),
            Err(InvalidArgument::SpeedOutOfRange { value: -1 })
        );
    }

    #[test]
    fn step_stops_at_bounds() {
        assert_eq!(Speed::MAX.step(Step::Up), None);
        assert_eq!(Speed::MIN.step(Step::Down), None);
        assert_eq!(Speed::MIN.step(Step::Up), Speed::new(1).ok());
        assert_eq!(Speed::MAX.step(Step::Down), Speed::new(99).ok());
        assert_eq!(Speed::saturating(250), Speed::MAX);
    }

    #[test]
    fn default_state_is_stopped_forward() {
        let state = MotorState::default();
        assert_eq!(state.speed, Speed::MIN);
        assert_eq!(state.direction, Direction::Forward);
    }

    #[test]
    fn state_serializes_as_plain_json() {
        let state = MotorState::new(Speed::new(75).expect("speed"), Direction::Reverse);
        let json = serde_json::to_string(&state).expect("serialize");
        assert_eq!(json, r#"{"speed":75,"direction":"reverse"}"#);

        let bad = serde_json::from_str::<MotorState>(r#"{"speed":120,"direction":"forward"}"#);
        assert!(bad.is_err());
    }
}

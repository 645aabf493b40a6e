use thiserror::Error;

/// Rejected user input. State is left untouched when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidArgument {
    #[error("speed {value} is outside 0..=100")]
    SpeedOutOfRange { value: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty packet")]
    EmptyPacket,
    #[error("packet {packet:?} has no ',' separator")]
    MissingSeparator { packet: String },
    #[error("packet {packet:?} carries an invalid speed")]
    InvalidSpeed { packet: String },
    #[error("unknown direction token {token:?}")]
    UnknownDirection { token: String },
    #[error("discarded {len} unparseable byte(s)")]
    Garbage { len: usize },
}

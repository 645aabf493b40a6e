use std::{io, time::Duration};

use thiserror::Error;

/// Failure handing a packet to the connected peer. Never fatal to the panel.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport writer has shut down")]
    Disconnected,
    #[error("send failed: {0}")]
    Io(#[from] io::Error),
}

/// Initial connection failure; the surrounding application treats it as fatal.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to connect to {address}:{port}: {source}")]
    Unreachable {
        address: String,
        port: u16,
        source: io::Error,
    },
    #[error("connection to {address}:{port} timed out after {timeout:?}")]
    Timeout {
        address: String,
        port: u16,
        timeout: Duration,
    },
}

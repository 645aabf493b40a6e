use std::{net::SocketAddr, sync::Arc, time::Duration};

use tokio::{
    io::AsyncWriteExt,
    net::TcpStream,
    sync::mpsc,
    task::JoinHandle,
    time,
};
use tracing::{debug, info, warn};

use crate::error::{ConnectError, TransportError};

/// Byte-oriented outbound link to the motor board.
///
/// `send` must not block: the dispatcher calls it from the event loop.
pub trait Transport {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        (**self).send(payload)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        (**self).send(payload)
    }
}

/// TCP link. The socket lives in a writer task; [`Transport::send`] only
/// queues the packet, so a slow peer never holds up the caller.
#[derive(Debug)]
pub struct TcpTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    peer: SocketAddr,
}

impl TcpTransport {
    /// Connects and spawns the writer task. The task ends after the first
    /// failed write or once every `TcpTransport` handle is dropped.
    pub async fn connect(
        address: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<(Self, JoinHandle<()>), ConnectError> {
        let stream = match time::timeout(timeout, TcpStream::connect((address, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ConnectError::Unreachable {
                    address: address.to_string(),
                    port,
                    source,
                })
            }
            Err(_) => {
                return Err(ConnectError::Timeout {
                    address: address.to_string(),
                    port,
                    timeout,
                })
            }
        };

        let peer = stream.peer_addr().map_err(|source| ConnectError::Unreachable {
            address: address.to_string(),
            port,
            source,
        })?;
        if let Err(err) = stream.set_nodelay(true) {
            debug!(%peer, error = %err, "could not disable nagle");
        }
        info!(%peer, "connected to motor board");

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_loop(stream, rx, peer));
        Ok((Self { tx, peer }, writer))
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Transport for TcpTransport {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        self.tx
            .send(payload.to_vec())
            .map_err(|_| TransportError::Disconnected)
    }
}

async fn write_loop(
    mut stream: TcpStream,
    mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
    peer: SocketAddr,
) {
    while let Some(payload) = rx.recv().await {
        if let Err(err) = stream.write_all(&payload).await {
            warn!(%peer, error = %err, "write to motor board failed; closing link");
            return;
        }
        debug!(%peer, bytes = payload.len(), "packet written");
    }
    debug!(%peer, "transport handle dropped; closing link");
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

use std::{
    io,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use crate::{error::TransportError, transport::Transport};

/// In-memory transport recording every packet it accepts.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub(crate) fn failing() -> Self {
        let transport = Self::default();
        transport.set_failing(true);
        transport
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "board went away",
            )));
        }
        self.sent
            .lock()
            .expect("sent lock")
            .push(String::from_utf8_lossy(payload).into_owned());
        Ok(())
    }
}

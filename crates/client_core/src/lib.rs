//! Motor panel core: the state store, the debounced dispatcher deciding when
//! the setpoint goes out on the wire, and the transport it goes out through.

pub mod dispatcher;
pub mod error;
pub mod intent;
pub mod panel;
pub mod state_store;
pub mod transport;

pub use dispatcher::{
    DebounceTimer, Dispatch, DispatchOutcome, DispatchPolicy, Dispatcher, DispatcherState,
};
pub use error::{ConnectError, TransportError};
pub use intent::Intent;
pub use panel::{Panel, PanelSummary};
pub use state_store::StateStore;
pub use transport::{TcpTransport, Transport};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

//! Connection lifecycle state.
//!
//! lapin tracks this with a `ConnectionState`/`ConnectionStep` pair, where
//! `ConnectionStep` additionally carries the resolver for whichever
//! handshake reply is currently outstanding. This crate's handshake is
//! driven synchronously through explicit method calls rather than awaited
//! futures, so there is no resolver to stash; `ConnectionState` alone is
//! enough to reject misordered calls.

use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Initial,
    SentProtocolHeader,
    Negotiating,
    Connected,
    Closing,
    Closed,
    Error,
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Initial
    }
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_closed(self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Error)
    }
}

/// Shared, cheaply cloned handle over a connection's state, mirroring
/// `channel::status::ChannelStatus`.
#[derive(Clone, Debug, Default)]
pub struct ConnectionStatus(Arc<Mutex<ConnectionState>>);

impl ConnectionStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> ConnectionState {
        *self.0.lock()
    }

    pub fn set(&self, state: ConnectionState) {
        *self.0.lock() = state;
    }

    pub fn is_connected(&self) -> bool {
        self.get().is_connected()
    }

    pub fn is_closed(&self) -> bool {
        self.get().is_closed()
    }
}

//! Events a session delivers to the application layer.

use tt_core::StateId;

/// One notification from the backend session, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A client joined the backend.
    ClientConnected { name: String, address: String },
    /// A client left the backend.
    ClientDisconnected {
        name: String,
        address: String,
        reason: String,
    },
    /// The backend announced it is closing the session.
    BackendDisconnected { reason: String },
    /// Client input that passed the session's fencing check.
    ClientInput {
        state_id: StateId,
        name: String,
        address: String,
        content: String,
    },
    /// The session is closed; no further events follow.
    OwnDisconnect { reason: String },
}

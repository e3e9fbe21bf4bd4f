//! All envelope types exchanged between the host and the relaying backend.
//!
//! Every envelope is a JSON object whose `type` field names the variant; the
//! remaining fields sit next to it in the same object:
//!
//! ```json
//! {"type":"Input","state_id":42,"name":"alice","address":"10.0.0.7:51234","content":"B"}
//! {"type":"ChangeState","state_id":42,"content":"ActivityFastRead"}
//! ```
//!
//! # Direction
//!
//! | Tag                  | Sent by  |
//! |----------------------|----------|
//! | `ClientConnected`    | backend  |
//! | `ClientDisconnected` | backend  |
//! | `Disconnect`         | backend  |
//! | `Input`              | backend  |
//! | `Disconnecting`      | host     |
//! | `Update`             | host     |
//! | `ChangeState`        | host     |
//!
//! `Disconnect` and `Disconnecting` carry the same fields but are distinct tags
//! on the wire; both are kept as-is for compatibility with deployed peers.

use serde::{Deserialize, Serialize};

use crate::domain::fencing::StateId;

// ── Disconnect reasons ────────────────────────────────────────────────────────

/// Reason reported when the stream fails or carries malformed data.
pub const DISCONNECT_REASON_VIOLATION: &str = "Protocol violation";

/// Reason reported after the backend announced a graceful `Disconnect`.
pub const DISCONNECT_REASON_BACKEND_CLOSED_GRACEFULLY: &str =
    "Connection closed gracefully by backend";

/// Reason sent when the host operator closes the session.
pub const DISCONNECT_REASON_HOST_CLOSED: &str = "Connection closed by host";

/// State name announced with `ChangeState` while no activity is running.
pub const IDLE_ACTIVITY_NAME: &str = "None";

// ── Envelope ──────────────────────────────────────────────────────────────────

/// A typed message carried as UTF-8 JSON inside one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    /// A client joined the backend.
    ClientConnected { name: String, address: String },

    /// A client left the backend.
    ClientDisconnected {
        name: String,
        address: String,
        reason: String,
    },

    /// The backend is closing the session.
    Disconnect { reason: String },

    /// The host is closing the session (fully or its sending half).
    Disconnecting { reason: String },

    /// Input a client produced under the activity identified by `state_id`.
    Input {
        state_id: StateId,
        name: String,
        address: String,
        content: String,
    },

    /// Activity-specific state pushed by the host to all clients.
    Update { state_id: StateId, content: String },

    /// Announces that the host switched to the activity named in `content`.
    ChangeState { state_id: StateId, content: String },
}

impl Envelope {
    /// Returns the wire tag of this envelope.
    pub fn type_name(&self) -> &'static str {
        match self {
            Envelope::ClientConnected { .. } => "ClientConnected",
            Envelope::ClientDisconnected { .. } => "ClientDisconnected",
            Envelope::Disconnect { .. } => "Disconnect",
            Envelope::Disconnecting { .. } => "Disconnecting",
            Envelope::Input { .. } => "Input",
            Envelope::Update { .. } => "Update",
            Envelope::ChangeState { .. } => "ChangeState",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_matches_serialized_tag() {
        let samples = [
            Envelope::ClientConnected {
                name: "a".into(),
                address: "b".into(),
            },
            Envelope::Disconnect { reason: "r".into() },
            Envelope::Disconnecting { reason: "r".into() },
            Envelope::Update {
                state_id: StateId(3),
                content: "c".into(),
            },
        ];

        for envelope in samples {
            let value = serde_json::to_value(&envelope).unwrap();
            assert_eq!(value["type"], envelope.type_name());
        }
    }

    #[test]
    fn test_disconnect_and_disconnecting_are_distinct_tags() {
        let a = serde_json::to_string(&Envelope::Disconnect { reason: "x".into() }).unwrap();
        let b = serde_json::to_string(&Envelope::Disconnecting { reason: "x".into() }).unwrap();
        assert_ne!(a, b);
    }
}

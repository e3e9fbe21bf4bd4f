//! ClientRoster: the host's view of which clients the backend has connected.
//!
//! The backend announces every client that joins or leaves with
//! `ClientConnected` / `ClientDisconnected`.  The roster mirrors those
//! announcements so the operator can see who is taking part.
//!
//! Clients are keyed by the backend-assigned `address`, which is unique per
//! connection; display names are self-reported and may collide.

use std::collections::HashMap;
use std::time::SystemTime;

/// One client currently connected to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedClient {
    pub name: String,
    pub address: String,
    /// When the backend announced the client.
    pub connected_at: SystemTime,
}

/// In-memory roster of connected clients.
///
/// # HashMap choice
///
/// A `HashMap<String, ConnectedClient>` keyed by address gives O(1) updates on
/// join/leave.  [`ClientRoster::all`] sorts by name for display.
#[derive(Debug, Default)]
pub struct ClientRoster {
    clients: HashMap<String, ConnectedClient>,
}

impl ClientRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a joined client.  A repeated announcement for the same address
    /// replaces the stored name.
    pub fn connect(&mut self, name: &str, address: &str) {
        self.clients.insert(
            address.to_string(),
            ConnectedClient {
                name: name.to_string(),
                address: address.to_string(),
                connected_at: SystemTime::now(),
            },
        );
    }

    /// Removes a client, returning it if it was known.
    pub fn disconnect(&mut self, address: &str) -> Option<ConnectedClient> {
        self.clients.remove(address)
    }

    pub fn get(&self, address: &str) -> Option<&ConnectedClient> {
        self.clients.get(address)
    }

    /// Snapshot of all clients sorted by name, then address.
    pub fn all(&self) -> Vec<ConnectedClient> {
        let mut clients: Vec<_> = self.clients.values().cloned().collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.address.cmp(&b.address)));
        clients
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Forgets every client; used once the session has closed.
    pub fn clear(&mut self) {
        self.clients.clear();
    }
}

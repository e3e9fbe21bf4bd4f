//! Session-callback → async channel bridge.
//!
//! Session callbacks run on the receive thread and must return quickly.
//! [`ChannelEvents`] turns each callback into a [`HostEvent`] and pushes it onto
//! an unbounded Tokio channel; the binary's event pump drains that channel and
//! feeds the events to the
//! [`ActivityController`](crate::application::run_activity::ActivityController).

use tokio::sync::mpsc;
use tracing::debug;
use tt_core::StateId;

use crate::application::host_event::HostEvent;
use crate::infrastructure::network::session::SessionEvents;

/// [`SessionEvents`] implementation that forwards every callback as a [`HostEvent`].
#[derive(Debug, Clone)]
pub struct ChannelEvents {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl ChannelEvents {
    /// Creates the bridge together with the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: HostEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!("event pump has stopped; dropping {:?}", e.0);
        }
    }
}

impl SessionEvents for ChannelEvents {
    fn on_client_connected(&self, name: &str, address: &str) {
        self.forward(HostEvent::ClientConnected {
            name: name.to_string(),
            address: address.to_string(),
        });
    }

    fn on_client_disconnected(&self, name: &str, address: &str, reason: &str) {
        self.forward(HostEvent::ClientDisconnected {
            name: name.to_string(),
            address: address.to_string(),
            reason: reason.to_string(),
        });
    }

    fn on_backend_disconnect(&self, reason: &str) {
        self.forward(HostEvent::BackendDisconnected {
            reason: reason.to_string(),
        });
    }

    fn on_client_input(&self, state_id: StateId, name: &str, address: &str, content: &str) {
        self.forward(HostEvent::ClientInput {
            state_id,
            name: name.to_string(),
            address: address.to_string(),
            content: content.to_string(),
        });
    }

    fn on_own_disconnect(&self, reason: &str) {
        self.forward(HostEvent::OwnDisconnect {
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callbacks_arrive_in_order_as_host_events() {
        // Arrange
        let (events, mut rx) = ChannelEvents::new();

        // Act
        events.on_client_connected("alice", "10.0.0.2:5000");
        events.on_client_input(StateId(42), "alice", "10.0.0.2:5000", "B");
        events.on_own_disconnect("Protocol violation");

        // Assert
        assert_eq!(
            rx.try_recv().unwrap(),
            HostEvent::ClientConnected {
                name: "alice".to_string(),
                address: "10.0.0.2:5000".to_string(),
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            HostEvent::ClientInput {
                state_id: StateId(42),
                name: "alice".to_string(),
                address: "10.0.0.2:5000".to_string(),
                content: "B".to_string(),
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            HostEvent::OwnDisconnect {
                reason: "Protocol violation".to_string(),
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_forwarding_after_receiver_dropped_does_not_panic() {
        let (events, rx) = ChannelEvents::new();
        drop(rx);

        events.on_backend_disconnect("Another host connected");
        events.on_client_disconnected("bob", "10.0.0.3:5000", "timeout");
    }
}

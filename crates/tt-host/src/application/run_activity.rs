//! RunActivityUseCase: starts and ends activities and routes client input.
//!
//! # Starting an activity (for beginners)
//!
//! Clients tag every answer with the `state_id` of the activity they believe is
//! running.  To make sure late answers from an earlier activity are never
//! mistaken for answers to the current one, starting an activity follows a
//! strict order:
//!
//! ```text
//! 1. mint a fresh StateId          (never 0, never the previous one)
//! 2. commit it on the session      (the receive loop now admits only it)
//! 3. ChangeState(id, name) ──►     (clients learn the new token)
//! ```
//!
//! Committing *before* announcing means there is no window in which a client
//! could answer with the new token while the session still rejects it.
//!
//! Ending an activity clears the committed token and announces the idle state
//! as `ChangeState(0, "None")`.
//!
//! Input is checked twice: once by the session's fence on the receive thread,
//! and again here when the queued event is delivered, because an activity may
//! have ended between the two.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use tt_core::protocol::messages::IDLE_ACTIVITY_NAME;
use tt_core::StateId;

use crate::application::activities::{Activity, ActivityCatalog};
use crate::application::host_event::HostEvent;
use crate::application::manage_clients::ClientRoster;

/// Error returned by an [`ActivityLink`] when a frame could not be sent.
pub type LinkError = Box<dyn std::error::Error + Send + Sync>;

/// The part of a session the application layer needs.
///
/// Implemented by `infrastructure::network::Session`; mocked in tests.
#[cfg_attr(test, mockall::automock)]
pub trait ActivityLink: Send + Sync {
    /// Commits the token inbound `Input` must carry.
    fn commit_state(&self, state_id: StateId);

    /// Returns the fence to idle.
    fn clear_state(&self);

    /// Announces the activity (or idle state) named `activity`.
    fn send_state_change(&self, state_id: StateId, activity: &str) -> Result<(), LinkError>;

    /// Pushes activity content to all clients.
    fn send_update(&self, state_id: StateId, content: &str) -> Result<(), LinkError>;
}

/// Errors surfaced by [`ActivityController`] operations.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// No activity is registered under this index.
    #[error("activity index {0} is not implemented")]
    BadIndex(usize),

    /// An update was requested while idle.
    #[error("no activity is running")]
    NotRunning,

    /// The session could not send the frame and has been closed.
    #[error("sending to the backend failed: {0}")]
    SendFailed(#[source] LinkError),
}

/// Snapshot of the running activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityStatus {
    pub index: usize,
    pub name: &'static str,
    pub state_id: StateId,
}

/// What the event pump should do after an event was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Keep pumping events.
    Continue,
    /// The session is gone; stop.
    Closed { reason: String },
}

struct RunningActivity {
    status: ActivityStatus,
    activity: Box<dyn Activity>,
}

/// Owns the running activity and the client roster for one session.
pub struct ActivityController {
    link: Arc<dyn ActivityLink>,
    catalog: ActivityCatalog,
    roster: ClientRoster,
    running: Option<RunningActivity>,
    last_state: Option<StateId>,
}

impl ActivityController {
    pub fn new(link: Arc<dyn ActivityLink>, catalog: ActivityCatalog) -> Self {
        Self {
            link,
            catalog,
            roster: ClientRoster::new(),
            running: None,
            last_state: None,
        }
    }

    pub fn catalog(&self) -> &ActivityCatalog {
        &self.catalog
    }

    pub fn roster(&self) -> &ClientRoster {
        &self.roster
    }

    /// The running activity, or `None` while idle.
    pub fn status(&self) -> Option<ActivityStatus> {
        self.running.as_ref().map(|r| r.status)
    }

    /// Starts the activity at `index`, replacing any running one.
    ///
    /// Returns the token minted for the new activity.
    ///
    /// # Errors
    ///
    /// - [`ActivityError::BadIndex`] if the catalog has no such entry; the
    ///   current state is left untouched.
    /// - [`ActivityError::SendFailed`] if the announcement could not be sent.
    ///   The activity is ended locally and the fence cleared.
    pub fn start_activity(&mut self, index: usize) -> Result<StateId, ActivityError> {
        let entry = self.catalog.get(index).ok_or(ActivityError::BadIndex(index))?;
        let name = entry.name();
        let activity = entry.create();

        if let Some(previous) = self.running.take() {
            info!(activity = previous.status.name, "replacing running activity");
        }

        let state_id = StateId::fresh(self.last_state);
        self.last_state = Some(state_id);
        self.link.commit_state(state_id);
        self.running = Some(RunningActivity {
            status: ActivityStatus {
                index,
                name,
                state_id,
            },
            activity,
        });

        if let Err(e) = self.link.send_state_change(state_id, name) {
            error!(activity = name, %state_id, "announcing activity failed: {e}");
            self.running = None;
            self.link.clear_state();
            return Err(ActivityError::SendFailed(e));
        }

        info!(activity = name, %state_id, "activity started");
        Ok(state_id)
    }

    /// Ends the running activity (if any) and announces the idle state.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::SendFailed`] if the idle announcement could not
    /// be sent.  The activity has been ended locally regardless.
    pub fn end_activity(&mut self) -> Result<(), ActivityError> {
        match self.running.take() {
            Some(previous) => info!(activity = previous.status.name, "activity ended"),
            None => debug!("no activity running; announcing idle state anyway"),
        }
        self.link.clear_state();
        self.link
            .send_state_change(StateId::IDLE, IDLE_ACTIVITY_NAME)
            .map_err(ActivityError::SendFailed)
    }

    /// Pushes `content` to all clients under the running activity's token.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::NotRunning`] while idle, or
    /// [`ActivityError::SendFailed`] if the session could not send.
    pub fn send_update(&self, content: &str) -> Result<(), ActivityError> {
        let running = self.running.as_ref().ok_or(ActivityError::NotRunning)?;
        self.link
            .send_update(running.status.state_id, content)
            .map_err(ActivityError::SendFailed)
    }

    /// Applies one session event.
    pub fn handle_event(&mut self, event: HostEvent) -> Flow {
        match event {
            HostEvent::ClientConnected { name, address } => {
                info!("client connected: {name} ({address})");
                self.roster.connect(&name, &address);
            }
            HostEvent::ClientDisconnected {
                name,
                address,
                reason,
            } => {
                info!("client disconnected: {name} ({address}): {reason}");
                self.roster.disconnect(&address);
            }
            HostEvent::ClientInput {
                state_id,
                name,
                address,
                content,
            } => self.deliver_input(state_id, &name, &address, &content),
            HostEvent::BackendDisconnected { reason } => {
                warn!("backend is closing the session: {reason}");
            }
            HostEvent::OwnDisconnect { reason } => {
                info!("session closed: {reason}");
                self.running = None;
                self.roster.clear();
                return Flow::Closed { reason };
            }
        }
        Flow::Continue
    }

    fn deliver_input(&mut self, state_id: StateId, name: &str, address: &str, content: &str) {
        match self.running.as_mut() {
            Some(running) if running.status.state_id == state_id => {
                running.activity.input_received(address, name, content);
            }
            Some(running) => debug!(
                expected = %running.status.state_id,
                %state_id,
                "dropping input from {address} for an earlier activity"
            ),
            None => debug!(%state_id, "dropping input from {address} while idle"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

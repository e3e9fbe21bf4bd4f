//! Activity fencing tokens.
//!
//! Each time the host starts an activity it picks a fresh, unpredictable
//! [`StateId`] and commits it to a [`StateFence`] *before* announcing the
//! activity.  Every `Input` a client sends echoes the token it believed was
//! current; the receive path admits an `Input` only if its token equals the
//! committed one.  Input produced under an activity that has since ended, or
//! delayed in flight across an activity boundary, is dropped.
//!
//! Tokens are compared by equality only.  They carry no order and are never
//! incremented.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// Opaque per-activity fencing token, carried on the wire as `state_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub i32);

impl StateId {
    /// Token sent alongside the idle-state announcement.  Never handed out by
    /// [`StateId::fresh`].
    pub const IDLE: StateId = StateId(0);

    /// Generates a new random token.
    ///
    /// The result is never [`StateId::IDLE`] and never equal to `previous`, so
    /// two back-to-back activities can not share a token.
    pub fn fresh(previous: Option<StateId>) -> StateId {
        loop {
            let candidate = StateId(rand::random::<i32>());
            if candidate != StateId::IDLE && Some(candidate) != previous {
                return candidate;
            }
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The currently committed fencing token of one session.
///
/// `None` means no activity is running; the fence then admits nothing.
#[derive(Debug, Default)]
pub struct StateFence {
    committed: Mutex<Option<StateId>>,
}

impl StateFence {
    /// Creates an idle fence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits `id` as the active token.
    pub fn commit(&self, id: StateId) {
        *self.lock() = Some(id);
    }

    /// Returns to idle.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// Returns the committed token, if any.
    pub fn current(&self) -> Option<StateId> {
        *self.lock()
    }

    /// Returns `true` if an `Input` carrying `id` belongs to the running activity.
    pub fn admits(&self, id: StateId) -> bool {
        *self.lock() == Some(id)
    }

    fn lock(&self) -> MutexGuard<'_, Option<StateId>> {
        // The guarded value is a plain `Copy` option; a panic elsewhere can not
        // leave it half-written.
        self.committed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

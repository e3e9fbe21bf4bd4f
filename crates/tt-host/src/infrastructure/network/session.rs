//! Session protocol over one persistent bidirectional byte stream.
//!
//! A [`Session`] owns exactly one stream for its whole lifetime:
//!
//! - **Send path** – `send_update`, `send_state_change`, `close_send`, and
//!   `close_completely` encode an [`Envelope`] and write it as one frame.  A
//!   mutex around the write half serializes physical writes so frames from
//!   concurrent callers never interleave.
//! - **Receive path** – one dedicated OS thread runs the receive loop.  It is
//!   the only reader of the stream.  Each frame is decoded and dispatched to the
//!   [`SessionEvents`] collaborator on that thread; `Input` envelopes are first
//!   checked against the committed fencing token.
//!
//! # Shutdown
//!
//! Closing the stream is the only cancellation mechanism.  Shutting both halves
//! down unblocks a pending read, which the receive loop reports through the
//! protocol-violation path.  Because `close_completely` fires the own-disconnect
//! notification at most once, that second close is a no-op.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, error, info, warn};
use tt_core::protocol::messages::{
    DISCONNECT_REASON_BACKEND_CLOSED_GRACEFULLY, DISCONNECT_REASON_VIOLATION,
};
use tt_core::{
    decode_envelope, encode_envelope, read_frame, write_frame, Envelope, FrameError,
    ProtocolError, StateFence, StateId,
};
use uuid::Uuid;

use crate::application::run_activity::{ActivityLink, LinkError};

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// TCP connection to the backend failed.
    #[error("failed to connect to backend at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The stream could not be cloned or the receive thread could not start.
    #[error("could not set up session stream: {0}")]
    Setup(#[source] io::Error),

    /// The envelope could not be serialized.  Nothing was written.
    #[error(transparent)]
    Encode(#[from] ProtocolError),

    /// The frame could not be written.  The stream has been closed; the peer
    /// may or may not have received part of the frame.
    #[error("sending failed, session closed: {0}")]
    SendFailed(#[source] FrameError),
}

/// A byte stream a [`Session`] can run on.
///
/// The session needs independent handles for reading, writing, and shutting
/// the stream down, so implementors must be cloneable into further handles
/// that refer to the same underlying connection.  The shutdown handle is
/// shared by every thread holding the session, hence `Sync`.
pub trait SessionStream: Read + Write + Send + Sync + 'static {
    /// Returns another handle to the same connection.
    fn try_clone_stream(&self) -> io::Result<Box<dyn SessionStream>>;

    /// Shuts down the read half, the write half, or both.
    fn shutdown_stream(&self, how: Shutdown) -> io::Result<()>;
}

impl SessionStream for TcpStream {
    fn try_clone_stream(&self) -> io::Result<Box<dyn SessionStream>> {
        Ok(Box::new(self.try_clone()?))
    }

    fn shutdown_stream(&self, how: Shutdown) -> io::Result<()> {
        self.shutdown(how)
    }
}

#[cfg(unix)]
impl SessionStream for std::os::unix::net::UnixStream {
    fn try_clone_stream(&self) -> io::Result<Box<dyn SessionStream>> {
        Ok(Box::new(self.try_clone()?))
    }

    fn shutdown_stream(&self, how: Shutdown) -> io::Result<()> {
        self.shutdown(how)
    }
}

/// Callbacks a session delivers to the surrounding application.
///
/// All callbacks except `on_own_disconnect` run on the session's receive
/// thread; `on_own_disconnect` runs on whichever thread closed the session.
/// Implementations must return quickly and hand expensive work to their own
/// execution context.
pub trait SessionEvents: Send + Sync {
    /// A client joined the backend.
    fn on_client_connected(&self, name: &str, address: &str);

    /// A client left the backend.
    fn on_client_disconnected(&self, name: &str, address: &str, reason: &str);

    /// The backend announced that it is closing the session.
    fn on_backend_disconnect(&self, reason: &str);

    /// A client sent input for the currently committed activity.
    fn on_client_input(&self, state_id: StateId, name: &str, address: &str, content: &str);

    /// The session has been closed.  Fired exactly once per session.
    fn on_own_disconnect(&self, reason: &str);
}

/// Tunables for a session.
///
/// The default accepts frames of any declared length; set `max_frame_len` to
/// reject oversized frames as a protocol violation before reading them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Largest inbound frame payload accepted; `None` disables the check.
    pub max_frame_len: Option<u32>,
}

/// States of the receive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    Closed,
}

/// One host↔backend session.  See the module documentation.
pub struct Session {
    id: Uuid,
    writer: Mutex<Box<dyn SessionStream>>,
    control: Box<dyn SessionStream>,
    fence: StateFence,
    events: Arc<dyn SessionEvents>,
    /// Set once both halves have been shut down.
    stream_closed: AtomicBool,
    /// Set once the outbound half has been closed by `close_send`.
    send_closed: AtomicBool,
    /// Set by the first `close_completely`; guards the own-disconnect callback.
    disconnected: AtomicBool,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Connects to the backend at `addr` and starts a session on the stream.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Connect`] if the TCP connection cannot be
    /// established, or [`SessionError::Setup`] if the session can not start.
    pub fn connect(
        addr: SocketAddr,
        events: Arc<dyn SessionEvents>,
        options: SessionOptions,
    ) -> Result<Arc<Self>, SessionError> {
        let stream =
            TcpStream::connect(addr).map_err(|source| SessionError::Connect { addr, source })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("could not disable Nagle on backend connection: {e}");
        }
        match stream.local_addr() {
            Ok(local) => info!("connected to backend at {addr} from {local}"),
            Err(_) => info!("connected to backend at {addr}"),
        }
        Self::start(stream, events, options)
    }

    /// Starts a session on an already-established stream and spawns its
    /// receive thread.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Setup`] if the stream cannot be cloned or the
    /// receive thread cannot be spawned.  The stream is closed in the latter case.
    pub fn start<S: SessionStream>(
        stream: S,
        events: Arc<dyn SessionEvents>,
        options: SessionOptions,
    ) -> Result<Arc<Self>, SessionError> {
        let reader = stream.try_clone_stream().map_err(SessionError::Setup)?;
        let control = stream.try_clone_stream().map_err(SessionError::Setup)?;
        let writer: Box<dyn SessionStream> = Box::new(stream);

        let session = Arc::new(Self {
            id: Uuid::new_v4(),
            writer: Mutex::new(writer),
            control,
            fence: StateFence::new(),
            events,
            stream_closed: AtomicBool::new(false),
            send_closed: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
            receiver: Mutex::new(None),
        });

        let loop_session = Arc::clone(&session);
        let spawned = thread::Builder::new()
            .name("tt-session-rx".to_string())
            .spawn(move || loop_session.receive_loop(reader, options.max_frame_len));

        match spawned {
            Ok(handle) => *lock(&session.receiver) = Some(handle),
            Err(e) => {
                session.force_close();
                return Err(SessionError::Setup(e));
            }
        }

        info!(session = %session.id, "session started");
        Ok(session)
    }

    /// Unique identifier of this session, used in log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns `true` once the session has been closed in any way.
    pub fn is_closed(&self) -> bool {
        self.disconnected.load(Ordering::Acquire) || self.stream_closed.load(Ordering::Acquire)
    }

    // ── Fencing ───────────────────────────────────────────────────────────────

    /// Commits `state_id` as the token inbound `Input` must carry.
    pub fn commit_state(&self, state_id: StateId) {
        self.fence.commit(state_id);
        debug!(session = %self.id, %state_id, "committed state");
    }

    /// Returns to idle; no `Input` is admitted until the next commit.
    pub fn clear_state(&self) {
        self.fence.clear();
        debug!(session = %self.id, "cleared state");
    }

    /// The currently committed token, if any.
    pub fn active_state(&self) -> Option<StateId> {
        self.fence.current()
    }

    // ── Send surface ──────────────────────────────────────────────────────────

    /// Pushes activity content to all clients.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SendFailed`] if the frame could not be written;
    /// the stream is closed before this returns.
    pub fn send_update(&self, state_id: StateId, content: &str) -> Result<(), SessionError> {
        self.send(&Envelope::Update {
            state_id,
            content: content.to_string(),
        })
    }

    /// Announces a switch to the activity (or idle state) named `content`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SendFailed`] if the frame could not be written;
    /// the stream is closed before this returns.
    pub fn send_state_change(&self, state_id: StateId, content: &str) -> Result<(), SessionError> {
        self.send(&Envelope::ChangeState {
            state_id,
            content: content.to_string(),
        })
    }

    /// Sends `Disconnecting{reason}` and closes only the outbound half.
    ///
    /// Frames already in flight from the backend are still delivered to the
    /// receive loop until the backend closes its side.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SendFailed`] if the notice could not be written;
    /// both halves are closed in that case.
    pub fn close_send(&self, reason: &str) -> Result<(), SessionError> {
        let envelope = Envelope::Disconnecting {
            reason: reason.to_string(),
        };

        let mut writer = lock(&self.writer);
        self.send_locked(&mut writer, &envelope)?;
        self.send_closed.store(true, Ordering::Release);
        if let Err(e) = writer.shutdown_stream(Shutdown::Write) {
            warn!(session = %self.id, "closing outbound half failed: {e}");
        }
        info!(session = %self.id, reason, "outbound half closed");
        Ok(())
    }

    /// Closes the session for good.
    ///
    /// Sends `Disconnecting{reason}` on a best-effort basis, shuts both halves
    /// down, and fires `on_own_disconnect(reason)`.  Only the first call does
    /// anything; later or concurrent calls return immediately.
    pub fn close_completely(&self, reason: &str) {
        if self.disconnected.swap(true, Ordering::AcqRel) {
            debug!(session = %self.id, reason, "session already closed");
            return;
        }
        info!(session = %self.id, reason, "closing session");

        if !self.stream_closed.load(Ordering::Acquire) && !self.send_closed.load(Ordering::Acquire)
        {
            let notice = Envelope::Disconnecting {
                reason: reason.to_string(),
            };
            if let Err(e) = self.send(&notice) {
                debug!(session = %self.id, "disconnect notice not delivered: {e}");
            }
        }

        self.force_close();
        self.events.on_own_disconnect(reason);
    }

    /// Blocks until the receive loop has exited.
    ///
    /// Does nothing when called from the receive thread itself or when the
    /// loop has already been joined.
    pub fn join(&self) {
        let handle = lock(&self.receiver).take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                *lock(&self.receiver) = Some(handle);
                return;
            }
            if handle.join().is_err() {
                error!(session = %self.id, "receive loop panicked");
            }
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn send(&self, envelope: &Envelope) -> Result<(), SessionError> {
        let mut writer = lock(&self.writer);
        self.send_locked(&mut writer, envelope)
    }

    /// Writes one envelope while the caller holds the writer lock.
    fn send_locked(
        &self,
        writer: &mut Box<dyn SessionStream>,
        envelope: &Envelope,
    ) -> Result<(), SessionError> {
        if self.stream_closed.load(Ordering::Acquire) || self.send_closed.load(Ordering::Acquire) {
            return Err(SessionError::SendFailed(FrameError::Io(io::Error::from(
                io::ErrorKind::NotConnected,
            ))));
        }

        let payload = encode_envelope(envelope)?;
        match write_frame(&mut **writer, &payload) {
            Ok(()) => {
                debug!(session = %self.id, kind = envelope.type_name(), len = payload.len(), "sent");
                Ok(())
            }
            Err(e) => {
                error!(session = %self.id, kind = envelope.type_name(), "send failed: {e}");
                self.force_close();
                Err(SessionError::SendFailed(e))
            }
        }
    }

    /// Shuts both halves down.  Idempotent.
    fn force_close(&self) {
        if self.stream_closed.swap(true, Ordering::AcqRel) {
            return;
        }
        match self.control.shutdown_stream(Shutdown::Both) {
            Ok(()) => debug!(session = %self.id, "stream closed"),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => {
                debug!(session = %self.id, "stream already closed by peer")
            }
            Err(e) => warn!(session = %self.id, "closing stream failed: {e}"),
        }
    }

    fn receive_loop(self: Arc<Self>, mut reader: Box<dyn SessionStream>, max_frame_len: Option<u32>) {
        debug!(session = %self.id, "receive loop running");

        let mut state = LoopState::Running;
        while state == LoopState::Running {
            state = self.receive_one(&mut *reader, max_frame_len);
        }

        info!(session = %self.id, "receive loop stopped");
    }

    /// Reads, decodes, and dispatches one frame.
    fn receive_one(&self, reader: &mut dyn SessionStream, max_frame_len: Option<u32>) -> LoopState {
        let payload = match read_frame(reader, max_frame_len) {
            Ok(payload) => payload,
            Err(e) => {
                if self.is_closed() {
                    debug!(session = %self.id, "read ended after local close: {e}");
                } else {
                    warn!(session = %self.id, "read from backend failed: {e}");
                }
                self.close_completely(DISCONNECT_REASON_VIOLATION);
                return LoopState::Closed;
            }
        };

        let envelope = match decode_envelope(&payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    session = %self.id,
                    "dropping session on malformed envelope: {e}; payload: {}",
                    String::from_utf8_lossy(&payload)
                );
                self.close_completely(DISCONNECT_REASON_VIOLATION);
                return LoopState::Closed;
            }
        };

        debug!(session = %self.id, kind = envelope.type_name(), "received");
        self.dispatch(envelope)
    }

    fn dispatch(&self, envelope: Envelope) -> LoopState {
        match envelope {
            Envelope::ClientConnected { name, address } => {
                self.events.on_client_connected(&name, &address);
            }
            Envelope::ClientDisconnected {
                name,
                address,
                reason,
            } => {
                self.events.on_client_disconnected(&name, &address, &reason);
            }
            Envelope::Input {
                state_id,
                name,
                address,
                content,
            } => {
                if self.fence.admits(state_id) {
                    self.events.on_client_input(state_id, &name, &address, &content);
                } else {
                    debug!(
                        session = %self.id,
                        %state_id,
                        active = ?self.fence.current(),
                        "dropping input from {address} outside the active state"
                    );
                }
            }
            Envelope::Disconnect { reason } => {
                info!(session = %self.id, reason = %reason, "backend is closing the session");
                self.events.on_backend_disconnect(&reason);
                self.close_completely(DISCONNECT_REASON_BACKEND_CLOSED_GRACEFULLY);
                return LoopState::Closed;
            }
            other @ (Envelope::Disconnecting { .. }
            | Envelope::Update { .. }
            | Envelope::ChangeState { .. }) => {
                warn!(
                    session = %self.id,
                    kind = other.type_name(),
                    "ignoring host-bound envelope received from backend"
                );
            }
        }
        LoopState::Running
    }
}

impl ActivityLink for Session {
    fn commit_state(&self, state_id: StateId) {
        Session::commit_state(self, state_id);
    }

    fn clear_state(&self) {
        Session::clear_state(self);
    }

    fn send_state_change(&self, state_id: StateId, activity: &str) -> Result<(), LinkError> {
        Session::send_state_change(self, state_id, activity).map_err(LinkError::from)
    }

    fn send_update(&self, state_id: StateId, content: &str) -> Result<(), LinkError> {
        Session::send_update(self, state_id, content).map_err(LinkError::from)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

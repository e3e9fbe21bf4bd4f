//! Network infrastructure for the host application.
//!
//! # Sub-modules
//!
//! - **`session`** – Owns the single TCP stream to the backend.  Serializes
//!   outbound frames, runs the receive loop on a dedicated thread, applies
//!   activity fencing to inbound `Input`, and implements the two close paths.
//!
//! - **`events`** – Bridges session callbacks (which fire on the receive
//!   thread) onto an async channel consumed by the application's event pump.

pub mod events;
pub mod session;

pub use events::ChannelEvents;
pub use session::{Session, SessionError, SessionEvents, SessionOptions, SessionStream};

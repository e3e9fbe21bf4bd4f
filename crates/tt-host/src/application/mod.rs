//! Application layer use cases for the host.
//!
//! # What lives here? (for beginners)
//!
//! The application layer decides *what* the host does with the events a
//! session produces: which activity is running, which client input reaches it,
//! and which clients are currently connected.  It talks to the network only
//! through the [`run_activity::ActivityLink`] trait, so every use case can be
//! tested with a mock instead of a real socket.
//!
//! # Sub-modules
//!
//! - **`host_event`**     – The events a session hands to the application.
//! - **`activities`**     – The catalog of selectable activities and the
//!   [`activities::Activity`] trait they implement.
//! - **`run_activity`**   – Starts and ends activities, mints fencing tokens,
//!   and routes client input to the running activity.
//! - **`manage_clients`** – In-memory roster of clients the backend reported.

pub mod activities;
pub mod host_event;
pub mod manage_clients;
pub mod run_activity;

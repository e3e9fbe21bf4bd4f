//! Domain types for the session core.
//!
//! - **`fencing`** – The per-activity `StateId` token and the `StateFence`
//!   that holds the currently committed token.

pub mod fencing;

pub use fencing::{StateFence, StateId};

//! # tt-core
//!
//! Shared library for TT-Host containing the session transport protocol:
//! the length-prefixed frame codec, the JSON envelope codec, and the fencing
//! token that keeps input from one activity out of the next.
//!
//! It has no dependencies on sockets, threads, or UI code.  The host
//! application (`tt-host`) layers a session with a receive loop on top.
//!
//! # Architecture overview
//!
//! A host pushes "activity" state to a group of remote clients through a
//! relaying backend and receives client input back.  All traffic between the
//! host and the backend travels over one bidirectional byte stream:
//!
//! - **`protocol`** – How bytes travel over the stream.  Every message is a
//!   JSON envelope with a `type` tag, carried in a frame made of a 4-byte
//!   big-endian length prefix followed by exactly that many payload bytes.
//!
//! - **`domain`** – The fencing token (`StateId`) and the committed-token
//!   fence that decides whether an inbound `Input` still belongs to the
//!   activity that is currently running.

pub mod domain;
pub mod protocol;

pub use domain::fencing::{StateFence, StateId};
pub use protocol::codec::{decode_envelope, encode_envelope, ProtocolError};
pub use protocol::frame::{encode_frame, read_frame, write_frame, FrameError};
pub use protocol::messages::Envelope;

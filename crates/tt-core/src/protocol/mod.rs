//! Session transport protocol: framing, envelope types, and the JSON codec.

pub mod codec;
pub mod frame;
pub mod messages;

pub use codec::{decode_envelope, encode_envelope, ProtocolError};
pub use frame::{encode_frame, read_frame, write_frame, FrameError, LENGTH_PREFIX_SIZE};
pub use messages::Envelope;

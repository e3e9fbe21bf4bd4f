//! Length-prefixed framing over a raw bidirectional byte stream.
//!
//! Wire format:
//! ```text
//! [payload_len:4][payload:payload_len]
//! ```
//! The length prefix is an unsigned 32-bit big-endian integer and always equals
//! the exact number of payload bytes that follow.  Payloads are never padded
//! or truncated.

use std::io::{self, Read, Write};

use thiserror::Error;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Upper bound for the up-front payload allocation.  Larger payloads grow the
/// buffer as bytes actually arrive.
const INITIAL_READ_CAPACITY: usize = 64 * 1024;

/// Errors that can occur while writing or reading a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The stream ended cleanly before the first byte of the next frame.
    #[error("stream ended before the next frame")]
    EndOfStream,

    /// The stream ended in the middle of a frame.
    #[error("stream ended inside a frame: expected {expected} bytes, received {received}")]
    Truncated { expected: usize, received: usize },

    /// The peer declared a payload larger than the configured limit.
    #[error("frame of {declared} bytes exceeds the {max}-byte limit")]
    TooLarge { declared: u32, max: u32 },

    /// The payload does not fit a 32-bit length prefix.
    #[error("payload of {0} bytes does not fit a 32-bit length prefix")]
    PayloadTooLong(usize),

    /// The underlying stream failed.
    #[error("stream I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Encodes `payload` as a single contiguous frame (prefix followed by payload).
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLong`] if the payload is longer than
/// `u32::MAX` bytes.
///
/// # Examples
///
/// ```rust
/// use tt_core::protocol::frame::encode_frame;
///
/// let frame = encode_frame(b"hi").unwrap();
/// assert_eq!(frame, vec![0, 0, 0, 2, b'h', b'i']);
/// ```
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len =
        u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLong(payload.len()))?;

    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Writes one frame to `writer` and flushes it.
///
/// The prefix and payload are handed to the writer as one buffer in a single
/// `write_all` call.  Callers that share a writer between threads must hold
/// their lock for the whole call so frames never interleave.
///
/// # Errors
///
/// Returns [`FrameError::Io`] if the write or flush fails, or
/// [`FrameError::PayloadTooLong`] for oversized payloads.
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError> {
    let frame = encode_frame(payload)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame from `reader`, blocking until the prefix and the whole
/// payload have arrived.
///
/// When `max_len` is `Some`, a declared length above it is rejected before any
/// payload byte is read or any buffer is allocated for it.
///
/// # Errors
///
/// - [`FrameError::EndOfStream`] if the stream ends before the first prefix byte.
/// - [`FrameError::Truncated`] if the stream ends inside the prefix or payload.
/// - [`FrameError::TooLarge`] if the declared length exceeds `max_len`.
/// - [`FrameError::Io`] for any other stream failure.
pub fn read_frame<R: Read + ?Sized>(
    reader: &mut R,
    max_len: Option<u32>,
) -> Result<Vec<u8>, FrameError> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    let mut filled = 0;
    while filled < LENGTH_PREFIX_SIZE {
        match reader.read(&mut prefix[filled..]) {
            Ok(0) if filled == 0 => return Err(FrameError::EndOfStream),
            Ok(0) => {
                return Err(FrameError::Truncated {
                    expected: LENGTH_PREFIX_SIZE,
                    received: filled,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let declared = u32::from_be_bytes(prefix);
    if let Some(max) = max_len {
        if declared > max {
            return Err(FrameError::TooLarge { declared, max });
        }
    }

    let expected = declared as usize;
    let mut payload = Vec::with_capacity(expected.min(INITIAL_READ_CAPACITY));
    let mut limited = Read::take(&mut *reader, u64::from(declared));
    limited.read_to_end(&mut payload)?;

    if payload.len() < expected {
        return Err(FrameError::Truncated {
            expected,
            received: payload.len(),
        });
    }
    Ok(payload)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(payload: &[u8]) -> Vec<u8> {
        let mut wire = Vec::new();
        write_frame(&mut wire, payload).expect("write must succeed");
        read_frame(&mut Cursor::new(wire), None).expect("read must succeed")
    }

    #[test]
    fn test_encode_frame_prefix_is_big_endian_length() {
        let frame = encode_frame(&[0xAA; 258]).unwrap();
        assert_eq!(&frame[..4], &[0x00, 0x00, 0x01, 0x02]);
        assert_eq!(frame.len(), LENGTH_PREFIX_SIZE + 258);
    }

    #[test]
    fn test_empty_payload_round_trips() {
        assert!(roundtrip(&[]).is_empty());
    }

    #[test]
    fn test_single_byte_payload_round_trips() {
        assert_eq!(roundtrip(&[0x7F]), vec![0x7F]);
    }

    #[test]
    fn test_64k_payload_round_trips_byte_identical() {
        let payload: Vec<u8> = (0..65536u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(roundtrip(&payload), payload);
    }

    #[test]
    fn test_consecutive_frames_are_read_in_order() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"first").unwrap();
        write_frame(&mut wire, b"").unwrap();
        write_frame(&mut wire, b"third").unwrap();
        let mut cursor = Cursor::new(wire);

        assert_eq!(read_frame(&mut cursor, None).unwrap(), b"first");
        assert_eq!(read_frame(&mut cursor, None).unwrap(), b"");
        assert_eq!(read_frame(&mut cursor, None).unwrap(), b"third");
        assert!(matches!(
            read_frame(&mut cursor, None),
            Err(FrameError::EndOfStream)
        ));
    }

    #[test]
    fn test_read_from_empty_stream_is_end_of_stream() {
        let result = read_frame(&mut Cursor::new(Vec::<u8>::new()), None);
        assert!(matches!(result, Err(FrameError::EndOfStream)));
    }

    #[test]
    fn test_partial_prefix_is_truncated() {
        let result = read_frame(&mut Cursor::new(vec![0x00, 0x00]), None);
        assert!(matches!(
            result,
            Err(FrameError::Truncated {
                expected: 4,
                received: 2
            })
        ));
    }

    #[test]
    fn test_partial_payload_is_truncated() {
        let mut wire = encode_frame(b"hello world").unwrap();
        wire.truncate(LENGTH_PREFIX_SIZE + 5);

        let result = read_frame(&mut Cursor::new(wire), None);

        assert!(matches!(
            result,
            Err(FrameError::Truncated {
                expected: 11,
                received: 5
            })
        ));
    }

    #[test]
    fn test_declared_length_above_limit_is_rejected() {
        // Only the prefix is present; the limit check must fire before reading on.
        let wire = 1_000_000u32.to_be_bytes().to_vec();

        let result = read_frame(&mut Cursor::new(wire), Some(1024));

        assert!(matches!(
            result,
            Err(FrameError::TooLarge {
                declared: 1_000_000,
                max: 1024
            })
        ));
    }

    #[test]
    fn test_declared_length_at_limit_is_accepted() {
        let mut wire = Vec::new();
        write_frame(&mut wire, &[1u8; 16]).unwrap();
        let payload = read_frame(&mut Cursor::new(wire), Some(16)).unwrap();
        assert_eq!(payload.len(), 16);
    }

    #[test]
    fn test_huge_declared_length_without_data_does_not_preallocate() {
        // A hostile prefix with no payload must fail as truncated rather than
        // attempting a 4 GiB allocation.
        let wire = u32::MAX.to_be_bytes().to_vec();
        let result = read_frame(&mut Cursor::new(wire), None);
        assert!(matches!(result, Err(FrameError::Truncated { received: 0, .. })));
    }
}

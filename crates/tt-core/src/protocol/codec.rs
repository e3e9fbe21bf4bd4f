//! JSON codec for [`Envelope`]s.
//!
//! Decoding is fail-closed: a payload that is not UTF-8, is not a JSON object,
//! lacks the `type` tag, names an unknown tag, or misses a required field is
//! rejected as a whole.  There is no partial parse and no pass-through of
//! unknown message types.

use thiserror::Error;

use crate::protocol::messages::Envelope;

/// Errors that can occur while encoding or decoding an envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload is not a well-formed envelope of a known type.
    #[error("malformed envelope: {0}")]
    Decode(#[source] serde_json::Error),

    /// The envelope could not be serialized.
    #[error("could not encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an [`Envelope`] as UTF-8 JSON text.
///
/// All fields of the variant are always emitted.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use tt_core::{encode_envelope, Envelope, StateId};
///
/// let bytes = encode_envelope(&Envelope::Update {
///     state_id: StateId(7),
///     content: "word".to_string(),
/// })
/// .unwrap();
/// assert_eq!(bytes, br#"{"type":"Update","state_id":7,"content":"word"}"#);
/// ```
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(envelope).map_err(ProtocolError::Encode)
}

/// Decodes one [`Envelope`] from a frame payload.
///
/// # Errors
///
/// Returns [`ProtocolError::Decode`] for any payload that is not exactly one
/// known envelope with all of its required fields.
///
/// # Examples
///
/// ```rust
/// use tt_core::{decode_envelope, Envelope};
///
/// let envelope = decode_envelope(br#"{"type":"Disconnect","reason":"bye"}"#).unwrap();
/// assert_eq!(envelope, Envelope::Disconnect { reason: "bye".to_string() });
///
/// assert!(decode_envelope(br#"{"type":"Hello"}"#).is_err());
/// ```
pub fn decode_envelope(payload: &[u8]) -> Result<Envelope, ProtocolError> {
    serde_json::from_slice(payload).map_err(ProtocolError::Decode)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fencing::StateId;

    fn assert_decode_fails(payload: &[u8]) {
        let result = decode_envelope(payload);
        assert!(
            matches!(result, Err(ProtocolError::Decode(_))),
            "expected decode error for {:?}, got {result:?}",
            String::from_utf8_lossy(payload)
        );
    }

    #[test]
    fn test_decode_input_from_backend_json() {
        let payload =
            br#"{"type":"Input","state_id":-12,"name":"alice","address":"10.0.0.7:5000","content":"B"}"#;

        let envelope = decode_envelope(payload).unwrap();

        assert_eq!(
            envelope,
            Envelope::Input {
                state_id: StateId(-12),
                name: "alice".into(),
                address: "10.0.0.7:5000".into(),
                content: "B".into(),
            }
        );
    }

    #[test]
    fn test_decode_ignores_field_order_and_extra_fields() {
        let payload = br#"{"address":"a","extra":1,"name":"n","type":"ClientConnected"}"#;
        let envelope = decode_envelope(payload).unwrap();
        assert_eq!(
            envelope,
            Envelope::ClientConnected {
                name: "n".into(),
                address: "a".into()
            }
        );
    }

    #[test]
    fn test_encode_change_state_emits_all_fields() {
        let bytes = encode_envelope(&Envelope::ChangeState {
            state_id: StateId(42),
            content: "ActivityFastRead".into(),
        })
        .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "ChangeState");
        assert_eq!(value["state_id"], 42);
        assert_eq!(value["content"], "ActivityFastRead");
    }

    #[test]
    fn test_missing_type_is_rejected() {
        assert_decode_fails(br#"{"reason":"bye"}"#);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert_decode_fails(br#"{"type":"NewHost","address":"1.2.3.4"}"#);
    }

    #[test]
    fn test_type_is_case_sensitive() {
        assert_decode_fails(br#"{"type":"disconnect","reason":"bye"}"#);
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        assert_decode_fails(br#"{"type":"ClientDisconnected","name":"n","address":"a"}"#);
        assert_decode_fails(br#"{"type":"Input","name":"n","address":"a","content":"c"}"#);
    }

    #[test]
    fn test_mistyped_field_is_rejected() {
        assert_decode_fails(br#"{"type":"Input","state_id":"7","name":"n","address":"a","content":"c"}"#);
        assert_decode_fails(br#"{"type":"Disconnect","reason":5}"#);
    }

    #[test]
    fn test_state_id_outside_32_bit_range_is_rejected() {
        assert_decode_fails(br#"{"type":"Update","state_id":4294967296,"content":"c"}"#);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert_decode_fails(br#"{"type":"Disconnect","reason":"bye""#);
        assert_decode_fails(b"");
        assert_decode_fails(b"[]");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        assert_decode_fails(&[b'{', 0xFF, 0xFE, b'}']);
    }
}

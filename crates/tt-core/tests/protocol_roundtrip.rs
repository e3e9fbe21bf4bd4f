//! Integration tests for the tt-core protocol codec.
//!
//! These tests push every envelope variant through the public API: JSON
//! encoding, framing onto a byte stream, reading the frame back, and decoding.

use std::io::Cursor;

use tt_core::{
    decode_envelope, encode_envelope, read_frame, write_frame, Envelope, FrameError, StateId,
};

/// Encodes, frames, reads back, and decodes `envelope`.
fn roundtrip(envelope: &Envelope) -> Envelope {
    let payload = encode_envelope(envelope).expect("encode must succeed");
    let mut wire = Vec::new();
    write_frame(&mut wire, &payload).expect("frame write must succeed");

    let mut cursor = Cursor::new(wire);
    let received = read_frame(&mut cursor, None).expect("frame read must succeed");
    assert_eq!(received, payload, "frame payload must be byte-identical");
    assert!(
        matches!(read_frame(&mut cursor, None), Err(FrameError::EndOfStream)),
        "exactly one frame must have been written"
    );

    decode_envelope(&received).expect("decode must succeed")
}

fn all_variants() -> Vec<Envelope> {
    vec![
        Envelope::ClientConnected {
            name: "alice".to_string(),
            address: "192.168.0.12:50123".to_string(),
        },
        Envelope::ClientDisconnected {
            name: "bob".to_string(),
            address: "192.168.0.13:50124".to_string(),
            reason: "Connection closed gracefully by client".to_string(),
        },
        Envelope::Disconnect {
            reason: "Another host connected".to_string(),
        },
        Envelope::Disconnecting {
            reason: "Connection closed by host".to_string(),
        },
        Envelope::Input {
            state_id: StateId(i32::MIN),
            name: "carol".to_string(),
            address: "[::1]:4000".to_string(),
            content: "answer: \"42\"\n".to_string(),
        },
        Envelope::Update {
            state_id: StateId(i32::MAX),
            content: "Grüße 👋".to_string(),
        },
        Envelope::ChangeState {
            state_id: StateId(42),
            content: "ActivityFastRead".to_string(),
        },
    ]
}

#[test]
fn test_every_variant_round_trips() {
    for original in all_variants() {
        assert_eq!(roundtrip(&original), original);
    }
}

#[test]
fn test_empty_strings_round_trip() {
    let original = Envelope::Input {
        state_id: StateId(1),
        name: String::new(),
        address: String::new(),
        content: String::new(),
    };
    assert_eq!(roundtrip(&original), original);
}

#[test]
fn test_large_update_content_round_trips() {
    let original = Envelope::Update {
        state_id: StateId(-3),
        content: "x".repeat(200_000),
    };
    assert_eq!(roundtrip(&original), original);
}

#[test]
fn test_all_variants_on_one_stream_arrive_in_order() {
    let variants = all_variants();
    let mut wire = Vec::new();
    for envelope in &variants {
        write_frame(&mut wire, &encode_envelope(envelope).unwrap()).unwrap();
    }

    let mut cursor = Cursor::new(wire);
    for expected in &variants {
        let payload = read_frame(&mut cursor, None).unwrap();
        assert_eq!(&decode_envelope(&payload).unwrap(), expected);
    }
    assert!(matches!(
        read_frame(&mut cursor, None),
        Err(FrameError::EndOfStream)
    ));
}

#[test]
fn test_wire_bytes_are_prefix_then_json_text() {
    // Big-endian u32 length followed by the UTF-8 JSON text.
    let payload = encode_envelope(&Envelope::Disconnecting {
        reason: "x".to_string(),
    })
    .unwrap();
    let mut wire = Vec::new();
    write_frame(&mut wire, &payload).unwrap();

    let text = r#"{"type":"Disconnecting","reason":"x"}"#;
    let mut expected = (text.len() as u32).to_be_bytes().to_vec();
    expected.extend_from_slice(text.as_bytes());
    assert_eq!(wire, expected);
}

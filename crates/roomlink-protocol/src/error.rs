//! Error types for the protocol layer.
//!
//! When you see a `ProtocolError`, the problem is in the message itself
//! (how it was encoded, decoded, or tagged), never in the network.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: malformed JSON, a top-level value that is not an
    /// object, or a frame that was cut short.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is well-formed JSON but breaks a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Room names are opaque but never empty.
    #[error("room name must not be empty")]
    EmptyRoomName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_keeps_serde_position() {
        let err = serde_json::from_slice::<serde_json::Value>(b"}}nope").unwrap_err();
        let message = ProtocolError::Decode(err).to_string();
        assert!(message.contains("line 1 column 1"), "{message}");
    }

    #[test]
    fn test_empty_room_message() {
        assert_eq!(
            ProtocolError::EmptyRoomName.to_string(),
            "room name must not be empty"
        );
    }
}

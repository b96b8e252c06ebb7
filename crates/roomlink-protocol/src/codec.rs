//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The structured send path hands whole [`Message`](crate::Message)s to the
//! transport, which frames them itself. The raw path is different: it
//! writes and reads plain bytes, so it needs something that turns a message
//! into bytes and back. That "something" is a [`Codec`].
//!
//! We ship [`JsonCodec`] because every room server we talk to speaks JSON.
//! Swapping in another format means implementing one trait, nothing else.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → the client shares its codec between the task running
///   the receive loop and whichever tasks are sending.
/// - `'static` → the codec owns everything it needs, so it can live inside
///   a client that is moved into a spawned task.
///
/// `decode` uses `DeserializeOwned` (vs plain `Deserialize`) so the result
/// doesn't borrow from the read buffer, which is reused on the next read.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use roomlink_protocol::{Codec, JsonCodec, Message};
///
/// let codec = JsonCodec;
///
/// let mut message = Message::new();
/// message.insert("text", "hi");
///
/// let bytes = codec.encode(&message).unwrap();
/// assert_eq!(bytes, br#"{"text":"hi"}"#);
///
/// let decoded: Message = codec.decode(&bytes).unwrap();
/// assert_eq!(message, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

//! Core protocol types for roomlink's wire format.
//!
//! The transport underneath only knows how to deliver one kind of thing: a
//! JSON object. Room semantics (join, leave, broadcast, multicast,
//! disconnect) are therefore encoded as two reserved keys inside that
//! object. This module owns those keys and the types that travel with them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Reserved keys
// ---------------------------------------------------------------------------

/// Key carrying the routing discriminator (see [`Kind`]).
pub const TYPE_KEY: &str = "GmWsType";

/// Key carrying the room name for `join`, `leave` and `multicast`.
pub const ROOM_KEY: &str = "GmWsRoom";

/// Every key the protocol owns. Callers should treat these as out of band.
pub const RESERVED_KEYS: [&str; 2] = [TYPE_KEY, ROOM_KEY];

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The identity of one connection, assigned by the client at connect time.
///
/// The server never sees this as a message field. It arrives once, as a
/// cookie on the handshake request, so the server can tie the socket to an
/// application session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh, globally unique identifier (random UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A caller-chosen room name.
///
/// Rooms live on the server; the client only names them. The one rule we
/// can check locally is that the name isn't empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomName(String);

impl RoomName {
    /// Validates and wraps a room name.
    ///
    /// # Errors
    /// Returns `ProtocolError::EmptyRoomName` for `""`.
    pub fn new(name: impl Into<String>) -> Result<Self, ProtocolError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ProtocolError::EmptyRoomName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomName {
    type Error = ProtocolError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<RoomName> for String {
    fn from(room: RoomName) -> Self {
        room.0
    }
}

impl AsRef<str> for RoomName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Kind — the routing discriminator
// ---------------------------------------------------------------------------

/// What the server should do with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Add this connection to a room.
    Join,
    /// Remove this connection from a room.
    Leave,
    /// Deliver to every connected peer.
    Broadcast,
    /// Deliver to the members of one room.
    Multicast,
    /// This connection is going away.
    Disconnect,
}

impl Kind {
    /// The exact string written under [`TYPE_KEY`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Broadcast => "broadcast",
            Self::Multicast => "multicast",
            Self::Disconnect => "disconnect",
        }
    }

    /// Returns `true` if messages of this kind carry [`ROOM_KEY`].
    pub fn requires_room(self) -> bool {
        matches!(self, Self::Join | Self::Leave | Self::Multicast)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "join" => Ok(Self::Join),
            "leave" => Ok(Self::Leave),
            "broadcast" => Ok(Self::Broadcast),
            "multicast" => Ok(Self::Multicast),
            "disconnect" => Ok(Self::Disconnect),
            other => Err(ProtocolError::InvalidMessage(format!(
                "unknown message type {other:?}"
            ))),
        }
    }
}

impl From<Kind> for Value {
    fn from(kind: Kind) -> Self {
        Value::String(kind.as_str().to_owned())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A generic keyed-value record: the unit of everything on the wire.
///
/// Values are [`serde_json::Value`], so a message can hold strings,
/// numbers, booleans, null, nested objects and lists while staying typed.
///
/// Tagging methods (`into_broadcast`, `into_multicast`) consume `self`.
/// The client calls them on a clone, so a caller's message never gains
/// protocol keys behind their back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Map<String, Value>);

impl Message {
    /// Creates an empty message.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// A control message carrying only a discriminator.
    pub fn control(kind: Kind) -> Self {
        let mut message = Self::new();
        message.0.insert(TYPE_KEY.to_owned(), kind.into());
        message
    }

    /// `{ GmWsType: "join", GmWsRoom: room }`
    pub fn join(room: &RoomName) -> Self {
        Self::control(Kind::Join).with_room(room)
    }

    /// `{ GmWsType: "leave", GmWsRoom: room }`
    pub fn leave(room: &RoomName) -> Self {
        Self::control(Kind::Leave).with_room(room)
    }

    /// `{ GmWsType: "disconnect" }`
    pub fn disconnect() -> Self {
        Self::control(Kind::Disconnect)
    }

    /// Tags the message for delivery to every peer.
    ///
    /// Any room key is removed: a broadcast never names a room.
    pub fn into_broadcast(mut self) -> Self {
        self.0.insert(TYPE_KEY.to_owned(), Kind::Broadcast.into());
        self.0.remove(ROOM_KEY);
        self
    }

    /// Tags the message for delivery to the members of `room`.
    pub fn into_multicast(mut self, room: &RoomName) -> Self {
        self.0.insert(TYPE_KEY.to_owned(), Kind::Multicast.into());
        self.with_room(room)
    }

    fn with_room(mut self, room: &RoomName) -> Self {
        self.0
            .insert(ROOM_KEY.to_owned(), Value::String(room.as_str().to_owned()));
        self
    }

    /// The routing discriminator, if present and recognised.
    pub fn kind(&self) -> Option<Kind> {
        self.0.get(TYPE_KEY)?.as_str()?.parse().ok()
    }

    /// The room name, if present.
    pub fn room(&self) -> Option<&str> {
        self.0.get(ROOM_KEY)?.as_str()
    }

    /// Returns `true` if any protocol-owned key is present.
    pub fn has_reserved_keys(&self) -> bool {
        RESERVED_KEYS.iter().any(|key| self.0.contains_key(*key))
    }

    /// The application payload with all protocol-owned keys removed.
    pub fn without_reserved(mut self) -> Self {
        for key in RESERVED_KEYS {
            self.0.remove(key);
        }
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.0.iter()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Message {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Message {
    type Error = ProtocolError;

    /// Accepts JSON objects only.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ProtocolError::InvalidMessage(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

impl From<Message> for Value {
    fn from(message: Message) -> Self {
        Value::Object(message.into_map())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Message {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! These tests pin the exact JSON shapes. A mismatch means the room
    //! server silently misroutes our messages.

    use serde_json::json;

    use super::*;

    fn room(name: &str) -> RoomName {
        RoomName::new(name).unwrap()
    }

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_session_ids_are_unique_and_non_empty() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert!(!a.as_str().is_empty());
        assert_ne!(a, b);
        // Canonical hyphenated UUID.
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&SessionId::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_room_name_rejects_empty() {
        assert!(matches!(RoomName::new(""), Err(ProtocolError::EmptyRoomName)));
        assert_eq!(room("lobby").as_str(), "lobby");
    }

    #[test]
    fn test_room_name_deserialize_validates() {
        let ok: RoomName = serde_json::from_str("\"lobby\"").unwrap();
        assert_eq!(ok.to_string(), "lobby");
        assert!(serde_json::from_str::<RoomName>("\"\"").is_err());
    }

    // =====================================================================
    // Kind
    // =====================================================================

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&Kind::Multicast).unwrap();
        assert_eq!(json, "\"multicast\"");
    }

    #[test]
    fn test_kind_from_str_matches_as_str() {
        for kind in [
            Kind::Join,
            Kind::Leave,
            Kind::Broadcast,
            Kind::Multicast,
            Kind::Disconnect,
        ] {
            assert_eq!(kind.as_str().parse::<Kind>().unwrap(), kind);
        }
        assert!("gm_ws_join".parse::<Kind>().is_err());
    }

    #[test]
    fn test_kind_requires_room() {
        assert!(Kind::Join.requires_room());
        assert!(Kind::Leave.requires_room());
        assert!(Kind::Multicast.requires_room());
        assert!(!Kind::Broadcast.requires_room());
        assert!(!Kind::Disconnect.requires_room());
    }

    // =====================================================================
    // Control messages
    // =====================================================================

    #[test]
    fn test_join_json_format() {
        let json = Value::from(Message::join(&room("lobby")));
        assert_eq!(json, json!({ "GmWsType": "join", "GmWsRoom": "lobby" }));
    }

    #[test]
    fn test_leave_json_format() {
        let json = Value::from(Message::leave(&room("lobby")));
        assert_eq!(json, json!({ "GmWsType": "leave", "GmWsRoom": "lobby" }));
    }

    #[test]
    fn test_disconnect_json_format() {
        let json = Value::from(Message::disconnect());
        assert_eq!(json, json!({ "GmWsType": "disconnect" }));
    }

    // =====================================================================
    // Tagging application messages
    // =====================================================================

    #[test]
    fn test_multicast_preserves_caller_keys() {
        let message: Message = [("text", "hi"), ("from", "ana")].into_iter().collect();
        let tagged = message.clone().into_multicast(&room("lobby"));

        assert_eq!(tagged.kind(), Some(Kind::Multicast));
        assert_eq!(tagged.room(), Some("lobby"));
        for (key, value) in &message {
            assert_eq!(tagged.get(key), Some(value));
        }
        assert_eq!(tagged.len(), message.len() + 2);
    }

    #[test]
    fn test_broadcast_never_carries_room() {
        let mut message = Message::new();
        message.insert("text", "hi");
        message.insert(ROOM_KEY, "sneaky");

        let tagged = message.into_broadcast();
        assert_eq!(tagged.kind(), Some(Kind::Broadcast));
        assert!(tagged.room().is_none());
        assert!(!tagged.contains_key(ROOM_KEY));
        assert_eq!(tagged.get("text"), Some(&json!("hi")));
    }

    #[test]
    fn test_tagging_overwrites_colliding_reserved_keys() {
        let mut message = Message::new();
        message.insert(TYPE_KEY, "join");
        message.insert(ROOM_KEY, "elsewhere");
        assert!(message.has_reserved_keys());

        let tagged = message.into_multicast(&room("lobby"));
        assert_eq!(tagged.kind(), Some(Kind::Multicast));
        assert_eq!(tagged.room(), Some("lobby"));
    }

    #[test]
    fn test_without_reserved_strips_protocol_keys() {
        let tagged = Message::from_iter([("text", "hi")]).into_multicast(&room("a"));
        let payload = tagged.without_reserved();
        assert_eq!(Value::from(payload), json!({ "text": "hi" }));
    }

    #[test]
    fn test_kind_ignores_unknown_discriminator() {
        let message = Message::from_iter([(TYPE_KEY, "gm_ws_broadcast")]);
        assert_eq!(message.kind(), None);
        let message = Message::from_iter([(TYPE_KEY, 7)]);
        assert_eq!(message.kind(), None);
    }

    // =====================================================================
    // Conversions
    // =====================================================================

    #[test]
    fn test_try_from_value_rejects_non_objects() {
        assert!(Message::try_from(json!([1, 2])).is_err());
        assert!(Message::try_from(json!("text")).is_err());
        assert!(Message::try_from(json!(null)).is_err());
        assert!(Message::try_from(json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_message_serializes_as_plain_object() {
        let message = Message::from_iter([("n", 1)]);
        assert_eq!(serde_json::to_string(&message).unwrap(), r#"{"n":1}"#);
    }
}

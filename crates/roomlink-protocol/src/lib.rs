//! Wire protocol for roomlink.
//!
//! This crate defines the "language" a roomlink client speaks to a room
//! server:
//!
//! - **Types** ([`Message`], [`Kind`], [`RoomName`], [`SessionId`]) — the
//!   records that travel on the wire and the reserved keys that route them.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how a message becomes
//!   bytes for the raw path, and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing either.
//!
//! # Architecture
//!
//! The protocol layer doesn't know about sockets or observers. It only
//! knows what a join/leave/broadcast/multicast/disconnect looks like as a
//! JSON object.
//!
//! ```text
//! Transport (frames) → Protocol (Message) → Client (observer events)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use serde_json::Value;
pub use types::{
    Kind, Message, RESERVED_KEYS, ROOM_KEY, RoomName, SessionId, TYPE_KEY,
};

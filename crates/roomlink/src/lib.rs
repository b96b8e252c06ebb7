//! # roomlink
//!
//! Client for message servers that group connections into rooms.
//!
//! The transport underneath only moves whole JSON messages. roomlink layers
//! a small tagged-message protocol on top (join, leave, broadcast,
//! multicast, disconnect) and reports everything that happens to an
//! [`Observer`] you supply.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use roomlink::prelude::*;
//!
//! struct Printer;
//!
//! impl Observer for Printer {
//!     fn on_receive(&self, message: &Message) {
//!         println!("{message:?}");
//!     }
//! }
//!
//! # async fn run() -> Result<(), ClientError> {
//! let client = Arc::new(SocketClient::new(
//!     ClientConfig::default(),
//!     WebSocketConnector,
//!     Arc::new(Printer),
//! ));
//! client.connect().await?;
//! tokio::spawn({
//!     let client = Arc::clone(&client);
//!     async move { client.receive().await }
//! });
//! client.join("lobby").await;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod observer;

pub use client::SocketClient;
pub use config::{ClientConfig, ReceivePolicy};
pub use error::ClientError;
pub use observer::{NoopObserver, Observer};

pub use roomlink_protocol::{
    Codec, JsonCodec, Kind, Message, ProtocolError, ROOM_KEY, RoomName, SessionId,
    TYPE_KEY, Value,
};
pub use roomlink_transport::{Connection, Connector, Handshake, RawRead, TransportError};
pub use roomlink_transport::{WebSocketConnection, WebSocketConnector};

/// Everything needed to build a client and an observer.
pub mod prelude {
    pub use crate::{
        ClientConfig, ClientError, Message, NoopObserver, Observer, ReceivePolicy,
        SessionId, SocketClient, Value, WebSocketConnector,
    };
}

//! Transport abstraction layer for roomlink.
//!
//! Provides the [`Connector`] and [`Connection`] traits the client core is
//! written against. A connection already knows how to move whole messages;
//! the core never sees frames, sockets or TLS.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

use std::future::Future;

use roomlink_protocol::{Message, SessionId};

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

/// Cookie name used for the session credential unless configured otherwise.
pub const DEFAULT_COOKIE_NAME: &str = "session_id";

/// Everything a [`Connector`] needs to open one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Sent as the `Origin` header.
    pub origin: String,
    /// Endpoint URL, e.g. `ws://localhost:3000/ws`.
    pub target: String,
    /// Identity bound to this connection through the cookie header.
    pub session_id: SessionId,
    /// Name of the cookie carrying `session_id`.
    pub cookie_name: String,
}

impl Handshake {
    /// Creates a handshake using [`DEFAULT_COOKIE_NAME`].
    pub fn new(
        origin: impl Into<String>,
        target: impl Into<String>,
        session_id: SessionId,
    ) -> Self {
        Self {
            origin: origin.into(),
            target: target.into(),
            session_id,
            cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
        }
    }

    /// The `Cookie` header value: `session_id=<id>`.
    pub fn cookie(&self) -> String {
        format!("{}={}", self.cookie_name, self.session_id)
    }
}

/// Opens connections to a server.
///
/// Trait futures are `Send` so a client generic over the connector can be
/// driven from `tokio::spawn`.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Performs the handshake and returns a ready connection.
    fn open(
        &self,
        handshake: &Handshake,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// What one [`Connection::read`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRead {
    /// Bytes copied into the buffer. `0` means end of stream.
    pub len: usize,
    /// The copied bytes are the last ones of their frame.
    pub frame_end: bool,
}

impl RawRead {
    /// The connection is cleanly closed.
    pub const EOF: Self = Self {
        len: 0,
        frame_end: true,
    };

    pub fn is_eof(&self) -> bool {
        self.len == 0
    }
}

/// A single bidirectional connection.
///
/// All methods take `&self`: one task may sit in `recv`/`read` while others
/// call `send`/`write`. Implementations serialize concurrent writers so a
/// message is never interleaved with another.
pub trait Connection: Send + Sync + 'static {
    /// Sends one structured message.
    fn send(
        &self,
        message: &Message,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next structured message.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(&self) -> impl Future<Output = Result<Option<Message>, TransportError>> + Send;

    /// Writes raw bytes as one frame, returning how many were written.
    fn write(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<usize, TransportError>> + Send;

    /// Reads raw bytes into `buf`.
    ///
    /// Returns [`RawRead::EOF`] when the connection is cleanly closed. A read
    /// never spans two frames. A frame larger than `buf` is handed out over
    /// several reads, and only the read that hands out its last byte sets
    /// `frame_end`, even when that byte lands exactly on the end of `buf`.
    fn read(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<RawRead, TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

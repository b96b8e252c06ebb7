//! Unified error type for the roomlink client.

use roomlink_protocol::ProtocolError;
use roomlink_transport::TransportError;

/// Every failure the client reports, whether through an [`Observer`] hook
/// or as the return value of `connect`/`disconnect`.
///
/// [`Observer`]: crate::Observer
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The operation needs a connection and the client is detached.
    #[error("client is not connected")]
    NotConnected,

    /// Dialing or the handshake failed.
    #[error("connection failed: {0}")]
    Connect(#[source] TransportError),

    /// A structured or raw write failed.
    #[error("send failed: {0}")]
    Send(#[source] TransportError),

    /// A structured or raw read failed.
    #[error("receive failed: {0}")]
    Receive(#[source] TransportError),

    /// The transport refused to close cleanly.
    #[error("close failed: {0}")]
    Close(#[source] TransportError),

    /// Encoding, decoding or validation failed before touching the wire.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A raw frame grew past `max_frame_size`.
    #[error("frame exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },
}

impl ClientError {
    /// Returns `true` if the connection this error came from is unusable.
    ///
    /// Receive loops stop on these regardless of [`ReceivePolicy`].
    ///
    /// [`ReceivePolicy`]: crate::ReceivePolicy
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::NotConnected => true,
            Self::Connect(e) | Self::Send(e) | Self::Receive(e) | Self::Close(e) => {
                e.is_closed()
            }
            Self::Protocol(_) | Self::FrameTooLarge { .. } => false,
        }
    }
}

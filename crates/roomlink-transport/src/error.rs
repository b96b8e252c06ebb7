use std::io::ErrorKind;

use roomlink_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The handshake request could not be built (bad URL or header value).
    #[error("invalid handshake: {0}")]
    InvalidHandshake(String),

    /// Dialing or upgrading the connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Closing the connection failed.
    #[error("close failed: {0}")]
    CloseFailed(#[source] std::io::Error),

    /// A frame arrived but was not a valid message.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    /// Returns `true` if this error means the connection is gone.
    ///
    /// Retrying a read or write after one of these only produces the same
    /// error again.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::ConnectionClosed(_) => true,
            Self::SendFailed(e) | Self::ReceiveFailed(e) | Self::CloseFailed(e) => {
                matches!(
                    e.kind(),
                    ErrorKind::NotConnected
                        | ErrorKind::ConnectionReset
                        | ErrorKind::ConnectionAborted
                        | ErrorKind::BrokenPipe
                        | ErrorKind::UnexpectedEof
                )
            }
            Self::InvalidHandshake(_) | Self::ConnectFailed(_) | Self::Protocol(_) => {
                false
            }
        }
    }
}

//! Client configuration.

use roomlink_transport::DEFAULT_COOKIE_NAME;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ReceivePolicy
// ---------------------------------------------------------------------------

/// What a receive loop does after reporting a read or decode error.
///
/// Either way the error reaches `Observer::on_receive_error` first, and a
/// loop always ends once an error says the connection itself is gone
/// (see [`ClientError::is_fatal`](crate::ClientError::is_fatal)). Without
/// that rule a dead socket would spin the loop reporting the same error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceivePolicy {
    /// Treat the error as transient and keep reading.
    #[default]
    Continue,
    /// End the loop on the first error.
    Stop,
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`SocketClient`](crate::SocketClient).
///
/// Override only what you need:
///
/// ```rust
/// use roomlink::{ClientConfig, ReceivePolicy};
///
/// let config = ClientConfig {
///     receive_policy: ReceivePolicy::Stop,
///     ..ClientConfig::new("http://localhost:3000", "ws://localhost:3000/ws")
/// };
/// assert_eq!(config.read_buffer_size, 4096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin presented during the handshake.
    pub origin: String,

    /// Server endpoint, e.g. `ws://localhost:3000/ws`.
    pub target: String,

    /// Name of the cookie that carries the session identifier.
    pub cookie_name: String,

    /// Initial read size for [`SocketClient::receive_raw`].
    ///
    /// [`SocketClient::receive_raw`]: crate::SocketClient::receive_raw
    pub read_buffer_size: usize,

    /// Upper bound on a reassembled raw frame. Frames that are still
    /// incomplete at this size are reported and dropped.
    pub max_frame_size: usize,

    /// Error handling for both receive loops.
    pub receive_policy: ReceivePolicy,
}

impl ClientConfig {
    /// Creates a config for the given origin and endpoint, defaults elsewhere.
    pub fn new(origin: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            target: target.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
            target: "ws://localhost:3000/ws".to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            read_buffer_size: 4096,
            max_frame_size: 1024 * 1024,
            receive_policy: ReceivePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.cookie_name, "session_id");
        assert_eq!(config.receive_policy, ReceivePolicy::Continue);
        assert!(config.max_frame_size >= config.read_buffer_size);
    }

    #[test]
    fn test_new_keeps_other_defaults() {
        let config = ClientConfig::new("http://a", "ws://a/ws");
        assert_eq!(config.origin, "http://a");
        assert_eq!(config.target, "ws://a/ws");
        assert_eq!(config.read_buffer_size, 4096);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: ClientConfig = serde_json::from_str(
            r#"{ "target": "ws://example/ws", "receive_policy": "stop" }"#,
        )
        .unwrap();
        assert_eq!(config.target, "ws://example/ws");
        assert_eq!(config.receive_policy, ReceivePolicy::Stop);
        assert_eq!(config.origin, "http://localhost:3000");
    }
}

//! Observer hooks: how the client tells you what happened.
//!
//! Joins, leaves and sends are fire-and-forget. Their return value says
//! nothing, so the [`Observer`] is the only place a failure shows up.
//! Every method has an empty default body, so an observer only spells out
//! the events it cares about.

use roomlink_protocol::{Message, SessionId};

use crate::ClientError;

/// Receives lifecycle and message events from a [`SocketClient`].
///
/// Hooks are called inline on whichever task performed the operation (the
/// receive loop's task for `on_receive*`). Keep them short; hand heavy work
/// off to a channel.
///
/// # Example
///
/// ```rust
/// use roomlink::{ClientError, Message, Observer};
///
/// struct PrintErrors;
///
/// impl Observer for PrintErrors {
///     fn on_receive(&self, message: &Message) {
///         println!("got {message:?}");
///     }
///
///     fn on_send_error(&self, error: &ClientError) {
///         eprintln!("send failed: {error}");
///     }
/// }
/// ```
///
/// [`SocketClient`]: crate::SocketClient
pub trait Observer: Send + Sync + 'static {
    /// The connection is up and bound to `session_id`.
    ///
    /// Observers don't depend on the transport type, so the connection
    /// itself isn't passed here; fetch it with [`SocketClient::connection`].
    ///
    /// [`SocketClient::connection`]: crate::SocketClient::connection
    fn on_connect(&self, _session_id: &SessionId) {}

    /// `connect` failed; the client stays detached.
    fn on_connect_error(&self, _error: &ClientError) {}

    /// The connection was closed by `disconnect`.
    fn on_disconnect(&self) {}

    /// `disconnect` could not close the connection cleanly.
    fn on_disconnect_error(&self, _error: &ClientError) {}

    /// A message arrived.
    fn on_receive(&self, _message: &Message) {}

    /// A read or decode failed.
    fn on_receive_error(&self, _error: &ClientError) {}

    /// The join request for `room` was sent.
    fn on_join(&self, _room: &str) {}

    fn on_join_error(&self, _room: &str, _error: &ClientError) {}

    /// The leave request for `room` was sent.
    fn on_leave(&self, _room: &str) {}

    fn on_leave_error(&self, _room: &str, _error: &ClientError) {}

    /// `message` went out exactly as shown, reserved keys included.
    fn on_send(&self, _message: &Message) {}

    fn on_send_error(&self, _error: &ClientError) {}
}

/// An [`Observer`] that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

//! `SocketClient`: connection lifecycle, room signalling, sends and the
//! receive loops.
//!
//! The client owns at most one connection at a time. Connect attaches it,
//! disconnect (or the end of a receive loop) detaches it. Everything in
//! between only reads the attachment, so sends from any number of tasks can
//! run alongside a receive loop on its own task:
//!
//! ```text
//!   connect ──→ attached ──→ disconnect / end of stream ──→ detached
//!                  │
//!      join / leave / broadcast / send_to_room / send_raw   (any task)
//!      receive or receive_raw                               (one task)
//! ```

use std::sync::Arc;

use roomlink_protocol::{Codec, JsonCodec, Message, RoomName, SessionId};
use roomlink_transport::{Connection, Connector, Handshake};
use tokio::sync::RwLock;

use crate::{ClientConfig, ClientError, Observer, ReceivePolicy};

/// The connection and the session it was opened for, set and cleared
/// together so one is never present without the other.
struct Attachment<T> {
    session_id: SessionId,
    conn: Arc<T>,
}

impl<T> Clone for Attachment<T> {
    fn clone(&self) -> Self {
        Self {
            session_id: self.session_id.clone(),
            conn: Arc::clone(&self.conn),
        }
    }
}

/// A client for a room-aware message server.
///
/// Put it in an `Arc` to run a receive loop on one task and send from
/// others:
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use roomlink::prelude::*;
///
/// # async fn run() -> Result<(), ClientError> {
/// let client = Arc::new(SocketClient::new(
///     ClientConfig::new("http://localhost:3000", "ws://localhost:3000/ws"),
///     WebSocketConnector,
///     Arc::new(NoopObserver),
/// ));
///
/// client.connect().await?;
/// let reader = Arc::clone(&client);
/// let receive = tokio::spawn(async move { reader.receive().await });
///
/// client.join("lobby").await;
/// client
///     .send_to_room("lobby", &Message::from_iter([("text", "hi")]))
///     .await;
///
/// client.disconnect().await?;
/// receive.await.ok();
/// # Ok(())
/// # }
/// ```
pub struct SocketClient<C: Connector, O: Observer, K: Codec = JsonCodec> {
    config: ClientConfig,
    connector: C,
    observer: Arc<O>,
    codec: K,
    attachment: RwLock<Option<Attachment<C::Connection>>>,
}

impl<C: Connector, O: Observer> SocketClient<C, O> {
    /// Creates a detached client that uses [`JsonCodec`] on the raw path.
    pub fn new(config: ClientConfig, connector: C, observer: Arc<O>) -> Self {
        Self::with_codec(config, connector, observer, JsonCodec)
    }
}

impl<C, O, K> SocketClient<C, O, K>
where
    C: Connector,
    O: Observer,
    K: Codec,
{
    /// Creates a detached client with a custom raw-path codec.
    pub fn with_codec(config: ClientConfig, connector: C, observer: Arc<O>, codec: K) -> Self {
        Self {
            config,
            connector,
            observer,
            codec,
            attachment: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn observer(&self) -> &Arc<O> {
        &self.observer
    }

    /// The current session, or `None` while detached.
    pub async fn session_id(&self) -> Option<SessionId> {
        self.attachment
            .read()
            .await
            .as_ref()
            .map(|a| a.session_id.clone())
    }

    pub async fn is_connected(&self) -> bool {
        self.attachment.read().await.is_some()
    }

    /// The live connection, or `None` while detached.
    ///
    /// Gives direct access to the transport for anything the client doesn't
    /// wrap. Holding the handle doesn't keep the client attached.
    pub async fn connection(&self) -> Option<Arc<C::Connection>> {
        self.attachment
            .read()
            .await
            .as_ref()
            .map(|a| Arc::clone(&a.conn))
    }

    // -----------------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------------

    /// Opens a connection under a freshly generated session identifier.
    ///
    /// The identifier travels as a cookie on the handshake. On success the
    /// client is attached and `on_connect` fires. On failure `on_connect_error`
    /// fires, the error is also returned, and the client stays as it was.
    ///
    /// Calling this while attached replaces the current connection, which is
    /// closed best-effort.
    pub async fn connect(&self) -> Result<SessionId, ClientError> {
        let session_id = SessionId::generate();
        let handshake = Handshake {
            origin: self.config.origin.clone(),
            target: self.config.target.clone(),
            session_id: session_id.clone(),
            cookie_name: self.config.cookie_name.clone(),
        };

        let conn = match self.connector.open(&handshake).await {
            Ok(conn) => Arc::new(conn),
            Err(e) => {
                let err = ClientError::Connect(e);
                tracing::warn!(endpoint = %self.config.target, error = %err, "connect failed");
                self.observer.on_connect_error(&err);
                return Err(err);
            }
        };

        let previous = self.attachment.write().await.replace(Attachment {
            session_id: session_id.clone(),
            conn,
        });
        if let Some(previous) = previous {
            tracing::debug!(session_id = %previous.session_id, "replacing previous connection");
            if let Err(e) = previous.conn.close().await {
                tracing::debug!(error = %e, "closing previous connection failed");
            }
        }

        tracing::info!(%session_id, endpoint = %self.config.target, "connected");
        self.observer.on_connect(&session_id);
        Ok(session_id)
    }

    /// Tells the server we're leaving, then closes the connection.
    ///
    /// The disconnect notice is best-effort: if it can't be sent,
    /// `on_send_error` fires and the close still happens. The client is
    /// detached either way. Callers must not race two disconnects.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        let Some(Attachment { session_id, conn }) = self.attachment.write().await.take() else {
            let err = ClientError::NotConnected;
            self.observer.on_disconnect_error(&err);
            return Err(err);
        };

        if let Err(e) = conn.send(&Message::disconnect()).await {
            let err = ClientError::Send(e);
            tracing::warn!(%session_id, error = %err, "disconnect notice not delivered");
            self.observer.on_send_error(&err);
        }

        match conn.close().await {
            Ok(()) => {
                tracing::info!(%session_id, "disconnected");
                self.observer.on_disconnect();
                Ok(())
            }
            Err(e) => {
                let err = ClientError::Close(e);
                tracing::warn!(%session_id, error = %err, "close failed");
                self.observer.on_disconnect_error(&err);
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Room membership
    // -----------------------------------------------------------------------

    /// Asks the server to add this connection to `room`.
    ///
    /// Nothing is tracked locally; the server owns membership.
    pub async fn join(&self, room: &str) {
        match self.signal_room(room, Message::join).await {
            Ok(()) => self.observer.on_join(room),
            Err(err) => {
                tracing::debug!(room, error = %err, "join failed");
                self.observer.on_join_error(room, &err);
            }
        }
    }

    /// Asks the server to remove this connection from `room`.
    ///
    /// Leaving a room never joined sends the same message as any other leave.
    pub async fn leave(&self, room: &str) {
        match self.signal_room(room, Message::leave).await {
            Ok(()) => self.observer.on_leave(room),
            Err(err) => {
                tracing::debug!(room, error = %err, "leave failed");
                self.observer.on_leave_error(room, &err);
            }
        }
    }

    async fn signal_room(
        &self,
        room: &str,
        build: fn(&RoomName) -> Message,
    ) -> Result<(), ClientError> {
        let room = RoomName::new(room)?;
        self.transmit(&build(&room)).await
    }

    // -----------------------------------------------------------------------
    // Outbound messages
    // -----------------------------------------------------------------------

    /// Sends `message` to every peer on the server.
    ///
    /// The message is copied before tagging, so `message` itself is left
    /// untouched. `on_send` receives the tagged copy.
    pub async fn broadcast(&self, message: &Message) {
        let tagged = self.claim_reserved(message).into_broadcast();
        self.deliver(tagged).await;
    }

    /// Sends `message` to the members of `room`.
    pub async fn send_to_room(&self, room: &str, message: &Message) {
        match RoomName::new(room) {
            Ok(room) => {
                let tagged = self.claim_reserved(message).into_multicast(&room);
                self.deliver(tagged).await;
            }
            Err(e) => self.observer.on_send_error(&e.into()),
        }
    }

    /// Encodes `message` with the codec and writes the bytes as-is.
    ///
    /// No routing keys are added: this is for servers that don't speak the
    /// room protocol.
    pub async fn send_raw(&self, message: &Message) {
        match self.write_raw(message).await {
            Ok(written) => {
                tracing::debug!(bytes = written, "raw message sent");
                self.observer.on_send(message);
            }
            Err(err) => {
                tracing::debug!(error = %err, "raw send failed");
                self.observer.on_send_error(&err);
            }
        }
    }

    /// Copies a caller message, warning when it already carries keys the
    /// protocol is about to overwrite.
    fn claim_reserved(&self, message: &Message) -> Message {
        if message.has_reserved_keys() {
            tracing::warn!("message carries reserved routing keys; they will be replaced");
        }
        message.clone()
    }

    async fn deliver(&self, message: Message) {
        match self.transmit(&message).await {
            Ok(()) => self.observer.on_send(&message),
            Err(err) => {
                tracing::debug!(error = %err, "send failed");
                self.observer.on_send_error(&err);
            }
        }
    }

    async fn transmit(&self, message: &Message) -> Result<(), ClientError> {
        let attachment = self.attached().await.ok_or(ClientError::NotConnected)?;
        attachment
            .conn
            .send(message)
            .await
            .map_err(ClientError::Send)?;
        tracing::debug!(
            session_id = %attachment.session_id,
            kind = ?message.kind(),
            room = message.room(),
            "message sent"
        );
        Ok(())
    }

    async fn write_raw(&self, message: &Message) -> Result<usize, ClientError> {
        let attachment = self.attached().await.ok_or(ClientError::NotConnected)?;
        let bytes = self.codec.encode(message)?;
        attachment
            .conn
            .write(&bytes)
            .await
            .map_err(ClientError::Send)
    }

    // -----------------------------------------------------------------------
    // Inbound messages
    // -----------------------------------------------------------------------

    /// Receives structured messages until the connection ends.
    ///
    /// Each message goes to `on_receive`, each error to `on_receive_error`.
    /// Whether the loop survives an error is decided by
    /// [`ClientConfig::receive_policy`]. Returns immediately when detached.
    ///
    /// Run this on its own task and never twice at once.
    pub async fn receive(&self) {
        let Some(Attachment { session_id, conn }) = self.attached().await else {
            tracing::debug!("receive called while detached");
            return;
        };

        loop {
            match conn.recv().await {
                Ok(Some(message)) => self.observer.on_receive(&message),
                Ok(None) => {
                    tracing::debug!(%session_id, "end of stream");
                    break;
                }
                Err(e) => {
                    if self.receive_failed(ClientError::Receive(e)) {
                        break;
                    }
                }
            }
        }

        self.release(&session_id).await;
    }

    /// Receives raw bytes, decoding each frame with the codec.
    ///
    /// Reads start at `read_buffer_size`. A frame that doesn't fit is
    /// gathered over several reads until the transport marks its end, and
    /// the buffer doubles along the way up to `max_frame_size`. A frame that
    /// grows past that size is reported as [`ClientError::FrameTooLarge`]
    /// and the rest of it is skipped.
    pub async fn receive_raw(&self) {
        let Some(Attachment { session_id, conn }) = self.attached().await else {
            tracing::debug!("receive_raw called while detached");
            return;
        };

        let limit = self.config.max_frame_size.max(1);
        let mut buf = vec![0u8; self.config.read_buffer_size.clamp(1, limit)];
        let mut frame: Vec<u8> = Vec::new();
        let mut skipping = false;

        loop {
            let read = match conn.read(&mut buf).await {
                Ok(read) if read.is_eof() => {
                    tracing::debug!(%session_id, "end of stream");
                    break;
                }
                Ok(read) => read,
                Err(e) => {
                    frame.clear();
                    skipping = false;
                    if self.receive_failed(ClientError::Receive(e)) {
                        break;
                    }
                    continue;
                }
            };

            if skipping {
                skipping = !read.frame_end;
                continue;
            }

            frame.extend_from_slice(&buf[..read.len]);
            if frame.len() > limit {
                frame.clear();
                skipping = !read.frame_end;
                if self.receive_failed(ClientError::FrameTooLarge { limit }) {
                    break;
                }
                continue;
            }
            if !read.frame_end {
                if read.len == buf.len() && buf.len() < limit {
                    let grown = (buf.len() * 2).min(limit);
                    tracing::trace!(from = buf.len(), to = grown, "growing read buffer");
                    buf.resize(grown, 0);
                }
                continue;
            }

            let decoded = self.codec.decode::<Message>(&frame);
            frame.clear();
            match decoded {
                Ok(message) => self.observer.on_receive(&message),
                Err(e) => {
                    if self.receive_failed(ClientError::Protocol(e)) {
                        break;
                    }
                }
            }
        }

        self.release(&session_id).await;
    }

    /// Reports a receive error. Returns `true` if the loop should end.
    fn receive_failed(&self, err: ClientError) -> bool {
        self.observer.on_receive_error(&err);
        let stop = err.is_fatal() || self.config.receive_policy == ReceivePolicy::Stop;
        tracing::debug!(error = %err, stop, "receive error");
        stop
    }

    // -----------------------------------------------------------------------
    // Attachment bookkeeping
    // -----------------------------------------------------------------------

    async fn attached(&self) -> Option<Attachment<C::Connection>> {
        self.attachment.read().await.clone()
    }

    /// Detaches after a receive loop ends, unless a newer session (or a
    /// disconnect) already took over.
    async fn release(&self, session_id: &SessionId) {
        let released = {
            let mut slot = self.attachment.write().await;
            if slot.as_ref().is_some_and(|a| &a.session_id == session_id) {
                slot.take()
            } else {
                None
            }
        };

        if let Some(attachment) = released {
            tracing::info!(%session_id, "connection ended; detached");
            if let Err(e) = attachment.conn.close().await {
                tracing::debug!(%session_id, error = %e, "close after end of stream failed");
            }
        }
    }
}

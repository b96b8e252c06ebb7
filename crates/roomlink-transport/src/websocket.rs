//! WebSocket transport implementation using `tokio-tungstenite`.

use std::io::{self, ErrorKind};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use roomlink_protocol::{Message, ProtocolError};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::{COOKIE, HeaderValue, ORIGIN};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as Frame};

use crate::{Connection, Connector, Handshake, RawRead, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A [`Connector`] that dials `ws://` and `wss://` endpoints.
///
/// The handshake request carries the configured `Origin` and the session
/// cookie, so the server can correlate the socket with a session before the
/// first message arrives.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    type Connection = WebSocketConnection;

    async fn open(
        &self,
        handshake: &Handshake,
    ) -> Result<WebSocketConnection, TransportError> {
        let request = build_request(handshake)?;

        let (ws, response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| {
                TransportError::ConnectFailed(io_error(e, ErrorKind::ConnectionRefused))
            })?;

        tracing::debug!(
            endpoint = %handshake.target,
            status = %response.status(),
            "WebSocket handshake complete"
        );

        // Split so the receive loop and the senders never wait on each other.
        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            sink: Mutex::new(sink),
            reader: Mutex::new(Reader {
                stream,
                pending: Vec::new(),
                offset: 0,
                finished: false,
            }),
        })
    }
}

/// Builds the upgrade request with `Origin` and `Cookie` headers.
fn build_request(handshake: &Handshake) -> Result<Request, TransportError> {
    let mut request = handshake
        .target
        .as_str()
        .into_client_request()
        .map_err(|e| TransportError::InvalidHandshake(e.to_string()))?;

    let headers = request.headers_mut();
    headers.insert(ORIGIN, header_value(&handshake.origin)?);
    headers.insert(COOKIE, header_value(&handshake.cookie())?);
    Ok(request)
}

fn header_value(value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value)
        .map_err(|e| TransportError::InvalidHandshake(format!("{value:?}: {e}")))
}

/// A single client-side WebSocket connection.
pub struct WebSocketConnection {
    sink: Mutex<SplitSink<WsStream, Frame>>,
    reader: Mutex<Reader>,
}

/// Read half plus the unread tail of the last data frame (raw path only).
struct Reader {
    stream: SplitStream<WsStream>,
    pending: Vec<u8>,
    offset: usize,
    /// Set once the peer's Close frame (or end of stream) has been seen.
    finished: bool,
}

impl Reader {
    /// Returns the payload of the next non-empty data frame.
    async fn next_payload(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        // tungstenite keeps reading after a Close frame until the socket
        // drops, so end of stream has to be remembered here.
        if self.finished {
            return Ok(None);
        }
        loop {
            match self.stream.next().await {
                Some(Ok(Frame::Text(text))) if !text.is_empty() => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Frame::Binary(data))) if !data.is_empty() => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Frame::Close(frame))) => {
                    tracing::debug!(?frame, "peer closed the connection");
                    self.finished = true;
                    return Ok(None);
                }
                None
                | Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                    self.finished = true;
                    return Ok(None);
                }
                Some(Ok(_)) => continue, // ping/pong/raw frame/empty payload
                Some(Err(e @ WsError::Capacity(_))) => {
                    return Err(TransportError::ReceiveFailed(io::Error::new(
                        ErrorKind::InvalidData,
                        e,
                    )));
                }
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io_error(
                        e,
                        ErrorKind::ConnectionReset,
                    )));
                }
            }
        }
    }
}

impl WebSocketConnection {
    async fn send_frame(&self, frame: Frame) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .send(frame)
            .await
            .map_err(|e| TransportError::SendFailed(io_error(e, ErrorKind::BrokenPipe)))
    }
}

impl Connection for WebSocketConnection {
    async fn send(&self, message: &Message) -> Result<(), TransportError> {
        let text = serde_json::to_string(message).map_err(ProtocolError::Encode)?;
        self.send_frame(Frame::text(text)).await
    }

    async fn recv(&self) -> Result<Option<Message>, TransportError> {
        let mut reader = self.reader.lock().await;
        match reader.next_payload().await? {
            Some(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|e| ProtocolError::Decode(e).into()),
            None => Ok(None),
        }
    }

    async fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        let frame = match std::str::from_utf8(data) {
            Ok(text) => Frame::text(text.to_owned()),
            Err(_) => Frame::binary(data.to_vec()),
        };
        self.send_frame(frame).await?;
        Ok(data.len())
    }

    async fn read(&self, buf: &mut [u8]) -> Result<RawRead, TransportError> {
        if buf.is_empty() {
            return Err(TransportError::ReceiveFailed(io::Error::new(
                ErrorKind::InvalidInput,
                "read buffer is empty",
            )));
        }

        let mut reader = self.reader.lock().await;
        if reader.offset >= reader.pending.len() {
            match reader.next_payload().await? {
                Some(data) => {
                    reader.pending = data;
                    reader.offset = 0;
                }
                None => return Ok(RawRead::EOF),
            }
        }

        let available = &reader.pending[reader.offset..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        reader.offset += n;
        Ok(RawRead {
            len: n,
            frame_end: reader.offset == reader.pending.len(),
        })
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| TransportError::CloseFailed(io_error(e, ErrorKind::BrokenPipe)))
    }
}

/// Converts a tungstenite error into an `io::Error`, keeping the real
/// kind for socket errors and marking closed connections as `NotConnected`.
fn io_error(err: WsError, kind: ErrorKind) -> io::Error {
    match err {
        WsError::Io(e) => e,
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            io::Error::new(ErrorKind::NotConnected, err)
        }
        other => io::Error::new(kind, other),
    }
}

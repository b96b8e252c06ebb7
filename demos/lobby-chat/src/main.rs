use std::sync::Arc;
use std::time::Duration;

use roomlink::prelude::*;
use serde_json::json;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Logs every client event. Chat lines from other peers are printed.
struct ChatObserver;

impl Observer for ChatObserver {
    fn on_connect(&self, session_id: &SessionId) {
        tracing::info!(%session_id, "connected");
    }

    fn on_connect_error(&self, error: &ClientError) {
        tracing::error!(%error, "could not connect");
    }

    fn on_disconnect(&self) {
        tracing::info!("disconnected");
    }

    fn on_disconnect_error(&self, error: &ClientError) {
        tracing::warn!(%error, "disconnect failed");
    }

    fn on_receive(&self, message: &Message) {
        println!("> {}", render_line(message));
    }

    fn on_receive_error(&self, error: &ClientError) {
        tracing::warn!(%error, "receive failed");
    }

    fn on_join(&self, room: &str) {
        tracing::info!(room, "joined");
    }

    fn on_join_error(&self, room: &str, error: &ClientError) {
        tracing::warn!(room, %error, "join failed");
    }

    fn on_leave(&self, room: &str) {
        tracing::info!(room, "left");
    }

    fn on_leave_error(&self, room: &str, error: &ClientError) {
        tracing::warn!(room, %error, "leave failed");
    }

    fn on_send(&self, message: &Message) {
        tracing::debug!(?message, "sent");
    }

    fn on_send_error(&self, error: &ClientError) {
        tracing::warn!(%error, "send failed");
    }
}

/// One chat line: the room (if any), then the text or the payload fields.
fn render_line(message: &Message) -> String {
    let prefix = message
        .room()
        .map(|room| format!("[{room}] "))
        .unwrap_or_default();
    let payload = message.clone().without_reserved();
    match payload.get("text").and_then(Value::as_str) {
        Some(text) => format!("{prefix}{text}"),
        None => {
            let fields: Vec<String> = payload.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("{prefix}{}", fields.join(" "))
        }
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// `lobby-chat [origin] [target] [room]`
#[derive(Debug, PartialEq)]
struct Args {
    config: ClientConfig,
    room: String,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Args {
    let defaults = ClientConfig::default();
    let origin = args.next().unwrap_or(defaults.origin);
    let target = args.next().unwrap_or(defaults.target);
    let room = args.next().unwrap_or_else(|| "lobby".to_string());
    Args {
        config: ClientConfig::new(origin, target),
        room,
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Args { config, room } = parse_args(std::env::args().skip(1));
    tracing::info!(endpoint = %config.target, %room, "starting lobby-chat");

    let client = Arc::new(SocketClient::new(
        config,
        WebSocketConnector,
        Arc::new(ChatObserver),
    ));
    let session_id = client.connect().await?;

    let reader = Arc::clone(&client);
    let receive = tokio::spawn(async move { reader.receive().await });

    client.join(&room).await;

    let hello = Message::try_from(json!({
        "text": format!("{session_id} joined {room}"),
    }))?;
    client.send_to_room(&room, &hello).await;
    client
        .broadcast(&Message::from_iter([("text", "hello, everyone")]))
        .await;

    // Give peers a moment to answer before leaving.
    tokio::time::sleep(Duration::from_secs(2)).await;

    client.leave(&room).await;
    client.disconnect().await?;
    receive.await?;
    Ok(())
}

//! WebSocket feed of committed conversation changes.
//!
//! The `/ws/events` endpoint upgrades an authenticated HTTP connection to a
//! WebSocket. The handler subscribes to the chat service's event bus and
//! forwards every event belonging to the caller as a JSON text frame. The
//! only client command is `{"type":"ping"}`, answered with
//! `{"type":"pong"}`.
//!
//! A lagging client misses events; the handler logs a warning and keeps
//! going.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use parley_types::event::ConversationEvent;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

/// Incoming command from a WebSocket client.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsCommand {
    Ping,
}

/// Upgrade an HTTP request to a WebSocket connection.
///
/// Mounted at `/ws/events` in the router.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    auth: Authenticated,
) -> impl IntoResponse {
    let events = state.chat_service.events().subscribe();
    ws.on_upgrade(move |socket| handle_ws_connection(socket, events, auth.user_id))
}

/// Multiplex bus events and client frames in a single task.
async fn handle_ws_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<ConversationEvent>,
    user_id: Uuid,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    tracing::debug!(%user_id, "WebSocket connection opened");

    loop {
        tokio::select! {
            event_result = event_rx.recv() => {
                match event_result {
                    Ok(event) => {
                        if event.user_id() != user_id {
                            continue;
                        }
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::warn!("Failed to serialize ConversationEvent: {err}");
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            skipped = n,
                            %user_id,
                            "WebSocket subscriber lagged, skipping {n} events"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        if !process_command(&text, &mut ws_sender).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!("WebSocket receive error: {err}");
                        break;
                    }
                    // Protocol-level ping/pong and binary frames are ignored.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!(%user_id, "WebSocket connection closed");
}

/// Handle one client frame. Returns `false` once the socket is gone.
async fn process_command(
    text: &str,
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
) -> bool {
    match serde_json::from_str::<WsCommand>(text) {
        Ok(WsCommand::Ping) => {
            let pong = serde_json::json!({ "type": "pong" }).to_string();
            ws_sender.send(Message::Text(pong.into())).await.is_ok()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring malformed WebSocket command");
            true
        }
    }
}

//! WebSocket show channel
//!
//! Each socket gets a writer task draining its coordinator queue; the reader
//! loop feeds text frames to the coordinator. Bad frames are logged and
//! dropped without closing the socket.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use super::server::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (id, mut outbox) = state.coordinator.lock().connect();

    let writer = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            let json = match message.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to encode {:?}: {}", message, e);
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let result = state.coordinator.lock().handle_text(&text);
                if let Err(e) = result {
                    tracing::warn!("Dropping frame from viewer {}: {}", id, e);
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!("WebSocket error for viewer {}: {}", id, e);
                break;
            }
            _ => {}
        }
    }

    state.coordinator.lock().disconnect(id);
    writer.abort();
}

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    message::MessageResponse,
    middleware::AuthUser,
    state::AppState,
    websocket::types::{ClientMessage, ErrorPayload, OnlineUsersPayload, WsMessage},
};

use super::WsSender;

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(30);

/// Real-time delivery socket.
///
/// Pushes `new_message` frames for messages addressed to the user and the
/// list of online users whenever someone connects or disconnects. Clients
/// may also send messages over the socket; they go through the same
/// service path as `POST /api/messages/send/{receiverId}`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, user_id: Uuid, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    let connection_id = connect(&state, user_id, tx.clone());
    tracing::info!("WebSocket opened for user {}", user_id);

    // Task: send messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Task: receive messages from WebSocket
    let state_clone = state.clone();
    let tx_clone = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_client_text(&text, user_id, &state_clone, &tx_clone).await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Heartbeat task
    let tx_heartbeat = tx.clone();
    let mut heartbeat_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(
            tokio::time::Instant::now() + HEARTBEAT_PERIOD,
            HEARTBEAT_PERIOD,
        );
        loop {
            interval.tick().await;
            if tx_heartbeat.send(WsMessage::Ping).is_err() {
                break;
            }
        }
    });

    // Stop all tasks when any one finishes
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            heartbeat_task.abort();
        },
        _ = &mut recv_task => {
            send_task.abort();
            heartbeat_task.abort();
        },
        _ = &mut heartbeat_task => {
            send_task.abort();
            recv_task.abort();
        }
    }

    disconnect(&state, user_id, connection_id);

    tracing::info!("WebSocket closed for user {}", user_id);
}

/// Registers a socket and tells everyone who is online now.
fn connect(state: &AppState, user_id: Uuid, tx: WsSender) -> u64 {
    let connection_id = state.ws_connections.add_connection(user_id, tx);
    broadcast_online_users(state);
    connection_id
}

fn disconnect(state: &AppState, user_id: Uuid, connection_id: u64) {
    state.ws_connections.remove_connection(&user_id, connection_id);
    broadcast_online_users(state);
}

/// Runs one client frame; failures are reported back on the socket as an
/// `error` frame.
async fn handle_client_text(text: &str, user_id: Uuid, state: &AppState, tx: &WsSender) {
    if let Err(e) = process_client_message(text, user_id, state, tx).await {
        tracing::warn!("Error processing socket message from {}: {}", user_id, e);
        let message = if e.status().is_server_error() {
            "Internal server error".to_string()
        } else {
            e.to_string()
        };
        let _ = tx.send(WsMessage::Error(ErrorPayload { message }));
    }
}

fn broadcast_online_users(state: &AppState) {
    let user_ids = state.ws_connections.online_users();
    state
        .ws_connections
        .broadcast(WsMessage::OnlineUsers(OnlineUsersPayload { user_ids }));
}

async fn process_client_message(
    text: &str,
    user_id: Uuid,
    state: &AppState,
    tx: &WsSender,
) -> Result<()> {
    let client_msg: ClientMessage = serde_json::from_str(text)
        .map_err(|e| AppError::BadRequest(format!("Invalid message format: {}", e)))?;

    match client_msg {
        ClientMessage::SendMessage {
            receiver_id,
            message,
        } => {
            let stored = state
                .message_service
                .send_message(user_id, receiver_id, &message)
                .await?;

            let _ = tx.send(WsMessage::MessageSent(MessageResponse::from(stored)));
        }

        ClientMessage::Ping => {
            let _ = tx.send(WsMessage::Pong);
        }
    }

    Ok(())
}

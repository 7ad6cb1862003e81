use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::MessageResponse;

/// Server-to-client frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// A message addressed to this user.
    NewMessage(MessageResponse),
    /// Acknowledges a message this connection sent over the socket.
    MessageSent(MessageResponse),
    OnlineUsers(OnlineUsersPayload),
    Error(ErrorPayload),
    Ping,
    Pong,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineUsersPayload {
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

// Client-to-server messages
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    SendMessage {
        receiver_id: Uuid,
        message: String,
    },
    Ping,
}

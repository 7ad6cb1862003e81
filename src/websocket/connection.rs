use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    message::{Message, MessageResponse},
    notification::Notifier,
    websocket::types::WsMessage,
};

pub type WsSender = mpsc::UnboundedSender<WsMessage>;

/// Registry of open WebSocket connections, keyed by user. A user may have
/// several connections open (one per tab/device).
#[derive(Clone, Default)]
pub struct ConnectionManager {
    connections: Arc<DashMap<Uuid, Vec<(u64, WsSender)>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns its id for later removal.
    pub fn add_connection(&self, user_id: Uuid, tx: WsSender) -> u64 {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections
            .entry(user_id)
            .or_default()
            .push((connection_id, tx));
        connection_id
    }

    pub fn remove_connection(&self, user_id: &Uuid, connection_id: u64) {
        let now_empty = match self.connections.get_mut(user_id) {
            Some(mut senders) => {
                senders.retain(|(id, _)| *id != connection_id);
                senders.is_empty()
            }
            None => false,
        };

        if now_empty {
            self.connections.remove_if(user_id, |_, senders| senders.is_empty());
        }
    }

    /// Sends to every open connection of `user_id`. Returns whether at least
    /// one connection accepted the frame.
    pub fn send_to_user(&self, user_id: &Uuid, message: WsMessage) -> bool {
        match self.connections.get(user_id) {
            Some(senders) => senders
                .iter()
                .fold(false, |sent, (_, tx)| tx.send(message.clone()).is_ok() || sent),
            None => false,
        }
    }

    pub fn broadcast(&self, message: WsMessage) {
        for entry in self.connections.iter() {
            for (_, tx) in entry.value() {
                let _ = tx.send(message.clone());
            }
        }
    }

    pub fn is_online(&self, user_id: &Uuid) -> bool {
        self.connections.contains_key(user_id)
    }

    pub fn online_users(&self) -> Vec<Uuid> {
        let mut users: Vec<Uuid> = self.connections.iter().map(|entry| *entry.key()).collect();
        users.sort();
        users
    }
}

impl Notifier for ConnectionManager {
    fn notify(&self, receiver_id: Uuid, message: &Message) {
        if !self.is_online(&receiver_id) {
            tracing::debug!(
                "User {} is offline; message {} stays in history only",
                receiver_id,
                message.id
            );
            return;
        }

        let frame = WsMessage::NewMessage(MessageResponse::from(message));
        if !self.send_to_user(&receiver_id, frame) {
            tracing::debug!("No open socket of {} accepted message {}", receiver_id, message.id);
        }
    }
}

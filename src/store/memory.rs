//! In-process store used for tests and `STORE_BACKEND=memory` runs.
//!
//! Uniqueness invariants rely on `DashMap::entry`, which holds the shard
//! lock for the whole check-and-insert. Lock order is always
//! conversations -> conversation index / messages, never the reverse.

use std::sync::atomic::{AtomicI64, Ordering};

use axum::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use crate::{
    conversation::{Conversation, ConversationStore, ParticipantPair},
    error::{AppError, Result},
    message::{Message, MessageStore},
    user::{NewUser, SidebarUser, User, UserStore},
};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    usernames: DashMap<String, Uuid>,
    conversations: DashMap<ParticipantPair, Conversation>,
    conversation_index: DashMap<Uuid, ParticipantPair>,
    messages: DashMap<Uuid, Vec<Message>>,
    next_seq: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        match self.usernames.entry(new_user.username.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("Username already exists".to_string())),
            Entry::Vacant(slot) => {
                let user = User {
                    id: Uuid::new_v4(),
                    full_name: new_user.full_name,
                    username: new_user.username,
                    password_hash: new_user.password_hash,
                    gender: new_user.gender,
                    profile_pic: new_user.profile_pic,
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&user_id).map(|user| user.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user_id = match self.usernames.get(username) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&user_id).map(|user| user.value().clone()))
    }

    async fn list_others(&self, user_id: Uuid) -> Result<Vec<SidebarUser>> {
        let mut users: Vec<SidebarUser> = self
            .users
            .iter()
            .filter(|entry| *entry.key() != user_id)
            .map(|entry| SidebarUser::from(entry.value()))
            .collect();

        users.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(users)
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn find_or_create(&self, pair: ParticipantPair) -> Result<Conversation> {
        let conversation = self
            .conversations
            .entry(pair)
            .or_insert_with(|| {
                let conversation = Conversation::start(pair);
                // Indexed before the entry lock is released so the id is
                // resolvable as soon as any caller sees it.
                self.conversation_index.insert(conversation.id, pair);
                conversation
            })
            .value()
            .clone();

        Ok(conversation)
    }

    async fn find_by_pair(&self, pair: ParticipantPair) -> Result<Option<Conversation>> {
        Ok(self.conversations.get(&pair).map(|c| c.value().clone()))
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, conversation_id: Uuid, sender_id: Uuid, body: &str) -> Result<Message> {
        let pair = self
            .conversation_index
            .get(&conversation_id)
            .map(|pair| *pair)
            .ok_or(AppError::NotFound("Conversation not found".to_string()))?;

        // Held for the whole append: serializes writers on this conversation.
        let mut conversation = self
            .conversations
            .get_mut(&pair)
            .ok_or(AppError::NotFound("Conversation not found".to_string()))?;

        if !conversation.has_participant(sender_id) {
            return Err(AppError::Forbidden(
                "Sender is not a participant of this conversation".to_string(),
            ));
        }

        let mut history = self.messages.entry(conversation_id).or_default();

        let now = Utc::now();
        let created_at = history
            .last()
            .map_or(now, |last| last.created_at.max(now));

        let message = Message {
            id: Uuid::new_v4(),
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst) + 1,
            conversation_id,
            sender_id,
            body: body.to_string(),
            created_at,
        };

        history.push(message.clone());
        conversation.message_ids.push(message.id);
        conversation.updated_at = created_at;

        Ok(message)
    }

    async fn list_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        Ok(self
            .messages
            .get(&conversation_id)
            .map(|history| history.value().clone())
            .unwrap_or_default())
    }
}

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::conversation::{Conversation, ConversationStore, ParticipantPair};
use crate::error::{AppError, Result};
use crate::message::message_dto::MAX_MESSAGE_LENGTH;
use crate::message::message_models::Message;
use crate::message::message_repository::MessageStore;
use crate::notification::Notifier;
use crate::store::bounded;
use crate::user::{SidebarUser, UserStore};

#[derive(Clone)]
pub struct MessageService {
    users: Arc<dyn UserStore>,
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    notifier: Arc<dyn Notifier>,
    store_timeout: Duration,
}

impl MessageService {
    pub fn new(
        users: Arc<dyn UserStore>,
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        notifier: Arc<dyn Notifier>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            users,
            conversations,
            messages,
            notifier,
            store_timeout,
        }
    }

    /// Stores `body` in the sender/receiver conversation (creating it on the
    /// first message) and notifies the receiver.
    pub async fn send_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        body: &str,
    ) -> Result<Message> {
        validate_body(body)?;
        // Self-messages are rejected before the receiver lookup.
        ParticipantPair::new(sender_id, receiver_id)?;

        bounded(self.store_timeout, self.users.find_by_id(receiver_id))
            .await?
            .ok_or(AppError::NotFound("Receiver not found".to_string()))?;

        let conversation = self.resolve_conversation(sender_id, receiver_id).await?;

        let message = bounded(
            self.store_timeout,
            self.messages.append(conversation.id, sender_id, body),
        )
        .await?;

        tracing::debug!(
            "Message {} stored in conversation {} ({} -> {})",
            message.id,
            conversation.id,
            sender_id,
            receiver_id
        );

        self.notifier.notify(receiver_id, &message);

        Ok(message)
    }

    /// Finds or creates the single conversation between two users.
    pub async fn resolve_conversation(&self, sender_id: Uuid, receiver_id: Uuid) -> Result<Conversation> {
        let pair = ParticipantPair::new(sender_id, receiver_id)?;
        bounded(self.store_timeout, self.conversations.find_or_create(pair)).await
    }

    /// History between two users, oldest first. No conversation yet means
    /// an empty history.
    pub async fn get_messages(&self, user_id: Uuid, other_user_id: Uuid) -> Result<Vec<Message>> {
        let pair = ParticipantPair::new(user_id, other_user_id)?;

        let conversation = match bounded(self.store_timeout, self.conversations.find_by_pair(pair)).await? {
            Some(conversation) => conversation,
            None => return Ok(Vec::new()),
        };

        bounded(
            self.store_timeout,
            self.messages.list_for_conversation(conversation.id),
        )
        .await
    }

    pub async fn get_sidebar_users(&self, user_id: Uuid) -> Result<Vec<SidebarUser>> {
        bounded(self.store_timeout, self.users.list_others(user_id)).await
    }
}

fn validate_body(body: &str) -> Result<()> {
    if body.trim().is_empty() {
        return Err(AppError::Validation("Message body cannot be empty".to_string()));
    }

    if body.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(AppError::Validation(format!(
            "Message body cannot exceed {} characters",
            MAX_MESSAGE_LENGTH
        )));
    }

    Ok(())
}

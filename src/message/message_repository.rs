use crate::{
    error::{AppError, Result},
    message::message_models::Message,
};
use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Message storage. Messages are append-only and owned by one conversation.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Appends a message to the conversation's history. The sender must be a
    /// participant; `created_at` is never earlier than the conversation's
    /// previous message.
    async fn append(&self, conversation_id: Uuid, sender_id: Uuid, body: &str) -> Result<Message>;

    async fn list_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>>;
}

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn append(&self, conversation_id: Uuid, sender_id: Uuid, body: &str) -> Result<Message> {
        // Touching the conversation row locks it, so appends to one
        // conversation are serialized and `seq` follows commit order.
        let message = sqlx::query_as::<_, Message>(
            "WITH conv AS (
                UPDATE conversations
                SET updated_at = NOW()
                WHERE id = $2 AND $3 IN (participant_low, participant_high)
                RETURNING id
             )
             INSERT INTO messages (id, conversation_id, sender_id, body, created_at)
             SELECT
                $1,
                conv.id,
                $3,
                $4,
                GREATEST(
                    clock_timestamp(),
                    COALESCE(
                        (SELECT MAX(m.created_at) FROM messages m WHERE m.conversation_id = conv.id),
                        '-infinity'::timestamptz
                    )
                )
             FROM conv
             RETURNING id, seq, conversation_id, sender_id, body, created_at"
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(sender_id)
        .bind(body)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::Forbidden(
            "Sender is not a participant of this conversation".to_string(),
        ))?;

        Ok(message)
    }

    async fn list_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, seq, conversation_id, sender_id, body, created_at
             FROM messages
             WHERE conversation_id = $1
             ORDER BY created_at ASC, seq ASC"
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}

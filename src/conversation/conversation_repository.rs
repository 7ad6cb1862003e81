use crate::error::Result;
use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use super::conversation_models::{Conversation, ParticipantPair};

/// Conversation storage keyed by the normalized participant pair.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns the pair's conversation, creating it if absent. Must be a
    /// single atomic create-if-absent so concurrent first messages from the
    /// same pair converge on one conversation.
    async fn find_or_create(&self, pair: ParticipantPair) -> Result<Conversation>;

    async fn find_by_pair(&self, pair: ParticipantPair) -> Result<Option<Conversation>>;
}

#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for ConversationRepository {
    async fn find_or_create(&self, pair: ParticipantPair) -> Result<Conversation> {
        // The no-op DO UPDATE makes RETURNING yield the existing row on conflict.
        let conversation = sqlx::query_as::<_, Conversation>(
            "INSERT INTO conversations (id, participant_low, participant_high)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT conversations_pair_unique
             DO UPDATE SET updated_at = conversations.updated_at
             RETURNING
                id,
                participant_low,
                participant_high,
                ARRAY(
                    SELECT m.id FROM messages m
                    WHERE m.conversation_id = conversations.id
                    ORDER BY m.created_at, m.seq
                ) AS message_ids,
                updated_at"
        )
        .bind(Uuid::new_v4())
        .bind(pair.low())
        .bind(pair.high())
        .fetch_one(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn find_by_pair(&self, pair: ParticipantPair) -> Result<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT
                c.id,
                c.participant_low,
                c.participant_high,
                ARRAY(
                    SELECT m.id FROM messages m
                    WHERE m.conversation_id = c.id
                    ORDER BY m.created_at, m.seq
                ) AS message_ids,
                c.updated_at
             FROM conversations c
             WHERE c.participant_low = $1 AND c.participant_high = $2"
        )
        .bind(pair.low())
        .bind(pair.high())
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }
}

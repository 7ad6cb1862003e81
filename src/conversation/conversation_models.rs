use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// The two participants of a direct conversation, normalized so that
/// `low < high`. Both send directions map to the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticipantPair {
    low: Uuid,
    high: Uuid,
}

impl ParticipantPair {
    pub fn new(a: Uuid, b: Uuid) -> Result<Self> {
        if a == b {
            return Err(AppError::Validation(
                "You cannot start a conversation with yourself".to_string(),
            ));
        }

        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { low, high })
    }

    pub fn low(&self) -> Uuid {
        self.low
    }

    pub fn high(&self) -> Uuid {
        self.high
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub participant_low: Uuid,
    pub participant_high: Uuid,
    /// Ids of the conversation's messages in delivery order.
    pub message_ids: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn start(pair: ParticipantPair) -> Self {
        Self {
            id: Uuid::new_v4(),
            participant_low: pair.low(),
            participant_high: pair.high(),
            message_ids: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn participants(&self) -> [Uuid; 2] {
        [self.participant_low, self.participant_high]
    }

    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants().contains(&user_id)
    }
}

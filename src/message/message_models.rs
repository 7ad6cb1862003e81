use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A stored message. `seq` is the insertion sequence used to break
/// `created_at` ties and is never sent to clients.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub seq: i64,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub conversation_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            body: message.body,
            conversation_id: message.conversation_id,
            created_at: message.created_at,
        }
    }
}

impl From<&Message> for MessageResponse {
    fn from(message: &Message) -> Self {
        message.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_hides_sequence_and_uses_camel_case() {
        let message = Message {
            id: Uuid::new_v4(),
            seq: 42,
            conversation_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            body: "hi".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(MessageResponse::from(&message)).unwrap();
        assert_eq!(json["senderId"], message.sender_id.to_string());
        assert_eq!(json["conversationId"], message.conversation_id.to_string());
        assert_eq!(json["body"], "hi");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("seq").is_none());
    }
}

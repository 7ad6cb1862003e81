use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

pub const MAX_MESSAGE_LENGTH: usize = 5000;

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessageRequest {
    // A missing field is treated like an empty one and rejected by validation.
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "Message body cannot be empty or exceed 5000 characters"))]
    pub message: String,
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::user::{User, UserResponse};

// Fields default to empty so a missing field gets the same 400 as a blank one.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    pub full_name: String,
    #[validate(length(min = 3, max = 32, message = "Username must be between 3 and 32 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub confirm_password: String,
    pub gender: String,
}

impl SignupRequest {
    /// Trims the free-text fields; passwords are kept verbatim.
    pub fn normalized(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            username: self.username.trim().to_string(),
            gender: self.gender.trim().to_string(),
            ..self
        }
    }

    pub fn has_blank_fields(&self) -> bool {
        [
            &self.full_name,
            &self.username,
            &self.password,
            &self.confirm_password,
            &self.gender,
        ]
        .iter()
        .any(|field| field.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub profile_pic: String,
    pub token: String,
}

impl LoginResponse {
    pub fn new(user: User, token: String) -> Self {
        let user = UserResponse::from(user);
        Self {
            id: user.id,
            full_name: user.full_name,
            username: user.username,
            profile_pic: user.profile_pic,
            token,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

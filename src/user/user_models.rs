use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown gender '{0}'")]
pub struct UnknownGender(String);

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(UnknownGender(s.to_string())),
        }
    }
}

impl TryFrom<String> for Gender {
    type Error = UnknownGender;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Stored account. Never serialized directly; clients see [`UserResponse`]
/// or [`SidebarUser`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub gender: Gender,
    pub profile_pic: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub username: String,
    pub password_hash: String,
    pub gender: Gender,
    pub profile_pic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub profile_pic: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            username: user.username,
            profile_pic: user.profile_pic,
        }
    }
}

/// Entry in the chat sidebar listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SidebarUser {
    pub id: Uuid,
    pub full_name: String,
    pub profile_pic: String,
}

impl From<&User> for SidebarUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            profile_pic: user.profile_pic.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parsing() {
        assert_eq!("male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert!("other".parse::<Gender>().is_err());
        assert_eq!(Gender::Female.to_string(), "female");
    }

    #[test]
    fn test_user_response_uses_camel_case() {
        let response = UserResponse {
            id: Uuid::nil(),
            full_name: "Ada Lovelace".to_string(),
            username: "ada".to_string(),
            profile_pic: "https://example.com/ada.png".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["fullName"], "Ada Lovelace");
        assert_eq!(json["profilePic"], "https://example.com/ada.png");
        assert!(json.get("passwordHash").is_none());
    }
}

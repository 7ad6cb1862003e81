use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::auth::auth_dto::{LoginRequest, SignupRequest};
use crate::auth::{create_jwt, hash_password, verify_jwt, verify_password};
use crate::error::{AppError, Result};
use crate::state::Config;
use crate::store::bounded;
use crate::user::{Gender, NewUser, User, UserStore};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    config: Arc<Config>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: Arc<Config>) -> Self {
        Self { users, config }
    }

    /// Creates an account and returns it with a fresh session token.
    pub async fn signup(&self, payload: SignupRequest) -> Result<(User, String)> {
        // Length rules apply to the values that get stored.
        let payload = payload.normalized();

        if payload.has_blank_fields() {
            return Err(AppError::Validation("Please fill in all fields".to_string()));
        }

        if payload.password != payload.confirm_password {
            return Err(AppError::Validation("Passwords don't match".to_string()));
        }

        payload.validate()?;

        if !is_valid_username(&payload.username) {
            return Err(AppError::Validation(
                "Username may only contain letters, digits, '_', '.' and '-'".to_string(),
            ));
        }

        let gender: Gender = payload
            .gender
            .parse()
            .map_err(|_| AppError::Validation("Gender must be 'male' or 'female'".to_string()))?;

        let password_hash = hash_password(&payload.password, self.config.bcrypt_cost).await?;

        let user = bounded(
            self.config.store_timeout,
            self.users.create(NewUser {
                profile_pic: profile_pic_url(&self.config.avatar_base_url, gender, &payload.username),
                full_name: payload.full_name,
                username: payload.username,
                password_hash,
                gender,
            }),
        )
        .await?;

        tracing::info!("New user signed up: {} ({})", user.username, user.id);

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    pub async fn login(&self, payload: LoginRequest) -> Result<(User, String)> {
        let invalid = || AppError::Validation("Invalid username or password".to_string());

        if payload.username.trim().is_empty() || payload.password.is_empty() {
            return Err(invalid());
        }

        let user = bounded(
            self.config.store_timeout,
            self.users.find_by_username(payload.username.trim()),
        )
        .await?
        .ok_or_else(invalid)?;

        if !verify_password(&payload.password, &user.password_hash).await? {
            return Err(invalid());
        }

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    /// Resolves a session token to the id of an existing user.
    pub async fn authenticate(&self, token: &str) -> Result<Uuid> {
        let claims = verify_jwt(token, &self.config.jwt_secret)?;
        let user_id = claims.user_id()?;

        bounded(self.config.store_timeout, self.users.find_by_id(user_id))
            .await?
            .ok_or(AppError::Unauthorized("User not found".to_string()))?;

        Ok(user_id)
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User> {
        bounded(self.config.store_timeout, self.users.find_by_id(user_id))
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))
    }

    fn issue_token(&self, user: &User) -> Result<String> {
        create_jwt(
            user.id,
            &user.username,
            &self.config.jwt_secret,
            self.config.jwt_expiration_hours,
        )
    }
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Placeholder avatar for a new account, picked by gender.
pub fn profile_pic_url(base_url: &str, gender: Gender, username: &str) -> String {
    let kind = match gender {
        Gender::Male => "boy",
        Gender::Female => "girl",
    };
    format!("{}/{}?username={}", base_url.trim_end_matches('/'), kind, username)
}

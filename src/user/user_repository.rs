use crate::error::{AppError, Result};
use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use super::user_models::{NewUser, SidebarUser, User};

/// Account storage. Usernames are unique; `create` reports a duplicate as
/// [`AppError::Conflict`] straight from the store so concurrent signups
/// cannot both succeed.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<User>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Every user except `user_id`, ordered by full name.
    async fn list_others(&self, user_id: Uuid) -> Result<Vec<SidebarUser>>;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, full_name, username, password_hash, gender, profile_pic)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *"
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.full_name)
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(new_user.gender.as_str())
        .bind(&new_user.profile_pic)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Username already exists".to_string())
            }
            other => AppError::Database(other),
        })?;

        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_others(&self, user_id: Uuid) -> Result<Vec<SidebarUser>> {
        let users = sqlx::query_as::<_, SidebarUser>(
            "SELECT id, full_name, profile_pic FROM users
             WHERE id != $1
             ORDER BY full_name, id"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

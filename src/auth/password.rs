use crate::error::{AppError, Result};

/// Hashes on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            AppError::InternalError
        })?
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            AppError::InternalError
        })
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            AppError::InternalError
        })?
        .map_err(|e| {
            tracing::error!("Password verification failed: {}", e);
            AppError::InternalError
        })
}

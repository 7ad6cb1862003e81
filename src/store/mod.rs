pub mod memory;

use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    conversation::{ConversationRepository, ConversationStore},
    db::DbPool,
    error::{AppError, Result},
    message::{MessageRepository, MessageStore},
    user::{UserRepository, UserStore},
};

pub use memory::MemoryStore;

/// The store handles injected into the services.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub conversations: Arc<dyn ConversationStore>,
    pub messages: Arc<dyn MessageStore>,
}

impl Stores {
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            conversations: Arc::new(ConversationRepository::new(pool.clone())),
            messages: Arc::new(MessageRepository::new(pool)),
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            conversations: store.clone(),
            messages: store,
        }
    }
}

/// Runs a store call with an upper bound on its duration.
pub async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Store(format!(
            "store call timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_through_results() {
        let value = bounded(Duration::from_secs(1), async { Ok::<_, AppError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);

        let err = bounded(Duration::from_secs(1), async {
            Err::<(), _>(AppError::NotFound("missing".to_string()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bounded_times_out_slow_calls() {
        let err = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, AppError>(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Store(_)));
    }
}

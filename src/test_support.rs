use std::{sync::Arc, time::Duration};

use crate::{
    state::{AppState, Config, NotifierKind, StoreBackend},
    store::Stores,
};

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        store_backend: StoreBackend::Memory,
        database_url: None,
        database_max_connections: 1,
        store_timeout: Duration::from_secs(5),
        jwt_secret: "test-secret".to_string(),
        jwt_expiration_hours: 1,
        // bcrypt's minimum cost keeps the suite fast
        bcrypt_cost: 4,
        avatar_base_url: "https://avatar.example/public".to_string(),
        notifier: NotifierKind::Fanout,
        allowed_origins: vec!["http://localhost:3000".to_string()],
        cookie_secure: false,
    }
}

pub fn test_state() -> AppState {
    AppState::new(Arc::new(test_config()), Stores::memory())
}

mod auth;
mod conversation;
mod db;
mod error;
mod extract;
mod message;
mod middleware;
mod notification;
mod routes;
mod state;
mod store;
mod user;
mod websocket;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use db::{create_pool, run_migrations};
use routes::create_router;
use state::{AppState, Config, StoreBackend};
use std::sync::Arc;
use store::Stores;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chat_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let stores = match (config.store_backend, config.database_url.as_deref()) {
        (StoreBackend::Postgres, Some(database_url)) => {
            // Hide credentials in the log line
            let url_for_logging = database_url
                .rsplit('@')
                .next()
                .map(|host| format!("<hidden>@{}", host))
                .unwrap_or_else(|| "<invalid format>".to_string());

            tracing::info!("Connecting to database at {}...", url_for_logging);
            let pool = create_pool(
                database_url,
                config.database_max_connections,
                config.store_timeout,
            )
            .await
            .with_context(|| format!("failed to connect to database at {}", url_for_logging))?;

            tracing::info!("Running migrations...");
            run_migrations(&pool).await.context("failed to run migrations")?;

            Stores::postgres(pool)
        }
        (StoreBackend::Postgres, None) => anyhow::bail!("DATABASE_URL must be set"),
        (StoreBackend::Memory, _) => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Stores::memory()
        }
    };

    tracing::info!("Delivering new messages via {:?} notifier", config.notifier);

    let state = AppState::new(config.clone(), stores);
    let app = create_router(state);

    let addr = config.addr();
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use naslet_api::app::{build_app, AppState};
use naslet_auth::TokenCodec;
use naslet_infra::{AppConfig, InMemoryStore, PostgresStore, SessionProvider};
use naslet_observability::Logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::initialise("naslet-api");

    let config = AppConfig::from_env().context("invalid configuration")?;

    let store: Arc<dyn SessionProvider> = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url, config.database_max_connections)
                .await
                .context("failed to connect to the database")?;
            store.migrate().await.context("failed to apply schema")?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
            Arc::new(InMemoryStore::new())
        }
    };

    let tokens = TokenCodec::new(
        config.jwt_secret.as_bytes(),
        chrono::Duration::minutes(config.token_ttl_minutes),
    );
    let app = build_app(AppState::new(store, tokens, logger.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    logger.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

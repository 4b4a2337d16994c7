use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::cli::open_repositories;
use crate::config::{AppConfig, AuthConfig, StorageConfig};
use crate::routes;
use crate::state::AppState;
use crate::storage::FileSystemStore;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let auth = AuthConfig::from_env()?;
    let storage = StorageConfig::from_env()?;
    info!("Starting cohesion-admin in {:?} mode", config.environment);
    info!("Database: {}", storage.describe_database());

    let repos = open_repositories(&config, &storage).await?;
    let objects = Arc::new(FileSystemStore::new(storage.media_root.clone()));
    let port = port.unwrap_or(config.server.port);

    let state = AppState::new(config, auth, &storage, repos, objects)?;
    let app = routes::app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    info!("listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::{AppConfig, StorageBackend, StorageConfig};
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let storage = StorageConfig::from_env()?;

    if storage.backend == StorageBackend::Memory {
        return output_success(output_format, "memory backend has no migrations to apply", None);
    }

    let manager = DatabaseManager::connect(&storage, &config.database).await?;
    manager.migrate().await?;
    output_success(
        output_format,
        "migrations applied",
        Some(json!({ "database": storage.describe_database() })),
    )
}

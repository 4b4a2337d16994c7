use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::{AppConfig, AuthConfig, StorageBackend, StorageConfig};

/// Loads every config source and reports what the server would run with.
/// Secrets are never printed.
pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let auth = AuthConfig::from_env()?;
    let storage = StorageConfig::from_env()?;
    let session_hours = config.security.session_max_age()?.num_hours();

    let backend = match storage.backend {
        StorageBackend::Postgres => "postgres",
        StorageBackend::Memory => "memory",
    };

    if output_format == OutputFormat::Text {
        println!("environment:  {:?}", config.environment);
        println!("port:         {}", config.server.port);
        println!("session:      {}h", session_hours);
        println!("idp domain:   {}", auth.domain);
        println!("callback:     {}", auth.callback_url);
        println!("backend:      {} ({})", backend, storage.describe_database());
        println!("bucket:       {}", storage.video_bucket);
        println!("media root:   {}", storage.media_root.display());
    }

    output_success(
        output_format,
        "configuration is complete",
        Some(json!({
            "environment": format!("{:?}", config.environment),
            "port": config.server.port,
            "session_hours": session_hours,
            "idp_domain": auth.domain,
            "callback_url": auth.callback_url,
            "backend": backend,
            "database": storage.describe_database(),
            "video_bucket": storage.video_bucket,
            "media_root": storage.media_root.display().to_string(),
        })),
    )
}

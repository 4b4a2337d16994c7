pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use crate::config::{AppConfig, StorageBackend, StorageConfig};
use crate::database::repository::MemoryStore;
use crate::database::{DatabaseManager, Repositories};

#[derive(Parser)]
#[command(name = "cohesion-admin")]
#[command(about = "Cohesion admin backend - server, migrations and taxonomy tools")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Load and validate configuration without starting the server")]
    CheckConfig,

    #[command(about = "Inspect the taxonomy tree")]
    Taxonomy {
        #[command(subcommand)]
        cmd: commands::taxonomy::TaxonomyCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::CheckConfig => commands::check_config::handle(output_format).await,
        Commands::Taxonomy { cmd } => commands::taxonomy::handle(cmd, output_format).await,
    }
}

/// Repositories for the configured backend, migrating first when enabled
pub(crate) async fn open_repositories(config: &AppConfig, storage: &StorageConfig) -> anyhow::Result<Repositories> {
    match storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory store; data is lost on exit");
            Ok(Repositories::memory(Arc::new(MemoryStore::new())))
        }
        StorageBackend::Postgres => {
            let manager = DatabaseManager::connect(storage, &config.database).await?;
            if config.database.run_migrations {
                manager.migrate().await?;
            }
            Ok(Repositories::postgres(manager.pool()))
        }
    }
}

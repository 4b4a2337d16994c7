use clap::Subcommand;
use serde_json::json;

use crate::cli::{open_repositories, utils::output_lines, OutputFormat};
use crate::config::{AppConfig, StorageConfig};
use crate::database::models::Taxonomy;
use crate::services::TaxonomyTree;

#[derive(Subcommand)]
pub enum TaxonomyCommands {
    #[command(about = "Print the taxonomy tree")]
    List,

    #[command(about = "Print leaf paths under a node, or under every root")]
    Flatten {
        #[arg(help = "Taxonomy ID (optional)")]
        id: Option<i64>,
    },

    #[command(about = "Print the full path from the root to a node")]
    ReverseFlatten {
        #[arg(help = "Taxonomy ID")]
        id: i64,
    },
}

pub async fn handle(cmd: TaxonomyCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let storage = StorageConfig::from_env()?;
    let repos = open_repositories(&config, &storage).await?;
    let taxonomy = repos.taxonomy.as_ref();

    match cmd {
        TaxonomyCommands::List => {
            let roots = taxonomy.list_recursive().await?;
            if output_format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&roots)?);
                return Ok(());
            }
            let mut lines = Vec::new();
            for root in &roots {
                tree_lines(root, 0, &mut lines);
            }
            output_lines(output_format, &lines, "no taxonomy entries")
        }
        TaxonomyCommands::Flatten { id } => {
            let starts = match id {
                Some(id) => taxonomy.get(id).await?.into_iter().collect(),
                None => taxonomy.list().await?,
            };
            let mut names = Vec::new();
            for start in starts {
                names.extend(taxonomy.flatten(Some(start)).await?.into_iter().map(|t| t.name));
            }
            output_lines(output_format, &names, "no leaves found")
        }
        TaxonomyCommands::ReverseFlatten { id } => {
            let node = taxonomy.get(id).await?;
            match taxonomy.reverse_flatten(node).await? {
                Some(path) if output_format == OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "id": path.id, "name": path.name }))?);
                    Ok(())
                }
                Some(path) => output_lines(output_format, &[path.name], ""),
                None => anyhow::bail!("taxonomy {} not found", id),
            }
        }
    }
}

fn tree_lines(node: &Taxonomy, depth: usize, lines: &mut Vec<String>) {
    lines.push(format!("{}{} [{}]", "  ".repeat(depth), node.name, node.id));
    for child in &node.children {
        tree_lines(child, depth + 1, lines);
    }
}

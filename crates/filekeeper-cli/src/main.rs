//! Filekeeper CLI: inspect and maintain the configured storages.
//!
//! Storages come from FILEKEEPER_* environment variables (a `.env` file is
//! honored), or from a JSON file passed with `--config`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use filekeeper_cli::{init_tracing, ConfigSummary};
use filekeeper_core::FileConfig;
use filekeeper_lifecycle::Handler;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "filekeeper", about = "Filekeeper storage maintenance CLI")]
struct Cli {
    /// JSON configuration file (defaults to the environment)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and list the storages
    CheckConfig,
    /// Show the absolute path and URI of a stored file
    Resolve {
        /// Relative path, e.g. /docs/3f2a.pdf
        relative_path: String,
        #[arg(long, default_value = "default")]
        storage: String,
    },
    /// Move a local file into a storage
    Upload {
        /// Path to the file to store
        file: PathBuf,
        /// Directory prefix inside the storage
        #[arg(long, default_value = "")]
        prefix: String,
        /// Naming strategy id: hashing or origin
        #[arg(long, default_value = "hashing")]
        naming: String,
        #[arg(long, default_value = "default")]
        storage: String,
    },
    /// Delete a stored file
    Remove {
        relative_path: String,
        #[arg(long, default_value = "default")]
        storage: String,
    },
    /// Move a stored file to the archive directory
    Archive {
        relative_path: String,
        #[arg(long, default_value = "default")]
        storage: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<FileConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            FileConfig::from_json(&json)
                .with_context(|| format!("Invalid configuration in {}", path.display()))
        }
        None => FileConfig::from_env().context("Invalid FILEKEEPER_* configuration"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    if let Commands::CheckConfig = cli.command {
        return print_json(&ConfigSummary::from_config(&config));
    }

    let handler = Handler::from_config(&config).context("Failed to initialize storages")?;

    match cli.command {
        Commands::CheckConfig => {}
        Commands::Resolve {
            relative_path,
            storage,
        } => {
            let location = filekeeper_cli::resolve(&handler, &storage, &relative_path)?;
            print_json(&location)?;
        }
        Commands::Upload {
            file,
            prefix,
            naming,
            storage,
        } => {
            let location =
                filekeeper_cli::upload(&handler, &storage, &file, &prefix, &naming).await?;
            print_json(&location)?;
        }
        Commands::Remove {
            relative_path,
            storage,
        } => {
            let removed = handler
                .remove("cli", &storage, Some(&relative_path))
                .await?;
            print_json(&serde_json::json!({
                "storage": storage,
                "relative_path": relative_path,
                "removed": removed,
            }))?;
        }
        Commands::Archive {
            relative_path,
            storage,
        } => {
            handler.archive(&storage, Some(&relative_path)).await?;
            let target = handler
                .archive_root()
                .join(relative_path.trim_start_matches('/'));
            print_json(&serde_json::json!({
                "storage": storage,
                "relative_path": relative_path,
                "archived_to": target.display().to_string(),
            }))?;
        }
    }

    Ok(())
}

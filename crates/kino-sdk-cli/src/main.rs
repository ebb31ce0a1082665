//! Kino SDK CLI - Headless track selection and warm-up tool
//!
//! Features:
//! - Inspect the tracks a player would expose for an engine mapping
//! - Resolve a track change into the engine override
//! - Warm up CDN connections

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

/// Kino SDK CLI - Track selection toolkit
#[derive(Parser)]
#[command(name = "kino-sdk")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Track selection and connection warm-up toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// SDK configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tracks exposed for a track mapping
    Tracks {
        /// Path to a track mapping (JSON)
        mapping: PathBuf,
    },

    /// Resolve a track change against a track mapping
    Select {
        /// Path to a track mapping (JSON)
        mapping: PathBuf,

        /// Unique id of the track to switch to
        unique_id: String,
    },

    /// Open pooled connections to CDN hosts
    Warmup {
        /// Hosts to warm up
        #[arg(required = true)]
        hosts: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(level).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(level).init();
    }
    kino_sdk::init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Tracks { mapping } => {
            commands::tracks(&mapping, &config, &cli.format)?;
        }
        Commands::Select { mapping, unique_id } => {
            commands::select(&mapping, &unique_id, &config, &cli.format).await?;
        }
        Commands::Warmup { hosts } => {
            commands::warmup(&hosts, &config, &cli.format).await?;
        }
    }

    Ok(())
}

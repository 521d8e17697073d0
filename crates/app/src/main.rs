//! Fatigue Monitor - Main Entry Point

use std::path::PathBuf;

use anyhow::Result;
use app::{init_logging, replay_file, start_session, Settings};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

#[derive(Parser)]
#[command(name = "fatigue-monitor")]
#[command(version)]
#[command(about = "Real-time driver fatigue monitor", long_about = None)]
struct Cli {
    /// Settings file (TOML); defaults to ./fatigue-monitor.toml when present
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a monitoring session over recorded frames and print the trip summary
    Replay {
        /// JSON-lines file of face frame samples
        frames: PathBuf,

        /// Pace frames by their timestamps
        #[arg(long)]
        realtime: bool,
    },

    /// Print the effective settings
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Replay { frames, realtime } => {
            info!("=== Fatigue Monitor v{} ===", env!("CARGO_PKG_VERSION"));

            let (handle, _store) = start_session(&settings)?;
            handle.start_monitoring().await?;

            let count = replay_file(&handle, &frames, realtime).await?;
            info!("Replayed {} frames", count);

            let snapshot = handle.snapshot().await?;
            let summary = handle.stop_monitoring().await?;
            handle.shutdown().await?;

            let report = json!({ "final_state": snapshot, "trip": summary });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

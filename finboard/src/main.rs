use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finboard::api::{state_from_config, ApiServer};
use finboard::AppConfig;

#[derive(Parser)]
#[command(name = "finboard")]
#[command(about = "Financial news dashboard backend", long_about = None)]
struct Cli {
    /// Data directory (overrides FINBOARD_DATA_DIR)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start API server with housekeeping and all scheduled tasks
    Serve {
        /// Host to bind to (overrides FINBOARD_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides FINBOARD_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one scheduled task once and exit
    RunTask {
        /// Task name, e.g. news-scraping
        name: String,
    },

    /// List scheduled tasks and their cadence
    Tasks,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "finboard=info,finboard_cache=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Serve { host, port } => {
            let config = config.merge(host, port, cli.data_dir);
            ApiServer::new(config).start().await?;
        }

        Commands::RunTask { ref name } => {
            let config = config.merge(None, None, cli.data_dir.clone());
            let state = state_from_config(&config)?;
            state.scheduler.run_now(name).await?;
            println!("Task {} completed", name);
        }

        Commands::Tasks => {
            let config = config.merge(None, None, cli.data_dir);
            let state = state_from_config(&config)?;
            let next_runs = state.scheduler.next_runs();

            println!("Scheduled tasks:");
            for (name, cadence) in state.scheduler.describe() {
                let next = next_runs
                    .get(&name)
                    .copied()
                    .flatten()
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("  {:<16} {:<28} next: {}", name, cadence, next);
            }
        }
    }

    Ok(())
}

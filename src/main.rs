use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vibe_matcher::application::*;
use vibe_matcher::logging::init_tracing;
use vibe_matcher::Config;

#[derive(Parser)]
#[command(name = "vibe-matcher")]
#[command(about = "Rank a fashion catalog by semantic similarity to a vibe query")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve,
    /// Rank the catalog against a query and print the matches as JSON
    Rank {
        /// Free-text vibe query
        query: String,
        /// JSON catalog to rank instead of the configured one
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Probe the embedding provider
    Health,
    /// Print the configuration diagnostic report
    Config,
    /// Generate sample configuration file
    InitConfig {
        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::from_env();
    let logging = loaded
        .as_ref()
        .map(|c| c.operational.clone())
        .unwrap_or_default();
    init_tracing(&logging.log_level, logging.json_logs);

    // Commands that must work with an incomplete or unparsable configuration
    match &cli.command {
        Some(Commands::InitConfig { output }) => {
            ConfigCommandHandler::init_config(output.clone())?;
            return Ok(());
        }
        Some(Commands::Config) => {
            ConfigCommandHandler::diagnose(&loaded);
            return Ok(());
        }
        _ => {}
    }

    let config = loaded?;

    let app = Application::new(config)?;
    app.initialize()?;

    match cli.command {
        Some(Commands::Rank { query, catalog }) => {
            let handler = RankCommandHandler::new(app.container.clone());
            handler.rank(&query, catalog.as_deref()).await
        }
        Some(Commands::Health) => {
            let handler = HealthCommandHandler::new(app.container.clone());
            handler.run_health_check().await
        }
        Some(Commands::Serve) | None => {
            let handler = ServerCommandHandler::new(app.container.clone());
            handler.start_http().await
        }
        Some(Commands::Config) | Some(Commands::InitConfig { .. }) => Ok(()),
    }
}

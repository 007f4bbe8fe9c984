mod pipeline;
mod status;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "brandpulse")]
#[command(about = "Brand mention sentiment monitoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Register a brand and run one full cycle (ingest, classify, aggregate)
    Monitor {
        /// Brand name to monitor
        #[arg(long)]
        brand: String,

        /// Print the cycle report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify pending mentions and record a fresh snapshot
    Analyze {
        #[arg(long)]
        brand_id: Uuid,
    },
    /// Show a brand's recent snapshots and alerts
    Status {
        #[arg(long)]
        brand_id: Uuid,

        /// Number of snapshots to show
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Turn off monitoring for a brand; history is kept
    Stop {
        #[arg(long)]
        brand_id: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = brandpulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = brandpulse_db::PoolConfig::from_app_config(&config);
    let pool = brandpulse_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Migrate => {
            let applied = brandpulse_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Monitor { brand, json } => {
            pipeline::run_monitor(&config, pool, &brand, json).await?;
        }
        Commands::Analyze { brand_id } => {
            pipeline::run_analyze(&config, pool, brand_id).await?;
        }
        Commands::Status { brand_id, limit } => {
            status::run_status(&pool, brand_id, limit).await?;
        }
        Commands::Stop { brand_id } => {
            pipeline::run_stop(&pool, brand_id).await?;
        }
    }

    Ok(())
}

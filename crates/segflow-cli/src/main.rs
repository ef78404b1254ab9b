use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use segflow_core::{Config, Result};

#[derive(Parser)]
#[command(name = "segflow")]
#[command(about = "Control plane for segmentation workloads on a batch cluster")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Set log level")]
    log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server and reconciliation engine
    Server {
        #[arg(short = 'H', long, help = "Bind address")]
        host: Option<String>,

        #[arg(short = 'P', long, help = "Port number")]
        port: Option<u16>,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Configuration operations
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Verify database connectivity
    Ping,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate the configuration and bundled templates
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if let Some(ref config_path) = cli.config {
        Config::load(&config_path.to_string_lossy())?
    } else {
        Config::from_env()?
    };

    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // Keep the appender guard alive for the whole process
    let _log_guard = segflow_core::logging::init(&config.logging)?;

    match cli.command {
        Commands::Server { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            info!(
                "Starting segflow v{} on {}:{}",
                segflow_core::VERSION,
                config.server.host,
                config.server.port
            );
            segflow_api::run(config).await
        }

        Commands::Db { command } => match command {
            DbCommands::Ping => {
                let pool = segflow_core::repository::create_pool(&config.database).await?;
                let db = segflow_core::repository::Database::new(pool);
                db.ping().await?;
                println!(
                    "Database {}:{}/{} is reachable",
                    config.database.host, config.database.port, config.database.database
                );
                Ok(())
            }
        },

        Commands::Config { command } => match command {
            ConfigCommands::Check => {
                config.validate()?;
                config.validate_templates()?;
                println!("Configuration OK");
                println!(
                    "  server: {}:{}",
                    config.server.host, config.server.port
                );
                println!(
                    "  database: {}:{}/{}",
                    config.database.host, config.database.port, config.database.database
                );
                println!("  templates: {}", config.storage.templates_dir.display());
                println!(
                    "  poll interval: {}s",
                    config.slurm.poll_interval_secs
                );
                Ok(())
            }
        },
    }
}

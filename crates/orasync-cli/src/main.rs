mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "orasync",
    version,
    about = "Oracle schema synchronization for the WMS staging pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize configured entities: discover, synthesize, apply DDL
    Sync {
        /// Path to sync config YAML file
        config: PathBuf,
        /// Limit the run to a single entity
        #[arg(long)]
        entity: Option<String>,
        /// Discover and synthesize only; make no database changes
        #[arg(long)]
        dry_run: bool,
    },
    /// Resolve and print an entity's schema
    Discover {
        /// Path to sync config YAML file
        config: PathBuf,
        /// Entity name (e.g. "allocation")
        entity: String,
    },
    /// Print the DDL that would be applied for an entity
    Ddl {
        /// Path to sync config YAML file
        config: PathBuf,
        /// Entity name (e.g. "allocation")
        entity: String,
        /// Use only the static fallback table; run no external processes
        #[arg(long)]
        offline: bool,
    },
    /// Validate configuration and database connectivity
    Check {
        /// Path to sync config YAML file
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Sync {
            config,
            entity,
            dry_run,
        } => commands::sync::execute(&config, entity.as_deref(), dry_run).await,
        Commands::Discover { config, entity } => commands::discover::execute(&config, &entity).await,
        Commands::Ddl {
            config,
            entity,
            offline,
        } => commands::ddl::execute(&config, &entity, offline).await,
        Commands::Check { config } => commands::check::execute(&config).await,
    }
}

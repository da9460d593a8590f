//! CLI entry point for the `ftpdts-store` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use ftpdts_store::cli::commands;
use ftpdts_store::{Config, StoreError};

#[derive(Parser)]
#[command(
    name = "ftpdts-store",
    about = "Inspect and seed the ftpdts record store"
)]
struct Cli {
    /// Path to a TOML config file (default: ./ftpdts.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the persistent data directory
    #[arg(long)]
    data: Option<PathBuf>,

    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a freshly generated identifier
    NewId,
    /// Check whether an identifier is valid
    Check {
        /// Candidate identifier
        id: String,
    },
    /// Store a JSON record
    Put {
        /// JSON payload
        payload: String,
        /// Record identifier; a new one is generated when omitted
        #[arg(long)]
        id: Option<String>,
        /// Lifetime in seconds; 0 stores the record durably
        #[arg(long, default_value = "0")]
        ttl: u64,
    },
    /// Read a record
    Get {
        /// Record identifier
        id: String,
    },
    /// List all persisted records
    List,
    /// Summary of the store
    Stats,
}

fn main() {
    let cli = Cli::parse();
    let json = cli.format == "json";

    let mut config = match Config::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };
    if let Some(data) = cli.data {
        config.data.path = data;
    }

    let level = if cli.verbose {
        "debug"
    } else {
        config.log.level.as_str()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::NewId => commands::cmd_new_id(&config, json),
        Commands::Check { id } => commands::cmd_check(&config, &id, json),
        Commands::Put { payload, id, ttl } => {
            commands::cmd_put(&config, id.as_deref(), &payload, ttl, json)
        }
        Commands::Get { id } => commands::cmd_get(&config, &id, json),
        Commands::List => commands::cmd_list(&config, json),
        Commands::Stats => commands::cmd_stats(&config, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = match &e {
            StoreError::Io { .. } | StoreError::NotCached { .. } => 1,
            StoreError::Serialization { .. } | StoreError::Config(_) => 2,
            StoreError::InvalidId(_) => 3,
            StoreError::NotFound(_) => 4,
        };
        process::exit(code);
    }
}

//! Command-line interface.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;

#[derive(Parser)]
#[command(name = "hiscored")]
#[command(about = "Continuous hiscore ingestion daemon for player behaviour analysis")]
#[command(version)]
pub struct Cli {
    /// Data directory
    #[arg(long, global = true, env = "HISCORED_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Run the continuous scrape scheduler
    Run {
        /// Players per batch
        #[arg(short, long)]
        batch_size: Option<usize>,
        /// Batches between candidate-list refreshes
        #[arg(long)]
        refresh_every: Option<usize>,
        /// Run a single sweep instead of looping forever
        #[arg(long)]
        once: bool,
    },

    /// Scrape specific players immediately
    Scrape {
        /// Player names to scrape
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Consume externally produced scrape triggers
    Consume {
        /// Read trigger payloads from stdin (one per line) instead of AMQP
        #[arg(long)]
        stdin: bool,
        /// Queue name (defaults to the configured trigger queue)
        #[arg(long)]
        queue: Option<String>,
    },

    /// Show player and snapshot counts
    Status,
}

/// Parse arguments and dispatch to the command handlers.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.data_dir.as_deref());

    match cli.command {
        Commands::Init => commands::cmd_init(&settings).await,
        Commands::Run {
            batch_size,
            refresh_every,
            once,
        } => commands::cmd_run(&settings, batch_size, refresh_every, once).await,
        Commands::Scrape { names } => commands::cmd_scrape(&settings, &names).await,
        Commands::Consume { stdin, queue } => commands::cmd_consume(&settings, stdin, queue).await,
        Commands::Status => commands::cmd_status(&settings).await,
    }
}

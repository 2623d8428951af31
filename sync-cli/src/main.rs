//! # vigil
//!
//! Command-line client for a shared Vigil document.
//!
//! ## Commands
//!
//! - `list`: Print the current items
//! - `add`: Create an item
//! - `rename`: Change an item's label
//! - `move`: Change an item's position
//! - `remove`: Delete an item
//! - `watch`: Print every remote change until Ctrl-C
//! - `status`: Show document and sync status
//!
//! ## Example
//!
//! ```bash
//! # Read-only
//! vigil --document 3f1a9c list
//!
//! # Edit (token from the environment)
//! VIGIL_TOKEN=ghp_... vigil --document 3f1a9c add --x 120 --y 40 --name Ada
//! vigil --document 3f1a9c rename 1 "Ada L."
//!
//! # Follow changes made by other clients
//! vigil --document 3f1a9c watch --interval 10
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sync_client::{HttpStore, ItemId, Mutation, SyncEngine};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{edit, list, status, watch};
use config::{Config, Overrides};

/// Command-line client for a shared Vigil document.
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/vigil/vigil.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Document id (overrides the config file)
    #[arg(long, short, global = true, env = "VIGIL_DOCUMENT")]
    document: Option<String>,

    /// Bearer token; without one the document is read-only
    #[arg(long, global = true, env = "VIGIL_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the current items
    List,

    /// Create an item
    Add {
        /// Horizontal position
        #[arg(long, allow_negative_numbers = true)]
        x: f64,

        /// Vertical position
        #[arg(long, allow_negative_numbers = true)]
        y: f64,

        /// Label
        #[arg(long, short, default_value = "")]
        name: String,
    },

    /// Change an item's label
    Rename {
        /// Item id
        id: u64,

        /// New label (may be empty)
        name: String,
    },

    /// Change an item's position
    Move {
        /// Item id
        id: u64,

        /// New horizontal position
        #[arg(allow_negative_numbers = true)]
        x: f64,

        /// New vertical position
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Delete an item
    Remove {
        /// Item id
        id: u64,
    },

    /// Print every remote change until Ctrl-C
    Watch {
        /// Seconds between polls (overrides the config file)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Show document and sync status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Config::load(cli.config.as_deref())?.resolve(Overrides {
        document: cli.document,
        token: cli.token,
    })?;
    tracing::debug!("Using {:?}", settings.store);

    let store =
        HttpStore::new(settings.store.clone()).context("Failed to create document store")?;
    let engine = SyncEngine::new(store);

    match cli.command {
        Commands::List => list::run(&engine).await?,
        Commands::Add { x, y, name } => edit::run(&engine, Mutation::Add { x, y, name }).await?,
        Commands::Rename { id, name } => {
            let id = ItemId::new(id);
            edit::run(&engine, Mutation::Rename { id, name }).await?
        }
        Commands::Move { id, x, y } => {
            let id = ItemId::new(id);
            edit::run(&engine, Mutation::Move { id, x, y }).await?
        }
        Commands::Remove { id } => {
            let id = ItemId::new(id);
            edit::run(&engine, Mutation::Remove { id }).await?
        }
        Commands::Watch { interval } => {
            let interval = match interval {
                Some(0) => anyhow::bail!("--interval must be at least 1 second"),
                Some(secs) => Duration::from_secs(secs),
                None => settings.poll_interval,
            };
            watch::run(Arc::new(engine), interval).await?
        }
        Commands::Status => status::run(&engine, &settings.store).await?,
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

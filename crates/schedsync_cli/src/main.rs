//! schedsync CLI
//!
//! Command-line tools for a schedsync snapshot store.
//!
//! # Commands
//!
//! - `init` - Create a snapshot file with the five scheduler tables
//! - `read` - Print every collection as the client sees it
//! - `write` - Apply a change set from a file or stdin
//! - `schema` - Print table columns
//!
//! Table identifiers are read from `SCHEDSYNC_<COLLECTION>_TABLE_ID`.

mod commands;

use clap::{Parser, Subcommand};
use schedsync_protocol::Collection;
use schedsync_server::{FieldPolicy, ReferencePolicy, ServerConfig, TableMap};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// schedsync command-line tools.
#[derive(Parser)]
#[command(name = "schedsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the snapshot store file
    #[arg(global = true, short, long, default_value = "scheduler.json")]
    store: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a store with empty scheduler tables
    Init {
        /// Overwrite an existing store
        #[arg(short, long)]
        force: bool,
    },

    /// Print every collection
    Read {
        /// Pretty-print the response
        #[arg(short, long)]
        pretty: bool,
    },

    /// Apply a change set and print the response
    Write {
        /// Request file, or `-` for stdin
        input: PathBuf,

        /// Pretty-print the response
        #[arg(short, long)]
        pretty: bool,

        /// Reject records carrying unknown fields
        #[arg(long)]
        strict_fields: bool,

        /// Reject references that match no new or existing row
        #[arg(long)]
        strict_references: bool,
    },

    /// Print table columns
    Schema {
        /// Only this collection
        collection: Option<Collection>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let tables = TableMap::from_env();
    match cli.command {
        Commands::Init { force } => {
            commands::init::run(&cli.store, &tables, force)?;
        }
        Commands::Read { pretty } => {
            let config = ServerConfig::new().with_tables(tables);
            commands::read::run(&cli.store, config, pretty).await?;
        }
        Commands::Write {
            input,
            pretty,
            strict_fields,
            strict_references,
        } => {
            let mut config = ServerConfig::new().with_tables(tables);
            if strict_fields {
                config = config.with_field_policy(FieldPolicy::Strict);
            }
            if strict_references {
                config = config.with_reference_policy(ReferencePolicy::Strict);
            }
            commands::write::run(&cli.store, &input, config, pretty).await?;
        }
        Commands::Schema { collection } => {
            commands::schema::run(&cli.store, &tables, collection).await?;
        }
        Commands::Version => {
            println!("schedsync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

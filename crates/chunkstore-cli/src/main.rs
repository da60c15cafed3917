//! chunkctl
//!
//! Command-line tool for building and reading chunk stores.
//!
//! ## Overview
//!
//! - **pack**: encode JSON-lines documents into a store plus its `.idx` address table
//! - **inspect**: show the footer and the byte range of every chunk
//! - **get**: fetch documents by number
//!
//! ## Quick Start
//!
//! ```bash
//! # Pack documents with the default settings (zstd level 3, 128 records per chunk)
//! chunkctl pack docs.jsonl docs.store
//!
//! # Look at the chunk layout
//! chunkctl inspect docs.store
//!
//! # Fetch documents 0 and 42 as JSON
//! chunkctl get docs.store 0 42 --output json
//!
//! # Smaller lz4 chunks
//! chunkctl --codec lz4 --chunk-size 32 pack docs.jsonl docs.store
//! ```
//!
//! ## Configuration
//!
//! Store settings come from `--config <file.toml>` (or `CHUNKSTORE_CONFIG`) and
//! the `--codec`, `--level`, `--chunk-size` and `--raw` flags. A store must be
//! read with the settings it was written with. Log verbosity follows `-v`/`-vv`
//! unless `RUST_LOG` is set.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod format;

use config::StoreOptions;
use format::{Formatter, OutputFormat};

#[derive(Parser)]
#[command(name = "chunkctl")]
#[command(about = "Chunked document store tool", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(id = "output_format", long = "output", value_enum, global = true, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Print Prometheus metrics to stderr before exiting
    #[arg(long, global = true)]
    metrics: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(flatten)]
    store: StoreOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a store from JSON lines (`-` reads stdin)
    Pack {
        /// Input file with one JSON document per line
        input: PathBuf,
        /// Store file to create
        output: PathBuf,
    },
    /// Show a store's chunk table
    Inspect {
        /// Store file
        store: PathBuf,
    },
    /// Fetch documents by number
    Get {
        /// Store file
        store: PathBuf,
        /// Document numbers
        #[arg(required = true)]
        docs: Vec<u64>,
    },
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    chunkstore_observability::init();

    let formatter = Formatter::new(cli.output, !cli.no_color);

    match &cli.command {
        Commands::Pack { input, output } => {
            let config = cli.store.resolve()?;
            commands::handle_pack(input, output, &config, &formatter)?
        }
        Commands::Inspect { store } => commands::handle_inspect(store, &formatter)?,
        Commands::Get { store, docs } => {
            let config = cli.store.resolve()?;
            commands::handle_get(store, docs, &config, &formatter)?
        }
    }

    if cli.metrics {
        eprint!("{}", chunkstore_observability::gather_text()?);
    }

    Ok(())
}

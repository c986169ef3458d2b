use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use keyprobe::KeyEncoding;

mod commands;

#[derive(Parser)]
#[command(name = "keyprobe-cmd")]
#[command(about = "Bulk exact-set key lookup harness")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index per key encoding and time one lookup of every key
    Run {
        /// JSON file with harness settings; flags below override it
        #[arg(long)]
        config: Option<String>,

        /// Number of documents per trial
        #[arg(long)]
        docs: Option<u64>,

        /// Payload length in symbols
        #[arg(long)]
        payload_len: Option<usize>,

        /// Seed for the payload generator
        #[arg(long)]
        seed: Option<u64>,

        /// Key encoding to run (string or numeric; can be specified multiple times)
        #[arg(short, long)]
        encoding: Vec<KeyEncoding>,

        /// Documents buffered before a segment is flushed
        #[arg(long)]
        max_buffered_docs: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check generated keys for collisions
    CheckKeys {
        /// Number of ordinals to check
        #[arg(long, default_value_t = 1_000_000)]
        docs: u64,

        /// Key encoding to check (defaults to all)
        #[arg(short, long)]
        encoding: Vec<KeyEncoding>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Run {
            config,
            docs,
            payload_len,
            seed,
            encoding,
            max_buffered_docs,
            json,
        } => commands::run::run(commands::run::RunArgs {
            config,
            docs,
            payload_len,
            seed,
            encodings: encoding,
            max_buffered_docs,
            json,
        }),
        Commands::CheckKeys { docs, encoding } => commands::check_keys::run(docs, encoding),
    }
}

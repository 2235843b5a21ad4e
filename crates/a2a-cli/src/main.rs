//! a2a - commit, anchor and verify agent-to-agent conversation traces.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

use commands::{anchor, canonicalize, commit, receipts, status, verify};

#[derive(Parser)]
#[command(name = "a2a")]
#[command(about = "Tamper-evident anchoring of A2A conversation traces")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical bytes of a trace
    Canonicalize {
        /// Trace JSON file (or stdin if not provided)
        input: Option<PathBuf>,
    },
    /// Compute the chunked Merkle commitment of a trace
    Commit {
        /// Trace JSON file
        trace: PathBuf,
        /// Chunk size in bytes
        #[arg(long, default_value_t = a2a_core::DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        /// Write the canonical bytes to DIR/<session_id>.json
        #[arg(long)]
        archive: Option<PathBuf>,
        /// Print the full trace document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store a trace on IPFS and anchor its commitment on the XRP Ledger
    Anchor {
        /// Trace JSON file
        trace: PathBuf,
        /// Config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Append the receipt to this journal
        #[arg(long)]
        journal: Option<PathBuf>,
        /// Write the canonical bytes to DIR/<session_id>.json before anchoring
        #[arg(long)]
        archive: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Verify the trace committed by a ledger transaction
    Verify {
        /// Transaction hash
        tx_ref: String,
        #[command(flatten)]
        opts: VerifyOpts,
    },
    /// Verify stored content against an expected Merkle root
    VerifyCid {
        /// Content identifier
        cid: String,
        /// Expected Merkle root (hex)
        root: String,
        #[command(flatten)]
        opts: VerifyOpts,
    },
    /// Verify a local canonical trace file against an expected Merkle root
    VerifyFile {
        /// Canonical trace file
        file: PathBuf,
        /// Expected Merkle root (hex)
        root: String,
        #[command(flatten)]
        opts: VerifyOpts,
    },
    /// List receipts and verification reports in a journal
    Receipts {
        /// Journal file
        journal: PathBuf,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Check IPFS and XRPL connectivity
    Status {
        /// Config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
pub struct VerifyOpts {
    /// Config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Append the report to this journal
    #[arg(long)]
    journal: Option<PathBuf>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
    /// Exit with error code if verification fails
    #[arg(long)]
    strict: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("a2a=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Canonicalize { input } => canonicalize::run(input),
        Commands::Commit {
            trace,
            chunk_size,
            archive,
            json,
        } => commit::run(trace, chunk_size, archive, json),
        Commands::Anchor {
            trace,
            config,
            journal,
            archive,
            json,
        } => anchor::run(trace, config, journal, archive, json).await,
        Commands::Verify { tx_ref, opts } => verify::by_transaction(tx_ref, opts).await,
        Commands::VerifyCid { cid, root, opts } => verify::by_content(cid, root, opts).await,
        Commands::VerifyFile { file, root, opts } => verify::by_file(file, root, opts),
        Commands::Receipts { journal, json } => receipts::run(journal, json),
        Commands::Status { config } => status::run(config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

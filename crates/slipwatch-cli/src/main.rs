//! # slipwatch
//!
//! Watches the Supreme Court slip-opinion listings and keeps a local copy of
//! every revision of every opinion PDF.
//!
//! ```bash
//! # One pass over the last three terms
//! slipwatch --log scotus.log
//!
//! # Poll every ten minutes, starting from the 2003 term
//! slipwatch --every 600 --first 03 --log scotus.log
//!
//! # Show what would be watched
//! slipwatch catalog --json
//! ```

mod commands;
mod console;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use slipwatch_core::{IdentityFilter, Period};
use slipwatch_sync::ClientConfig;
use slipwatch_sync::http::{
    DEFAULT_DOCUMENT_BASE, DEFAULT_LISTING_URL, DEFAULT_USER_AGENT,
};
use slipwatch_watch::{DEFAULT_STORE_ROOT, Settings};
use tracing_subscriber::EnvFilter;

/// Detects new and revised slip opinions and downloads each revision once.
#[derive(Parser)]
#[command(name = "slipwatch", version, about)]
struct Cli {
    /// Print every document as it is checked, and enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Append one line per captured revision or failure to this file.
    #[arg(short, long, global = true, env = "SLIPWATCH_LOG")]
    log: Option<PathBuf>,

    /// Directory that holds captured revisions.
    #[arg(short, long, global = true, env = "SLIPWATCH_DIR", default_value = DEFAULT_STORE_ROOT)]
    dir: PathBuf,

    /// Repeat the pass every SECONDS until interrupted.
    #[arg(
        short = 'c',
        long = "every",
        value_name = "SECONDS",
        global = true,
        env = "SLIPWATCH_EVERY",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    every: Option<u64>,

    /// Earliest term to list, as `YY` or `YYYY`. Defaults to three terms back.
    #[arg(short, long, global = true, value_parser = Period::parse)]
    first: Option<Period>,

    /// Only watch opinions whose name matches this case-insensitive regex.
    #[arg(short, long, global = true, value_parser = IdentityFilter::new)]
    regex: Option<IdentityFilter>,

    /// Listing page URL; the two-digit term is appended.
    #[arg(long, global = true, env = "SLIPWATCH_LISTING_URL", default_value = DEFAULT_LISTING_URL)]
    listing_url: String,

    /// Base URL that relative opinion links resolve against.
    #[arg(long, global = true, env = "SLIPWATCH_DOCUMENT_BASE", default_value = DEFAULT_DOCUMENT_BASE)]
    document_base: String,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    #[arg(long, global = true, env = "SLIPWATCH_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check every cataloged opinion and capture new revisions (default).
    Check,

    /// Build the catalog and print it without probing anything.
    Catalog {
        /// Print the catalog as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Report on-disk anomalies under the store root.
    Verify,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            store_root: self.dir.clone(),
            log_path: self.log.clone(),
            poll_interval: self.every.map(Duration::from_secs),
            first_period: self.first,
            identity_filter: self.regex.clone(),
        }
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            listing_url: self.listing_url.clone(),
            document_base: self.document_base.clone(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

/// Filter used when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info,slipwatch_core=debug,slipwatch_store=debug,slipwatch_sync=debug,slipwatch_watch=debug"
    } else {
        "warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::info!("slipwatch v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        None | Some(Command::Check) => {
            commands::check(cli.client_config(), cli.settings(), cli.verbose).await
        }
        Some(Command::Catalog { json }) => {
            commands::catalog(cli.client_config(), &cli.settings(), json).await
        }
        Some(Command::Verify) => commands::verify(&cli.settings()),
    }
}

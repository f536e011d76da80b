//! Command line entry point for the arXiv harvester.
//!
//! Runs the `harvester` crawler until it is interrupted. Where it starts depends on the
//! checkpoint: with one, it continues with the month before the last completed month; without
//! one, it begins at `--start`, the configured `start_month`, or the current month.
//!
//! # Usage
//!
//! ```bash
//! # Harvest with the defaults (cs.AI and cs.CV into data/pdf)
//! harvester
//!
//! # Use a specific configuration and start month, with info logging
//! harvester --config harvester.toml --start 2024-12 -vv
//! ```
//!
//! The process never finishes on its own. Stopping it (e.g. with Ctrl-C) at any time is safe; at
//! most the current month is fetched again on the next start.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

use clap::{builder::ArgAction, Parser};
use console::style;
use harvester::{
  arxiv::ArxivClient, calendar::MonthCursor, configuration::Config, crawler::Crawler,
  download::HttpDownloader, error::Result,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub mod report;

use crate::report::*;

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Walks arXiv backward month by month and stores every PDF")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(short, long, action = ArgAction::Count, help = "Increase logging verbosity")]
  verbose: u8,

  /// Path to a TOML configuration file. If not specified, the platform-specific default location
  /// is used when it exists, otherwise the built-in defaults.
  #[arg(long, short)]
  config: Option<PathBuf>,

  /// Month to start from when there is no checkpoint, as `YYYY-MM`
  #[arg(long, short)]
  start: Option<MonthCursor>,
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// `RUST_LOG` takes precedence when set.
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_file(true)
    .with_line_number(true)
    .with_target(true)
    .init();
}

/// Reads the configuration and applies command line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
  let mut config = Config::load(cli.config.as_deref())?;
  if let Some(start) = cli.start {
    config = config.with_start_month(start);
  }
  debug!(?config, "Using configuration");
  Ok(config)
}

/// Entry point for the harvester
///
/// # Errors
///
/// Only an unusable configuration ends the process with an error. Network and storage failures
/// during the crawl are logged and retried.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  let config = match load_config(&cli) {
    Ok(config) => config,
    Err(e) => {
      eprintln!("{} Failed to load configuration: {}", style(ERROR_PREFIX).red(), style(&e).red());
      return Err(e);
    },
  };

  let categories = config.categories.clone();
  let search = ArxivClient::new(&config.api_url);
  let download = HttpDownloader::from_config(&config);
  let mut crawler = match Crawler::resume(config, search, download) {
    Ok(crawler) => crawler,
    Err(e) => {
      eprintln!("{} Failed to start: {}", style(ERROR_PREFIX).red(), style(&e).red());
      return Err(e);
    },
  };

  starting(crawler.cursor(), &categories);
  crawler.run_with(step).await;
  Ok(())
}

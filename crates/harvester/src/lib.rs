//! Backward-walking arXiv harvester.
//!
//! `harvester` keeps a local mirror of arXiv PDFs for a fixed set of subject categories. It
//! starts at a month (or at the month before the last one it finished), asks arXiv for every
//! paper submitted in that month, downloads whatever is not on disk yet, and then steps one month
//! further into the past. It never stops on its own.
//!
//! # Features
//!
//! - **Calendar-exact stepping**: months are walked with explicit month arithmetic, so February,
//!   30-day months and the December/January boundary are always handled correctly
//! - **Resumable**: the last month that finished without a single failure is checkpointed to disk
//! - **Idempotent**: a paper whose PDF already exists locally is never downloaded again
//! - **Polite**: searches are throttled and every paper is followed by a short pause
//!
//! # Getting Started
//!
//! ```no_run
//! use harvester::{
//!   arxiv::ArxivClient, configuration::Config, crawler::Crawler, download::HttpDownloader,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let config = Config::default();
//!   let search = ArxivClient::new(&config.api_url);
//!   let download = HttpDownloader::from_config(&config);
//!
//!   let mut crawler = Crawler::resume(config, search, download)?;
//!   crawler.run().await;
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`calendar`]: month cursors, month ranges and leap-year handling
//! - [`checkpoint`]: durable "last completed month" state
//! - [`fetch`]: one month of search-then-download, and the collaborator traits it calls
//! - [`crawler`]: the never-ending control loop
//! - [`arxiv`]: the arXiv search collaborator
//! - [`download`]: the HTTP download collaborator
//! - [`retry`] and [`throttle`]: pacing helpers shared by the collaborators
//! - [`configuration`]: TOML configuration
//! - [`paper`]: paper records returned by a search
//!
//! # Running more than one instance
//!
//! The checkpoint file and the download directory are owned by a single process. Nothing locks
//! them, so two harvesters must never be pointed at the same storage.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
  time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod arxiv;
pub mod calendar;
pub mod checkpoint;
pub mod configuration;
pub mod crawler;
pub mod download;
pub mod error;
pub mod fetch;
pub mod paper;
pub mod retry;
pub mod throttle;

use crate::{calendar::*, error::*, paper::*};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use harvester::prelude::*;
///
/// fn example() -> Result<MonthCursor, HarvestError> { "2024-12".parse() }
/// ```
pub mod prelude {
  pub use crate::{
    calendar::{MonthCursor, MonthRange},
    error::HarvestError,
    fetch::{PaperDownload, PaperSearch},
  };
}

//! Error types for the harvester library.
//!
//! Every fallible operation in the crate returns [`HarvestError`]. Most variants wrap the error
//! of an underlying crate so that `?` works across network, filesystem and parsing code.
//!
//! # Examples
//!
//! ```
//! use harvester::{calendar::MonthCursor, error::HarvestError};
//!
//! match "2024-13".parse::<MonthCursor>() {
//!   Err(HarvestError::InvalidMonth(month)) => assert_eq!(month, 13),
//!   other => panic!("unexpected: {other:?}"),
//! }
//! ```

use thiserror::Error;

/// Error type alias used for the [`harvester`](crate) crate.
pub type Result<T> = core::result::Result<T, HarvestError>;

/// Errors that can occur while harvesting papers.
#[derive(Error, Debug)]
pub enum HarvestError {
  /// A month number outside of `1..=12` was supplied.
  #[error("Invalid month {0}, expected a value between 1 and 12")]
  InvalidMonth(u32),

  /// A month cursor could not be parsed or does not fit in the calendar.
  ///
  /// The string parameter holds the offending input.
  #[error("Invalid month cursor \"{0}\", expected YYYY-MM")]
  InvalidCursor(String),

  /// A network request failed before a response was received.
  ///
  /// This covers DNS failures, refused connections, timeouts, TLS errors and bodies that were
  /// cut off while streaming.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// A server answered with a non-success status code.
  #[error("Request to {url} failed with HTTP status {status}")]
  HttpStatus {
    /// The requested URL
    url:    String,
    /// The HTTP status code that was returned
    status: u16,
  },

  /// The remote API reported an error in an otherwise successful response.
  #[error("API error: {0}")]
  ApiError(String),

  /// A paper record had no PDF link to download from.
  ///
  /// The string parameter holds the paper identifier.
  #[error("Paper {0} has no PDF URL")]
  MissingPdfUrl(String),

  /// A search hit could not be turned into a usable paper record.
  #[error("Invalid record \"{identifier}\": {reason}")]
  InvalidRecord {
    /// Identifier of the record, empty if it had none
    identifier: String,
    /// What was wrong with it
    reason:     String,
  },

  /// A file system operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// The Atom feed returned by arXiv could not be decoded.
  #[error(transparent)]
  Xml(#[from] quick_xml::DeError),

  /// The checkpoint file could not be encoded or decoded.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// The configuration file could not be decoded.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// A configuration value was rejected.
  #[error("{0}")]
  Config(String),
}

impl HarvestError {
  /// Whether retrying the same request may succeed.
  ///
  /// Transport failures, rate limiting (HTTP 429) and server-side errors (HTTP 5xx) are
  /// transient. Everything else, such as a 404 or an unparsable response, will fail the same way
  /// on every attempt.
  pub fn is_retryable(&self) -> bool {
    match self {
      HarvestError::Network(_) | HarvestError::Io(_) => true,
      HarvestError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
      _ => false,
    }
  }
}

impl From<tempfile::PersistError> for HarvestError {
  fn from(err: tempfile::PersistError) -> Self { HarvestError::Io(err.error) }
}

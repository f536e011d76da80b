//! Harvester configuration.
//!
//! Configuration is read from a TOML file. Every key is optional; anything left out falls back to
//! the defaults below, so an empty file (or no file at all) is a valid configuration.
//!
//! ```toml
//! download_dir    = "data/pdf"
//! checkpoint_path = "data/checkpoint.json"
//! categories      = ["cs.AI", "cs.CV"]
//! batch_size      = 1000
//! api_url         = "https://export.arxiv.org/api/query"
//! start_month     = "2024-12"
//!
//! [timing]
//! search_interval_secs    = 3
//! paper_delay_secs        = 1
//! month_delay_secs        = 3
//! search_retry_delay_secs = 60
//! download_backoff_secs   = 2
//! download_attempts       = 3
//! ```

use super::*;
use crate::retry::RetryPolicy;

/// Default arXiv query endpoint.
pub const DEFAULT_API_URL: &str = "https://export.arxiv.org/api/query";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Directory the PDFs are stored in
  pub download_dir:    PathBuf,
  /// Location of the checkpoint file
  pub checkpoint_path: PathBuf,
  /// arXiv subject categories, combined with OR
  pub categories:      Vec<String>,
  /// Maximum number of results requested per month
  pub batch_size:      usize,
  /// Search endpoint
  pub api_url:         String,
  /// Month to start from when no checkpoint exists; defaults to the current month
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start_month:     Option<MonthCursor>,
  /// Pacing and retry settings
  pub timing:          Timing,
}

/// Delays and retry counts, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
  /// Minimum gap between two searches
  pub search_interval_secs:    u64,
  /// Pause after every paper, downloaded or not
  pub paper_delay_secs:        u64,
  /// Pause before moving on to the previous month
  pub month_delay_secs:        u64,
  /// Pause before retrying a month whose search failed
  pub search_retry_delay_secs: u64,
  /// Pause between two download attempts
  pub download_backoff_secs:   u64,
  /// Attempts per download, including the first
  pub download_attempts:       u32,
}

impl Config {
  /// Platform specific location of the configuration file, e.g.
  /// `~/.config/harvester/config.toml` on Linux.
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("harvester").join("config.toml")
  }

  /// Reads and validates a configuration file.
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    debug!("Reading configuration from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    Self::from_toml(&content)
  }

  /// Parses and validates a TOML string.
  pub fn from_toml(content: &str) -> Result<Self> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Loads `path` if given, otherwise the file at [`Config::default_path`] if there is one,
  /// otherwise the defaults.
  ///
  /// An explicitly given path that does not exist is an error.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    match path {
      Some(path) => Self::from_path(path),
      None => {
        let default_path = Self::default_path();
        if default_path.exists() {
          Self::from_path(default_path)
        } else {
          debug!("No configuration at {}, using defaults", default_path.display());
          Ok(Self::default())
        }
      },
    }
  }

  /// Rejects values the crawler cannot work with.
  pub fn validate(&self) -> Result<()> {
    if self.batch_size == 0 {
      return Err(HarvestError::Config("batch_size must be greater than zero".into()));
    }
    if self.categories.iter().all(|category| category.trim().is_empty()) {
      return Err(HarvestError::Config("at least one category is required".into()));
    }
    Ok(())
  }

  /// The month to start from when there is no checkpoint.
  pub fn start_cursor(&self) -> Result<MonthCursor> {
    match self.start_month {
      Some(cursor) => Ok(cursor),
      None => MonthCursor::current(),
    }
  }

  /// Retry policy for downloads.
  pub fn download_retry(&self) -> RetryPolicy {
    RetryPolicy::new(
      self.timing.download_attempts,
      Duration::from_secs(self.timing.download_backoff_secs),
    )
  }

  /// Sets the download directory.
  pub fn with_download_dir(mut self, dir: impl AsRef<Path>) -> Self {
    self.download_dir = dir.as_ref().to_path_buf();
    self
  }

  /// Sets the checkpoint file location.
  pub fn with_checkpoint_path(mut self, path: impl AsRef<Path>) -> Self {
    self.checkpoint_path = path.as_ref().to_path_buf();
    self
  }

  /// Sets the categories to search.
  pub fn with_categories<S: Into<String>>(mut self, categories: impl IntoIterator<Item = S>) -> Self {
    self.categories = categories.into_iter().map(Into::into).collect();
    self
  }

  /// Sets the number of results requested per month.
  pub fn with_batch_size(mut self, batch_size: usize) -> Self {
    self.batch_size = batch_size;
    self
  }

  /// Sets the search endpoint.
  pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
    self.api_url = api_url.into();
    self
  }

  /// Sets the month to start from when there is no checkpoint.
  pub fn with_start_month(mut self, cursor: MonthCursor) -> Self {
    self.start_month = Some(cursor);
    self
  }

  /// Replaces all pacing settings.
  pub fn with_timing(mut self, timing: Timing) -> Self {
    self.timing = timing;
    self
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      download_dir:    PathBuf::from("data").join("pdf"),
      checkpoint_path: PathBuf::from("data").join("checkpoint.json"),
      categories:      vec!["cs.AI".to_string(), "cs.CV".to_string()],
      batch_size:      1000,
      api_url:         DEFAULT_API_URL.to_string(),
      start_month:     None,
      timing:          Timing::default(),
    }
  }
}

impl Timing {
  /// No pauses at all and a single download attempt. Meant for tests and dry runs.
  pub fn none() -> Self {
    Self {
      search_interval_secs:    0,
      paper_delay_secs:        0,
      month_delay_secs:        0,
      search_retry_delay_secs: 0,
      download_backoff_secs:   0,
      download_attempts:       1,
    }
  }

  /// Minimum gap between two searches.
  pub fn search_interval(&self) -> Duration { Duration::from_secs(self.search_interval_secs) }

  /// Pause after every paper.
  pub fn paper_delay(&self) -> Duration { Duration::from_secs(self.paper_delay_secs) }

  /// Pause before moving on to the previous month.
  pub fn month_delay(&self) -> Duration { Duration::from_secs(self.month_delay_secs) }

  /// Pause before retrying a month whose search failed.
  pub fn search_retry_delay(&self) -> Duration { Duration::from_secs(self.search_retry_delay_secs) }
}

impl Default for Timing {
  fn default() -> Self {
    Self {
      search_interval_secs:    3,
      paper_delay_secs:        1,
      month_delay_secs:        3,
      search_retry_delay_secs: 60,
      download_backoff_secs:   2,
      download_attempts:       3,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_file_is_default() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.batch_size, 1000);
    assert_eq!(config.categories, vec!["cs.AI", "cs.CV"]);
    assert_eq!(config.timing.search_retry_delay(), Duration::from_secs(60));
    assert_eq!(config.download_retry(), RetryPolicy::new(3, Duration::from_secs(2)));
  }

  #[test]
  fn test_partial_overrides() {
    let config = Config::from_toml(
      r#"
        categories  = ["math.GT"]
        start_month = "2024-12"

        [timing]
        paper_delay_secs = 0
      "#,
    )
    .unwrap();

    assert_eq!(config.categories, vec!["math.GT"]);
    assert_eq!(config.start_cursor().unwrap(), MonthCursor::new(2024, 12).unwrap());
    assert_eq!(config.timing.paper_delay(), Duration::ZERO);
    assert_eq!(config.timing.month_delay(), Duration::from_secs(3));
    assert_eq!(config.download_dir, PathBuf::from("data").join("pdf"));
  }

  #[test]
  fn test_rejects_invalid_values() {
    assert!(matches!(Config::from_toml("batch_size = 0"), Err(HarvestError::Config(_))));
    assert!(matches!(Config::from_toml("categories = []"), Err(HarvestError::Config(_))));
    assert!(Config::from_toml("start_month = \"2024-13\"").is_err());
    assert!(matches!(Config::from_toml("batch_size = \"many\""), Err(HarvestError::TomlDe(_))));
  }

  #[test]
  fn test_from_path_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let config = Config::default()
      .with_download_dir(dir.path().join("pdf"))
      .with_start_month(MonthCursor::new(2023, 7).unwrap())
      .with_batch_size(50);
    std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

    assert_eq!(Config::load(Some(&path)).unwrap(), config);
    assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
  }

  #[test]
  fn test_default_path() {
    let path = Config::default_path();
    assert!(path.ends_with("harvester/config.toml") || path.ends_with("harvester\\config.toml"));
  }
}

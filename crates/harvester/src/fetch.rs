//! One month of search-then-download.
//!
//! [`Fetcher::fetch_month`] builds the category and date query for a [`MonthRange`], runs a
//! single search through a [`PaperSearch`] collaborator, and hands every hit that is not on disk
//! yet to a [`PaperDownload`] collaborator. The outcome is summarized in a [`FetchResult`].
//!
//! Failures are split in two classes:
//!
//! - a failed search fails the whole month and is returned as an error, so the caller can retry
//!   the same month later;
//! - a failed paper is only counted in [`FetchResult::failed`] and the month carries on. This
//!   covers records the index returned but that could not be interpreted, records without a PDF
//!   link or usable identifier, exhausted download retries and unwritable files.

use super::*;
use crate::{configuration::Config, throttle::Throttle};

/// Field the search results are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
  /// Original submission date
  SubmittedDate,
  /// Date of the latest revision
  LastUpdatedDate,
  /// Search relevance
  Relevance,
}

/// Direction of the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
  /// Oldest or least relevant first
  Ascending,
  /// Newest or most relevant first
  Descending,
}

/// A single search as handed to a [`PaperSearch`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
  /// Query in arXiv search syntax
  pub query:       String,
  /// Upper bound on the number of records returned
  pub max_results: usize,
  /// Ordering field
  pub sort_by:     SortField,
  /// Ordering direction
  pub sort_order:  SortOrder,
}

/// One record of a search response.
///
/// An `Err` is a record the index did return but that could not be turned into a
/// [`PaperRecord`]. It still takes up a slot in the batch and counts as a failed paper.
pub type SearchHit = Result<PaperRecord>;

/// Something that can look papers up in a remote index.
#[async_trait]
pub trait PaperSearch: Send + Sync {
  /// Runs `request` and returns at most `request.max_results` hits.
  ///
  /// An outer error is treated by the caller as a failure of the whole month; a failed hit only
  /// fails that record.
  async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>>;
}

/// Something that can store a remote PDF on disk.
#[async_trait]
pub trait PaperDownload: Send + Sync {
  /// Stores the resource at `url` as `destination`.
  ///
  /// Implementations retry transient failures themselves; an `Err` means the paper could not be
  /// stored and no file must be left at `destination`.
  async fn download(&self, url: &str, destination: &Path) -> Result<()>;
}

/// Counts for one processed month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchResult {
  /// Records returned by the search
  pub found:      usize,
  /// PDFs newly written to disk
  pub downloaded: usize,
  /// Records whose PDF already existed
  pub skipped:    usize,
  /// Records that could not be stored
  pub failed:     usize,
  /// Whether the search hit the batch size, meaning some papers may be missing
  pub truncated:  bool,
}

impl FetchResult {
  /// Whether no paper failed. Only clean months are checkpointed.
  pub fn is_clean(&self) -> bool { self.failed == 0 }
}

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaperOutcome {
  /// The PDF was downloaded
  Downloaded,
  /// The PDF was already on disk
  Skipped,
}

/// Runs the search and downloads for a month.
pub struct Fetcher<S, D> {
  /// Search collaborator
  search:       S,
  /// Download collaborator
  download:     D,
  /// Categories combined with OR in every query
  categories:   Vec<String>,
  /// Results requested per search
  batch_size:   usize,
  /// Where PDFs are stored
  download_dir: PathBuf,
  /// Pause after each paper
  paper_delay:  Duration,
  /// Spacing between searches
  throttle:     Throttle,
}

impl<S: PaperSearch, D: PaperDownload> Fetcher<S, D> {
  /// Creates a fetcher using the categories, batch size, storage and timing from `config`.
  pub fn new(config: &Config, search: S, download: D) -> Self {
    Self {
      search,
      download,
      categories: config.categories.clone(),
      batch_size: config.batch_size,
      download_dir: config.download_dir.clone(),
      paper_delay: config.timing.paper_delay(),
      throttle: Throttle::new(config.timing.search_interval()),
    }
  }

  /// The search collaborator.
  pub fn search_client(&self) -> &S { &self.search }

  /// The download collaborator.
  pub fn download_client(&self) -> &D { &self.download }

  /// Searches `range` and downloads every paper that is not stored yet.
  ///
  /// # Errors
  ///
  /// Only search failures (and failing to create the download directory) are returned. Failures
  /// of individual papers are counted in [`FetchResult::failed`].
  pub async fn fetch_month(&mut self, range: MonthRange) -> Result<FetchResult> {
    let request = SearchRequest {
      query:       build_query(&self.categories, &range),
      max_results: self.batch_size,
      sort_by:     SortField::SubmittedDate,
      sort_order:  SortOrder::Descending,
    };

    self.throttle.wait().await;
    info!(%range, query = %request.query, "Searching for papers");
    let hits = self.search.search(&request).await?;

    let mut result = FetchResult {
      found: hits.len(),
      truncated: hits.len() == self.batch_size,
      ..FetchResult::default()
    };
    info!(%range, found = result.found, "Search finished");
    if result.truncated {
      warn!(
        %range,
        batch_size = self.batch_size,
        "Search returned exactly batch_size results, the month may be truncated"
      );
    }

    if !hits.is_empty() {
      tokio::fs::create_dir_all(&self.download_dir).await?;
    }

    for hit in hits {
      match hit {
        Ok(paper) => match self.process_paper(&paper).await {
          Ok(PaperOutcome::Downloaded) => result.downloaded += 1,
          Ok(PaperOutcome::Skipped) => result.skipped += 1,
          Err(e) => {
            warn!(identifier = %paper.identifier, error = %e, "Failed to store paper");
            result.failed += 1;
          },
        },
        Err(e) => {
          warn!(error = %e, "Search returned an unusable record");
          result.failed += 1;
        },
      }
      tokio::time::sleep(self.paper_delay).await;
    }

    info!(
      %range,
      found = result.found,
      downloaded = result.downloaded,
      skipped = result.skipped,
      failed = result.failed,
      "Month processed"
    );
    Ok(result)
  }

  /// Stores a single record unless its PDF is already present.
  async fn process_paper(&self, paper: &PaperRecord) -> Result<PaperOutcome> {
    if paper.sanitized_identifier().is_empty() {
      return Err(HarvestError::InvalidRecord {
        identifier: paper.identifier.clone(),
        reason:     "empty identifier".to_string(),
      });
    }
    let destination = self.download_dir.join(paper.filename());
    debug!(
      identifier = %paper.identifier,
      title = %paper.title,
      categories = %paper.categories.join(", "),
      published = %paper.published,
      "Processing paper"
    );

    if destination.exists() {
      debug!(path = %destination.display(), "Already stored, skipping");
      return Ok(PaperOutcome::Skipped);
    }

    let url =
      paper.pdf_url.as_deref().ok_or_else(|| HarvestError::MissingPdfUrl(paper.identifier.clone()))?;
    self.download.download(url, &destination).await?;
    debug!(path = %destination.display(), "Stored paper");
    Ok(PaperOutcome::Downloaded)
  }
}

/// Query for every paper in `categories` submitted within `range`.
///
/// ```
/// use harvester::{calendar::MonthCursor, fetch::build_query};
///
/// let range = MonthCursor::new(2024, 2)?.range();
/// let query = build_query(&["cs.AI".to_string(), "cs.CV".to_string()], &range);
/// assert_eq!(query, "(cat:cs.AI OR cat:cs.CV) AND submittedDate:[202402010000 TO 202402292359]");
/// # Ok::<(), harvester::error::HarvestError>(())
/// ```
pub fn build_query(categories: &[String], range: &MonthRange) -> String {
  let categories = categories
    .iter()
    .map(|category| category.trim())
    .filter(|category| !category.is_empty())
    .map(|category| format!("cat:{category}"))
    .collect::<Vec<_>>();
  let categories = match categories.len() {
    1 => categories[0].clone(),
    _ => format!("({})", categories.join(" OR ")),
  };
  format!(
    "{categories} AND submittedDate:[{}0000 TO {}2359]",
    range.first().format("%Y%m%d"),
    range.last().format("%Y%m%d")
  )
}

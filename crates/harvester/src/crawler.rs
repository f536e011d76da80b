//! The never-ending backward walk.
//!
//! A [`Crawler`] moves through the following states:
//!
//! ```text
//! Init -> Resuming -> ProcessingMonth -> CheckpointDecision -> Advancing -> ProcessingMonth ...
//!                          ^    |
//!                          +----+  search failed: wait, then retry the same month
//! ```
//!
//! [`Crawler::resume`] covers `Init` and `Resuming`. Each call to [`Crawler::step`] processes the
//! current month once and either advances to the previous month or, if the search itself failed,
//! stays put. [`Crawler::run`] calls `step` forever; the process is expected to be stopped from
//! the outside.
//!
//! Progress is checkpointed per month. Stopping mid-month means that month is fetched again on
//! the next start, and the on-disk existence check keeps already stored PDFs from being
//! downloaded twice.

use super::*;
use crate::{
  checkpoint::{resume_cursor, CheckpointStore},
  configuration::Config,
  fetch::{FetchResult, Fetcher, PaperDownload, PaperSearch},
};

/// What a single [`Crawler::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
  /// The month was searched and its papers processed.
  Completed {
    /// The month that was processed
    cursor:       MonthCursor,
    /// Counts for that month
    result:       FetchResult,
    /// Whether the checkpoint now points at `cursor`
    checkpointed: bool,
    /// The month processed next, `None` once the start of the calendar is reached
    next:         Option<MonthCursor>,
  },
  /// The search failed; the same month is tried again on the next step.
  Retrying {
    /// The month that will be retried
    cursor: MonthCursor,
    /// Why the search failed
    error:  String,
  },
}

/// Running totals across all months processed by one crawler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
  /// Months searched successfully
  pub months:          usize,
  /// Months whose search failed and was retried
  pub search_failures: usize,
  /// PDFs downloaded
  pub downloaded:      usize,
  /// PDFs that were already stored
  pub skipped:         usize,
  /// Papers that could not be stored
  pub failed:          usize,
}

/// Drives the fetcher backward through time, one month per step.
pub struct Crawler<S, D> {
  /// Search and download for a single month
  fetcher:            Fetcher<S, D>,
  /// Durable last-completed month
  checkpoints:        CheckpointStore,
  /// Month processed by the next step
  cursor:             MonthCursor,
  /// Pause before moving on to the previous month
  month_delay:        Duration,
  /// Pause before retrying a failed search
  search_retry_delay: Duration,
  /// Counts across all steps so far
  totals:             Totals,
}

impl<S: PaperSearch, D: PaperDownload> Crawler<S, D> {
  /// Builds a crawler positioned according to the checkpoint.
  ///
  /// With a checkpoint the first month processed is the one before the checkpointed month;
  /// without one it is the configured start month, or the current month if none is configured.
  ///
  /// # Errors
  ///
  /// Fails only on an invalid configuration. A missing or broken checkpoint is not an error.
  pub fn resume(config: Config, search: S, download: D) -> Result<Self> {
    config.validate()?;
    let checkpoints = CheckpointStore::new(&config.checkpoint_path);
    let start = config.start_cursor()?;
    let checkpoint = checkpoints.load();
    let cursor = resume_cursor(checkpoint, start);

    match checkpoint {
      Some(completed) => info!(%completed, %cursor, "Resuming from checkpoint"),
      None => info!(%cursor, "No checkpoint, starting fresh"),
    }

    Ok(Self {
      fetcher: Fetcher::new(&config, search, download),
      checkpoints,
      cursor,
      month_delay: config.timing.month_delay(),
      search_retry_delay: config.timing.search_retry_delay(),
      totals: Totals::default(),
    })
  }

  /// The month the next step will process.
  pub fn cursor(&self) -> MonthCursor { self.cursor }

  /// Counts across all steps so far.
  pub fn totals(&self) -> Totals { self.totals }

  /// The fetcher, e.g. to inspect its collaborators.
  pub fn fetcher(&self) -> &Fetcher<S, D> { &self.fetcher }

  /// The checkpoint store this crawler writes to.
  pub fn checkpoints(&self) -> &CheckpointStore { &self.checkpoints }

  /// Processes the current month once.
  ///
  /// On success the checkpoint is updated if no paper failed, the cursor moves to the previous
  /// month and the month delay is observed. If the search fails, the search retry delay is
  /// observed and the cursor is left where it is.
  pub async fn step(&mut self) -> StepOutcome {
    let cursor = self.cursor;
    let range = cursor.range();

    let result = match self.fetcher.fetch_month(range).await {
      Ok(result) => result,
      Err(e) => {
        self.totals.search_failures += 1;
        warn!(
          %cursor,
          error = %e,
          "Search failed, retrying the same month in {:?}",
          self.search_retry_delay
        );
        tokio::time::sleep(self.search_retry_delay).await;
        return StepOutcome::Retrying { cursor, error: e.to_string() };
      },
    };

    self.totals.months += 1;
    self.totals.downloaded += result.downloaded;
    self.totals.skipped += result.skipped;
    self.totals.failed += result.failed;

    let checkpointed = self.checkpoint(cursor, &result);

    let next = cursor.previous();
    match next {
      Some(previous) => {
        debug!(%cursor, next = %previous, "Advancing");
        self.cursor = previous;
        tokio::time::sleep(self.month_delay).await;
      },
      None => warn!(%cursor, "Reached the start of the calendar"),
    }

    StepOutcome::Completed { cursor, result, checkpointed, next }
  }

  /// Processes months until the start of the calendar is reached, which in practice is never.
  pub async fn run(&mut self) { self.run_with(|_, _| {}).await }

  /// Like [`Crawler::run`], calling `observer` after every step with its outcome and the
  /// updated totals.
  pub async fn run_with<F>(&mut self, mut observer: F)
  where F: FnMut(&StepOutcome, &Totals) {
    loop {
      let outcome = self.step().await;
      observer(&outcome, &self.totals);
      if let StepOutcome::Completed { next: None, .. } = outcome {
        return;
      }
    }
  }

  /// Saves `cursor` as the last completed month if `result` had no failures.
  ///
  /// A failed write is logged and otherwise ignored.
  fn checkpoint(&self, cursor: MonthCursor, result: &FetchResult) -> bool {
    if !result.is_clean() {
      info!(%cursor, failed = result.failed, "Month had failures, checkpoint left unchanged");
      return false;
    }
    match self.checkpoints.save(cursor) {
      Ok(()) => true,
      Err(e) => {
        warn!(%cursor, error = %e, "Failed to save checkpoint");
        false
      },
    }
  }
}

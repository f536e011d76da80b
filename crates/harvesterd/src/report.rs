//! Styled console output for crawler progress.

use console::style;
use harvester::{
  calendar::MonthCursor,
  crawler::{StepOutcome, Totals},
  fetch::FetchResult,
};

/// Prefix for information messages
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for success messages
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for warning messages
pub static WARNING_PREFIX: &str = "⚠️ ";
/// Prefix for error messages
pub static ERROR_PREFIX: &str = "✗ ";
/// Continuation line under a month summary
pub static CONTINUE_PREFIX: &str = "│  ";
/// Last line under a month summary
pub static LAST_ITEM_PREFIX: &str = "└─ ";

/// Announces where the walk starts.
pub fn starting(cursor: MonthCursor, categories: &[String]) {
  println!(
    "{} Harvesting {} backward from {}",
    style(INFO_PREFIX).cyan(),
    style(categories.join(", ")).yellow(),
    style(cursor).cyan()
  );
}

/// Prints one line per step, plus details for completed months.
pub fn step(outcome: &StepOutcome, totals: &Totals) {
  match outcome {
    StepOutcome::Completed { cursor, result, checkpointed, next } => {
      month(*cursor, result, *checkpointed);
      println!(
        "{}{}",
        style(LAST_ITEM_PREFIX).dim(),
        style(format!(
          "Total: {} months, {} downloaded, {} skipped, {} failed",
          totals.months, totals.downloaded, totals.skipped, totals.failed
        ))
        .dim()
      );
      if next.is_none() {
        println!("{} Reached the start of the calendar", style(INFO_PREFIX).cyan());
      }
    },
    StepOutcome::Retrying { cursor, error } => {
      println!(
        "{} Search for {} failed, retrying: {}",
        style(WARNING_PREFIX).yellow(),
        style(cursor).cyan(),
        style(error).red()
      );
    },
  }
}

/// Summary of a completed month.
fn month(cursor: MonthCursor, result: &FetchResult, checkpointed: bool) {
  let prefix = if result.is_clean() {
    style(SUCCESS_PREFIX).green()
  } else {
    style(WARNING_PREFIX).yellow()
  };
  println!(
    "{}{}: {} found, {} downloaded, {} skipped, {} failed",
    prefix,
    style(cursor).cyan(),
    result.found,
    style(result.downloaded).green(),
    result.skipped,
    style(result.failed).red()
  );
  if result.truncated {
    println!(
      "{}{}",
      style(CONTINUE_PREFIX).dim(),
      style("Search hit the batch size, some papers may be missing").yellow()
    );
  }
  if !checkpointed {
    println!("{}{}", style(CONTINUE_PREFIX).dim(), style("Checkpoint not updated").yellow());
  }
}

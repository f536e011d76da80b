//! Bounded retry with a fixed delay between attempts.

use std::future::Future;

use super::*;

/// How often and how patiently to retry a fallible operation.
///
/// Only errors for which [`HarvestError::is_retryable`] holds are retried; anything else is
/// returned after the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total number of attempts, including the first one. Never zero.
  max_attempts: u32,
  /// Pause between two attempts
  delay:        Duration,
}

impl RetryPolicy {
  /// Creates a policy. `max_attempts` is clamped to at least one.
  pub fn new(max_attempts: u32, delay: Duration) -> Self {
    Self { max_attempts: max_attempts.max(1), delay }
  }

  /// Total number of attempts.
  pub fn max_attempts(&self) -> u32 { self.max_attempts }

  /// Pause between attempts.
  pub fn delay(&self) -> Duration { self.delay }

  /// Runs `operation` until it succeeds, fails with a fatal error, or runs out of attempts.
  ///
  /// The closure receives the 1-based attempt number. `label` only appears in logs.
  pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
  where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>, {
    let mut attempt = 1;
    loop {
      match operation(attempt).await {
        Ok(value) => return Ok(value),
        Err(err) if err.is_retryable() && attempt < self.max_attempts => {
          warn!(
            label,
            attempt,
            max_attempts = self.max_attempts,
            error = %err,
            "Attempt failed, retrying in {:?}",
            self.delay
          );
          tokio::time::sleep(self.delay).await;
          attempt += 1;
        },
        Err(err) => {
          debug!(label, attempt, error = %err, "Giving up");
          return Err(err);
        },
      }
    }
  }
}

impl Default for RetryPolicy {
  fn default() -> Self { Self::new(3, Duration::from_secs(2)) }
}

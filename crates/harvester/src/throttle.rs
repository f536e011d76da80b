//! Minimum spacing between consecutive requests.

use tokio::time::Instant;

use super::*;

/// Guarantees at least `min_interval` between two calls to [`Throttle::wait`].
///
/// The first call never waits.
#[derive(Debug)]
pub struct Throttle {
  /// Required gap between two requests
  min_interval: Duration,
  /// When the previous request was let through
  last:         Option<Instant>,
}

impl Throttle {
  /// Creates a throttle that has not let anything through yet.
  pub fn new(min_interval: Duration) -> Self { Self { min_interval, last: None } }

  /// Sleeps for whatever remains of the interval since the previous call, then records now.
  ///
  /// Returns how long it slept.
  pub async fn wait(&mut self) -> Duration {
    let waited = match self.last {
      Some(last) => {
        let remaining = self.min_interval.saturating_sub(last.elapsed());
        if !remaining.is_zero() {
          trace!("Throttling for {remaining:?}");
          tokio::time::sleep(remaining).await;
        }
        remaining
      },
      None => Duration::ZERO,
    };
    self.last = Some(Instant::now());
    waited
  }
}

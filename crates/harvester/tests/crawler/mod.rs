use std::time::Duration;

use harvester::{
  checkpoint::CheckpointStore,
  crawler::{Crawler, StepOutcome},
};
use tokio::time::Instant;

use super::*;

#[tokio::test]
async fn test_resumes_before_checkpointed_month() {
  let (config, _dir) = test_config();
  CheckpointStore::new(&config.checkpoint_path).save(cursor(2024, 6)).unwrap();

  let mut crawler =
    Crawler::resume(config, ScriptedSearch::default(), RecordingDownload::default()).unwrap();
  assert_eq!(crawler.cursor(), cursor(2024, 5));

  let outcome = crawler.step().await;

  assert!(matches!(
    outcome,
    StepOutcome::Completed { cursor: month, checkpointed: true, .. } if month == cursor(2024, 5)
  ));
  let queries = crawler.fetcher().search_client().queries();
  assert_eq!(queries.len(), 1);
  assert!(queries[0].contains("submittedDate:[202405010000 TO 202405312359]"));
  assert_eq!(crawler.checkpoints().load(), Some(cursor(2024, 5)));
  assert_eq!(crawler.cursor(), cursor(2024, 4));
}

#[tokio::test]
async fn test_fresh_start_walks_back_across_years() {
  let (config, _dir) = test_config();
  let mut crawler =
    Crawler::resume(config, ScriptedSearch::default(), RecordingDownload::default()).unwrap();
  assert_eq!(crawler.cursor(), cursor(2024, 12));

  for _ in 0..24 {
    crawler.step().await;
  }

  assert_eq!(crawler.cursor(), cursor(2022, 12));
  assert_eq!(crawler.totals().months, 24);
  let queries = crawler.fetcher().search_client().queries();
  assert!(queries[0].contains("[202412010000 TO 202412312359]"));
  assert!(queries[10].contains("[202402010000 TO 202402292359]"));
  assert!(queries[22].contains("[202302010000 TO 202302282359]"));
  assert!(queries[23].contains("[202301010000 TO 202301312359]"));
  assert_eq!(crawler.checkpoints().load(), Some(cursor(2023, 1)));
}

#[tokio::test]
async fn test_month_with_failures_is_not_checkpointed() {
  let (config, _dir) = test_config();
  let mut broken = paper("2412.00002v1");
  broken.pdf_url = None;
  let search = ScriptedSearch::new([Ok(vec![paper("2412.00001v1"), broken])]);
  let mut crawler = Crawler::resume(config, search, RecordingDownload::default()).unwrap();

  let outcome = crawler.step().await;

  match outcome {
    StepOutcome::Completed { cursor: month, result, checkpointed, next } => {
      assert_eq!(month, cursor(2024, 12));
      assert_eq!((result.found, result.downloaded, result.failed), (2, 1, 1));
      assert!(!checkpointed);
      assert_eq!(next, Some(cursor(2024, 11)));
    },
    other => panic!("unexpected outcome: {other:?}"),
  }
  assert_eq!(crawler.checkpoints().load(), None);
  assert_eq!(crawler.cursor(), cursor(2024, 11));

  // A later clean month moves the checkpoint past the failed one.
  crawler.step().await;
  assert_eq!(crawler.checkpoints().load(), Some(cursor(2024, 11)));
}

#[tokio::test]
async fn test_rerun_skips_stored_papers() {
  let (config, _dir) = test_config();
  let papers = vec![paper("2412.00001v1"), paper("2412.00002v1")];
  std::fs::create_dir_all(&config.download_dir).unwrap();
  for paper in &papers {
    std::fs::write(config.download_dir.join(paper.filename()), b"%PDF-1.4").unwrap();
  }
  let search = ScriptedSearch::new([Ok(papers)]);
  let mut crawler = Crawler::resume(config, search, RecordingDownload::default()).unwrap();

  let outcome = crawler.step().await;

  let StepOutcome::Completed { result, checkpointed, .. } = outcome else {
    panic!("unexpected outcome: {outcome:?}");
  };
  assert_eq!((result.downloaded, result.skipped, result.failed), (0, 2, 0));
  assert!(checkpointed);
  assert_eq!(crawler.fetcher().download_client().calls(), 0);
}

#[tokio::test]
async fn test_search_failure_retries_same_month() {
  let (config, _dir) = test_config();
  let search = ScriptedSearch::new([Err(search_failure()), Ok(vec![paper("2412.00001v1")])]);
  let mut crawler = Crawler::resume(config, search, RecordingDownload::default()).unwrap();

  let outcome = crawler.step().await;
  assert!(matches!(
    outcome,
    StepOutcome::Retrying { cursor: month, .. } if month == cursor(2024, 12)
  ));
  assert_eq!(crawler.cursor(), cursor(2024, 12));
  assert_eq!(crawler.checkpoints().load(), None);

  let outcome = crawler.step().await;
  assert!(matches!(
    outcome,
    StepOutcome::Completed { cursor: month, checkpointed: true, .. } if month == cursor(2024, 12)
  ));
  assert_eq!(crawler.cursor(), cursor(2024, 11));

  let totals = crawler.totals();
  assert_eq!((totals.months, totals.search_failures, totals.downloaded), (1, 1, 1));
  let queries = crawler.fetcher().search_client().queries();
  assert_eq!(queries[0], queries[1]);
}

#[tokio::test]
async fn test_unusable_checkpoint_starts_fresh() {
  let (config, _dir) = test_config();
  std::fs::write(&config.checkpoint_path, "{ \"last_completed_month\": \"soon\" }").unwrap();

  let crawler =
    Crawler::resume(config, ScriptedSearch::default(), RecordingDownload::default()).unwrap();

  assert_eq!(crawler.cursor(), cursor(2024, 12));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
  let (config, _dir) = test_config();
  let config = config.with_batch_size(0);

  let result = Crawler::resume(config, ScriptedSearch::default(), RecordingDownload::default());

  assert!(matches!(result, Err(HarvestError::Config(_))));
}

#[tokio::test]
async fn test_run_stops_at_start_of_calendar() {
  let (config, _dir) = test_config();
  let config = config.with_start_month(cursor(1, 2));
  let mut crawler =
    Crawler::resume(config, ScriptedSearch::default(), RecordingDownload::default()).unwrap();

  let mut seen = Vec::new();
  crawler
    .run_with(|outcome, _| {
      if let StepOutcome::Completed { cursor, .. } = outcome {
        seen.push(*cursor);
      }
    })
    .await;

  assert_eq!(seen, vec![cursor(1, 2), cursor(1, 1)]);
  assert_eq!(crawler.checkpoints().load(), Some(cursor(1, 1)));
}

#[tokio::test(start_paused = true)]
async fn test_month_is_paced_per_paper_then_per_month() {
  let (config, _dir) = paced_config();
  let timing = config.timing;
  let stored = paper("2412.00001v1");
  let mut missing_url = paper("2412.00002v1");
  missing_url.pdf_url = None;
  std::fs::create_dir_all(&config.download_dir).unwrap();
  std::fs::write(config.download_dir.join(stored.filename()), b"%PDF-1.4").unwrap();
  let search = ScriptedSearch::new([Ok(vec![stored, missing_url, paper("2412.00003v1")])]);
  let mut crawler = Crawler::resume(config, search, RecordingDownload::default()).unwrap();

  let start = Instant::now();
  let outcome = crawler.step().await;
  let elapsed = start.elapsed();

  let StepOutcome::Completed { result, .. } = outcome else {
    panic!("unexpected outcome: {outcome:?}");
  };
  assert_eq!((result.skipped, result.failed, result.downloaded), (1, 1, 1));
  let expected = timing.paper_delay() * 3 + timing.month_delay();
  assert_eq!(expected, Duration::from_secs(6));
  assert!(elapsed >= expected && elapsed < expected + Duration::from_secs(1), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_waits_before_retrying() {
  let (config, _dir) = paced_config();
  let timing = config.timing;
  let search = ScriptedSearch::new([Err(search_failure())]);
  let mut crawler = Crawler::resume(config, search, RecordingDownload::default()).unwrap();

  let start = Instant::now();
  let outcome = crawler.step().await;
  let elapsed = start.elapsed();

  assert!(matches!(outcome, StepOutcome::Retrying { .. }));
  assert_eq!(timing.search_retry_delay(), Duration::from_secs(60));
  assert!(
    elapsed >= timing.search_retry_delay()
      && elapsed < timing.search_retry_delay() + Duration::from_secs(1),
    "{elapsed:?}"
  );

  // The retry delay already covers the search interval, so the retry goes out right away.
  let start = Instant::now();
  crawler.step().await;
  assert!(start.elapsed() >= timing.month_delay());
  assert!(start.elapsed() < timing.month_delay() + Duration::from_secs(1));
}

use std::{collections::VecDeque, path::Path, sync::Mutex};

use async_trait::async_trait;
use chrono::Utc;
use harvester::{
  calendar::MonthCursor,
  configuration::{Config, Timing},
  error::{HarvestError, Result},
  fetch::{PaperDownload, PaperSearch, SearchHit, SearchRequest},
  paper::PaperRecord,
};
use tempfile::{tempdir, TempDir};

mod crawler;

/// Answers searches from a script, then with empty months once the script runs out.
#[derive(Default)]
pub struct ScriptedSearch {
  responses: Mutex<VecDeque<Result<Vec<PaperRecord>>>>,
  requests:  Mutex<Vec<SearchRequest>>,
}

impl ScriptedSearch {
  pub fn new(responses: impl IntoIterator<Item = Result<Vec<PaperRecord>>>) -> Self {
    Self { responses: Mutex::new(responses.into_iter().collect()), ..Self::default() }
  }

  pub fn queries(&self) -> Vec<String> {
    self.requests.lock().unwrap().iter().map(|request| request.query.clone()).collect()
  }
}

#[async_trait]
impl PaperSearch for ScriptedSearch {
  async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
    self.requests.lock().unwrap().push(request.clone());
    let response = self.responses.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()));
    response.map(|papers| papers.into_iter().map(Ok).collect())
  }
}

/// Writes a stub PDF for every request and remembers the URLs.
#[derive(Default)]
pub struct RecordingDownload {
  urls: Mutex<Vec<String>>,
}

impl RecordingDownload {
  pub fn calls(&self) -> usize { self.urls.lock().unwrap().len() }
}

#[async_trait]
impl PaperDownload for RecordingDownload {
  async fn download(&self, url: &str, destination: &Path) -> Result<()> {
    self.urls.lock().unwrap().push(url.to_string());
    std::fs::write(destination, b"%PDF-1.4")?;
    Ok(())
  }
}

pub fn paper(identifier: &str) -> PaperRecord {
  PaperRecord {
    identifier: identifier.to_string(),
    pdf_url:    Some(format!("https://arxiv.org/pdf/{identifier}")),
    title:      format!("Paper {identifier}"),
    authors:    vec!["Alice Researcher".to_string()],
    categories: vec!["cs.AI".to_string()],
    published:  Utc::now(),
  }
}

pub fn cursor(year: i32, month: u32) -> MonthCursor { MonthCursor::new(year, month).unwrap() }

pub fn search_failure() -> HarvestError {
  HarvestError::HttpStatus { url: "https://export.arxiv.org/api/query".to_string(), status: 503 }
}

/// Configuration rooted in a fresh temporary directory, without any pauses.
pub fn test_config() -> (Config, TempDir) {
  let (config, dir) = paced_config();
  (config.with_timing(Timing::none()), dir)
}

/// Configuration rooted in a fresh temporary directory, with the default pauses.
pub fn paced_config() -> (Config, TempDir) {
  let dir = tempdir().unwrap();
  let config = Config::default()
    .with_download_dir(dir.path().join("pdf"))
    .with_checkpoint_path(dir.path().join("checkpoint.json"))
    .with_start_month(cursor(2024, 12));
  (config, dir)
}

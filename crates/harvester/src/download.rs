//! Download collaborator that streams PDFs over HTTP.
//!
//! The body is streamed into `<destination>.part` and renamed once complete. The existence of
//! the final file is what marks a paper as stored, so an interrupted transfer must never leave a
//! file under that name.

use futures::StreamExt;
use tokio::{fs::File, io::AsyncWriteExt};

use super::*;
use crate::{configuration::Config, fetch::PaperDownload, retry::RetryPolicy};

/// Streams PDFs to disk, retrying transient failures.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
  /// Internal web client reused for every download
  client: reqwest::Client,
  /// Attempts and backoff for a single download
  retry:  RetryPolicy,
}

impl HttpDownloader {
  /// Creates a downloader with the given retry policy.
  pub fn new(retry: RetryPolicy) -> Self { Self { client: reqwest::Client::new(), retry } }

  /// Creates a downloader with the retry settings from `config`.
  pub fn from_config(config: &Config) -> Self { Self::new(config.download_retry()) }

  /// A single attempt: request, stream the body into a partial file, rename it into place.
  async fn fetch_once(&self, url: &str, destination: &Path) -> Result<u64> {
    let response = self.client.get(url).send().await?;
    if !response.status().is_success() {
      trace!("{url} response: {response:?}");
      return Err(HarvestError::HttpStatus { url: url.to_string(), status: response.status().as_u16() });
    }

    let expected = response.content_length();
    let partial = partial_path(destination);
    let written = match write_body(response, &partial).await {
      Ok(written) => written,
      Err(e) => {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
      },
    };

    tokio::fs::rename(&partial, destination).await?;
    debug!(url, path = %destination.display(), bytes = written, expected, "Download complete");
    Ok(written)
  }
}

impl Default for HttpDownloader {
  fn default() -> Self { Self::new(RetryPolicy::default()) }
}

#[async_trait]
impl PaperDownload for HttpDownloader {
  async fn download(&self, url: &str, destination: &Path) -> Result<()> {
    self
      .retry
      .run(url, move |attempt| {
        trace!(url, attempt, "Downloading");
        self.fetch_once(url, destination)
      })
      .await
      .map(|_| ())
  }
}

/// Copies the response body chunk by chunk into a freshly created file.
async fn write_body(response: reqwest::Response, path: &Path) -> Result<u64> {
  let mut file = File::create(path).await?;
  let mut stream = response.bytes_stream();
  let mut written = 0u64;
  while let Some(chunk) = stream.next().await {
    let chunk = chunk?;
    file.write_all(&chunk).await?;
    written += chunk.len() as u64;
  }
  file.flush().await?;
  Ok(written)
}

/// `paper.pdf` becomes `paper.pdf.part`.
fn partial_path(destination: &Path) -> PathBuf {
  let mut name = destination.file_name().map(|name| name.to_os_string()).unwrap_or_default();
  name.push(".part");
  destination.with_file_name(name)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_partial_path() {
    let path = PathBuf::from("data").join("pdf").join("2402.01234v1.pdf");
    assert_eq!(partial_path(&path), PathBuf::from("data").join("pdf").join("2402.01234v1.pdf.part"));
  }

  #[traced_test]
  #[tokio::test]
  async fn test_unreachable_host_leaves_no_file() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("paper.pdf");
    let downloader = HttpDownloader::new(RetryPolicy::new(2, Duration::ZERO));

    // Nothing listens on the discard port locally.
    let result = downloader.download("http://127.0.0.1:9/paper.pdf", &destination).await;

    assert!(result.is_err());
    assert!(!destination.exists());
    assert!(!partial_path(&destination).exists());
    assert!(logs_contain("Attempt failed, retrying"));
  }
}

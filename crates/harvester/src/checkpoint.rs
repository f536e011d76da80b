//! Durable record of the last month that was harvested without failures.
//!
//! The checkpoint is a small JSON document holding one ISO-8601 timestamp:
//!
//! ```json
//! { "last_completed_month": "2024-06-01T00:00:00" }
//! ```
//!
//! A missing or unreadable checkpoint is never fatal; it simply means the walk starts over from
//! the configured start month. Writes go to a temporary file next to the checkpoint which is then
//! renamed over it, so a crash mid-write leaves the previous checkpoint intact.

use std::io::Write;

use chrono::NaiveDateTime;
use tempfile::NamedTempFile;

use super::*;

/// Format used when writing `last_completed_month`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// On-disk representation of the checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
  /// Start of the last completed month as an ISO-8601 date-time
  pub last_completed_month: String,
}

impl Checkpoint {
  /// Checkpoint for a completed month.
  pub fn new(cursor: MonthCursor) -> Self {
    Self { last_completed_month: cursor.start_of_month().format(TIMESTAMP_FORMAT).to_string() }
  }

  /// The month named by the stored timestamp.
  ///
  /// Accepts the format written by [`Checkpoint::new`], RFC 3339 timestamps with an offset
  /// (`2024-06-01T00:00:00+00:00`) and plain dates (`2024-06-01`). Only the year and month are
  /// kept.
  pub fn cursor(&self) -> Result<MonthCursor> {
    let value = self.last_completed_month.trim();
    let date = if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
      datetime.date_naive()
    } else if let Ok(datetime) = value.parse::<NaiveDateTime>() {
      datetime.date()
    } else if let Ok(date) = value.parse::<NaiveDate>() {
      date
    } else {
      return Err(HarvestError::InvalidCursor(value.to_owned()));
    };
    MonthCursor::containing(date)
  }
}

/// Reads and writes the checkpoint file.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
  /// Location of the checkpoint file
  path: PathBuf,
}

impl CheckpointStore {
  /// A store backed by the file at `path`. Nothing is read or created yet.
  pub fn new(path: impl AsRef<Path>) -> Self { Self { path: path.as_ref().to_path_buf() } }

  /// Location of the checkpoint file.
  pub fn path(&self) -> &Path { &self.path }

  /// The last completed month, if a usable checkpoint exists.
  ///
  /// A missing file returns `None` silently. An unreadable or malformed file is logged as a
  /// warning and also returns `None`.
  pub fn load(&self) -> Option<MonthCursor> {
    match self.try_load() {
      Ok(cursor) => cursor,
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "Ignoring unusable checkpoint");
        None
      },
    }
  }

  /// Like [`CheckpointStore::load`], but reports why a present checkpoint could not be used.
  pub fn try_load(&self) -> Result<Option<MonthCursor>> {
    let content = match std::fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        debug!(path = %self.path.display(), "No checkpoint found");
        return Ok(None);
      },
      Err(e) => return Err(e.into()),
    };
    let checkpoint: Checkpoint = serde_json::from_str(&content)?;
    let cursor = checkpoint.cursor()?;
    debug!(path = %self.path.display(), %cursor, "Loaded checkpoint");
    Ok(Some(cursor))
  }

  /// Records `cursor` as the last completed month, replacing any previous checkpoint.
  ///
  /// Parent directories are created on demand.
  pub fn save(&self, cursor: MonthCursor) -> Result<()> {
    let parent = match self.path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
      _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let json = serde_json::to_string_pretty(&Checkpoint::new(cursor))?;
    let mut file = NamedTempFile::new_in(&parent)?;
    file.write_all(json.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(&self.path)?;

    info!(path = %self.path.display(), %cursor, "Saved checkpoint");
    Ok(())
  }
}

/// The month to process first.
///
/// With a checkpoint, processing resumes one month before the last completed month; the
/// completed month itself is never repeated. Without one, the walk begins at `start`.
pub fn resume_cursor(checkpoint: Option<MonthCursor>, start: MonthCursor) -> MonthCursor {
  match checkpoint {
    Some(completed) => match completed.previous() {
      Some(cursor) => cursor,
      None => {
        warn!(%completed, "Checkpoint is at the start of the calendar, starting from {start}");
        start
      },
    },
    None => start,
  }
}

//! Paper records returned by a search.
//!
//! A [`PaperRecord`] carries only what the harvester needs to decide whether and where to store a
//! PDF, plus a few fields that are logged while a month is processed.

use super::*;

/// A single search hit.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use harvester::paper::PaperRecord;
///
/// let paper = PaperRecord {
///   identifier: "math.GT/0309136v1".to_string(),
///   pdf_url:    Some("https://arxiv.org/pdf/math/0309136v1".to_string()),
///   title:      "A note on knots".to_string(),
///   authors:    vec!["Alice Researcher".to_string()],
///   categories: vec!["math.GT".to_string()],
///   published:  Utc::now(),
/// };
/// assert_eq!(paper.filename().to_str(), Some("math.GT_0309136v1.pdf"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
  /// Short arXiv identifier including the version, e.g. `2401.01234v1`
  pub identifier: String,
  /// Link to the PDF, if the index provided one
  pub pdf_url:    Option<String>,
  /// The paper's title with whitespace collapsed
  pub title:      String,
  /// Author names in listed order
  pub authors:    Vec<String>,
  /// Subject categories, primary first
  pub categories: Vec<String>,
  /// First submission timestamp
  pub published:  DateTime<Utc>,
}

impl PaperRecord {
  /// The identifier with path separators replaced so it can be used as a file name.
  ///
  /// Old-style arXiv identifiers such as `hep-th/9901001v2` contain a `/`.
  pub fn sanitized_identifier(&self) -> String { sanitize_identifier(&self.identifier) }

  /// File name of the stored PDF: `<sanitized-identifier>.pdf`.
  pub fn filename(&self) -> PathBuf { PathBuf::from(format!("{}.pdf", self.sanitized_identifier())) }
}

/// Replaces `/` and `\` with `_`.
pub fn sanitize_identifier(identifier: &str) -> String {
  identifier.trim().replace(['/', '\\'], "_")
}

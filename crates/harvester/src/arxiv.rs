//! Search collaborator backed by the arXiv API.
//!
//! arXiv answers queries with an Atom feed. Each `<entry>` is turned into a [`PaperRecord`]:
//!
//! ```xml
//! <entry>
//!   <id>http://arxiv.org/abs/2402.01234v1</id>
//!   <published>2024-02-02T18:59:59Z</published>
//!   <title>A Paper Title</title>
//!   <author><name>Alice Researcher</name></author>
//!   <link href="http://arxiv.org/abs/2402.01234v1" rel="alternate" type="text/html"/>
//!   <link title="pdf" href="http://arxiv.org/pdf/2402.01234v1" rel="related" type="application/pdf"/>
//!   <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
//! </entry>
//! ```
//!
//! A malformed query is reported by arXiv as a single entry whose id points at
//! `http://arxiv.org/api/errors`; that is surfaced as [`HarvestError::ApiError`].
//!
//! Entries are decoded leniently. An entry without an id or title, or with a `published` value
//! that is not RFC 3339, becomes a [`HarvestError::InvalidRecord`] hit instead of failing the
//! whole response.

use quick_xml::de::from_str;
use reqwest::Url;

use super::*;
use crate::fetch::{PaperSearch, SearchHit, SearchRequest, SortField, SortOrder};

/// Internal representation of the arXiv API's Atom feed response.
#[derive(Debug, Deserialize)]
struct Feed {
  /// A feed may contain zero or more entries
  #[serde(rename = "entry", default)]
  entries: Vec<Entry>,
}

/// Internal representation of a paper entry from arXiv's API response.
///
/// Everything is optional here; [`PaperRecord::try_from`] decides what is required.
#[derive(Debug, Deserialize)]
struct Entry {
  /// Abstract page URL, e.g. `http://arxiv.org/abs/2402.01234v1`
  id:         Option<String>,
  /// Paper title, possibly wrapped over several lines
  title:      Option<String>,
  /// First submission timestamp, RFC 3339
  published:  Option<String>,
  /// Paper authors
  #[serde(rename = "author", default)]
  authors:    Vec<Author>,
  /// Alternate, PDF and DOI links
  #[serde(rename = "link", default)]
  links:      Vec<Link>,
  /// Subject categories
  #[serde(rename = "category", default)]
  categories: Vec<Category>,
}

/// Internal representation of an author from arXiv's API response.
#[derive(Debug, Deserialize)]
struct Author {
  /// Author's full name
  #[serde(default)]
  name: String,
}

/// An Atom `<link>` element.
#[derive(Debug, Deserialize)]
struct Link {
  /// Target URL
  #[serde(rename = "@href", default)]
  href:  Option<String>,
  /// `pdf` for the PDF link
  #[serde(rename = "@title", default)]
  title: Option<String>,
  /// MIME type of the target
  #[serde(rename = "@type", default)]
  mime:  Option<String>,
}

/// An Atom `<category>` element.
#[derive(Debug, Deserialize)]
struct Category {
  /// Category name, e.g. `cs.AI`
  #[serde(rename = "@term", default)]
  term: String,
}

/// Client for the arXiv query API.
///
/// # Examples
///
/// ```no_run
/// use harvester::{
///   arxiv::ArxivClient,
///   fetch::{PaperSearch, SearchRequest, SortField, SortOrder},
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ArxivClient::new("https://export.arxiv.org/api/query");
/// let request = SearchRequest {
///   query:       "cat:cs.AI AND submittedDate:[202402010000 TO 202402292359]".to_string(),
///   max_results: 10,
///   sort_by:     SortField::SubmittedDate,
///   sort_order:  SortOrder::Descending,
/// };
/// for hit in client.search(&request).await? {
///   match hit {
///     Ok(paper) => println!("{}: {}", paper.identifier, paper.title),
///     Err(e) => eprintln!("skipping: {e}"),
///   }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArxivClient {
  /// Internal web client used to connect to the API.
  client:  reqwest::Client,
  /// Query endpoint
  api_url: String,
}

impl ArxivClient {
  /// Creates a client for the endpoint at `api_url`.
  pub fn new(api_url: impl Into<String>) -> Self {
    Self { client: reqwest::Client::new(), api_url: api_url.into() }
  }

  /// Full request URL for `request`.
  pub fn request_url(&self, request: &SearchRequest) -> Result<Url> {
    let mut url = Url::parse(&self.api_url)
      .map_err(|e| HarvestError::Config(format!("Invalid API URL {}: {e}", self.api_url)))?;
    url
      .query_pairs_mut()
      .append_pair("search_query", &request.query)
      .append_pair("start", "0")
      .append_pair("max_results", &request.max_results.to_string())
      .append_pair("sortBy", sort_field(request.sort_by))
      .append_pair("sortOrder", sort_order(request.sort_order));
    Ok(url)
  }
}

#[async_trait]
impl PaperSearch for ArxivClient {
  async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
    let url = self.request_url(request)?;
    debug!("Fetching from arXiv via: {url}");

    let response = self.client.get(url.clone()).send().await?;
    if !response.status().is_success() {
      return Err(HarvestError::HttpStatus {
        url:    url.to_string(),
        status: response.status().as_u16(),
      });
    }
    let body = response.text().await?;
    trace!("arXiv response: {body}");

    parse_feed(&body)
  }
}

/// Converts an Atom feed into one hit per entry.
///
/// Only a document that is not a feed at all, or an arXiv error entry, fails as a whole.
pub fn parse_feed(xml: &str) -> Result<Vec<SearchHit>> {
  let feed: Feed = from_str(xml)?;

  let is_error = |entry: &&Entry| entry.id.as_deref().is_some_and(|id| id.contains("/api/errors"));
  if let Some(error) = feed.entries.iter().find(is_error) {
    let message = error.title.as_deref().unwrap_or_default();
    return Err(HarvestError::ApiError(normalize_whitespace(message)));
  }

  Ok(feed.entries.into_iter().map(PaperRecord::try_from).collect())
}

impl TryFrom<Entry> for PaperRecord {
  type Error = HarvestError;

  fn try_from(entry: Entry) -> Result<Self> {
    let identifier = entry.id.as_deref().map(short_id).unwrap_or_default();
    let invalid =
      |reason: String| HarvestError::InvalidRecord { identifier: identifier.clone(), reason };

    if identifier.is_empty() {
      return Err(invalid("missing id".to_string()));
    }
    let title = entry
      .title
      .as_deref()
      .map(normalize_whitespace)
      .filter(|title| !title.is_empty())
      .ok_or_else(|| invalid("missing title".to_string()))?;
    let published = entry
      .published
      .as_deref()
      .map(str::trim)
      .ok_or_else(|| invalid("missing published date".to_string()))?;
    let published = DateTime::parse_from_rfc3339(published)
      .map_err(|e| invalid(format!("unparseable published date \"{published}\": {e}")))?
      .with_timezone(&Utc);

    let pdf_url = entry
      .links
      .iter()
      .find(|link| {
        link.title.as_deref() == Some("pdf") || link.mime.as_deref() == Some("application/pdf")
      })
      .and_then(|link| link.href.clone());

    Ok(PaperRecord {
      identifier,
      pdf_url,
      title,
      authors: entry.authors.into_iter().map(|author| normalize_whitespace(&author.name)).collect(),
      categories: entry
        .categories
        .into_iter()
        .map(|category| category.term)
        .filter(|term| !term.is_empty())
        .collect(),
      published,
    })
  }
}

/// `http://arxiv.org/abs/hep-th/9901001v2` becomes `hep-th/9901001v2`.
fn short_id(id: &str) -> String {
  let id = id.trim();
  match id.split_once("/abs/") {
    Some((_, short)) => short.to_string(),
    None => id.to_string(),
  }
}

/// Collapses runs of whitespace, including the line breaks arXiv puts in long titles.
fn normalize_whitespace(text: &str) -> String { text.split_whitespace().collect::<Vec<_>>().join(" ") }

/// API name of a sort field.
fn sort_field(field: SortField) -> &'static str {
  match field {
    SortField::SubmittedDate => "submittedDate",
    SortField::LastUpdatedDate => "lastUpdatedDate",
    SortField::Relevance => "relevance",
  }
}

/// API name of a sort order.
fn sort_order(order: SortOrder) -> &'static str {
  match order {
    SortOrder::Ascending => "ascending",
    SortOrder::Descending => "descending",
  }
}

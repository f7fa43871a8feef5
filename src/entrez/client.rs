//! HTTP client for the Entrez index and record source.
//!
//! One `reqwest::Client` built at startup with the configured per-request
//! deadline; cheap to clone. All methods are sequential single round-trips
//! apart from the documented one-shot retries.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::EntrezConfig;
use super::record;
use super::{AuthorHits, EntrezError, PaperRecord};

/// Honorific prefixes stripped from author names, longest first so the
/// dotted forms win over their bare prefixes ("Dr." before "Dr").
const HONORIFICS: [&str; 8] = [
    "Professor", "Prof.", "Prof", "Mrs.", "Dr.", "Mr.", "Ms.", "Dr",
];

// ── Client ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EntrezClient {
    http: Client,
    api_base_url: String,
    db: String,
    author_retmax: u32,
    title_retmax: u32,
    sort: String,
}

impl EntrezClient {
    pub fn new(config: &EntrezConfig) -> Result<Self, EntrezError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| EntrezError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base_url: config.api_base_url.clone(),
            db: config.db.clone(),
            author_retmax: config.author_retmax,
            title_retmax: config.title_retmax,
            sort: config.sort.clone(),
        })
    }

    /// Search the index for papers by `name`.
    ///
    /// The name is normalized first (honorifics stripped). A zero-match
    /// result triggers exactly one retry with the final whitespace token
    /// as a last-name-only query; a non-empty retry wins. Zero totals on
    /// both attempts yield empty `ids`, never an error.
    pub async fn search_by_author(&self, name: &str) -> Result<AuthorHits, EntrezError> {
        let cleaned = strip_honorifics(name);
        debug!(original = name, cleaned = %cleaned, "author search");

        let first = self
            .esearch(&format!("{cleaned}[Author]"), self.author_retmax, true)
            .await?;
        if first.count > 0 {
            return Ok(AuthorHits { term: cleaned, count: first.count, ids: first.ids });
        }

        let last_name = cleaned
            .split_whitespace()
            .last()
            .unwrap_or(cleaned.as_str())
            .to_string();
        info!(%last_name, "author search empty, retrying with last name only");
        let retry = self
            .esearch(&format!("{last_name}[Author]"), self.author_retmax, true)
            .await?;
        if retry.count > 0 {
            Ok(AuthorHits { term: last_name, count: retry.count, ids: retry.ids })
        } else {
            Ok(AuthorHits { term: cleaned, count: 0, ids: Vec::new() })
        }
    }

    /// Search the index for one paper by title and hydrate the best match.
    ///
    /// Tries an exact quoted-title query first, then once more unquoted
    /// (partial-match semantics are the index's business). The first
    /// identifier of a non-empty result is immediately resolved into a
    /// full record; this path never returns a bare identifier list.
    pub async fn search_by_title(&self, title: &str) -> Result<Option<PaperRecord>, EntrezError> {
        debug!(title, "title search");

        let exact = self
            .esearch(&format!("\"{title}\"[Title]"), self.title_retmax, false)
            .await?;
        let best = match exact.ids.first() {
            Some(id) => Some(id.clone()),
            None => {
                let partial = self
                    .esearch(&format!("{title}[Title]"), self.title_retmax, false)
                    .await?;
                partial.ids.first().cloned()
            }
        };

        match best {
            Some(id) => self.fetch_record(&id).await,
            None => Ok(None),
        }
    }

    /// Fetch and parse one record from the record source.
    ///
    /// Fast-fails on a non-numeric identifier before any network call.
    /// A syntactically valid identifier with no record behind it is
    /// `Ok(None)`, not an error.
    pub async fn fetch_record(&self, pmid: &str) -> Result<Option<PaperRecord>, EntrezError> {
        if !is_valid_pmid(pmid) {
            return Err(EntrezError::InvalidId(pmid.to_string()));
        }

        debug!(pmid, "fetching record");
        let url = format!("{}/efetch.fcgi", self.api_base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("db", self.db.as_str()), ("id", pmid), ("retmode", "xml")])
            .send()
            .await
            .map_err(|e| EntrezError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| EntrezError::Transport(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| EntrezError::Transport(format!("efetch body: {e}")))?;

        record::parse_first_article(&body, pmid)
    }

    // ── Wire level ────────────────────────────────────────────────────────────

    async fn esearch(&self, term: &str, retmax: u32, sorted: bool) -> Result<EsearchHits, EntrezError> {
        let url = format!("{}/esearch.fcgi", self.api_base_url);
        let retmax = retmax.to_string();
        let mut params = vec![
            ("db", self.db.as_str()),
            ("term", term),
            ("retmax", retmax.as_str()),
            ("retmode", "json"),
        ];
        if sorted && !self.sort.is_empty() {
            params.push(("sort", self.sort.as_str()));
        }

        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| EntrezError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| EntrezError::Transport(e.to_string()))?;

        let envelope = response
            .json::<EsearchEnvelope>()
            .await
            .map_err(|e| EntrezError::Parse(format!("esearch body: {e}")))?;

        let result = envelope.esearchresult;
        let count = result
            .count
            .parse::<u64>()
            .map_err(|e| EntrezError::Parse(format!("esearch count '{}': {e}", result.count)))?;

        Ok(EsearchHits { count, ids: result.idlist })
    }
}

struct EsearchHits {
    count: u64,
    ids: Vec<String>,
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EsearchEnvelope {
    esearchresult: EsearchResult,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    /// The index encodes the total as a string.
    #[serde(default = "zero")]
    count: String,
    #[serde(default)]
    idlist: Vec<String>,
}

fn zero() -> String {
    "0".to_string()
}

// ── Normalization ─────────────────────────────────────────────────────────────

/// Strip leading honorifics ("Dr.", "Prof.", ...) from an author name.
///
/// Case-sensitive, longest literal match at string start, repeated until
/// no prefix applies, so the result is a fixed point of this function.
/// Each honorific must be followed by a space; "Drake" stays intact.
pub fn strip_honorifics(name: &str) -> String {
    let mut cleaned = name.trim();
    'outer: loop {
        for prefix in HONORIFICS {
            if let Some(rest) = cleaned.strip_prefix(prefix) {
                if let Some(rest) = rest.strip_prefix(' ') {
                    cleaned = rest.trim_start();
                    continue 'outer;
                }
            }
        }
        break;
    }
    cleaned.to_string()
}

/// An identifier may reach the record source only if it is all decimal digits.
pub fn is_valid_pmid(pmid: &str) -> bool {
    !pmid.is_empty() && pmid.bytes().all(|b| b.is_ascii_digit())
}

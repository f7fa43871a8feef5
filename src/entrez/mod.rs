//! Entrez E-utilities access: the search and fetch leaves of the assistant.
//!
//! Two operations against the index (`esearch.fcgi`) and one against the
//! record source (`efetch.fcgi`), each returning an explicit tagged result.
//! Errors never cross this boundary as panics; callers branch on
//! `Ok(hits)` / `Ok(Some(record))` / `Ok(None)` / `Err(EntrezError)`.

pub mod client;
pub mod record;

pub use self::client::EntrezClient;

use serde::Serialize;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EntrezError {
    /// Malformed identifier. Terminal for the call, never retried, and
    /// raised before any network traffic.
    #[error("invalid paper id '{0}': ids must be numeric")]
    InvalidId(String),

    /// Network-level failure against the index or record source.
    #[error("entrez request failed: {0}")]
    Transport(String),

    /// The service answered, but with a body we could not interpret.
    #[error("malformed entrez response: {0}")]
    Parse(String),
}

// ── Data model ────────────────────────────────────────────────────────────────

/// One fully-hydrated bibliographic record.
///
/// Produced exclusively by [`EntrezClient::fetch_record`]; immutable once
/// built. Missing source fields land as the fixed fallback strings rather
/// than options, mirroring what the record source itself omits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperRecord {
    pub pmid: String,
    pub title: String,
    /// Author full names in the source's listed order.
    pub authors: Vec<String>,
    pub journal: String,
    pub year: String,
    pub doi: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// Outcome of an author query against the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorHits {
    /// The normalized term actually queried (honorifics stripped, or the
    /// bare last name when the fallback attempt won).
    pub term: String,
    /// Total matches reported by the index, which may exceed `ids.len()`.
    pub count: u64,
    /// Bounded prefix of the match list, in index order.
    pub ids: Vec<String>,
}

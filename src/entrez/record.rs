//! efetch XML parsing: one `PubmedArticle` document into a [`PaperRecord`].
//!
//! Streaming event reader rather than a DOM. Only the handful of elements
//! the record model needs are tracked; everything else passes through.
//! Text inside inline markup (`<i>`, `<sub>`, ...) is accumulated for the
//! title and abstract, so formatted titles survive intact.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{EntrezError, PaperRecord};

const NO_TITLE: &str = "No title";
const NO_ABSTRACT: &str = "No abstract available";
const UNKNOWN_JOURNAL: &str = "Unknown journal";
const UNKNOWN_YEAR: &str = "Unknown year";

/// Parse the first `PubmedArticle` of an efetch response body.
///
/// Returns `Ok(None)` when the body contains no article at all (the record
/// source's way of saying a syntactically valid id has nothing behind it).
pub fn parse_first_article(xml: &str, pmid: &str) -> Result<Option<PaperRecord>, EntrezError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    // Element path from the document root to the current node.
    let mut path: Vec<String> = Vec::new();
    let mut in_article = false;
    let mut seen_article = false;

    let mut title = String::new();
    let mut journal = String::new();
    let mut year = String::new();
    let mut doi: Option<String> = None;
    let mut authors: Vec<String> = Vec::new();
    let mut abstract_parts: Vec<(Option<String>, String)> = Vec::new();

    // Scratch state for the element currently being read.
    let mut segment_label: Option<String> = None;
    let mut segment_text = String::new();
    let mut fore_name = String::new();
    let mut last_name = String::new();
    let mut id_type = String::new();
    let mut id_text = String::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Err(e) => {
                return Err(EntrezError::Parse(format!(
                    "xml error at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            Ok(Event::Eof) => break,

            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if !seen_article && name == "PubmedArticle" {
                    in_article = true;
                    seen_article = true;
                }
                if in_article {
                    match name.as_str() {
                        "AbstractText" => {
                            segment_label = attr_value(&e, "Label")?;
                            segment_text.clear();
                        }
                        "Author" => {
                            fore_name.clear();
                            last_name.clear();
                        }
                        "ArticleId" => {
                            id_type = attr_value(&e, "IdType")?.unwrap_or_default();
                            id_text.clear();
                        }
                        _ => {}
                    }
                }
                path.push(name);
            }

            Ok(Event::End(_)) => {
                let Some(name) = path.pop() else { continue };
                if !in_article {
                    continue;
                }
                match name.as_str() {
                    // Only the first article contributes to the record.
                    "PubmedArticle" => in_article = false,
                    "AbstractText" => {
                        abstract_parts.push((segment_label.take(), std::mem::take(&mut segment_text)));
                    }
                    "Author" => {
                        let full = format!("{} {}", fore_name.trim(), last_name.trim())
                            .trim()
                            .to_string();
                        if !full.is_empty() {
                            authors.push(full);
                        }
                    }
                    "ArticleId" => {
                        if id_type == "doi" && doi.is_none() && !id_text.trim().is_empty() {
                            doi = Some(id_text.trim().to_string());
                        }
                    }
                    _ => {}
                }
            }

            Ok(Event::Text(t)) => {
                if !in_article {
                    continue;
                }
                let text = t
                    .unescape()
                    .map_err(|e| EntrezError::Parse(format!("bad text node: {e}")))?;

                if within(&path, "AbstractText") {
                    push_word(&mut segment_text, &text);
                } else if within(&path, "ArticleTitle") {
                    push_word(&mut title, &text);
                } else {
                    match (parent(&path), current(&path)) {
                        (Some("Author"), Some("ForeName")) => push_word(&mut fore_name, &text),
                        (Some("Author"), Some("LastName")) => push_word(&mut last_name, &text),
                        (Some("Journal"), Some("Title")) => push_word(&mut journal, &text),
                        (Some("PubDate"), Some("Year")) => push_word(&mut year, &text),
                        (_, Some("ArticleId")) => push_word(&mut id_text, &text),
                        _ => {}
                    }
                }
            }

            _ => {}
        }
    }

    if !seen_article {
        return Ok(None);
    }

    Ok(Some(PaperRecord {
        pmid: pmid.to_string(),
        title: fallback(title, NO_TITLE),
        authors,
        journal: fallback(journal, UNKNOWN_JOURNAL),
        year: fallback(year, UNKNOWN_YEAR),
        doi,
        abstract_text: join_abstract(&abstract_parts),
    }))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attr_value(e: &BytesStart, name: &str) -> Result<Option<String>, EntrezError> {
    match e.try_get_attribute(name) {
        Ok(Some(attr)) => attr
            .unescape_value()
            .map(|v| Some(v.into_owned()))
            .map_err(|err| EntrezError::Parse(format!("bad {name} attribute: {err}"))),
        Ok(None) => Ok(None),
        Err(err) => Err(EntrezError::Parse(format!("bad attributes: {err}"))),
    }
}

fn current(path: &[String]) -> Option<&str> {
    path.last().map(String::as_str)
}

fn parent(path: &[String]) -> Option<&str> {
    path.len().checked_sub(2).map(|i| path[i].as_str())
}

/// True when `name` is anywhere on the open-element path. Catches text
/// nested in inline markup below the element of interest.
fn within(path: &[String], name: &str) -> bool {
    path.iter().any(|n| n == name)
}

/// Append a text fragment, space-separating consecutive fragments.
fn push_word(buf: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(text);
}

fn fallback(value: String, default: &str) -> String {
    if value.trim().is_empty() { default.to_string() } else { value }
}

/// Concatenate abstract segments in document order, single-space joined,
/// each labelled segment prefixed with `"Label: "`.
fn join_abstract(parts: &[(Option<String>, String)]) -> String {
    if parts.is_empty() {
        return NO_ABSTRACT.to_string();
    }
    parts
        .iter()
        .map(|(label, text)| match label {
            Some(l) => format!("{l}: {text}"),
            None => text.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

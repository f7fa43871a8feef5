//! Reply shaping: heterogeneous tool outputs into one coherent reply.
//!
//! Formatting is pure; feeding the same record through twice produces
//! identical text. The console renders [`Reply::to_text`]; structured
//! surfaces consume the [`Reply::Papers`] fields directly.

pub mod pages;

use serde::Serialize;

use crate::entrez::{AuthorHits, PaperRecord};
use self::pages::PageView;

const DIVIDER_WIDTH: usize = 50;

/// What a turn hands to the reply surface.
#[derive(Debug, Clone, Serialize)]
pub enum Reply {
    /// Plain prose: direct answers, single cards, clarifications, errors.
    Text(String),
    /// A search summary plus eagerly hydrated records and pagination
    /// metadata over the full identifier list.
    Papers {
        summary: String,
        /// Hydrated records, in identifier-list order.
        records: Vec<PaperRecord>,
        /// Every identifier the search returned (bounded upstream).
        ids: Vec<String>,
        page: PageView,
    },
}

impl Reply {
    /// Render for a plain-text surface.
    pub fn to_text(&self) -> String {
        match self {
            Reply::Text(text) => text.clone(),
            Reply::Papers { summary, records, ids, page } => {
                let mut out = String::new();
                out.push_str(summary);
                out.push_str("\n\nHere are details for the first ");
                out.push_str(&records.len().to_string());
                out.push_str(" papers:\n");
                out.push_str(&"=".repeat(DIVIDER_WIDTH));
                for (i, record) in records.iter().enumerate() {
                    out.push_str(&format!("\n\nPAPER {}:\n", i + 1));
                    out.push_str(&format_card(record));
                    if i + 1 < records.len() {
                        out.push('\n');
                        out.push_str(&"-".repeat(DIVIDER_WIDTH));
                    }
                }
                if ids.len() > records.len() {
                    out.push_str(&format!(
                        "\n\n{} identifiers on hand, page {} of {}.",
                        ids.len(),
                        page.page,
                        page.total_pages
                    ));
                }
                out.push_str("\n\nNeed more papers or specific details? Just ask.");
                out
            }
        }
    }
}

/// One record as a text card, all fields present via fixed fallbacks.
pub fn format_card(record: &PaperRecord) -> String {
    let authors = if record.authors.is_empty() {
        "No authors listed".to_string()
    } else {
        record.authors.join(", ")
    };
    let doi = record.doi.as_deref().unwrap_or("Not available");
    format!(
        "Paper ID: {}\nTitle: {}\nAuthors: {}\nJournal: {} ({})\nDOI: {}\n\nAbstract:\n{}",
        record.pmid, record.title, authors, record.journal, record.year, doi, record.abstract_text
    )
}

/// Summary line for an author search outcome.
pub fn author_summary(hits: &AuthorHits) -> String {
    if hits.count == 0 {
        format!("Found no papers by {}.", hits.term)
    } else {
        format!(
            "Found {} papers by {}. Showing the {} most recent.",
            hits.count,
            hits.term,
            hits.ids.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pages::Pager;

    fn record() -> PaperRecord {
        PaperRecord {
            pmid: "37635766".into(),
            title: "Cavity architecture of a gut enzyme".into(),
            authors: vec!["Jane Doe".into(), "Richard Roe".into()],
            journal: "Journal of Testing".into(),
            year: "2023".into(),
            doi: Some("10.1000/jt.2023.001".into()),
            abstract_text: "BACKGROUND: Context. RESULTS: Findings.".into(),
        }
    }

    #[test]
    fn card_contains_every_field() {
        let card = format_card(&record());
        assert!(card.contains("Paper ID: 37635766"));
        assert!(card.contains("Title: Cavity architecture"));
        assert!(card.contains("Authors: Jane Doe, Richard Roe"));
        assert!(card.contains("Journal of Testing (2023)"));
        assert!(card.contains("DOI: 10.1000/jt.2023.001"));
        assert!(card.contains("BACKGROUND: Context."));
    }

    #[test]
    fn card_formatting_is_idempotent() {
        let r = record();
        assert_eq!(format_card(&r), format_card(&r));
    }

    #[test]
    fn missing_doi_and_authors_fall_back() {
        let mut r = record();
        r.doi = None;
        r.authors.clear();
        let card = format_card(&r);
        assert!(card.contains("DOI: Not available"));
        assert!(card.contains("Authors: No authors listed"));
    }

    #[test]
    fn author_summary_wording() {
        let empty = AuthorHits { term: "Jane Doe".into(), count: 0, ids: vec![] };
        assert_eq!(author_summary(&empty), "Found no papers by Jane Doe.");

        let some = AuthorHits {
            term: "Jane Doe".into(),
            count: 120,
            ids: vec!["1111111".into(), "2222222".into()],
        };
        let line = author_summary(&some);
        assert!(line.contains("Found 120 papers by Jane Doe"));
        assert!(line.contains("Showing the 2 most recent"));
    }

    #[test]
    fn papers_reply_renders_in_order() {
        let mut second = record();
        second.pmid = "1111111".into();
        let hits_ids: Vec<String> = vec!["37635766".into(), "1111111".into(), "2222222".into()];
        let reply = Reply::Papers {
            summary: "Found 3 papers by Jane Doe. Showing the 3 most recent.".into(),
            records: vec![record(), second],
            ids: hits_ids,
            page: Pager::new(10).view(3),
        };
        let text = reply.to_text();
        let first_pos = text.find("PAPER 1:").unwrap();
        let second_pos = text.find("PAPER 2:").unwrap();
        assert!(first_pos < second_pos);
        assert!(text.find("37635766").unwrap() < text.find("1111111").unwrap());
        assert!(text.starts_with("Found 3 papers"));
    }
}

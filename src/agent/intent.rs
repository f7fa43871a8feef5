//! Intent resolution: one unstructured utterance into exactly one
//! discriminated action.
//!
//! Deterministic prefilters run first so the common "tell me about paper
//! 12345678" case costs no model call. Only when neither shortcut applies
//! does the resolver ask the LLM, which must answer with a one-object JSON
//! verdict validated against [`Verdict`]. Anything unparseable degrades to
//! [`Intent::Unrecognized`]; classification is single-shot with no retry.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::llm::LlmProvider;
use super::session::{RecentSearch, Turn};

// ── Intent ────────────────────────────────────────────────────────────────────

/// The one action a turn resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    AuthorSearch(String),
    TitleSearch(String),
    IdLookup(String),
    DirectAnswer(String),
    Unrecognized,
}

// ── Deterministic prefilters ──────────────────────────────────────────────────

/// Phrases that mark an utterance as a lookup request. Substring match on
/// the lowercased utterance.
const TRIGGERS: [&str; 4] = ["details", "paper id", "tell me about", "get"];

/// A standalone PubMed-id-shaped token.
static PMID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{7,9})\b").unwrap());

/// A reference to a cached synthetic key: "paper 2", "paper_2", "paper #2".
static CACHE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpaper[ _#]?([1-9])\b").unwrap());

/// Shortest cached topic worth matching against follow-up turns.
const MIN_TOPIC_LEN: usize = 4;

fn has_trigger(lowered: &str) -> bool {
    TRIGGERS.iter().any(|t| lowered.contains(t))
}

/// An id-shaped token plus a trigger phrase resolves without the model.
fn id_shortcut(utterance: &str) -> Option<String> {
    if !has_trigger(&utterance.to_lowercase()) {
        return None;
    }
    PMID_RE.captures(utterance).map(|c| c[1].to_string())
}

/// Follow-up references against the most recent search: a synthetic
/// `paper_N` key, or the cached topic phrase named together with a
/// trigger. Generalizes the source heuristic; no literal topics or ids.
fn cache_shortcut(utterance: &str, cache: &RecentSearch) -> Option<String> {
    if cache.is_empty() {
        return None;
    }

    if let Some(c) = CACHE_KEY_RE.captures(utterance) {
        let n: usize = c[1].parse().ok()?;
        if let Some(id) = cache.nth(n) {
            return Some(id.to_string());
        }
    }

    let lowered = utterance.to_lowercase();
    let topic = cache.topic()?;
    if topic.len() >= MIN_TOPIC_LEN
        && has_trigger(&lowered)
        && lowered.contains(&topic.to_lowercase())
    {
        return cache.first().map(str::to_string);
    }
    None
}

// ── Model classification ──────────────────────────────────────────────────────

const SYSTEM_PROMPT: &str = "\
You route requests for a research paper assistant backed by PubMed.

Pick exactly one action for the user's request:
- \"search_author\": find papers written by an author; argument is the author's name
- \"search_title\": find one paper by its title; argument is the title text
- \"fetch_paper\": get details for a specific paper; argument is the numeric PubMed id
- \"answer\": no lookup is needed; argument is your answer to the user

Reply with a single JSON object and nothing else, in the form
{\"action\": \"search_author\", \"argument\": \"Jane Doe\"}";

/// The classifier's verdict, validated by shape. Unknown action tags fail
/// deserialization and therefore never reach dispatch.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", content = "argument", rename_all = "snake_case")]
enum Verdict {
    SearchAuthor(String),
    SearchTitle(String),
    FetchPaper(String),
    Answer(String),
}

impl From<Verdict> for Intent {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::SearchAuthor(name) => Intent::AuthorSearch(name),
            Verdict::SearchTitle(title) => Intent::TitleSearch(title),
            Verdict::FetchPaper(id) => Intent::IdLookup(id),
            Verdict::Answer(text) => Intent::DirectAnswer(text),
        }
    }
}

/// Parse the model's output into a verdict.
///
/// Tries the raw text first, then the slice between the outermost braces,
/// which also covers markdown-fenced replies. `None` means unparseable.
fn parse_verdict(output: &str) -> Option<Verdict> {
    let trimmed = output.trim();
    if let Ok(v) = serde_json::from_str(trimmed) {
        return Some(v);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

async fn classify(llm: &LlmProvider, utterance: &str, recent: &[Turn]) -> Intent {
    let mut history = String::new();
    for turn in recent {
        history.push_str(&turn.render());
        history.push('\n');
    }
    let prompt = format!("Recent conversation:\n{history}\nUser request: {utterance}");

    let output = match llm.complete(&prompt, Some(SYSTEM_PROMPT)).await {
        Ok(output) => output,
        Err(e) => {
            // Resolver-level failure; surfaced as a clarification, not fatal.
            warn!(error = %e, "classification call failed");
            return Intent::Unrecognized;
        }
    };

    match parse_verdict(&output) {
        Some(verdict) => {
            debug!(?verdict, "classifier verdict");
            verdict.into()
        }
        None => {
            warn!(output = %output, "unparseable classifier output");
            Intent::Unrecognized
        }
    }
}

/// Resolve an utterance, cheapest path first: deterministic id shortcut,
/// then the recent-search cache, then the model.
pub async fn resolve(
    llm: &LlmProvider,
    utterance: &str,
    recent: &[Turn],
    cache: &RecentSearch,
) -> Intent {
    if let Some(id) = id_shortcut(utterance) {
        debug!(%id, "deterministic id shortcut");
        return Intent::IdLookup(id);
    }
    if let Some(id) = cache_shortcut(utterance, cache) {
        debug!(%id, "recent-search cache shortcut");
        return Intent::IdLookup(id);
    }
    classify(llm, utterance, recent).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::dummy::DummyProvider;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    // ── id shortcut ───────────────────────────────────────────────────────────

    #[test]
    fn id_shortcut_needs_trigger_and_id() {
        assert_eq!(
            id_shortcut("Tell me about paper 37635766"),
            Some("37635766".to_string())
        );
        assert_eq!(id_shortcut("Get details for 1234567"), Some("1234567".to_string()));
        // id without trigger
        assert_eq!(id_shortcut("37635766 looks interesting"), None);
        // trigger without id
        assert_eq!(id_shortcut("tell me about gut bacteria"), None);
    }

    #[test]
    fn id_shortcut_length_bounds() {
        assert_eq!(id_shortcut("details for 1234567"), Some("1234567".to_string()));
        assert_eq!(id_shortcut("details for 123456789"), Some("123456789".to_string()));
        // 6 digits: too short
        assert_eq!(id_shortcut("details for 123456"), None);
        // 10 digits: too long, and not a prefix match either
        assert_eq!(id_shortcut("details for 1234567890"), None);
    }

    // ── cache shortcut ────────────────────────────────────────────────────────

    #[test]
    fn cache_key_reference_resolves() {
        let mut cache = RecentSearch::new(5);
        cache.remember("Jane Doe", &ids(&["1111111", "2222222", "3333333"]));
        assert_eq!(
            cache_shortcut("show me paper 2", &cache),
            Some("2222222".to_string())
        );
        assert_eq!(
            cache_shortcut("what about paper_3?", &cache),
            Some("3333333".to_string())
        );
        // key beyond the cached range
        assert_eq!(cache_shortcut("show me paper 4", &cache), None);
    }

    #[test]
    fn cached_topic_with_trigger_resolves_to_first_id() {
        let mut cache = RecentSearch::new(5);
        cache.remember("cavity architecture", &ids(&["3763576", "1111111"]));
        assert_eq!(
            cache_shortcut("tell me about the Cavity Architecture study", &cache),
            Some("3763576".to_string())
        );
        // topic named without any trigger phrase: goes to the model instead
        assert_eq!(cache_shortcut("cavity architecture is neat", &cache), None);
    }

    #[test]
    fn empty_cache_never_shortcuts() {
        let cache = RecentSearch::new(5);
        assert_eq!(cache_shortcut("tell me about paper 2", &cache), None);
    }

    // ── verdict parsing ───────────────────────────────────────────────────────

    #[test]
    fn verdict_parses_all_actions() {
        let cases = [
            (r#"{"action":"search_author","argument":"Jane Doe"}"#, Intent::AuthorSearch("Jane Doe".into())),
            (r#"{"action":"search_title","argument":"Gut enzymes"}"#, Intent::TitleSearch("Gut enzymes".into())),
            (r#"{"action":"fetch_paper","argument":"37635766"}"#, Intent::IdLookup("37635766".into())),
            (r#"{"action":"answer","argument":"PubMed indexes biomedical literature."}"#, Intent::DirectAnswer("PubMed indexes biomedical literature.".into())),
        ];
        for (raw, expected) in cases {
            let verdict = parse_verdict(raw).expect(raw);
            assert_eq!(Intent::from(verdict), expected);
        }
    }

    #[test]
    fn unknown_action_rejected() {
        assert!(parse_verdict(r#"{"action":"drop_tables","argument":"x"}"#).is_none());
    }

    #[test]
    fn garbage_rejected() {
        assert!(parse_verdict("I would search for the author, probably.").is_none());
        assert!(parse_verdict("").is_none());
        assert!(parse_verdict("}{").is_none());
    }

    #[test]
    fn fenced_and_wrapped_json_tolerated() {
        let fenced = "```json\n{\"action\":\"fetch_paper\",\"argument\":\"1234567\"}\n```";
        assert!(matches!(
            parse_verdict(fenced),
            Some(Verdict::FetchPaper(id)) if id == "1234567"
        ));
        let wrapped = r#"Sure! {"action":"answer","argument":"hi"} hope that helps"#;
        assert!(matches!(parse_verdict(wrapped), Some(Verdict::Answer(_))));
    }

    // ── resolve ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn resolve_prefers_shortcut_over_model() {
        // The canned verdict would send us to an author search; the
        // shortcut must win without consulting it.
        let llm = LlmProvider::Dummy(DummyProvider::with_reply(
            r#"{"action":"search_author","argument":"nope"}"#,
        ));
        let cache = RecentSearch::new(5);
        let intent = resolve(&llm, "Tell me about paper 37635766", &[], &cache).await;
        assert_eq!(intent, Intent::IdLookup("37635766".into()));
    }

    #[tokio::test]
    async fn resolve_falls_through_to_model() {
        let llm = LlmProvider::Dummy(DummyProvider::with_reply(
            r#"{"action":"search_author","argument":"Jane Doe"}"#,
        ));
        let cache = RecentSearch::new(5);
        let intent = resolve(&llm, "Show papers by Dr. Jane Doe", &[], &cache).await;
        assert_eq!(intent, Intent::AuthorSearch("Jane Doe".into()));
    }

    #[tokio::test]
    async fn unparseable_model_output_is_unrecognized() {
        let llm = LlmProvider::Dummy(DummyProvider::with_reply("no json here"));
        let cache = RecentSearch::new(5);
        let intent = resolve(&llm, "do something", &[], &cache).await;
        assert_eq!(intent, Intent::Unrecognized);
    }
}

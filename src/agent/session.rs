//! Session-confined conversation state.
//!
//! The append-only turn log and the recent-search identifier cache both
//! live for exactly one session and are never persisted. Both are owned
//! by the dispatch loop; nothing else mutates them.

/// Upper bound on a tool summary entering the log. Keeps the prompt
/// context for later turns small.
pub const SUMMARY_MAX: usize = 200;

// ── Turn log ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Turn {
    User(String),
    Tool { name: String, summary: String },
}

impl Turn {
    /// One prompt-context line for this entry.
    pub fn render(&self) -> String {
        match self {
            Turn::User(text) => format!("User: {text}"),
            Turn::Tool { name, summary } => format!("Tool {name}: {summary}"),
        }
    }
}

/// Ordered, append-only log of the session's turns.
#[derive(Debug, Default)]
pub struct TurnLog {
    turns: Vec<Turn>,
}

impl TurnLog {
    pub fn push_user(&mut self, text: &str) {
        self.turns.push(Turn::User(text.to_string()));
    }

    /// Record a tool outcome. Only a truncated summary enters the log;
    /// full tool output never does.
    pub fn push_tool(&mut self, name: &str, outcome: &str) {
        self.turns.push(Turn::Tool {
            name: name.to_string(),
            summary: truncate(outcome, SUMMARY_MAX),
        });
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Char-boundary-safe truncation with an ellipsis marker.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

// ── Recent-search cache ───────────────────────────────────────────────────────

/// Identifiers from the most recent search, under synthetic keys
/// `paper_1..paper_N`.
///
/// A heuristic memory aid for follow-up turns, not a general cache: each
/// new search overwrites it wholesale, and there is no other eviction.
#[derive(Debug)]
pub struct RecentSearch {
    topic: Option<String>,
    ids: Vec<String>,
    cap: usize,
}

impl RecentSearch {
    pub fn new(cap: usize) -> Self {
        Self { topic: None, ids: Vec::new(), cap }
    }

    /// Overwrite the cache with a new search outcome, keeping at most
    /// `cap` identifiers.
    pub fn remember(&mut self, topic: &str, ids: &[String]) {
        self.topic = Some(topic.to_string());
        self.ids = ids.iter().take(self.cap).cloned().collect();
    }

    /// The topic term of the most recent search, if any.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Resolve a 1-based synthetic key (`paper_3` -> `nth(3)`).
    pub fn nth(&self, n: usize) -> Option<&str> {
        n.checked_sub(1).and_then(|i| self.ids.get(i)).map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.ids.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn log_appends_in_order() {
        let mut log = TurnLog::default();
        log.push_user("hello");
        log.push_tool("search_author", "Found 5 papers");
        assert_eq!(log.len(), 2);
        assert_eq!(log.recent(2)[0].render(), "User: hello");
        assert!(log.recent(2)[1].render().starts_with("Tool search_author:"));
    }

    #[test]
    fn recent_returns_tail() {
        let mut log = TurnLog::default();
        for i in 0..5 {
            log.push_user(&format!("msg{i}"));
        }
        let tail = log.recent(3);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].render(), "User: msg2");
        assert_eq!(tail[2].render(), "User: msg4");
        assert_eq!(log.recent(99).len(), 5);
    }

    #[test]
    fn tool_summaries_are_truncated() {
        let mut log = TurnLog::default();
        log.push_tool("fetch_paper", &"x".repeat(SUMMARY_MAX * 2));
        let rendered = log.recent(1)[0].render();
        assert!(rendered.ends_with("..."));
        assert!(rendered.len() < SUMMARY_MAX * 2);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "é".repeat(SUMMARY_MAX + 10);
        let cut = truncate(&text, SUMMARY_MAX);
        assert_eq!(cut.chars().count(), SUMMARY_MAX + 3);
    }

    #[test]
    fn cache_overwrites_wholesale() {
        let mut cache = RecentSearch::new(5);
        cache.remember("Jane Doe", &ids(&["1111111", "2222222"]));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.topic(), Some("Jane Doe"));

        cache.remember("gut microbiome", &ids(&["3333333"]));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.topic(), Some("gut microbiome"));
        assert_eq!(cache.first(), Some("3333333"));
        assert_eq!(cache.nth(2), None);
    }

    #[test]
    fn cache_cap_bounds_ids() {
        let mut cache = RecentSearch::new(5);
        let many: Vec<String> = (0..8).map(|i| format!("100000{i}")).collect();
        cache.remember("someone", &many);
        assert_eq!(cache.len(), 5);
        assert_eq!(cache.nth(5), Some("1000004"));
        assert_eq!(cache.nth(6), None);
    }

    #[test]
    fn nth_is_one_based() {
        let mut cache = RecentSearch::new(5);
        cache.remember("t", &ids(&["1111111", "2222222"]));
        assert_eq!(cache.nth(0), None);
        assert_eq!(cache.nth(1), Some("1111111"));
        assert_eq!(cache.nth(2), Some("2222222"));
    }
}

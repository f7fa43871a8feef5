//! The dispatch loop: one utterance in, one reply out.
//!
//! Per turn: append to the log, resolve the intent, run zero or more
//! lookups, shape the reply. Execution is sequential within a turn; no
//! state survives between turns except the turn log, the recent-search
//! cache, and the pagination cursor. All collaborators (LLM provider,
//! Entrez client) are injected at construction.

pub mod intent;
pub mod session;

use tracing::{debug, warn};

use crate::config::DisplayConfig;
use crate::entrez::{EntrezClient, EntrezError};
use crate::llm::LlmProvider;
use crate::render::pages::Pager;
use crate::render::{self, Reply};
use self::intent::Intent;
use self::session::{RecentSearch, TurnLog};

/// How many recent log entries the classifier sees as context.
const CONTEXT_TURNS: usize = 3;

/// Fixed reply when no intent can be established.
pub const CLARIFICATION: &str =
    "I couldn't understand your request. Please try again with a clearer query.";

pub struct ResearchAgent {
    llm: LlmProvider,
    entrez: EntrezClient,
    display: DisplayConfig,
    log: TurnLog,
    cache: RecentSearch,
    pager: Pager,
}

impl ResearchAgent {
    pub fn new(llm: LlmProvider, entrez: EntrezClient, display: DisplayConfig) -> Self {
        let cache = RecentSearch::new(display.cache_cap);
        let pager = Pager::new(display.page_size);
        Self { llm, entrez, display, log: TurnLog::default(), cache, pager }
    }

    /// Handle one conversational turn.
    ///
    /// Never fails: every structured error becomes a user-visible reply,
    /// and a failed turn leaves the log and cache coherent for the next.
    pub async fn handle_turn(&mut self, utterance: &str) -> Reply {
        self.log.push_user(utterance);
        debug!(turn = self.log.len(), "resolving");

        let intent = intent::resolve(
            &self.llm,
            utterance,
            self.log.recent(CONTEXT_TURNS),
            &self.cache,
        )
        .await;

        match intent {
            Intent::DirectAnswer(text) => Reply::Text(text),
            Intent::Unrecognized => Reply::Text(CLARIFICATION.to_string()),
            Intent::IdLookup(pmid) => self.lookup_by_id(&pmid).await,
            Intent::TitleSearch(title) => self.lookup_by_title(&title).await,
            Intent::AuthorSearch(name) => self.search_author(&name).await,
        }
    }

    /// Presentation hook: request a page of the last search's identifier
    /// list. Out-of-range values are clamped when the view is computed.
    pub fn set_page(&mut self, page: usize) {
        self.pager.request_page(page);
    }

    /// Presentation hook: change the page size for structured replies.
    pub fn set_page_size(&mut self, size: usize) {
        self.pager.set_page_size(size);
    }

    // ── Branches ──────────────────────────────────────────────────────────────

    async fn lookup_by_id(&mut self, pmid: &str) -> Reply {
        match self.entrez.fetch_record(pmid).await {
            Ok(Some(record)) => {
                let card = render::format_card(&record);
                self.log.push_tool("fetch_paper", &card);
                Reply::Text(card)
            }
            Ok(None) => {
                let msg = format!("No article found for id {pmid}.");
                self.log.push_tool("fetch_paper", &msg);
                Reply::Text(msg)
            }
            Err(e) => self.tool_failure("fetch_paper", e),
        }
    }

    async fn lookup_by_title(&mut self, title: &str) -> Reply {
        match self.entrez.search_by_title(title).await {
            Ok(Some(record)) => {
                let card = render::format_card(&record);
                self.log.push_tool("search_title", &card);
                Reply::Text(card)
            }
            Ok(None) => {
                let msg = "No papers found with this title. \
                           Try searching by author or use a shorter title."
                    .to_string();
                self.log.push_tool("search_title", &msg);
                Reply::Text(msg)
            }
            Err(e) => self.tool_failure("search_title", e),
        }
    }

    async fn search_author(&mut self, name: &str) -> Reply {
        let hits = match self.entrez.search_by_author(name).await {
            Ok(hits) => hits,
            Err(e) => return self.tool_failure("search_author", e),
        };

        self.cache.remember(&hits.term, &hits.ids);
        let summary = render::author_summary(&hits);
        self.log
            .push_tool("search_author", &format!("{summary} ids: {}", hits.ids.join(", ")));

        if hits.ids.is_empty() {
            return Reply::Text(summary);
        }

        // Auto-expansion: hydrate the first few hits in this same turn,
        // sequentially and in identifier-list order. Extra lookups now
        // for fewer conversational round-trips later.
        let mut records = Vec::new();
        for pmid in hits.ids.iter().take(self.display.expand_count) {
            match self.entrez.fetch_record(pmid).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => warn!(%pmid, "search hit vanished before hydration"),
                Err(e) => {
                    warn!(%pmid, error = %e, "hydration failed");
                    self.log.push_tool("fetch_paper", &e.to_string());
                }
            }
        }

        let page = self.pager.view(hits.ids.len());
        Reply::Papers { summary, records, ids: hits.ids, page }
    }

    fn tool_failure(&mut self, tool: &str, e: EntrezError) -> Reply {
        warn!(tool, error = %e, "tool call failed");
        let msg = e.to_string();
        self.log.push_tool(tool, &msg);
        Reply::Text(msg)
    }
}

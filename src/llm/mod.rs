//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities, clone them freely.
//! Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency;
//! adding a backend = new module + new variant + new `complete` arm.
//!
//! The provider is built once in `main` from config and injected into the
//! agent at construction. Nothing in this crate constructs a client at
//! import time or on first use.

pub mod providers;

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `content` (plus an optional system instruction) to the provider
    /// and return its text reply. One round-trip, no retry.
    pub async fn complete(&self, content: &str, system: Option<&str>) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(content, system).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(content, system).await,
        }
    }
}

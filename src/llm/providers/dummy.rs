//! Dummy LLM provider - canned or echoing replies, no network.
//!
//! The default instance answers every classification request with a
//! direct-answer verdict echoing the input, so the console loop works
//! without an API key. Tests use [`DummyProvider::with_reply`] to script
//! the exact classifier output they need.

use crate::llm::ProviderError;

#[derive(Debug, Clone, Default)]
pub struct DummyProvider {
    canned: Option<String>,
}

impl DummyProvider {
    /// A provider that always returns `reply`, verbatim.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self { canned: Some(reply.into()) }
    }

    pub async fn complete(&self, content: &str, _system: Option<&str>) -> Result<String, ProviderError> {
        if let Some(reply) = &self.canned {
            return Ok(reply.clone());
        }
        // Shape matches the classifier contract so the resolver can parse it.
        let verdict = serde_json::json!({
            "action": "answer",
            "argument": format!("[dummy] {content}"),
        });
        Ok(verdict.to_string())
    }
}

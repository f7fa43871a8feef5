//! Provider construction from config.

pub mod dummy;
pub mod openai_compatible;

use crate::config::LlmConfig;
use super::{LlmProvider, ProviderError};

/// Build the configured provider. `api_key` comes from `LLM_API_KEY` env,
/// never TOML; it is `None` for the dummy provider and keyless local models.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider::default())),
        "openai" => {
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                config.openai.api_base_url.clone(),
                config.openai.model.clone(),
                config.openai.temperature,
                config.openai.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}

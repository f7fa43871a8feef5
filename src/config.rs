//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies the `MEDLIT_LOG_LEVEL` env override. The LLM API key is
//! only ever read from the `LLM_API_KEY` env var, never from TOML.

use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::error::AppError;

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature. Classification wants determinism, so 0.0.
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM subsystem configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (e.g. `"dummy"`, `"openai"`).
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    /// Config for the OpenAI / OpenAI-compatible provider (`[llm.openai]`).
    pub openai: OpenAiConfig,
}

/// Entrez E-utilities configuration (`[entrez]`).
#[derive(Debug, Clone)]
pub struct EntrezConfig {
    /// Base URL of the E-utilities endpoints, without a trailing slash.
    /// `esearch.fcgi` / `efetch.fcgi` are appended per call.
    pub api_base_url: String,
    /// Database to query, normally `"pubmed"`.
    pub db: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum identifiers returned by an author search.
    pub author_retmax: u32,
    /// Maximum identifiers returned by a title search.
    pub title_retmax: u32,
    /// Result ordering requested from the index; empty string keeps the
    /// index's own ordering. `"pub_date"` means newest first.
    pub sort: String,
}

/// Reply-surface tuning (`[display]`).
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// Records shown per page in the structured reply surface.
    pub page_size: usize,
    /// How many search hits are eagerly hydrated into full records per turn.
    pub expand_count: usize,
    /// How many identifiers the recent-search cache keeps.
    pub cache_cap: usize,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub assistant_name: String,
    pub log_level: String,
    pub llm: LlmConfig,
    /// API key from `LLM_API_KEY` env var. `None` for keyless local models.
    /// Never sourced from TOML.
    pub llm_api_key: Option<String>,
    pub entrez: EntrezConfig,
    pub display: DisplayConfig,
}

/// Raw TOML shape - `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    assistant: RawAssistant,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    entrez: RawEntrez,
    #[serde(default)]
    display: RawDisplay,
}

#[derive(Deserialize)]
struct RawAssistant {
    name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawEntrez {
    #[serde(default = "default_entrez_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_entrez_db")]
    db: String,
    #[serde(default = "default_entrez_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_author_retmax")]
    author_retmax: u32,
    #[serde(default = "default_title_retmax")]
    title_retmax: u32,
    #[serde(default = "default_entrez_sort")]
    sort: String,
}

impl Default for RawEntrez {
    fn default() -> Self {
        Self {
            api_base_url: default_entrez_api_base_url(),
            db: default_entrez_db(),
            timeout_seconds: default_entrez_timeout_seconds(),
            author_retmax: default_author_retmax(),
            title_retmax: default_title_retmax(),
            sort: default_entrez_sort(),
        }
    }
}

#[derive(Deserialize)]
struct RawDisplay {
    #[serde(default = "default_page_size")]
    page_size: usize,
    #[serde(default = "default_expand_count")]
    expand_count: usize,
    #[serde(default = "default_cache_cap")]
    cache_cap: usize,
}

impl Default for RawDisplay {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            expand_count: default_expand_count(),
            cache_cap: default_cache_cap(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_llm_provider() -> String { "dummy".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_temperature() -> f32 { 0.0 }
fn default_openai_timeout_seconds() -> u64 { 30 }
fn default_entrez_api_base_url() -> String { "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string() }
fn default_entrez_db() -> String { "pubmed".to_string() }
fn default_entrez_timeout_seconds() -> u64 { 10 }
fn default_author_retmax() -> u32 { 50 }
fn default_title_retmax() -> u32 { 5 }
fn default_entrez_sort() -> String { "pub_date".to_string() }
fn default_page_size() -> usize { 10 }
fn default_expand_count() -> usize { 3 }
fn default_cache_cap() -> usize { 5 }

/// Load config from `config/default.toml`, then apply env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let log_level_override = env::var("MEDLIT_LOG_LEVEL").ok();
    load_from(Path::new("config/default.toml"), log_level_override.as_deref())
}

/// Internal loader - accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, log_level_override: Option<&str>) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let log_level = log_level_override
        .unwrap_or(&parsed.assistant.log_level)
        .to_string();

    Ok(Config {
        assistant_name: parsed.assistant.name,
        log_level,
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: env::var("LLM_API_KEY").ok(),
        entrez: EntrezConfig {
            api_base_url: parsed.entrez.api_base_url,
            db: parsed.entrez.db,
            timeout_seconds: parsed.entrez.timeout_seconds,
            author_retmax: parsed.entrez.author_retmax,
            title_retmax: parsed.entrez.title_retmax,
            sort: parsed.entrez.sort,
        },
        display: DisplayConfig {
            page_size: parsed.display.page_size.max(1),
            expand_count: parsed.display.expand_count,
            cache_cap: parsed.display.cache_cap,
        },
    })
}

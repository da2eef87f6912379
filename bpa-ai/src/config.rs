//! Credential resolution for bpa-ai
//!
//! Two tiers, ENV → TOML. A missing credential is not a startup error: the
//! service starts, reports itself unconfigured on /health, and the calls
//! that need the credential fail with a configuration error.

use bpa_common::config::{is_valid_key, TomlConfig};
use tracing::{info, warn};

pub const COMPLETION_KEY_ENV: &str = "BPA_COMPLETION_API_KEY";
pub const COMPLETION_KEY_FALLBACK_ENV: &str = "OPENAI_API_KEY";
pub const SEARCH_KEY_ENV: &str = "BPA_SEARCH_API_KEY";

/// Resolve the completion-service key
///
/// **Priority:** `BPA_COMPLETION_API_KEY` → `OPENAI_API_KEY` → TOML `[completion] api_key`
pub fn resolve_completion_api_key(toml_config: &TomlConfig) -> Option<String> {
    resolve_key(
        "Completion API key",
        vec![
            (COMPLETION_KEY_ENV, std::env::var(COMPLETION_KEY_ENV).ok()),
            (COMPLETION_KEY_FALLBACK_ENV, std::env::var(COMPLETION_KEY_FALLBACK_ENV).ok()),
            ("TOML", toml_config.completion.api_key.clone()),
        ],
    )
}

/// Resolve the web-search key
///
/// **Priority:** `BPA_SEARCH_API_KEY` → TOML `[search] api_key`
pub fn resolve_search_api_key(toml_config: &TomlConfig) -> Option<String> {
    resolve_key(
        "Search API key",
        vec![
            (SEARCH_KEY_ENV, std::env::var(SEARCH_KEY_ENV).ok()),
            ("TOML", toml_config.search.api_key.clone()),
        ],
    )
}

/// First valid key in priority order. Values are never logged.
fn resolve_key(label: &str, candidates: Vec<(&str, Option<String>)>) -> Option<String> {
    let valid: Vec<(&str, String)> = candidates
        .into_iter()
        .filter_map(|(source, key)| key.filter(|k| is_valid_key(k)).map(|k| (source, k)))
        .collect();

    if valid.len() > 1 {
        let sources: Vec<&str> = valid.iter().map(|(source, _)| *source).collect();
        warn!(
            "{} found in multiple sources: {}. Using {} (highest priority).",
            label,
            sources.join(", "),
            sources[0]
        );
    }

    match valid.into_iter().next() {
        Some((source, key)) => {
            info!("{} loaded from {}", label, source);
            Some(key.trim().to_string())
        }
        None => {
            warn!("{} not configured", label);
            None
        }
    }
}

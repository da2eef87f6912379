//! Bootstrap configuration loading
//!
//! The TOML file is optional. A missing file is not an error: every value has a
//! built-in default so the service can start with no configuration at all
//! (credentials excepted, see `bpa-ai::config`).
//!
//! # Config file location priority
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`BPA_CONFIG`)
//! 3. Platform config directory (`~/.config/bpa/<module>.toml` on Linux)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "BPA_CONFIG";

/// Bootstrap configuration loaded from TOML
///
/// Cannot change while the service runs; restart to pick up edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database for stored analyses (optional)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub competitors: CompetitorConfig,

    /// Estimator strategy: "static" or "model"
    #[serde(default = "default_estimator")]
    pub estimator: String,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            database_path: None,
            logging: LoggingConfig::default(),
            completion: CompletionConfig::default(),
            retry: RetryConfig::default(),
            extraction: ExtractionConfig::default(),
            search: SearchConfig::default(),
            competitors: CompetitorConfig::default(),
            estimator: default_estimator(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Completion service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_model")]
    pub premium_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_premium_max_tokens")]
    pub premium_max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Wall-clock timeout per call, clamped to 30..=60 seconds
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    /// Language the model is asked to answer in
    #[serde(default = "default_response_language")]
    pub response_language: String,
    /// API key (lowest priority, environment wins)
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_completion_base_url(),
            model: default_model(),
            premium_model: default_model(),
            max_tokens: default_max_tokens(),
            premium_max_tokens: default_premium_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_completion_timeout_secs(),
            requests_per_second: default_requests_per_second(),
            response_language: default_response_language(),
            api_key: None,
        }
    }
}

/// Retry policy for completion calls made by the analysis assembler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Content extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    #[serde(default = "default_max_visible_text_chars")]
    pub max_visible_text_chars: usize,
    #[serde(default = "default_max_concurrent_sessions")]
    pub max_concurrent_sessions: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: default_navigation_timeout_secs(),
            max_visible_text_chars: default_max_visible_text_chars(),
            max_concurrent_sessions: default_max_concurrent_sessions(),
        }
    }
}

/// Web search settings (whole feature disabled without a key)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_search_market")]
    pub market: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            market: default_search_market(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorConfig {
    #[serde(default = "default_max_competitors")]
    pub max_competitors: usize,
}

impl Default for CompetitorConfig {
    fn default() -> Self {
        Self {
            max_competitors: default_max_competitors(),
        }
    }
}

fn default_port() -> u16 {
    5730
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_estimator() -> String {
    "static".to_string()
}

fn default_completion_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_premium_max_tokens() -> u32 {
    4000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_completion_timeout_secs() -> u64 {
    45
}

fn default_requests_per_second() -> u32 {
    5
}

fn default_response_language() -> String {
    "English".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    4000
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_max_visible_text_chars() -> usize {
    3000
}

fn default_max_concurrent_sessions() -> usize {
    4
}

fn default_search_endpoint() -> String {
    "https://api.bing.microsoft.com/v7.0/search".to_string()
}

fn default_search_market() -> String {
    "sv-SE".to_string()
}

fn default_max_competitors() -> usize {
    3
}

/// Locates the bootstrap config file for a module
pub struct ConfigFileResolver {
    module_name: String,
}

impl ConfigFileResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
        }
    }

    /// Resolve the config file path following the priority order
    ///
    /// Returns `None` only when no candidate location can be determined.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        self.default_path()
    }

    /// Platform default: `<config_dir>/bpa/<module>.toml`
    pub fn default_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("bpa").join(format!("{}.toml", self.module_name)))
    }
}

/// Default SQLite location: `<data_local_dir>/bpa/bpa.db`, else `./bpa.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("bpa").join("bpa.db"))
        .unwrap_or_else(|| PathBuf::from("bpa.db"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load config, falling back to built-in defaults when the file is missing
///
/// A file that exists but does not parse is still an error.
pub fn load_or_default(path: Option<&Path>) -> Result<TomlConfig> {
    match path {
        Some(path) if path.exists() => {
            let config = load_toml_config(path)?;
            info!("Configuration loaded from {}", path.display());
            Ok(config)
        }
        Some(path) => {
            warn!(
                "Config file not found at {}, using built-in defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("No config location available, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Validate a credential value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::AppError;

/// Application configuration module
/// This module handles the application configuration including loading,
/// environment overrides and validation.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Document handling config
    #[serde(default)]
    pub documents: DocumentConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Online translation backend
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OnlineBackend {
    // @backend: DeepL REST API
    DeepL,
    // @backend: Google Translate web endpoint
    Google,
}

impl OnlineBackend {
    // @returns: Capitalized backend name
    pub fn display_name(&self) -> &str {
        match self {
            Self::DeepL => "DeepL",
            Self::Google => "Google Translate",
        }
    }
}

/// Which path the dispatcher takes for every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSelection {
    /// Only the local model is used
    LocalOnly,
    /// An online backend with the local model as fallback
    Online(OnlineBackend),
}

impl std::fmt::Display for BackendSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalOnly => write!(f, "local model"),
            Self::Online(backend) => write!(f, "{}", backend.display_name()),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// DeepL API key; DeepL is used whenever this is non-empty
    #[serde(default)]
    pub deepl_api_key: String,

    /// DeepL endpoint; derived from the key type when empty
    #[serde(default)]
    pub deepl_endpoint: String,

    /// Google Translate endpoint
    #[serde(default = "default_google_endpoint")]
    pub google_endpoint: String,

    /// Translate with the local model only
    #[serde(default)]
    pub local_only: bool,

    /// Local model settings
    #[serde(default)]
    pub local_model: LocalModelConfig,

    /// Requests per second across all workers
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Attempts against the online backend before falling back
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay in milliseconds, doubled on each retry
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Fragments translated concurrently
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TranslationConfig {
    /// Resolve the backend selection from the key and the local flag
    pub fn selection(&self) -> BackendSelection {
        if self.local_only {
            BackendSelection::LocalOnly
        } else if !self.deepl_api_key.trim().is_empty() {
            BackendSelection::Online(OnlineBackend::DeepL)
        } else {
            BackendSelection::Online(OnlineBackend::Google)
        }
    }

    /// Apply environment variables through the given lookup
    ///
    /// `DEEPL_API_KEY` replaces the configured key when set; `LOCAL_TRANSLATION`
    /// switches local-only mode when it parses as a boolean.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("DEEPL_API_KEY") {
            self.deepl_api_key = key.trim().to_string();
        }

        if let Some(flag) = lookup("LOCAL_TRANSLATION") {
            self.local_only = flag.trim().eq_ignore_ascii_case("true");
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            deepl_api_key: String::new(),
            deepl_endpoint: String::new(),
            google_endpoint: default_google_endpoint(),
            local_only: false,
            local_model: LocalModelConfig::default(),
            requests_per_second: default_requests_per_second(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            concurrent_requests: default_concurrent_requests(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Local fallback model served by Ollama
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LocalModelConfig {
    /// Ollama endpoint URL
    #[serde(default = "default_local_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_local_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_local_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_local_endpoint(),
            model: default_local_model(),
            timeout_secs: default_local_timeout_secs(),
        }
    }
}

/// Document handling configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DocumentConfig {
    /// External command that prints the text of a legacy .doc file
    #[serde(default = "default_legacy_extractor")]
    pub legacy_extractor: String,

    /// Write fragment failures to an issues log next to the output
    #[serde(default = "default_true")]
    pub write_issues_log: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            legacy_extractor: default_legacy_extractor(),
            write_issues_log: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_requests_per_second() -> f64 {
    2.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1000 // 1 second, doubled on each retry
}

fn default_concurrent_requests() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_local_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_google_endpoint() -> String {
    "https://translate.googleapis.com".to_string()
}

fn default_local_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_local_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_legacy_extractor() -> String {
    "antiword".to_string()
}

impl Config {
    /// Load the configuration file if it exists, defaults otherwise
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), AppError> {
        let translation = &self.translation;

        if !(translation.requests_per_second.is_finite() && translation.requests_per_second > 0.0) {
            return Err(AppError::Config(format!(
                "requests_per_second must be positive, got {}",
                translation.requests_per_second
            )));
        }

        if translation.concurrent_requests == 0 {
            return Err(AppError::Config("concurrent_requests must be at least 1".to_string()));
        }

        if translation.max_retries == 0 {
            return Err(AppError::Config("max_retries must be at least 1".to_string()));
        }

        if translation.local_only && translation.local_model.model.trim().is_empty() {
            return Err(AppError::Config("Local-only mode requires a local model name".to_string()));
        }

        if self.documents.legacy_extractor.trim().is_empty() {
            return Err(AppError::Config("legacy_extractor must not be empty".to_string()));
        }

        Ok(())
    }
}

/*!
 * Backend selection, retry with exponential backoff and local fallback.
 *
 * The dispatcher is the only place backend errors are handled: callers get
 * a string back for every request, the local model's output when the
 * online backend could not deliver.
 */

use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{BackendSelection, OnlineBackend, TranslationConfig};
use crate::providers::deepl::DeepL;
use crate::providers::google::GoogleTranslate;
use crate::providers::local::LocalModel;
use crate::providers::{FallbackBackend, TranslationBackend, preview};

use super::rate_limiter::RateLimiter;

/// Retry schedule for the online backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_retries: u32,
    /// Sleep after the first retryable failure, doubled after each further one
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        }
    }
}

/// Which path produced a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationSource {
    /// The online backend answered
    Online,
    /// The online backend gave up and the local model answered
    Fallback,
    /// Local-only mode
    LocalOnly,
}

/// Outcome of one dispatched request
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    /// The translated text, possibly the untranslated input
    pub text: String,
    pub source: TranslationSource,
    /// Calls made to the online backend
    pub attempts: u32,
    /// Backoff sleeps taken between attempts, in order
    pub backoffs: Vec<Duration>,
}

/// Chooses a backend for every request and never fails
#[derive(Clone)]
pub struct TranslationDispatcher {
    /// Online backend; `None` means local-only mode
    online: Option<Arc<dyn TranslationBackend>>,
    fallback: Arc<dyn FallbackBackend>,
    rate_limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl fmt::Debug for TranslationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationDispatcher")
            .field("online", &self.online.as_ref().map(|b| b.name().to_string()))
            .field("fallback", &self.fallback.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl TranslationDispatcher {
    /// Create a dispatcher from explicit parts
    ///
    /// # Arguments
    /// * `online` - Online backend, or `None` for local-only mode
    /// * `fallback` - Backend of last resort
    /// * `rate_limiter` - Limiter awaited before every online attempt
    /// * `policy` - Retry schedule
    pub fn new(
        online: Option<Arc<dyn TranslationBackend>>,
        fallback: Arc<dyn FallbackBackend>,
        rate_limiter: Arc<RateLimiter>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            online,
            fallback,
            rate_limiter,
            policy,
        }
    }

    /// Build the real backends for the configured selection
    pub fn from_config(config: &TranslationConfig) -> Self {
        let selection = config.selection();
        info!("Translation backend: {}", selection);

        let online: Option<Arc<dyn TranslationBackend>> = match selection {
            BackendSelection::LocalOnly => None,
            BackendSelection::Online(OnlineBackend::DeepL) => Some(Arc::new(DeepL::new(
                config.deepl_api_key.clone(),
                config.deepl_endpoint.clone(),
                config.timeout_secs,
            ))),
            BackendSelection::Online(OnlineBackend::Google) => Some(Arc::new(GoogleTranslate::new(
                config.google_endpoint.clone(),
                config.timeout_secs,
            ))),
        };

        Self::new(
            online,
            Arc::new(LocalModel::new(&config.local_model)),
            Arc::new(RateLimiter::new(config.requests_per_second)),
            RetryPolicy::from_config(config),
        )
    }

    /// Whether requests go to the local model only
    pub fn is_local_only(&self) -> bool {
        self.online.is_none()
    }

    /// Name of the backend tried first
    pub fn backend_name(&self) -> &str {
        match &self.online {
            Some(backend) => backend.name(),
            None => self.fallback.name(),
        }
    }

    /// Translate a text, returning only the resulting string
    pub async fn translate(&self, text: &str, target_language: &str) -> String {
        self.translate_detailed(text, target_language).await.text
    }

    /// Translate a text and report how the result was obtained
    pub async fn translate_detailed(&self, text: &str, target_language: &str) -> Translation {
        let Some(backend) = &self.online else {
            return Translation {
                text: self.fallback.translate(text, target_language).await,
                source: TranslationSource::LocalOnly,
                attempts: 0,
                backoffs: Vec::new(),
            };
        };

        let max_retries = self.policy.max_retries.max(1);
        let mut delay = self.policy.initial_backoff;
        let mut backoffs = Vec::new();
        let mut attempts = 0;

        while attempts < max_retries {
            attempts += 1;
            self.rate_limiter.wait().await;

            match backend.translate(text, target_language).await {
                Ok(translated) => {
                    debug!("{} translated '{}' on attempt {}", backend.name(), preview(text, 30), attempts);
                    return Translation {
                        text: translated,
                        source: TranslationSource::Online,
                        attempts,
                        backoffs,
                    };
                }
                Err(e) if e.is_retryable() && attempts < max_retries => {
                    warn!(
                        "{} attempt {}/{} failed: {}. Retrying in {:?}",
                        backend.name(),
                        attempts,
                        max_retries,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    backoffs.push(delay);
                    delay *= 2;
                }
                Err(e) => {
                    error!(
                        "{} failed for '{}' after {} attempt(s): {}. Falling back to {}",
                        backend.name(),
                        preview(text, 30),
                        attempts,
                        e,
                        self.fallback.name()
                    );
                    break;
                }
            }
        }

        Translation {
            text: self.fallback.translate(text, target_language).await,
            source: TranslationSource::Fallback,
            attempts,
            backoffs,
        }
    }
}

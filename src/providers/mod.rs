/*!
 * Backend implementations for different translation services.
 *
 * This module contains client implementations for the translation backends:
 * - DeepL: DeepL REST API (used when an API key is configured)
 * - Google: Google Translate web endpoint
 * - Local: local model served by Ollama, the fallback of last resort
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for the online translation backends
///
/// This trait defines the interface the dispatcher retries against, allowing
/// real clients and test doubles to be used interchangeably.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Human readable backend name for logs
    fn name(&self) -> &str;

    /// Translate one text into the target language
    ///
    /// # Arguments
    /// * `text` - Non-empty text to translate
    /// * `target_language` - Generic language code, mapped by the backend
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or a classified error
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError>;
}

/// Backend used when everything else failed
///
/// Implementations must never fail: on any internal error they hand back the
/// original text, which is why the signature has no `Result`.
#[async_trait]
pub trait FallbackBackend: Send + Sync + Debug {
    /// Human readable backend name for logs
    fn name(&self) -> &str;

    /// Translate one text, returning the input unchanged on failure
    async fn translate(&self, text: &str, target_language: &str) -> String;
}

/// Truncate a text for log and report lines
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

pub mod deepl;
pub mod google;
pub mod local;
pub mod mock;

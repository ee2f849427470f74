use async_trait::async_trait;
use log::error;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::language_utils::google_target_code;
use crate::providers::TranslationBackend;

/// Google Translate client using the public web endpoint
#[derive(Debug)]
pub struct GoogleTranslate {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the service
    endpoint: String,
}

impl GoogleTranslate {
    /// Create a new Google Translate client
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    /// Map a non-success HTTP status to a provider error
    pub fn classify_error(status: StatusCode, body: &str) -> ProviderError {
        match status.as_u16() {
            429 => ProviderError::RateLimitExceeded(format!("Too many requests: {}", body)),
            400 => ProviderError::UnsupportedLanguage(body.to_string()),
            code => ProviderError::ApiError {
                status_code: code,
                message: body.to_string(),
            },
        }
    }

    /// Join the translated segments of a `translate_a/single` response
    ///
    /// The body is a nested array; element 0 lists sentence segments whose
    /// first item is the translated sentence.
    pub fn parse_response(body: &str) -> Result<String, ProviderError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Google response: {}", e)))?;

        let segments = value
            .get(0)
            .and_then(|v| v.as_array())
            .ok_or_else(|| ProviderError::ParseError("Google response has no segments".to_string()))?;

        let translated: String = segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(|s| s.as_str()))
            .collect();

        if translated.is_empty() {
            return Err(ProviderError::ParseError("Google response contained no text".to_string()));
        }

        Ok(translated)
    }
}

#[async_trait]
impl TranslationBackend for GoogleTranslate {
    fn name(&self) -> &str {
        "Google Translate"
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        let url = format!("{}/translate_a/single", self.endpoint);
        let target_code = google_target_code(target_language);

        let response = self
            .client
            .post(&url)
            .query(&[("client", "gtx"), ("sl", "auto"), ("tl", target_code.as_str()), ("dt", "t")])
            .form(&[("q", text)])
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to Google Translate: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read Google Translate response: {}", e)))?;

        if !status.is_success() {
            error!("Google Translate error ({}): {}", status, body);
            return Err(Self::classify_error(status, &body));
        }

        Self::parse_response(&body)
    }
}

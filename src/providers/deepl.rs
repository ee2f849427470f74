use async_trait::async_trait;
use log::error;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::language_utils::deepl_target_code;
use crate::providers::TranslationBackend;

const FREE_ENDPOINT: &str = "https://api-free.deepl.com";
const PRO_ENDPOINT: &str = "https://api.deepl.com";

/// DeepL client for interacting with the DeepL v2 API
#[derive(Debug)]
pub struct DeepL {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL
    endpoint: String,
}

/// DeepL translate response
#[derive(Debug, Deserialize)]
pub struct DeepLResponse {
    /// One entry per submitted text
    pub translations: Vec<DeepLTranslation>,
}

/// Individual translation in a DeepL response
#[derive(Debug, Deserialize)]
pub struct DeepLTranslation {
    /// Language DeepL detected in the source
    #[serde(default)]
    pub detected_source_language: Option<String>,
    /// The translated text
    pub text: String,
}

impl DeepL {
    /// Create a new DeepL client
    ///
    /// An empty endpoint picks the free or pro API from the key: free keys end in `:fx`.
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let api_key = api_key.into();
        let endpoint = endpoint.into();
        let endpoint = if endpoint.trim().is_empty() {
            Self::endpoint_for_key(&api_key).to_string()
        } else {
            endpoint.trim_end_matches('/').to_string()
        };

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key,
            endpoint,
        }
    }

    /// Base URL matching the key type
    pub fn endpoint_for_key(api_key: &str) -> &'static str {
        if api_key.trim().ends_with(":fx") {
            FREE_ENDPOINT
        } else {
            PRO_ENDPOINT
        }
    }

    /// The base URL this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Map a non-success HTTP status to a provider error
    pub fn classify_error(status: StatusCode, body: &str) -> ProviderError {
        match status.as_u16() {
            429 => ProviderError::RateLimitExceeded(format!("Too many requests: {}", body)),
            456 => ProviderError::QuotaExceeded(body.to_string()),
            401 | 403 => ProviderError::AuthenticationError(body.to_string()),
            400 if body.contains("target_lang") => ProviderError::UnsupportedLanguage(body.to_string()),
            code => ProviderError::ApiError {
                status_code: code,
                message: body.to_string(),
            },
        }
    }

    /// Pull the translated text out of a response body
    pub fn extract_text(response: DeepLResponse) -> Result<String, ProviderError> {
        response
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| ProviderError::ParseError("DeepL returned no translations".to_string()))
    }
}

#[async_trait]
impl TranslationBackend for DeepL {
    fn name(&self) -> &str {
        "DeepL"
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        let url = format!("{}/v2/translate", self.endpoint);
        let target_code = deepl_target_code(target_language);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(&[("text", text), ("target_lang", target_code.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to DeepL API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("DeepL API error ({}): {}", status, error_text);
            return Err(Self::classify_error(status, &error_text));
        }

        let deepl_response = response
            .json::<DeepLResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse DeepL API response: {}", e)))?;

        Self::extract_text(deepl_response)
    }
}

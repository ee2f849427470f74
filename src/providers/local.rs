use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::app_config::LocalModelConfig;
use crate::language_utils::{detect_language, get_language_name, normalize_to_part1_or_part2t};
use crate::providers::{FallbackBackend, preview};

/// Preamble some models put before the answer ("Translation:", "Here is the translation:")
static PREAMBLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(here is the translation[^:\n]*|translation(\s*\([^)\n]*\))?)\s*:\s*").unwrap()
});

/// Local translation model served by an Ollama instance
#[derive(Debug)]
pub struct LocalModel {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model name
    model: String,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: false,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
        });
        self
    }
}

/// Normalize an endpoint into a base URL with scheme and port
fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("Invalid host in endpoint: {}", endpoint))?;
    let port = url.port().unwrap_or(if url.scheme() == "https" { 443 } else { 11434 });

    Ok(format!("{}://{}:{}", url.scheme(), host, port))
}

impl LocalModel {
    /// Create a new local model client from configuration
    ///
    /// A malformed endpoint is logged and replaced by the default one: the
    /// fallback must always be constructible.
    pub fn new(config: &LocalModelConfig) -> Self {
        let base_url = normalize_endpoint(&config.endpoint).unwrap_or_else(|e| {
            warn!("Invalid local model endpoint '{}': {}. Using http://localhost:11434", config.endpoint, e);
            "http://localhost:11434".to_string()
        });

        Self {
            base_url,
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            model: config.model.clone(),
        }
    }

    /// The base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Source language for a text, English when detection gives no answer
    pub fn source_language(text: &str) -> &'static str {
        match detect_language(text) {
            Some(code) => code,
            None => {
                debug!("Language detection failed for '{}', assuming English", preview(text, 30));
                "en"
            }
        }
    }

    /// Build the prompt pair for one translation
    pub fn build_prompt(&self, text: &str, source_language: &str, target_language: &str) -> GenerationRequest {
        let target_code = normalize_to_part1_or_part2t(target_language)
            .unwrap_or_else(|_| target_language.to_lowercase());
        let source_name = get_language_name(source_language).unwrap_or_else(|_| source_language.to_string());
        let target_name = get_language_name(&target_code).unwrap_or_else(|_| target_code.clone());

        let system_prompt = format!(
            "You are a professional translator. Translate the user's text from {} to {} ({}). \
             Preserve line breaks and punctuation. \
             Only respond with the translated text, without any explanations or notes.",
            source_name, target_name, target_code
        );

        GenerationRequest::new(self.model.clone(), text)
            .system(system_prompt)
            .temperature(0.1)
    }

    /// Run one generation against the Ollama API
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to send request to local model: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(anyhow!("Local model error ({}): {}", status, error_text));
        }

        response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| anyhow!("Failed to parse local model response: {}", e))
    }

    async fn try_translate(&self, text: &str, target_language: &str) -> Result<String> {
        let source_language = Self::source_language(text);
        let request = self.build_prompt(text, source_language, target_language);
        let response = self.generate(request).await?;

        let translated = clean_model_output(text, &response.response);
        if translated.is_empty() {
            return Err(anyhow!("Local model returned an empty translation"));
        }

        Ok(translated)
    }
}

/// Strip the chatter a model adds around a translation
///
/// Removes a leading preamble and quotes wrapping the whole answer, unless
/// the original text was quoted itself.
fn clean_model_output(original: &str, output: &str) -> String {
    let output = PREAMBLE_REGEX.replace(output.trim(), "");
    let output = output.trim();

    let original = original.trim();
    let original_quoted = original.starts_with('"') && original.ends_with('"');
    if !original_quoted && output.len() >= 2 && output.starts_with('"') && output.ends_with('"') {
        return output[1..output.len() - 1].trim().to_string();
    }
    output.to_string()
}

#[async_trait]
impl FallbackBackend for LocalModel {
    fn name(&self) -> &str {
        "local model"
    }

    async fn translate(&self, text: &str, target_language: &str) -> String {
        match self.try_translate(text, target_language).await {
            Ok(translated) => translated,
            Err(e) => {
                error!("Local translation failed for '{}': {}", preview(text, 30), e);
                text.to_string()
            }
        }
    }
}

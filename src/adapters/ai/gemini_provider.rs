//! Gemini Provider - Implementation of AIProvider for Google's Generative Language API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(api_key)
//!     .with_model("gemini-2.0-flash")
//!     .with_timeout(Duration::from_secs(30));
//!
//! let provider = GeminiProvider::new(config)?;
//! ```
//!
//! Each `complete` call makes exactly one `generateContent` request. Retries
//! are the flow executor's job.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TokenUsage,
};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gemini-2.0-flash").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Builds the generateContent endpoint URL.
    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Sends a request and handles transport failures.
    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        let body = GenerateRequest::from_completion(request);

        self.client
            .post(self.generate_url())
            .header("x-goog-api-key", self.config.api_key())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(error_for_status(status.as_u16(), error_body))
    }
}

/// Maps a non-success status and body onto the port's error type.
fn error_for_status(status: u16, error_body: String) -> AIError {
    match status {
        // An invalid key is reported as 400 INVALID_ARGUMENT.
        400 if error_body.contains("API_KEY_INVALID") || error_body.contains("API key not valid") => {
            AIError::AuthenticationFailed
        }
        400 if error_body.contains("exceeds the maximum number of tokens") => {
            AIError::context_too_long(0, 0)
        }
        400 => AIError::InvalidRequest(error_body),
        401 | 403 => AIError::AuthenticationFailed,
        404 => AIError::InvalidRequest(format!("Unknown model: {}", error_body)),
        429 => AIError::rate_limited(parse_retry_delay(&error_body)),
        500..=599 => AIError::unavailable(format!("Server error {}: {}", status, error_body)),
        _ => AIError::network(format!("Unexpected status {}: {}", status, error_body)),
    }
}

/// Reads `retryDelay` (e.g. "17s") from a RESOURCE_EXHAUSTED body.
fn parse_retry_delay(error_body: &str) -> u32 {
    let Some(idx) = error_body.find("\"retryDelay\"") else {
        return 30;
    };
    error_body[idx..]
        .split('"')
        .nth(3)
        .and_then(|v| v.trim_end_matches('s').parse::<f64>().ok())
        .map(|secs| secs.ceil() as u32)
        .unwrap_or(30)
}

/// Converts a decoded API response into a completion.
fn into_completion(response: GenerateResponse, model: &str) -> Result<CompletionResponse, AIError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AIError::content_filtered(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AIError::parse("No candidates in response"))?;

    let finish_reason = match candidate.finish_reason.as_deref() {
        Some("STOP") | None => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT")
        | Some("SPII") => FinishReason::ContentFilter,
        Some(_) => FinishReason::Error,
    };

    let content: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if content.is_empty() && finish_reason == FinishReason::ContentFilter {
        return Err(AIError::content_filtered(
            candidate.finish_reason.unwrap_or_default(),
        ));
    }

    let usage = response
        .usage_metadata
        .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();

    Ok(CompletionResponse {
        content,
        usage,
        model: response.model_version.unwrap_or_else(|| model.to_string()),
        finish_reason,
    })
}

#[async_trait]
impl AIProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let response = self.send_request(&request).await?;
        let response = self.handle_response_status(response).await?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        into_completion(body, &self.config.model)
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        // ~4 characters per token for Gemini models
        (text.len() / 4).max(1) as u32
    }

    fn provider_info(&self) -> ProviderInfo {
        let max_context = match self.config.model.as_str() {
            m if m.starts_with("gemini-1.5-pro") => 2_097_152,
            _ => 1_048_576,
        };

        ProviderInfo::new("gemini", &self.config.model, max_context)
    }
}

// ----- Gemini API Types -----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    fn from_completion(request: &CompletionRequest) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                response_mime_type: request.json_output.then(|| "application/json".to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RequestMetadata;
    use serde_json::json;
    use uuid::Uuid;

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            "Reply with JSON",
            RequestMetadata::new("therapeutic-response", Uuid::new_v4(), 1),
        )
        .with_temperature(0.7)
    }

    fn decode(body: serde_json::Value) -> GenerateResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn config_builder_works() {
        let config = GeminiConfig::new("test-key")
            .with_model("gemini-1.5-pro")
            .with_base_url("https://custom.api.com")
            .with_timeout(Duration::from_secs(10));

        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn config_debug_hides_key() {
        let config = GeminiConfig::new("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn url_includes_model() {
        let provider = GeminiProvider::new(
            GeminiConfig::new("k").with_base_url("https://example.test/v1beta/"),
        )
        .unwrap();
        assert_eq!(
            provider.generate_url(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn request_asks_for_json() {
        let body = serde_json::to_value(GenerateRequest::from_completion(&request())).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Reply with JSON");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn plain_text_request_omits_mime_type() {
        let body = serde_json::to_value(GenerateRequest::from_completion(
            &request().with_plain_text(),
        ))
        .unwrap();
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn parses_candidate_text_and_usage() {
        let response = decode(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16},
            "modelVersion": "gemini-2.0-flash-001"
        }));

        let completion = into_completion(response, DEFAULT_MODEL).unwrap();
        assert_eq!(completion.content, "{\"a\":1}");
        assert_eq!(completion.usage.total_tokens, 16);
        assert_eq!(completion.model, "gemini-2.0-flash-001");
        assert_eq!(completion.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn blocked_prompt_is_content_filtered() {
        let response = decode(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        let err = into_completion(response, DEFAULT_MODEL).unwrap_err();
        assert!(matches!(err, AIError::ContentFiltered { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn empty_candidates_is_parse_error() {
        let err = into_completion(decode(json!({})), DEFAULT_MODEL).unwrap_err();
        assert!(matches!(err, AIError::Parse(_)));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            error_for_status(400, "API key not valid. Please pass a valid API key.".into()),
            AIError::AuthenticationFailed
        ));
        assert!(matches!(error_for_status(403, String::new()), AIError::AuthenticationFailed));
        assert!(matches!(error_for_status(400, "bad".into()), AIError::InvalidRequest(_)));
        assert!(matches!(error_for_status(503, String::new()), AIError::Unavailable { .. }));
        assert!(matches!(
            error_for_status(429, r#"{"details":[{"retryDelay": "17s"}]}"#.into()),
            AIError::RateLimited { retry_after_secs: 17 }
        ));
    }

    #[test]
    fn retry_delay_defaults_to_thirty() {
        assert_eq!(parse_retry_delay("quota exceeded"), 30);
    }
}

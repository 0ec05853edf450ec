//! AI provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::ai::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::application::ExecutorSettings;

/// Upper bound on retries after the first model attempt.
pub const MAX_RETRIES_LIMIT: u32 = 5;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Google Generative Language API key
    pub google_api_key: Option<String>,

    /// Gemini model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Optional cap on output tokens
    pub max_output_tokens: Option<u32>,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if a Google API key is configured
    pub fn has_google(&self) -> bool {
        self.google_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Builds the adapter configuration. `None` without an API key.
    pub fn gemini(&self) -> Option<GeminiConfig> {
        let key = self.google_api_key.as_ref().filter(|k| !k.is_empty())?;
        Some(
            GeminiConfig::new(key.clone())
                .with_model(self.model.clone())
                .with_base_url(self.base_url.clone())
                .with_timeout(self.timeout()),
        )
    }

    /// Retry and timeout policy for the flow executor.
    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            timeout: self.timeout(),
            max_retries: self.max_retries,
            temperature: Some(self.temperature),
            max_tokens: self.max_output_tokens,
        }
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_google() {
            return Err(ValidationError::MissingRequired("GOOGLE_API_KEY"));
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ValidationError::TooManyRetries {
                max: MAX_RETRIES_LIMIT,
                actual: self.max_retries,
            });
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature(self.temperature));
        }

        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(ValidationError::InvalidBaseUrl);
        }

        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            temperature: default_temperature(),
            max_output_tokens: None,
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

fn default_temperature() -> f32 {
    0.7
}

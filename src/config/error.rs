//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid model request timeout")]
    InvalidTimeout,

    #[error("max_retries must be at most {max}, got {actual}")]
    TooManyRetries { max: u32, actual: u32 },

    #[error("temperature must be between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f32),

    #[error("Invalid AI base URL format")]
    InvalidBaseUrl,

    #[error("window_size must be between 1 and {max}, got {actual}")]
    InvalidWindowSize { max: usize, actual: usize },

    #[error("Lexicon file not found: {0}")]
    LexiconFileMissing(String),

    #[error("crisis_flow '{0}' is not a registered flow")]
    UnknownCrisisFlow(String),
}

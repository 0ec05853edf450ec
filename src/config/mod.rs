//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CAMPUS_CARE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use campus_care::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Using model {}", config.ai.model);
//! ```

mod ai;
mod conversation;
mod error;
mod safety;

pub use ai::{AiConfig, MAX_RETRIES_LIMIT};
pub use conversation::{ConversationConfig, MAX_WINDOW_SIZE};
pub use error::{ConfigError, ValidationError};
pub use safety::SafetyConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults; only `ai.google_api_key` must be supplied
/// for [`AppConfig::validate()`] to pass.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Model provider configuration (Gemini)
    #[serde(default)]
    pub ai: AiConfig,

    /// Conversation context window
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Lexicon and crisis routing
    #[serde(default)]
    pub safety: SafetyConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CAMPUS_CARE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CAMPUS_CARE__AI__GOOGLE_API_KEY=...` -> `ai.google_api_key = ...`
    /// - `CAMPUS_CARE__CONVERSATION__WINDOW_SIZE=8` -> `conversation.window_size = 8`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CAMPUS_CARE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.conversation.validate()?;
        self.safety.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use std::time::Duration;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "CAMPUS_CARE__AI__GOOGLE_API_KEY",
        "CAMPUS_CARE__AI__MODEL",
        "CAMPUS_CARE__AI__TIMEOUT_SECS",
        "CAMPUS_CARE__AI__MAX_RETRIES",
        "CAMPUS_CARE__CONVERSATION__WINDOW_SIZE",
        "CAMPUS_CARE__SAFETY__LEXICON_PATH",
    ];

    fn set_minimal_env() {
        env::set_var("CAMPUS_CARE__AI__GOOGLE_API_KEY", "AIza-test");
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.ai.google_api_key.as_deref(), Some("AIza-test"));
        assert_eq!(config.ai.model, "gemini-2.0-flash");
        assert_eq!(config.conversation.window_size, 5);
        assert!(config.safety.lexicon_path.is_none());
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("GOOGLE_API_KEY"))
        );
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("CAMPUS_CARE__AI__MODEL", "gemini-1.5-pro");
        env::set_var("CAMPUS_CARE__AI__TIMEOUT_SECS", "12");
        env::set_var("CAMPUS_CARE__AI__MAX_RETRIES", "4");
        env::set_var("CAMPUS_CARE__CONVERSATION__WINDOW_SIZE", "8");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ai.model, "gemini-1.5-pro");
        assert_eq!(config.ai.timeout(), Duration::from_secs(12));
        assert_eq!(config.ai.max_retries, 4);
        assert_eq!(config.conversation.window_size, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_window_out_of_range() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("CAMPUS_CARE__CONVERSATION__WINDOW_SIZE", "0");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(
            result.unwrap().validate(),
            Err(ValidationError::InvalidWindowSize { .. })
        ));
    }
}

//! Conversation context configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::conversation::DEFAULT_WINDOW_SIZE;

/// Largest accepted context window.
pub const MAX_WINDOW_SIZE: usize = 50;

/// Conversation context configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Trailing messages embedded into each prompt
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

impl ConversationConfig {
    /// Validate conversation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.window_size == 0 || self.window_size > MAX_WINDOW_SIZE {
            return Err(ValidationError::InvalidWindowSize {
                max: MAX_WINDOW_SIZE,
                actual: self.window_size,
            });
        }
        Ok(())
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window() {
        let config = ConversationConfig::default();
        assert_eq!(config.window_size, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_window_bounds() {
        for size in [0, 51] {
            let config = ConversationConfig { window_size: size };
            assert!(config.validate().is_err(), "size {size} should be rejected");
        }
        assert!(ConversationConfig { window_size: 1 }.validate().is_ok());
        assert!(ConversationConfig { window_size: 50 }.validate().is_ok());
    }
}

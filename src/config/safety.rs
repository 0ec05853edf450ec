//! Safety configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::flows::FlowRegistry;
use crate::domain::safety::{LexiconClassifier, LexiconError, DEFAULT_CRISIS_FLOW};

/// Safety configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SafetyConfig {
    /// Optional YAML file adding phrases to the lexicon tiers
    pub lexicon_path: Option<PathBuf>,

    /// Flow that critical conversations are redirected to
    #[serde(default = "default_crisis_flow")]
    pub crisis_flow: String,
}

impl SafetyConfig {
    /// Builds the lexicon classifier, applying the extension file if set.
    pub fn classifier(&self) -> Result<LexiconClassifier, LexiconError> {
        match &self.lexicon_path {
            Some(path) => LexiconClassifier::from_yaml_file(path),
            None => Ok(LexiconClassifier::new()),
        }
    }

    /// Validate safety configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(path) = &self.lexicon_path {
            if !path.is_file() {
                return Err(ValidationError::LexiconFileMissing(
                    path.display().to_string(),
                ));
            }
        }

        if self.crisis_flow.is_empty() {
            return Err(ValidationError::MissingRequired("SAFETY__CRISIS_FLOW"));
        }

        // Critical redirection targets must resolve to a built-in flow.
        if !FlowRegistry::with_default_flows().contains(&self.crisis_flow) {
            return Err(ValidationError::UnknownCrisisFlow(self.crisis_flow.clone()));
        }

        Ok(())
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            lexicon_path: None,
            crisis_flow: default_crisis_flow(),
        }
    }
}

fn default_crisis_flow() -> String {
    DEFAULT_CRISIS_FLOW.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::safety::RiskLevel;
    use std::io::Write;

    #[test]
    fn test_defaults_use_builtin_lexicon() {
        let config = SafetyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.crisis_flow, "crisis-intervention");

        let classifier = config.classifier().unwrap();
        assert_eq!(
            classifier.classify("I want to kill myself").level(),
            RiskLevel::Critical
        );
    }

    #[test]
    fn test_missing_lexicon_file() {
        let config = SafetyConfig {
            lexicon_path: Some(PathBuf::from("/nonexistent/lexicon.yaml")),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::LexiconFileMissing(_))
        ));
    }

    #[test]
    fn test_unregistered_crisis_flow() {
        let config = SafetyConfig {
            crisis_flow: "crisis-interventoin".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnknownCrisisFlow(
                "crisis-interventoin".to_string()
            ))
        );
    }

    #[test]
    fn test_empty_crisis_flow() {
        let config = SafetyConfig {
            crisis_flow: String::new(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("SAFETY__CRISIS_FLOW"))
        );
    }

    #[test]
    fn test_lexicon_file_extends_tiers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "critical:\n  - \"no way out\"").unwrap();

        let config = SafetyConfig {
            lexicon_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let classifier = config.classifier().unwrap();
        assert_eq!(
            classifier.classify("There's no way out for me").level(),
            RiskLevel::Critical
        );
    }
}

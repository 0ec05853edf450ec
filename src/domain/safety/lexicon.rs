//! Deterministic lexicon risk classifier.
//!
//! Scans raw user-authored text for risk phrases without consulting the
//! model. Tiers are evaluated from most to least severe and the first tier
//! with a matching phrase wins, so a critical phrase always beats a milder
//! one appearing in the same text.
//!
//! Phrase sets can be extended at start-up (in code or from a YAML file);
//! extension only adds phrases to a tier and never changes the ladder.
//!
//! ```yaml
//! critical:
//!   - "no way out"
//! low:
//!   - "exam panic"
//! ```

use std::path::Path;

use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;

use super::binding::SafetyBinding;
use super::risk::{RiskAssessment, RiskLevel, RiskSource};

const CRITICAL_PHRASES: &[&str] = &[
    "kill myself",
    "killing myself",
    "suicide",
    "suicidal",
    "end it all",
    "end my life",
    "better off dead",
    "want to die",
    "don't want to live",
    "no reason to live",
    "take my own life",
];

const HIGH_PHRASES: &[&str] = &[
    "hurt myself",
    "hurting myself",
    "harm myself",
    "self harm",
    "self-harm",
    "cut myself",
    "cutting myself",
    "burn myself",
];

const MODERATE_PHRASES: &[&str] = &[
    "hopeless",
    "worthless",
    "no point",
    "nobody cares",
    "completely alone",
    "so alone",
    "isolated",
    "i'm a burden",
];

const LOW_PHRASES: &[&str] = &[
    "stressed",
    "overwhelmed",
    "can't cope",
    "cannot cope",
    "anxious",
    "burned out",
    "burnt out",
    "panicking",
];

static STANDARD: Lazy<LexiconClassifier> = Lazy::new(LexiconClassifier::new);

/// Errors raised while extending the lexicon.
#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("phrases cannot be attached to the `none` tier")]
    NoneTier,

    #[error("lexicon phrases cannot be empty")]
    EmptyPhrase,

    #[error("failed to read lexicon file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lexicon file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// An input field whose value is itself a risk signal.
///
/// For example an assessment questionnaire answer `suicidalIdeation: true`
/// is critical no matter what free text accompanies it, and so is a crisis
/// report whose `crisisType` is `"suicidal"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSignal {
    /// JSON pointer into the flow input.
    pub pointer: &'static str,
    /// Value that raises the signal.
    pub trigger: SignalTrigger,
    /// Level raised when the signal fires.
    pub level: RiskLevel,
    /// Flag recorded on the assessment.
    pub flag: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalTrigger {
    /// The field is boolean `true`.
    True,
    /// The field is exactly this string.
    Equals(&'static str),
}

impl InputSignal {
    /// Fires when the boolean at `pointer` is `true`.
    pub fn when_true(pointer: &'static str, level: RiskLevel, flag: &'static str) -> Self {
        Self {
            pointer,
            trigger: SignalTrigger::True,
            level,
            flag,
        }
    }

    /// Fires when the string at `pointer` equals `value`.
    pub fn when_equals(
        pointer: &'static str,
        value: &'static str,
        level: RiskLevel,
        flag: &'static str,
    ) -> Self {
        Self {
            pointer,
            trigger: SignalTrigger::Equals(value),
            level,
            flag,
        }
    }

    fn fires(&self, input: &Value) -> bool {
        let field = input.pointer(self.pointer);
        match self.trigger {
            SignalTrigger::True => field.and_then(Value::as_bool) == Some(true),
            SignalTrigger::Equals(expected) => field.and_then(Value::as_str) == Some(expected),
        }
    }
}

#[derive(Debug, Clone)]
struct Tier {
    level: RiskLevel,
    phrases: Vec<String>,
}

/// YAML shape of a lexicon extension file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LexiconExtension {
    #[serde(default)]
    critical: Vec<String>,
    #[serde(default)]
    high: Vec<String>,
    #[serde(default)]
    moderate: Vec<String>,
    #[serde(default)]
    low: Vec<String>,
}

/// First-match-wins severity ladder over case-insensitive phrases.
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    /// Ordered most severe first.
    tiers: Vec<Tier>,
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconClassifier {
    /// Creates a classifier with the built-in phrase sets.
    pub fn new() -> Self {
        let tier = |level, phrases: &[&str]| Tier {
            level,
            phrases: phrases.iter().map(|p| normalize(p)).collect(),
        };

        Self {
            tiers: vec![
                tier(RiskLevel::Critical, CRITICAL_PHRASES),
                tier(RiskLevel::High, HIGH_PHRASES),
                tier(RiskLevel::Moderate, MODERATE_PHRASES),
                tier(RiskLevel::Low, LOW_PHRASES),
            ],
        }
    }

    /// Shared instance with the built-in phrase sets.
    pub fn standard() -> &'static LexiconClassifier {
        &STANDARD
    }

    /// Adds phrases to the tier for `level`.
    pub fn extend<I, S>(&mut self, level: RiskLevel, phrases: I) -> Result<(), LexiconError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tier = self
            .tiers
            .iter_mut()
            .find(|t| t.level == level)
            .ok_or(LexiconError::NoneTier)?;

        for phrase in phrases {
            let phrase = normalize(phrase.as_ref());
            if phrase.is_empty() {
                return Err(LexiconError::EmptyPhrase);
            }
            if !tier.phrases.contains(&phrase) {
                tier.phrases.push(phrase);
            }
        }
        Ok(())
    }

    /// Builder form of [`extend`](Self::extend).
    pub fn with_phrases<I, S>(mut self, level: RiskLevel, phrases: I) -> Result<Self, LexiconError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extend(level, phrases)?;
        Ok(self)
    }

    /// Extends the built-in phrase sets from YAML text.
    pub fn extend_from_yaml(&mut self, yaml: &str) -> Result<(), LexiconError> {
        let extension: LexiconExtension = serde_yaml::from_str(yaml)?;
        self.extend(RiskLevel::Critical, extension.critical)?;
        self.extend(RiskLevel::High, extension.high)?;
        self.extend(RiskLevel::Moderate, extension.moderate)?;
        self.extend(RiskLevel::Low, extension.low)?;
        Ok(())
    }

    /// Creates a classifier with the built-in phrases plus those in a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, LexiconError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut classifier = Self::new();
        classifier.extend_from_yaml(&yaml)?;
        Ok(classifier)
    }

    /// Classifies raw text.
    ///
    /// Flags list every phrase of the winning tier found in the text.
    pub fn classify(&self, raw_text: &str) -> RiskAssessment {
        let text = normalize(raw_text);

        for tier in &self.tiers {
            let matched: Vec<&String> = tier
                .phrases
                .iter()
                .filter(|phrase| text.contains(phrase.as_str()))
                .collect();

            if !matched.is_empty() {
                return RiskAssessment::new(tier.level, RiskSource::Lexicon).with_flags(
                    matched
                        .into_iter()
                        .map(|phrase| format!("lexicon:{}:\"{}\"", tier.level, phrase)),
                );
            }
        }

        RiskAssessment::none(RiskSource::Lexicon)
    }

    /// Evaluates declared input signals.
    ///
    /// Every signal that fires contributes its flag; the level is the most
    /// severe of them.
    pub fn classify_signals(&self, input: &Value, signals: &[InputSignal]) -> RiskAssessment {
        let raised: Vec<&InputSignal> = signals.iter().filter(|s| s.fires(input)).collect();

        let level = raised
            .iter()
            .fold(RiskLevel::None, |acc, s| acc.max_severity(s.level));

        RiskAssessment::new(level, RiskSource::Lexicon)
            .with_flags(raised.iter().map(|s| format!("signal:{}", s.flag)))
    }

    /// Full deterministic assessment of a flow input.
    ///
    /// Merges the phrase scan over the binding's text fields, its input
    /// signals and its risk floor. The model is never consulted.
    pub fn assess(&self, input: &Value, binding: &SafetyBinding) -> RiskAssessment {
        let text = self.classify(&binding.scanned_text(input));
        let signals = self.classify_signals(input, binding.input_signals());

        let mut level = text.level().max_severity(signals.level());
        let mut flags: Vec<String> = text.flags().iter().chain(signals.flags()).cloned().collect();

        if let Some((floor, flag)) = binding.risk_floor() {
            level = level.max_severity(floor);
            flags.push(format!("floor:{}", flag));
        }

        RiskAssessment::new(level, RiskSource::Lexicon).with_flags(flags)
    }

    /// Number of phrases attached to `level`.
    pub fn phrase_count(&self, level: RiskLevel) -> usize {
        self.tiers
            .iter()
            .find(|t| t.level == level)
            .map_or(0, |t| t.phrases.len())
    }
}

/// Lowercases, folds typographic apostrophes and collapses whitespace.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace(['\u{2019}', '\u{2018}'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

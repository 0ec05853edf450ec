//! Risk levels and assessments.
//!
//! Severity is compared through an explicit rank table, never through the
//! textual names, so `"critical" > "high"` cannot silently depend on
//! alphabetical order.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ordered severity scale: `none < low < moderate < high < critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// All levels from least to most severe.
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::None,
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Wire names in severity order, used by output contracts.
    pub const NAMES: [&'static str; 5] = ["none", "low", "moderate", "high", "critical"];

    /// Position on the severity scale.
    pub fn rank(self) -> u8 {
        match self {
            RiskLevel::None => 0,
            RiskLevel::Low => 1,
            RiskLevel::Moderate => 2,
            RiskLevel::High => 3,
            RiskLevel::Critical => 4,
        }
    }

    /// Returns the wire name.
    pub fn as_str(self) -> &'static str {
        Self::NAMES[self.rank() as usize]
    }

    /// Returns the more severe of two levels.
    pub fn max_severity(self, other: RiskLevel) -> RiskLevel {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    /// True for `high` and `critical`, the levels that force escalation.
    pub fn requires_escalation(self) -> bool {
        self.rank() >= RiskLevel::High.rank()
    }
}

impl PartialOrd for RiskLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RiskLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown risk level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown risk level: {0}")]
pub struct UnknownRiskLevel(pub String);

impl FromStr for RiskLevel {
    type Err = UnknownRiskLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        RiskLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| UnknownRiskLevel(s.to_string()))
    }
}

/// Where a risk assessment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskSource {
    /// Reported by the language model inside its structured output.
    Model,
    /// Computed by the deterministic lexicon classifier.
    Lexicon,
    /// Merge of a model and a lexicon assessment.
    Combined,
}

/// Immutable risk verdict. Merging produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    level: RiskLevel,
    source: RiskSource,
    flags: BTreeSet<String>,
}

impl RiskAssessment {
    /// Creates an assessment with the given level and source and no flags.
    pub fn new(level: RiskLevel, source: RiskSource) -> Self {
        Self {
            level,
            source,
            flags: BTreeSet::new(),
        }
    }

    /// A `none` assessment from the given source.
    pub fn none(source: RiskSource) -> Self {
        Self::new(RiskLevel::None, source)
    }

    /// Returns a copy with an extra flag.
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    /// Returns a copy with extra flags.
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags.extend(flags.into_iter().map(Into::into));
        self
    }

    pub fn level(&self) -> RiskLevel {
        self.level
    }

    pub fn source(&self) -> RiskSource {
        self.source
    }

    pub fn flags(&self) -> &BTreeSet<String> {
        &self.flags
    }
}

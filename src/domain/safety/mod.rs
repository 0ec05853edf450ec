//! Safety Domain Module
//!
//! Deterministic risk detection and escalation, independent of the model.
//!
//! - **Risk**: ordered severity scale and immutable assessments
//! - **Lexicon**: first-match-wins phrase ladder over raw user text
//! - **Binding**: where each flow keeps its risk-relevant fields
//! - **Router**: max-severity merge and escalation decisions

pub mod binding;
pub mod lexicon;
pub mod risk;
pub mod router;

pub use binding::SafetyBinding;
pub use lexicon::{InputSignal, LexiconClassifier, LexiconError, SignalTrigger};
pub use risk::{RiskAssessment, RiskLevel, RiskSource, UnknownRiskLevel};
pub use router::{EscalationDecision, EscalationRouter, DEFAULT_CRISIS_FLOW};

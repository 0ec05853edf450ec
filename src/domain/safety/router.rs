//! Crisis escalation router.
//!
//! Merges the model's risk report with the lexicon verdict and decides what
//! the caller must do about it. The merged level is the maximum of the two,
//! so the deterministic classifier can raise risk but never be talked down
//! by the model.

use serde::Serialize;
use serde_json::Value;

use super::binding::{set_pointer, SafetyBinding};
use super::risk::{RiskAssessment, RiskLevel, RiskSource};

/// Default flow that critical conversations are redirected to.
pub const DEFAULT_CRISIS_FLOW: &str = "crisis-intervention";

/// What the caller must do with a routed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationDecision {
    pub risk: RiskAssessment,
    pub follow_up_required: bool,
    pub escalation_needed: bool,
    /// Flow the caller should move the conversation to, if any.
    pub redirect_to: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EscalationRouter {
    crisis_flow: String,
}

impl Default for EscalationRouter {
    fn default() -> Self {
        Self::new(DEFAULT_CRISIS_FLOW)
    }
}

impl EscalationRouter {
    pub fn new(crisis_flow: impl Into<String>) -> Self {
        Self {
            crisis_flow: crisis_flow.into(),
        }
    }

    pub fn crisis_flow(&self) -> &str {
        &self.crisis_flow
    }

    /// Merges two assessments into one.
    ///
    /// The level is the more severe of the two and the flags are their union.
    /// The source is `combined` unless both inputs carry the same source.
    pub fn route(&self, model: &RiskAssessment, lexicon: &RiskAssessment) -> RiskAssessment {
        let level = model.level().max_severity(lexicon.level());
        let source = if model.source() == lexicon.source() {
            model.source()
        } else {
            RiskSource::Combined
        };

        RiskAssessment::new(level, source)
            .with_flags(model.flags().iter().cloned())
            .with_flags(lexicon.flags().iter().cloned())
    }

    /// Decides escalation and redirection for a merged assessment.
    pub fn decide(&self, flow: &str, combined: RiskAssessment) -> EscalationDecision {
        let escalate = combined.level().requires_escalation();
        let redirect_to = (combined.level() == RiskLevel::Critical && flow != self.crisis_flow)
            .then(|| self.crisis_flow.clone());

        EscalationDecision {
            risk: combined,
            follow_up_required: escalate,
            escalation_needed: escalate,
            redirect_to,
        }
    }

    /// Writes the decision back into a flow output.
    ///
    /// The merged level and flags replace the model's own report, and every
    /// escalation field of the binding is forced to `true` when escalating.
    /// Only fields the output contract already declares are touched.
    pub fn apply(&self, binding: &SafetyBinding, decision: &EscalationDecision, output: &mut Value) {
        if let Some(pointer) = binding.model_level_pointer() {
            set_pointer(output, pointer, Value::from(decision.risk.level().as_str()));
        }

        if let Some(pointer) = binding.model_flags_pointer() {
            let flags: Vec<Value> = decision.risk.flags().iter().cloned().map(Value::from).collect();
            set_pointer(output, pointer, Value::Array(flags));
        }

        if decision.escalation_needed {
            for pointer in binding.escalation_fields() {
                set_pointer(output, pointer, Value::Bool(true));
            }
        }
    }
}

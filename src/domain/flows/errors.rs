//! Flow errors.

use thiserror::Error;

use super::contract::ContractViolation;

/// Errors raised while resolving, compiling or executing a flow.
///
/// Only `UnknownFlow`, `DuplicateFlow` and `InputValidation` reach callers.
/// Model-side failures are absorbed into the flow's fallback and recorded per
/// attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    #[error("Unknown flow: {0}")]
    UnknownFlow(String),

    #[error("Flow already registered: {0}")]
    DuplicateFlow(String),

    #[error("Invalid input for flow {flow}: {}", join_violations(.violations))]
    InputValidation {
        flow: String,
        violations: Vec<ContractViolation>,
    },

    #[error("Model unavailable for flow {flow}: {reason}")]
    ModelUnavailable { flow: String, reason: String },

    #[error("Output of flow {flow} failed validation: {}", join_violations(.violations))]
    OutputValidation {
        flow: String,
        violations: Vec<ContractViolation>,
    },
}

impl FlowError {
    pub fn model_unavailable(flow: impl Into<String>, reason: impl ToString) -> Self {
        FlowError::ModelUnavailable {
            flow: flow.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true for errors the caller must handle itself.
    pub fn is_caller_fatal(&self) -> bool {
        matches!(
            self,
            FlowError::UnknownFlow(_) | FlowError::DuplicateFlow(_) | FlowError::InputValidation { .. }
        )
    }

    /// Violations carried by validation errors.
    pub fn violations(&self) -> &[ContractViolation] {
        match self {
            FlowError::InputValidation { violations, .. }
            | FlowError::OutputValidation { violations, .. } => violations,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[ContractViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_validation_lists_every_field() {
        let err = FlowError::InputValidation {
            flow: "psychoeducation".to_string(),
            violations: vec![
                ContractViolation::MissingRequired { field: "topic".to_string() },
                ContractViolation::MissingRequired { field: "userLevel".to_string() },
            ],
        };

        let message = err.to_string();
        assert!(message.contains("topic"));
        assert!(message.contains("userLevel"));
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn caller_fatal_classification() {
        assert!(FlowError::UnknownFlow("x".to_string()).is_caller_fatal());
        assert!(FlowError::DuplicateFlow("x".to_string()).is_caller_fatal());
        assert!(!FlowError::model_unavailable("x", "timed out").is_caller_fatal());
        assert!(!FlowError::OutputValidation {
            flow: "x".to_string(),
            violations: vec![]
        }
        .is_caller_fatal());
    }

    #[test]
    fn model_unavailable_keeps_reason() {
        let err = FlowError::model_unavailable("crisis-intervention", "network error: reset");
        assert_eq!(
            err.to_string(),
            "Model unavailable for flow crisis-intervention: network error: reset"
        );
    }
}

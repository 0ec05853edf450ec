//! Safety pipeline.
//!
//! The caller-facing entry point. Every invocation runs the deterministic
//! classifier over the flow input (text, signals and risk floor), executes
//! the flow, merges the lexicon verdict with
//! the model's own risk report and writes the escalation decision back into
//! the output.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::executor::FlowExecutor;
use crate::domain::conversation::{ConversationWindow, Message, DEFAULT_WINDOW_SIZE};
use crate::domain::flows::FlowError;
use crate::domain::safety::{
    EscalationRouter, LexiconClassifier, RiskAssessment, RiskSource,
};

/// Result of one `invoke` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowOutcome {
    pub flow: String,
    /// Conforms to the flow's output contract, with risk fields already
    /// overwritten by the merged assessment.
    pub output: Value,
    pub risk: RiskAssessment,
    pub follow_up_required: bool,
    pub escalation_needed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    pub used_fallback: bool,
    pub attempts: u32,
    pub invocation_id: Uuid,
}

impl FlowOutcome {
    /// True when a human should be brought in.
    pub fn needs_attention(&self) -> bool {
        self.escalation_needed || self.redirect_to.is_some()
    }
}

pub struct SafetyPipeline {
    executor: FlowExecutor,
    classifier: Arc<LexiconClassifier>,
    router: EscalationRouter,
    window_size: usize,
}

impl SafetyPipeline {
    /// Builds a pipeline using the standard lexicon and router.
    pub fn new(executor: FlowExecutor) -> Self {
        Self {
            executor,
            classifier: Arc::new(LexiconClassifier::standard().clone()),
            router: EscalationRouter::default(),
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<LexiconClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_router(mut self, router: EscalationRouter) -> Self {
        self.router = router;
        self
    }

    /// Number of trailing context messages embedded into prompts.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size.max(1);
        self
    }

    pub fn executor(&self) -> &FlowExecutor {
        &self.executor
    }

    /// Runs a flow end to end.
    ///
    /// Only unknown flows and invalid input are returned as errors. Model
    /// failures surface as fallback output with `used_fallback` set.
    pub async fn invoke(
        &self,
        flow: &str,
        input: Value,
        context: &[Message],
    ) -> Result<FlowOutcome, FlowError> {
        let definition = self.executor.registry().lookup(flow)?;
        let binding = definition.safety();
        let invocation_id = Uuid::new_v4();

        let lexicon = self.classifier.assess(&input, binding);

        tracing::debug!(
            flow,
            invocation_id = %invocation_id,
            flags = lexicon.flags().len(),
            level = %lexicon.level().as_str(),
            "Lexicon classification complete"
        );

        let window = ConversationWindow::from_history(context, self.window_size);
        let execution = self
            .executor
            .run(&definition, &input, &window, invocation_id)
            .await?;

        let model = if execution.used_fallback {
            RiskAssessment::none(RiskSource::Model)
        } else {
            binding.read_model_risk(&execution.output)
        };

        let decision = self
            .router
            .decide(definition.name(), self.router.route(&model, &lexicon));

        let mut output = execution.output;
        self.router.apply(binding, &decision, &mut output);

        if decision.escalation_needed {
            tracing::warn!(
                flow,
                invocation_id = %invocation_id,
                level = %decision.risk.level().as_str(),
                redirect_to = decision.redirect_to.as_deref().unwrap_or(""),
                "Escalation required"
            );
        } else {
            tracing::info!(
                flow,
                invocation_id = %invocation_id,
                level = %decision.risk.level().as_str(),
                used_fallback = execution.used_fallback,
                "Flow invocation complete"
            );
        }

        Ok(FlowOutcome {
            flow: definition.name().to_string(),
            output,
            risk: decision.risk,
            follow_up_required: decision.follow_up_required,
            escalation_needed: decision.escalation_needed,
            redirect_to: decision.redirect_to,
            used_fallback: execution.used_fallback,
            attempts: execution.attempts,
            invocation_id,
        })
    }
}

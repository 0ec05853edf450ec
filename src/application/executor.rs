//! Flow executor.
//!
//! Resolves a flow, compiles its prompt, calls the model under a timeout and
//! validates the reply against the output contract. Invalid replies are
//! retried with a directive listing the violations; when every attempt fails
//! the flow's deterministic fallback is returned instead. Model-side failures
//! never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;
use uuid::Uuid;

use crate::domain::conversation::ConversationWindow;
use crate::domain::flows::contract::ROOT_PATH;
use crate::domain::flows::{
    compile, retry_directive, ContractViolation, FlowDefinition, FlowError, FlowRegistry,
};
use crate::ports::{AIProvider, CompletionRequest, RequestMetadata};

/// Retry and timeout policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorSettings {
    /// Upper bound for one model call.
    pub timeout: Duration,
    /// Attempts after the first one.
    pub max_retries: u32,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 2,
            temperature: Some(0.7),
            max_tokens: None,
        }
    }
}

/// Validated output of one flow execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// Conforms to the flow's output contract.
    pub output: Value,
    /// Model calls made, including failed ones.
    pub attempts: u32,
    pub used_fallback: bool,
    /// One entry per failed attempt, oldest first.
    pub failures: Vec<FlowError>,
}

pub struct FlowExecutor {
    registry: Arc<FlowRegistry>,
    provider: Arc<dyn AIProvider>,
    settings: ExecutorSettings,
}

impl FlowExecutor {
    pub fn new(registry: Arc<FlowRegistry>, provider: Arc<dyn AIProvider>) -> Self {
        Self {
            registry,
            provider,
            settings: ExecutorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ExecutorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &FlowRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Executes a flow by name.
    ///
    /// Unknown flows and invalid input fail before any model call.
    pub async fn execute(
        &self,
        flow: &str,
        input: &Value,
        context: &ConversationWindow,
    ) -> Result<ExecutionResult, FlowError> {
        let definition = self.registry.lookup(flow)?;
        self.run(&definition, input, context, Uuid::new_v4()).await
    }

    /// Executes a resolved flow, tagging every attempt with `invocation_id`.
    pub async fn run(
        &self,
        definition: &FlowDefinition,
        input: &Value,
        context: &ConversationWindow,
        invocation_id: Uuid,
    ) -> Result<ExecutionResult, FlowError> {
        let flow = definition.name();
        let prompt = compile(definition, input, context)?;

        let max_attempts = self.settings.max_retries.saturating_add(1);
        let mut failures = Vec::new();
        let mut directive: Option<String> = None;
        let mut attempts = 0;

        while attempts < max_attempts {
            attempts += 1;

            let text = match &directive {
                Some(d) => format!("{}\n{}", prompt, d),
                None => prompt.clone(),
            };

            tracing::debug!(
                flow,
                attempt = attempts,
                invocation_id = %invocation_id,
                prompt_tokens = self.provider.estimate_tokens(&text),
                "Invoking model"
            );

            let request = self.request(text, RequestMetadata::new(flow, invocation_id, attempts));

            let completion = match timeout(self.settings.timeout, self.provider.complete(request)).await
            {
                Err(_) => {
                    tracing::warn!(
                        flow,
                        attempt = attempts,
                        invocation_id = %invocation_id,
                        timeout_ms = self.settings.timeout.as_millis() as u64,
                        "Model call timed out"
                    );
                    failures.push(FlowError::model_unavailable(
                        flow,
                        format!("timed out after {}ms", self.settings.timeout.as_millis()),
                    ));
                    continue;
                }
                Ok(Err(err)) => {
                    let retryable = err.is_retryable();
                    tracing::warn!(
                        flow,
                        attempt = attempts,
                        invocation_id = %invocation_id,
                        error = %err,
                        retryable,
                        "Model call failed"
                    );
                    failures.push(FlowError::model_unavailable(flow, &err));
                    if !retryable {
                        break;
                    }
                    continue;
                }
                Ok(Ok(completion)) => completion,
            };

            let checked = match extract_json(&completion.content) {
                Some(value) => definition
                    .output_contract()
                    .validate(&value)
                    .map(|()| value),
                None => Err(vec![ContractViolation::InvalidType {
                    field: ROOT_PATH.to_string(),
                    expected: "JSON object".to_string(),
                    actual: "unparseable text".to_string(),
                }]),
            };

            match checked {
                Ok(output) => {
                    tracing::info!(
                        flow,
                        attempts,
                        invocation_id = %invocation_id,
                        completion_tokens = completion.usage.completion_tokens,
                        "Flow output validated"
                    );
                    return Ok(ExecutionResult {
                        output,
                        attempts,
                        used_fallback: false,
                        failures,
                    });
                }
                Err(violations) => {
                    tracing::warn!(
                        flow,
                        attempt = attempts,
                        invocation_id = %invocation_id,
                        violations = violations.len(),
                        "Model output rejected"
                    );
                    directive = Some(retry_directive(&violations));
                    failures.push(FlowError::OutputValidation {
                        flow: flow.to_string(),
                        violations,
                    });
                }
            }
        }

        tracing::error!(
            flow,
            attempts,
            invocation_id = %invocation_id,
            "Model attempts exhausted, using fallback output"
        );

        Ok(ExecutionResult {
            output: definition.fallback(input),
            attempts,
            used_fallback: true,
            failures,
        })
    }

    fn request(&self, prompt: String, metadata: RequestMetadata) -> CompletionRequest {
        let mut request = CompletionRequest::new(prompt, metadata);
        if let Some(temperature) = self.settings.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.settings.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }
}

/// Pulls a JSON value out of model text.
///
/// Accepts bare JSON, JSON inside a Markdown code fence, or a single object
/// surrounded by prose.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(fenced) = strip_code_fence(trimmed) {
        if let Ok(value) = serde_json::from_str(fenced) {
            return Some(value);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let rest = &text[open + 3..];
    // Skip the language tag on the opening line.
    let body_start = rest.find('\n')? + 1;
    let body = &rest[body_start..];
    let close = body.rfind("```")?;
    Some(body[..close].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::domain::flows::catalog::{self, THERAPEUTIC_RESPONSE};
    use serde_json::json;

    fn valid_reply() -> String {
        json!({
            "response": "That sounds like a lot to carry.",
            "emotionalTone": "supportive",
            "riskIndicators": {"level": "low", "flags": ["exam stress"]}
        })
        .to_string()
    }

    fn input() -> Value {
        json!({"userMessage": "I'm a bit stressed about exams"})
    }

    fn executor(provider: &MockAIProvider) -> FlowExecutor {
        FlowExecutor::new(
            Arc::new(FlowRegistry::with_default_flows()),
            Arc::new(provider.clone()),
        )
        .with_settings(ExecutorSettings {
            timeout: Duration::from_millis(50),
            ..ExecutorSettings::default()
        })
    }

    mod extraction {
        use super::*;

        #[test]
        fn bare_json() {
            assert_eq!(extract_json(" {\"a\": 1} "), Some(json!({"a": 1})));
        }

        #[test]
        fn fenced_json() {
            let text = "Here you go:\n```json\n{\"a\": [1, 2]}\n```\nHope it helps";
            assert_eq!(extract_json(text), Some(json!({"a": [1, 2]})));
        }

        #[test]
        fn object_inside_prose() {
            let text = "Sure! {\"a\": {\"b\": true}} Let me know.";
            assert_eq!(extract_json(text), Some(json!({"a": {"b": true}})));
        }

        #[test]
        fn rejects_plain_text() {
            assert_eq!(extract_json("I'm here for you."), None);
            assert_eq!(extract_json("} backwards {"), None);
        }
    }

    mod execution {
        use super::*;

        #[tokio::test]
        async fn valid_reply_on_first_attempt() {
            let provider = MockAIProvider::new().with_response(valid_reply());

            let result = executor(&provider)
                .execute(THERAPEUTIC_RESPONSE, &input(), &ConversationWindow::default())
                .await
                .unwrap();

            assert_eq!(result.attempts, 1);
            assert!(!result.used_fallback);
            assert!(result.failures.is_empty());
            assert_eq!(result.output["riskIndicators"]["level"], "low");
            assert_eq!(provider.call_count(), 1);
        }

        #[tokio::test]
        async fn unknown_flow_makes_no_calls() {
            let provider = MockAIProvider::new();

            let err = executor(&provider)
                .execute("not-a-real-flow", &json!({}), &ConversationWindow::default())
                .await
                .unwrap_err();

            assert_eq!(err, FlowError::UnknownFlow("not-a-real-flow".to_string()));
            assert_eq!(provider.call_count(), 0);
        }

        #[tokio::test]
        async fn invalid_input_makes_no_calls() {
            let provider = MockAIProvider::new();

            let err = executor(&provider)
                .execute(THERAPEUTIC_RESPONSE, &json!({"userMessage": 3}), &ConversationWindow::default())
                .await
                .unwrap_err();

            assert!(matches!(err, FlowError::InputValidation { .. }));
            assert_eq!(provider.call_count(), 0);
        }

        #[tokio::test]
        async fn invalid_reply_is_retried_with_directive() {
            let provider = MockAIProvider::new()
                .with_response(r#"{"response": "hi", "emotionalTone": "cheerful"}"#)
                .with_response(valid_reply());

            let result = executor(&provider)
                .execute(THERAPEUTIC_RESPONSE, &input(), &ConversationWindow::default())
                .await
                .unwrap();

            assert_eq!(result.attempts, 2);
            assert!(!result.used_fallback);
            assert!(matches!(result.failures[0], FlowError::OutputValidation { .. }));

            let calls = provider.get_calls();
            assert!(!calls[0].prompt.contains("REJECTED"));
            assert!(calls[1].prompt.contains("REJECTED"));
            assert!(calls[1].prompt.contains("emotionalTone"));
            assert_eq!(calls[1].metadata.attempt, 2);
            assert_eq!(calls[0].metadata.invocation_id, calls[1].metadata.invocation_id);
        }

        #[tokio::test]
        async fn exhausted_attempts_use_fallback() {
            let provider = MockAIProvider::new().with_default_response("not json at all");

            let result = executor(&provider)
                .execute(THERAPEUTIC_RESPONSE, &input(), &ConversationWindow::default())
                .await
                .unwrap();

            assert!(result.used_fallback);
            assert_eq!(result.attempts, 3);
            assert_eq!(result.failures.len(), 3);
            assert_eq!(provider.call_count(), 3);

            let definition = catalog::therapeutic_response::definition();
            assert!(definition.output_contract().validate(&result.output).is_ok());
        }

        #[tokio::test]
        async fn timeouts_fall_back_after_every_attempt() {
            let provider = MockAIProvider::new()
                .with_default_response(valid_reply())
                .with_delay(Duration::from_millis(500));

            let result = executor(&provider)
                .execute(THERAPEUTIC_RESPONSE, &input(), &ConversationWindow::default())
                .await
                .unwrap();

            assert!(result.used_fallback);
            assert_eq!(result.attempts, 3);
            assert!(result
                .failures
                .iter()
                .all(|f| matches!(f, FlowError::ModelUnavailable { .. })));
        }

        #[tokio::test]
        async fn non_retryable_error_skips_remaining_attempts() {
            let provider = MockAIProvider::new()
                .with_error(MockError::AuthenticationFailed)
                .with_response(valid_reply());

            let result = executor(&provider)
                .execute(THERAPEUTIC_RESPONSE, &input(), &ConversationWindow::default())
                .await
                .unwrap();

            assert!(result.used_fallback);
            assert_eq!(result.attempts, 1);
            assert_eq!(provider.call_count(), 1);
        }

        #[tokio::test]
        async fn retryable_error_then_success() {
            let provider = MockAIProvider::new()
                .with_error(MockError::Network {
                    message: "reset".to_string(),
                })
                .with_response(valid_reply());

            let result = executor(&provider)
                .execute(THERAPEUTIC_RESPONSE, &input(), &ConversationWindow::default())
                .await
                .unwrap();

            assert!(!result.used_fallback);
            assert_eq!(result.attempts, 2);
        }

        #[tokio::test]
        async fn zero_retries_means_one_attempt() {
            let provider = MockAIProvider::new().with_default_response("{}");
            let executor = executor(&provider).with_settings(ExecutorSettings {
                max_retries: 0,
                ..ExecutorSettings::default()
            });

            let result = executor
                .execute(THERAPEUTIC_RESPONSE, &input(), &ConversationWindow::default())
                .await
                .unwrap();

            assert!(result.used_fallback);
            assert_eq!(result.attempts, 1);
        }

        #[tokio::test]
        async fn settings_reach_the_request() {
            let provider = MockAIProvider::new().with_response(valid_reply());
            let executor = executor(&provider).with_settings(ExecutorSettings {
                temperature: Some(0.2),
                max_tokens: Some(512),
                ..ExecutorSettings::default()
            });

            executor
                .execute(THERAPEUTIC_RESPONSE, &input(), &ConversationWindow::default())
                .await
                .unwrap();

            let call = &provider.get_calls()[0];
            assert_eq!(call.temperature, Some(0.2));
            assert_eq!(call.max_tokens, Some(512));
            assert!(call.json_output);
        }
    }
}

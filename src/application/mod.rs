//! Application layer - flow execution and the safety pipeline.
//!
//! The executor owns the model interaction (timeout, retry, fallback); the
//! pipeline wraps it with lexicon classification and escalation routing.

mod executor;
mod pipeline;

pub use executor::{extract_json, ExecutionResult, ExecutorSettings, FlowExecutor};
pub use pipeline::{FlowOutcome, SafetyPipeline};

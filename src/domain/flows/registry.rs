//! Flow definitions and the registry that maps names to them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::catalog;
use super::contract::Contract;
use super::errors::FlowError;
use super::prompt::PromptTemplate;
use crate::domain::safety::SafetyBinding;

/// Produces a schema-conformant output without the model.
///
/// Receives the validated flow input so the reply can be tailored to it.
pub type Fallback = fn(&Value) -> Value;

/// Everything needed to run one flow.
///
/// Immutable once built; shared through the registry as `Arc<FlowDefinition>`.
#[derive(Clone)]
pub struct FlowDefinition {
    name: &'static str,
    input: Contract,
    output: Contract,
    template: PromptTemplate,
    safety: SafetyBinding,
    fallback: Fallback,
}

impl FlowDefinition {
    /// Builds a flow definition.
    ///
    /// Every free-text field of the input contract is added to the safety
    /// binding's lexicon scan, so user-authored text never bypasses the
    /// classifier.
    pub fn new(
        name: &'static str,
        input: Contract,
        output: Contract,
        template: PromptTemplate,
        safety: SafetyBinding,
        fallback: Fallback,
    ) -> Self {
        let safety = safety.scan_all(input.text_pointers());
        Self {
            name,
            input,
            output,
            template,
            safety,
            fallback,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn input_contract(&self) -> &Contract {
        &self.input
    }

    pub fn output_contract(&self) -> &Contract {
        &self.output
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn safety(&self) -> &SafetyBinding {
        &self.safety
    }

    /// Deterministic output used when the model cannot produce a valid one.
    pub fn fallback(&self, input: &Value) -> Value {
        (self.fallback)(input)
    }
}

impl fmt::Debug for FlowDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowDefinition")
            .field("name", &self.name)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("template", &self.template)
            .field("safety", &self.safety)
            .finish_non_exhaustive()
    }
}

/// Name-to-definition map, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct FlowRegistry {
    flows: HashMap<String, Arc<FlowDefinition>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every flow of the catalog.
    pub fn with_default_flows() -> Self {
        let mut registry = Self::new();
        for definition in catalog::all() {
            registry
                .flows
                .insert(definition.name().to_string(), Arc::new(definition));
        }
        registry
    }

    pub fn register(&mut self, definition: FlowDefinition) -> Result<(), FlowError> {
        let name = definition.name();
        if self.flows.contains_key(name) {
            return Err(FlowError::DuplicateFlow(name.to_string()));
        }
        self.flows.insert(name.to_string(), Arc::new(definition));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<FlowDefinition>, FlowError> {
        self.flows
            .get(name)
            .cloned()
            .ok_or_else(|| FlowError::UnknownFlow(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flows.contains_key(name)
    }

    /// Registered flow names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.flows.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

//! Prompt compilation.
//!
//! A [`PromptTemplate`] is a fixed preamble, an ordered list of named slots
//! filled from the flow input, and a guidelines block. [`compile`] validates
//! the input, renders the slots whose values are present, embeds the bounded
//! conversation window and finishes with the exact output shape the model
//! must produce. Compilation is pure: the same input always yields the same
//! prompt text.

use std::fmt::Write as _;

use serde_json::Value;

use super::contract::ContractViolation;
use super::errors::FlowError;
use super::registry::FlowDefinition;
use crate::domain::conversation::ConversationWindow;

/// How a slot value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFormat {
    /// Inline after the label. Non-string scalars use their JSON text.
    Text,
    /// One `- item` line per array element.
    List,
    /// Compact JSON.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    label: &'static str,
    pointer: &'static str,
    format: SlotFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptTemplate {
    preamble: &'static str,
    slots: Vec<Slot>,
    guidelines: &'static str,
}

impl PromptTemplate {
    pub fn new(preamble: &'static str) -> Self {
        Self {
            preamble,
            ..Self::default()
        }
    }

    /// Adds a slot rendered from the input value at `pointer`.
    ///
    /// The slot is emitted only when the value is present, non-null and
    /// non-empty.
    pub fn slot(mut self, label: &'static str, pointer: &'static str, format: SlotFormat) -> Self {
        self.slots.push(Slot {
            label,
            pointer,
            format,
        });
        self
    }

    pub fn text(self, label: &'static str, pointer: &'static str) -> Self {
        self.slot(label, pointer, SlotFormat::Text)
    }

    pub fn list(self, label: &'static str, pointer: &'static str) -> Self {
        self.slot(label, pointer, SlotFormat::List)
    }

    pub fn json(self, label: &'static str, pointer: &'static str) -> Self {
        self.slot(label, pointer, SlotFormat::Json)
    }

    pub fn guidelines(mut self, guidelines: &'static str) -> Self {
        self.guidelines = guidelines;
        self
    }

    fn render_slots(&self, input: &Value, out: &mut String) {
        for slot in &self.slots {
            let Some(value) = input.pointer(slot.pointer).filter(|v| is_present(v)) else {
                continue;
            };

            match slot.format {
                SlotFormat::Text => {
                    let _ = writeln!(out, "{}: {}", slot.label, scalar_text(value));
                }
                SlotFormat::List => {
                    let _ = writeln!(out, "{}:", slot.label);
                    match value {
                        Value::Array(items) => {
                            for item in items {
                                let _ = writeln!(out, "- {}", scalar_text(item));
                            }
                        }
                        other => {
                            let _ = writeln!(out, "- {}", scalar_text(other));
                        }
                    }
                }
                SlotFormat::Json => {
                    let _ = writeln!(out, "{}: {}", slot.label, value);
                }
            }
        }
    }
}

/// Header of the section listing the required output fields.
pub const OUTPUT_FORMAT_HEADER: &str = "OUTPUT FORMAT";

/// Header of the embedded conversation window.
pub const CONTEXT_HEADER: &str = "Recent conversation:";

/// Compiles the prompt for one invocation of `definition`.
///
/// Fails with [`FlowError::InputValidation`] listing every violated field
/// before any text is produced.
pub fn compile(
    definition: &FlowDefinition,
    input: &Value,
    context: &ConversationWindow,
) -> Result<String, FlowError> {
    definition
        .input_contract()
        .validate(input)
        .map_err(|violations| FlowError::InputValidation {
            flow: definition.name().to_string(),
            violations,
        })?;

    let template = definition.template();
    let mut out = String::new();

    out.push_str(template.preamble.trim_end());
    out.push_str("\n\n");

    template.render_slots(input, &mut out);

    if !context.is_empty() {
        out.push('\n');
        out.push_str(CONTEXT_HEADER);
        out.push('\n');
        for message in context.iter() {
            let _ = writeln!(out, "{}: {}", message.role().label(), message.content());
        }
    }

    if !template.guidelines.is_empty() {
        out.push('\n');
        out.push_str(template.guidelines.trim_end());
        out.push('\n');
    }

    out.push('\n');
    out.push_str(OUTPUT_FORMAT_HEADER);
    out.push('\n');
    out.push_str(
        "Respond with a single JSON object and nothing else. Use exactly these field names:\n",
    );
    out.push_str(&definition.output_contract().describe());

    Ok(out)
}

/// Instruction appended to a prompt after the model produced invalid output.
pub fn retry_directive(violations: &[ContractViolation]) -> String {
    let mut out = String::from(
        "\nYOUR PREVIOUS RESPONSE WAS REJECTED\nIt did not match the required output format:\n",
    );
    for violation in violations {
        let _ = writeln!(out, "- {}", violation);
    }
    out.push_str("Reply again with only a JSON object that satisfies the OUTPUT FORMAT above.\n");
    out
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//! Safety bindings: where a flow keeps its risk-relevant fields.
//!
//! Each flow declares which input fields hold user-authored text, which
//! inputs are risk signals on their own, the minimum risk the flow always
//! carries, where the model reports risk in the output, and which output
//! booleans must be forced on escalation. Locations are JSON pointers
//! (RFC 6901).

use serde_json::Value;

use super::lexicon::InputSignal;
use super::risk::{RiskAssessment, RiskLevel, RiskSource};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyBinding {
    scanned_text: Vec<String>,
    input_signals: Vec<InputSignal>,
    risk_floor: Option<(RiskLevel, &'static str)>,
    model_level: Option<&'static str>,
    model_flags: Option<&'static str>,
    escalation_fields: Vec<&'static str>,
}

impl SafetyBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input field holding user-authored text for the lexicon scan.
    pub fn scan(self, pointer: &'static str) -> Self {
        self.scan_all([pointer.to_string()])
    }

    /// Adds every pointer not already scanned.
    pub fn scan_all<I>(mut self, pointers: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        for pointer in pointers {
            if !self.scanned_text.contains(&pointer) {
                self.scanned_text.push(pointer);
            }
        }
        self
    }

    /// Input field that raises risk when its signal fires.
    pub fn signal(mut self, signal: InputSignal) -> Self {
        self.input_signals.push(signal);
        self
    }

    /// Output fields where the model reports its risk level and flags.
    pub fn model_risk(mut self, level: &'static str, flags: &'static str) -> Self {
        self.model_level = Some(level);
        self.model_flags = Some(flags);
        self
    }

    /// Minimum level every invocation of the flow carries.
    pub fn minimum_risk(mut self, level: RiskLevel, flag: &'static str) -> Self {
        self.risk_floor = Some((level, flag));
        self
    }

    /// Output boolean forced to `true` when escalation is required.
    pub fn escalation_field(mut self, pointer: &'static str) -> Self {
        self.escalation_fields.push(pointer);
        self
    }

    pub fn input_signals(&self) -> &[InputSignal] {
        &self.input_signals
    }

    pub fn scanned_pointers(&self) -> impl Iterator<Item = &str> {
        self.scanned_text.iter().map(String::as_str)
    }

    pub fn risk_floor(&self) -> Option<(RiskLevel, &'static str)> {
        self.risk_floor
    }

    pub fn model_level_pointer(&self) -> Option<&'static str> {
        self.model_level
    }

    pub fn model_flags_pointer(&self) -> Option<&'static str> {
        self.model_flags
    }

    pub fn escalation_fields(&self) -> &[&'static str] {
        &self.escalation_fields
    }

    /// Concatenates the scanned text fields of `input`, one per line.
    ///
    /// Arrays of strings are included element by element.
    pub fn scanned_text(&self, input: &Value) -> String {
        let mut parts = Vec::new();
        for pointer in &self.scanned_text {
            match input.pointer(pointer) {
                Some(Value::String(s)) => parts.push(s.as_str()),
                Some(Value::Array(items)) => {
                    parts.extend(items.iter().filter_map(Value::as_str));
                }
                _ => {}
            }
        }
        parts.join("\n")
    }

    /// Reads the model's own risk report from `output`.
    ///
    /// Missing or unparseable levels read as `none`.
    pub fn read_model_risk(&self, output: &Value) -> RiskAssessment {
        let level = self
            .model_level
            .and_then(|p| output.pointer(p))
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());

        let flags = self
            .model_flags
            .and_then(|p| output.pointer(p))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        match level {
            Some(level) => RiskAssessment::new(level, RiskSource::Model).with_flags(flags),
            None => RiskAssessment::none(RiskSource::Model),
        }
    }
}

/// Writes `new` at `pointer`, creating the last segment if its parent object
/// exists. Returns false when the parent is missing or not an object.
pub(crate) fn set_pointer(target: &mut Value, pointer: &str, new: Value) -> bool {
    if let Some(slot) = target.pointer_mut(pointer) {
        *slot = new;
        return true;
    }

    let Some((parent, key)) = pointer.rsplit_once('/') else {
        return false;
    };
    let key = key.replace("~1", "/").replace("~0", "~");

    match target.pointer_mut(parent) {
        Some(Value::Object(map)) => {
            map.insert(key, new);
            true
        }
        _ => false,
    }
}

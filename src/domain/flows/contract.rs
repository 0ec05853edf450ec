//! Declarative value contracts for flow inputs and outputs.
//!
//! A [`Contract`] describes the shape of a JSON object: which fields exist,
//! their types, enum membership, inclusive numeric ranges and whether they are
//! required. Validation reports every violation it finds, each with a dotted
//! and indexed path such as `safetyPlan[2].step`.
//!
//! Contracts never call the model. The same contract drives validation and the
//! output-format section of compiled prompts, so the two cannot drift apart.

use std::fmt::Write as _;

use serde_json::{Map, Value};
use thiserror::Error;

/// Type constraint for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Text,
    Boolean,
    /// Number with optional inclusive bounds.
    Number { min: Option<f64>, max: Option<f64> },
    /// Text restricted to a fixed set of values.
    Enum(&'static [&'static str]),
    Array(Box<FieldType>),
    Object(Contract),
}

impl FieldType {
    pub fn number() -> Self {
        FieldType::Number { min: None, max: None }
    }

    pub fn number_range(min: f64, max: f64) -> Self {
        FieldType::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn number_at_least(min: f64) -> Self {
        FieldType::Number {
            min: Some(min),
            max: None,
        }
    }

    pub fn one_of(values: &'static [&'static str]) -> Self {
        FieldType::Enum(values)
    }

    pub fn array_of(element: FieldType) -> Self {
        FieldType::Array(Box::new(element))
    }

    pub fn text_list() -> Self {
        Self::array_of(FieldType::Text)
    }

    pub fn object(contract: Contract) -> Self {
        FieldType::Object(contract)
    }

    fn describe(&self) -> String {
        match self {
            FieldType::Text => "text".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Number { min, max } => match (min, max) {
                (Some(min), Some(max)) => format!("number between {} and {}", min, max),
                (Some(min), None) => format!("number >= {}", min),
                (None, Some(max)) => format!("number <= {}", max),
                (None, None) => "number".to_string(),
            },
            FieldType::Enum(values) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
                format!("one of {}", quoted.join(" | "))
            }
            FieldType::Array(element) => match element.as_ref() {
                FieldType::Object(_) => "array of objects".to_string(),
                other => format!("array of {}", other.describe()),
            },
            FieldType::Object(_) => "object".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Field {
    name: &'static str,
    ty: FieldType,
    required: bool,
}

/// Shape of a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contract {
    fields: Vec<Field>,
}

/// One way in which a value breaks its contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid type for field {field}: expected {expected}, got {actual}")]
    InvalidType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Value out of range for field {field}: {value} not in [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("Invalid value for field {field}: \"{value}\" is not one of {allowed}")]
    NotInEnum {
        field: String,
        value: String,
        allowed: String,
    },
}

impl ContractViolation {
    /// Path of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ContractViolation::MissingRequired { field }
            | ContractViolation::InvalidType { field, .. }
            | ContractViolation::OutOfRange { field, .. }
            | ContractViolation::NotInEnum { field, .. } => field,
        }
    }
}

/// Path used for a value that is not an object at all.
pub const ROOT_PATH: &str = "$";

impl Contract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &'static str, ty: FieldType) -> Self {
        self.fields.push(Field {
            name,
            ty,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &'static str, ty: FieldType) -> Self {
        self.fields.push(Field {
            name,
            ty,
            required: false,
        });
        self
    }

    /// Names of the required top-level fields, in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }

    /// JSON pointers of every free-text field, nested objects included.
    ///
    /// Covers `Text` fields and arrays of `Text`. Enum fields are not free
    /// text, and fields inside arrays of objects have no single pointer.
    pub fn text_pointers(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_text_pointers("", &mut out);
        out
    }

    fn collect_text_pointers(&self, prefix: &str, out: &mut Vec<String>) {
        for field in &self.fields {
            let pointer = format!("{}/{}", prefix, field.name);
            match &field.ty {
                FieldType::Text => out.push(pointer),
                FieldType::Array(element) if **element == FieldType::Text => out.push(pointer),
                FieldType::Object(nested) => nested.collect_text_pointers(&pointer, out),
                _ => {}
            }
        }
    }

    /// Validates `value`, collecting every violation.
    ///
    /// `null` on an optional field counts as absent. Fields the contract does
    /// not declare are tolerated.
    pub fn validate(&self, value: &Value) -> Result<(), Vec<ContractViolation>> {
        let mut violations = Vec::new();
        match value {
            Value::Object(map) => self.validate_object(map, "", &mut violations),
            other => violations.push(ContractViolation::InvalidType {
                field: ROOT_PATH.to_string(),
                expected: "object".to_string(),
                actual: json_type(other).to_string(),
            }),
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Renders the contract as a deterministic list of field descriptions.
    ///
    /// ```text
    /// - response: text (required)
    /// - riskIndicators: object (required)
    /// - riskIndicators.level: one of "none" | "low" | ... (required)
    /// ```
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into("", &mut out);
        out
    }

    fn describe_into(&self, prefix: &str, out: &mut String) {
        for field in &self.fields {
            let path = child_path(prefix, field.name);
            let presence = if field.required { "required" } else { "optional" };
            let _ = writeln!(out, "- {}: {} ({})", path, field.ty.describe(), presence);

            match &field.ty {
                FieldType::Object(nested) => nested.describe_into(&path, out),
                FieldType::Array(element) => {
                    if let FieldType::Object(nested) = element.as_ref() {
                        nested.describe_into(&format!("{}[]", path), out);
                    }
                }
                _ => {}
            }
        }
    }

    fn validate_object(
        &self,
        map: &Map<String, Value>,
        prefix: &str,
        violations: &mut Vec<ContractViolation>,
    ) {
        for field in &self.fields {
            let path = child_path(prefix, field.name);
            match map.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        violations.push(ContractViolation::MissingRequired { field: path });
                    }
                }
                Some(value) => check_value(&field.ty, value, &path, violations),
            }
        }
    }
}

fn check_value(ty: &FieldType, value: &Value, path: &str, violations: &mut Vec<ContractViolation>) {
    match (ty, value) {
        (FieldType::Text, Value::String(_)) => {}
        (FieldType::Boolean, Value::Bool(_)) => {}
        (FieldType::Number { min, max }, Value::Number(n)) => {
            let Some(v) = n.as_f64() else { return };
            let below = min.map_or(false, |m| v < m);
            let above = max.map_or(false, |m| v > m);
            if below || above {
                violations.push(ContractViolation::OutOfRange {
                    field: path.to_string(),
                    value: n.to_string(),
                    min: min.map_or_else(|| "-inf".to_string(), |m| m.to_string()),
                    max: max.map_or_else(|| "inf".to_string(), |m| m.to_string()),
                });
            }
        }
        (FieldType::Enum(allowed), Value::String(s)) => {
            if !allowed.contains(&s.as_str()) {
                violations.push(ContractViolation::NotInEnum {
                    field: path.to_string(),
                    value: s.clone(),
                    allowed: allowed.join(", "),
                });
            }
        }
        (FieldType::Array(element), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                check_value(element, item, &format!("{}[{}]", path, i), violations);
            }
        }
        (FieldType::Object(contract), Value::Object(map)) => {
            contract.validate_object(map, path, violations);
        }
        (expected, actual) => violations.push(ContractViolation::InvalidType {
            field: path.to_string(),
            expected: expected_name(expected).to_string(),
            actual: json_type(actual).to_string(),
        }),
    }
}

fn expected_name(ty: &FieldType) -> &'static str {
    match ty {
        FieldType::Text | FieldType::Enum(_) => "string",
        FieldType::Boolean => "boolean",
        FieldType::Number { .. } => "number",
        FieldType::Array(_) => "array",
        FieldType::Object(_) => "object",
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn child_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

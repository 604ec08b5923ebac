//! Field value normalization: raw record to typed model input.
//!
//! The normalizer separates two failure causes that downstream policies
//! treat differently: a declared field *absent* from the record, and a
//! declared field *present but not coercible* to its kind. A field is
//! always exactly one of present or absent; an explicit JSON `null`
//! counts as absent.

use serde_json::Value;

use crate::record::{FieldKind, FieldValue, PreparedInput, Record};
use crate::schema::ModelSchema;

/// A declared field that was present but not coercible to its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidField {
    pub field: String,
    pub reason: String,
}

/// What the normalizer observed about one record.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRecord {
    /// Successfully coerced values.
    pub prepared: PreparedInput,

    /// Declared fields absent from the record (or explicitly null).
    pub missing: Vec<String>,

    /// Declared fields present but uncoercible.
    pub invalid: Vec<InvalidField>,
}

impl NormalizedRecord {
    /// True when every declared field coerced cleanly.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }
}

/// Normalize a raw record against the model's declared input fields.
///
/// Fields the record carries beyond the declared set are ignored. No side
/// effects; the same record and schema always produce the same result.
pub fn normalize(schema: &ModelSchema, record: &Record) -> NormalizedRecord {
    let mut normalized = NormalizedRecord::default();

    for spec in &schema.input_fields {
        match record.get(&spec.name) {
            None | Some(Value::Null) => normalized.missing.push(spec.name.clone()),
            Some(raw) => match coerce(spec.kind, raw) {
                Ok(value) => normalized.prepared.insert(&spec.name, value),
                Err(reason) => {
                    normalized.invalid.push(InvalidField { field: spec.name.clone(), reason })
                }
            },
        }
    }

    normalized
}

/// Coerce one raw value to the declared kind.
///
/// Accepted shapes per kind:
/// - `Integer`: JSON integers, floats with no fractional part, integer strings
/// - `Float`: any finite JSON number, numeric strings
/// - `Text`: strings; numbers and booleans are rendered, since categorical
///   values often arrive numeric
/// - `Boolean`: booleans, and `"true"` / `"false"` strings
///
/// Returns the human-readable reason on failure.
pub fn coerce(kind: FieldKind, raw: &Value) -> Result<FieldValue, String> {
    match kind {
        FieldKind::Integer => match raw {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(FieldValue::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                        Ok(FieldValue::Integer(f as i64))
                    } else {
                        Err(format!("number {} is not an integer", f))
                    }
                } else {
                    Err("number out of integer range".to_string())
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| format!("string {:?} is not an integer", s)),
            other => Err(format!("expected an integer, got {}", shape_of(other))),
        },

        FieldKind::Float => match raw {
            Value::Number(n) => n
                .as_f64()
                .map(FieldValue::Float)
                .ok_or_else(|| "number out of float range".to_string()),
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(FieldValue::Float(f)),
                _ => Err(format!("string {:?} is not a finite number", s)),
            },
            other => Err(format!("expected a number, got {}", shape_of(other))),
        },

        FieldKind::Text => match raw {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
            Value::Bool(b) => Ok(FieldValue::Text(b.to_string())),
            other => Err(format!("expected text, got {}", shape_of(other))),
        },

        FieldKind::Boolean => match raw {
            Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(FieldValue::Boolean(true)),
                "false" => Ok(FieldValue::Boolean(false)),
                _ => Err(format!("string {:?} is not a boolean", s)),
            },
            other => Err(format!("expected a boolean, got {}", shape_of(other))),
        },
    }
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! Record and field value types shared across the pipeline.
//!
//! Records are transient per call: every stage produces new mappings
//! instead of mutating its input in place.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw record as delivered by the host runtime: field name to untyped value.
pub type Record = HashMap<String, Value>;

/// What the model evaluator computed: output field name to value.
pub type EvaluationOutput = HashMap<String, Value>;

/// The type a model declares for one of its input fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    Float,
    Text,
    Boolean,
}

/// A field value coerced to its declared kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl FieldValue {
    /// The kind this value satisfies.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Boolean(_) => FieldKind::Boolean,
        }
    }

    /// Render back into an untyped JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => {
                serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null)
            }
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Boolean(b) => Value::Bool(*b),
        }
    }
}

/// The fully-typed input handed to the model evaluator.
///
/// Invariant: by the time the evaluator is invoked, this contains an entry
/// for every input field the model declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedInput {
    values: HashMap<String, FieldValue>,
}

impl PreparedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    /// Merge substituted values into the input.
    pub fn extend(&mut self, additions: HashMap<String, FieldValue>) {
        self.values.extend(additions);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }
}

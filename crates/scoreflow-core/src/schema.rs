//! Model schema: the declared surface of a loaded model.

use serde::{Deserialize, Serialize};

use crate::record::FieldKind;

/// One declared model input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// What a loaded model declares: the input fields it requires, the target
/// field(s) it predicts, and the supplementary output fields it can compute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    #[serde(default)]
    pub input_fields: Vec<FieldSpec>,

    #[serde(default)]
    pub target_fields: Vec<String>,

    #[serde(default)]
    pub output_fields: Vec<String>,
}

impl ModelSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an input field.
    pub fn with_input(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.input_fields.push(FieldSpec::new(name, kind));
        self
    }

    /// Declare a target field.
    pub fn with_target(mut self, name: impl Into<String>) -> Self {
        self.target_fields.push(name.into());
        self
    }

    /// Declare a supplementary output field.
    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.output_fields.push(name.into());
        self
    }

    /// Look up a declared input field by name.
    pub fn input(&self, name: &str) -> Option<&FieldSpec> {
        self.input_fields.iter().find(|f| f.name == name)
    }

    /// Names of all declared input fields, in declaration order.
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.input_fields.iter().map(|f| f.name.as_str())
    }
}

//! Result extraction: which evaluator outputs become the emitted record.

use std::fmt;
use std::sync::Arc;

use crate::errors::ScoreError;
use crate::record::{EvaluationOutput, Record};
use crate::schema::ModelSchema;

/// Caller-supplied projection from evaluation output to emitted record.
///
/// Must be a pure function of the evaluation output and the declared
/// field lists; projections never see the original input record.
pub trait Projection: Send + Sync {
    fn project(&self, output: &EvaluationOutput, schema: &ModelSchema)
        -> Result<Record, ScoreError>;
}

/// Policy selecting the emitted subset of the evaluation output.
#[derive(Clone)]
pub enum ResultExtractionStrategy {
    /// Only the declared target field(s).
    TargetsOnly,

    /// Only the declared supplementary output field(s).
    OutputsOnly,

    /// The union of targets and outputs.
    TargetsAndOutputs,

    /// A caller-supplied projection.
    Custom(Arc<dyn Projection>),
}

impl Default for ResultExtractionStrategy {
    fn default() -> Self {
        Self::TargetsAndOutputs
    }
}

impl fmt::Debug for ResultExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetsOnly => write!(f, "TargetsOnly"),
            Self::OutputsOnly => write!(f, "OutputsOnly"),
            Self::TargetsAndOutputs => write!(f, "TargetsAndOutputs"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl ResultExtractionStrategy {
    /// Shape the emitted record from one evaluation output.
    ///
    /// Requested fields absent from the output fail with
    /// `ScoreError::Extraction`, surfaced through the same channel as any
    /// other stage error.
    pub fn extract(
        &self,
        output: &EvaluationOutput,
        schema: &ModelSchema,
    ) -> Result<Record, ScoreError> {
        match self {
            Self::TargetsOnly => select(output, schema.target_fields.iter()),
            Self::OutputsOnly => select(output, schema.output_fields.iter()),
            Self::TargetsAndOutputs => {
                select(output, schema.target_fields.iter().chain(schema.output_fields.iter()))
            }
            Self::Custom(projection) => projection.project(output, schema),
        }
    }
}

fn select<'a>(
    output: &EvaluationOutput,
    fields: impl Iterator<Item = &'a String>,
) -> Result<Record, ScoreError> {
    let mut selected = Record::new();
    let mut absent = Vec::new();

    for name in fields {
        match output.get(name) {
            Some(value) => {
                selected.insert(name.clone(), value.clone());
            }
            None if !absent.contains(name) => absent.push(name.clone()),
            None => {}
        }
    }

    if absent.is_empty() {
        Ok(selected)
    } else {
        Err(ScoreError::Extraction { fields: absent })
    }
}

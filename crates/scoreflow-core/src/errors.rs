//! Error taxonomy for per-record scoring.
//!
//! Each variant names the stage that produced it. Missing fields and
//! preparation failures have dedicated resolution policies; evaluation and
//! extraction failures flow straight to the exception handling policy,
//! which is the single component allowed to decide between per-record
//! suppression and aborting the caller.

use thiserror::Error;

/// The model evaluator raised while scoring a prepared input.
///
/// Opaque to the pipeline; carries whatever message the engine produced.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("model evaluation failed: {0}")]
pub struct EvaluationError(pub String);

impl EvaluationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors produced while scoring a single record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// Required model input field(s) absent from the record.
    #[error("missing required input field(s): {}", .fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// A field was present but could not be coerced to its declared kind.
    #[error("field '{field}' could not be prepared: {reason}")]
    Preparation { field: String, reason: String },

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// Requested output field(s) absent from the evaluation output.
    #[error("evaluation output lacks requested field(s): {}", .fields.join(", "))]
    Extraction { fields: Vec<String> },
}

impl ScoreError {
    /// The pipeline stage this error belongs to, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            ScoreError::MissingFields { .. } => "missing-value",
            ScoreError::Preparation { .. } => "preparation",
            ScoreError::Evaluation(_) => "evaluation",
            ScoreError::Extraction { .. } => "extraction",
        }
    }
}

//! The model-evaluation boundary.

use crate::errors::EvaluationError;
use crate::record::{EvaluationOutput, PreparedInput};
use crate::schema::ModelSchema;

/// External model-evaluation engine.
///
/// Implementations wrap a loaded predictive model. The pipeline treats
/// `evaluate` as opaque and potentially failing: no retry logic wraps the
/// call, and a returned error flows straight to the exception handling
/// policy. The pipeline guarantees in return that `evaluate` is only ever
/// called with an input carrying every field `schema` declares.
///
/// One evaluator is owned by exactly one pipeline instance; it is
/// constructed once at operator startup and never rebuilt per record.
pub trait ModelEvaluator: Send {
    /// The declared surface of the loaded model.
    fn schema(&self) -> &ModelSchema;

    /// Score one prepared input, returning output field name to value.
    fn evaluate(&self, input: &PreparedInput) -> Result<EvaluationOutput, EvaluationError>;
}

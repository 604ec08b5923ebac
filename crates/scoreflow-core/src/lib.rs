//! # scoreflow-core
//!
//! Deterministic per-record model scoring pipeline.
//!
//! This crate provides the core evaluation logic for scoreflow: given a
//! raw record and a loaded model evaluator, produce zero or one output
//! records, with every failure mode routed through a caller-chosen
//! policy.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: the same record against the same evaluator and
//!    policies always produces the same outcome
//! 2. **At most one emission per record**: encoded in [`RecordOutcome`]
//! 3. **No silent losses**: every dropped record passed through a policy
//!    decision point, and suppressed errors are logged with record context
//! 4. **Synchronous**: no stage suspends or performs I/O; the only
//!    external call is the in-process evaluator
//!
//! ## Example
//!
//! ```rust,ignore
//! use scoreflow_core::{RecordOutcome, ScoringPipeline};
//!
//! let pipeline = ScoringPipeline::new(evaluator);
//!
//! match pipeline.process_one(&record) {
//!     RecordOutcome::Emitted(output) => downstream.push(output),
//!     RecordOutcome::Skipped | RecordOutcome::Suppressed { .. } => {}
//!     RecordOutcome::Aborted { error, .. } => return Err(error.into()),
//! }
//! ```

pub mod errors;
pub mod evaluator;
pub mod normalizer;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod strategies;

// Re-export main types at crate root
pub use errors::{EvaluationError, ScoreError};
pub use evaluator::ModelEvaluator;
pub use normalizer::{coerce, normalize, InvalidField, NormalizedRecord};
pub use pipeline::{RecordOutcome, ScoringPipeline, ScoringPipelineBuilder};
pub use record::{EvaluationOutput, FieldKind, FieldValue, PreparedInput, Record};
pub use schema::{FieldSpec, ModelSchema};
pub use strategies::{
    ExceptionDecision, ExceptionHandler, ExceptionHandlingStrategy, MissingValueDecision,
    MissingValueStrategy, PreparationDecision, PreparationErrorStrategy, Projection,
    ResultExtractionStrategy,
};

//! Exception handling: the outermost policy around per-record scoring.
//!
//! Whatever stage a record fails in, the error ends up here, and this
//! policy alone decides between the two consequences: suppress (the
//! record is dropped and the stream continues) or rethrow (the caller is
//! expected to stop processing the stream on this worker). That
//! per-record vs. whole-job distinction is the most consequential choice
//! a caller makes when configuring a pipeline.

use std::fmt;
use std::sync::Arc;

use crate::errors::ScoreError;
use crate::record::Record;

/// What the policy decided for a failed record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExceptionDecision {
    /// A substitute record to emit in place of the failed one, if any.
    pub emit: Option<Record>,

    /// Re-raise the error to the caller.
    pub rethrow: bool,
}

impl ExceptionDecision {
    /// Drop the record, emit nothing, keep the stream alive.
    pub fn suppress() -> Self {
        Self::default()
    }

    /// Re-raise the error to the caller.
    pub fn propagate() -> Self {
        Self { emit: None, rethrow: true }
    }

    /// Emit a substitute record and keep the stream alive.
    pub fn substitute(record: Record) -> Self {
        Self { emit: Some(record), rethrow: false }
    }
}

/// Caller-supplied exception handler.
pub trait ExceptionHandler: Send + Sync {
    fn handle(&self, error: &ScoreError, record: &Record) -> ExceptionDecision;
}

/// Policy applied when any pipeline stage fails.
#[derive(Clone)]
pub enum ExceptionHandlingStrategy {
    /// Log the error with record-identifying context, then drop the
    /// record and continue.
    SuppressAndLog,

    /// Re-raise. Under host-runtime semantics this aborts the entire
    /// streaming job on this worker, not just the one record.
    Propagate,

    /// A caller-supplied handler; may emit a substitute record and/or
    /// rethrow.
    Custom(Arc<dyn ExceptionHandler>),
}

impl Default for ExceptionHandlingStrategy {
    fn default() -> Self {
        Self::SuppressAndLog
    }
}

impl fmt::Debug for ExceptionHandlingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuppressAndLog => write!(f, "SuppressAndLog"),
            Self::Propagate => write!(f, "Propagate"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl ExceptionHandlingStrategy {
    /// Decide the fate of a failed record.
    pub fn handle(&self, error: &ScoreError, record: &Record) -> ExceptionDecision {
        match self {
            ExceptionHandlingStrategy::SuppressAndLog => {
                tracing::warn!(
                    stage = error.stage(),
                    error = %error,
                    record = %render(record),
                    "record dropped"
                );
                ExceptionDecision::suppress()
            }

            ExceptionHandlingStrategy::Propagate => ExceptionDecision::propagate(),

            ExceptionHandlingStrategy::Custom(handler) => handler.handle(error, record),
        }
    }
}

fn render(record: &Record) -> String {
    serde_json::to_string(record).unwrap_or_else(|_| format!("{record:?}"))
}

//! The four per-pipeline policy kinds.
//!
//! Each policy is a closed set of tagged variants over one decision
//! function. Policies are selected once at pipeline construction time and
//! shared read-only across all records processed by that pipeline; if an
//! implementation carries state, that state lives as long as the policy
//! instance does.

mod exception_handling;
mod missing_value;
mod preparation_error;
mod result_extraction;

pub use exception_handling::{ExceptionDecision, ExceptionHandler, ExceptionHandlingStrategy};
pub use missing_value::{MissingValueDecision, MissingValueStrategy};
pub use preparation_error::{PreparationDecision, PreparationErrorStrategy};
pub use result_extraction::{Projection, ResultExtractionStrategy};

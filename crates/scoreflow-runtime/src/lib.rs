//! # scoreflow-runtime
//!
//! Host-runtime integration for scoreflow.
//!
//! `scoreflow-core` scores one record at a time and knows nothing about
//! where models come from or where output records go. This crate adds the
//! pieces a stream-processing host needs around that core:
//!
//! - [`OperatorConfig`]: the portable, serializable half of an operator
//!   (model source + strategy selections), loadable from YAML or JSON
//! - [`ModelLoader`] / [`LoaderRegistry`]: the seam keeping model-format
//!   parsing outside the core; backends are registered by source scheme
//! - [`ScoringOperator`]: lifecycle (`start` / `process_one` / `stop`)
//!   driven by the host, emitting into its [`Collector`]
//! - [`OperatorMetrics`]: per-operator record counters
//!
//! ## Example
//!
//! ```rust,ignore
//! use scoreflow_runtime::{LoaderRegistry, OperatorConfig, ScoringOperator};
//!
//! let config = OperatorConfig::from_yaml_file("operator.yaml")?;
//! let mut operator = ScoringOperator::new(config, registry);
//!
//! operator.start()?; // builds the evaluator on this execution unit
//! for record in source {
//!     operator.process_one(&record, &mut sink)?;
//! }
//! operator.stop();
//! ```

pub mod config;
pub mod loader;
pub mod metrics;
pub mod operator;

// Re-export main types at crate root
pub use config::{
    ConfigError, ExceptionHandlingConfig, ExtractionConfig, MissingValueConfig, OperatorConfig,
    PreparationErrorConfig,
};
pub use loader::{EvaluatorFactory, LoaderRegistry, ModelLoadError, ModelLoader, StaticModelLoader};
pub use metrics::{MetricsSnapshot, OperatorMetrics};
pub use operator::{Collector, OperatorError, ScoringOperator, ScoringOperatorBuilder};

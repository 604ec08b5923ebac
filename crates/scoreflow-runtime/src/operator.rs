//! The scoring operator: lifecycle and per-record driving.
//!
//! The host runtime owns the operator's life: it calls [`ScoringOperator::start`]
//! once after placing the instance on its execution unit, then delivers
//! records one at a time to [`ScoringOperator::process_one`], which pushes
//! zero or one output records into the host's [`Collector`]. Instances are
//! never shared across concurrent execution units, so no locking guards
//! the per-record path.

use std::sync::Arc;

use thiserror::Error;

use scoreflow_core::{
    ExceptionHandler, ExceptionHandlingStrategy, Projection, Record, RecordOutcome,
    ResultExtractionStrategy, ScoreError, ScoringPipeline,
};

use crate::config::OperatorConfig;
use crate::loader::{LoaderRegistry, ModelLoadError};
use crate::metrics::OperatorMetrics;

/// Downstream sink owned by the host runtime.
pub trait Collector {
    fn collect(&mut self, record: Record);
}

/// `Vec<Record>` collects directly; convenient for embedding and tests.
impl Collector for Vec<Record> {
    fn collect(&mut self, record: Record) {
        self.push(record);
    }
}

/// Errors surfaced to the host runtime.
#[derive(Error, Debug)]
pub enum OperatorError {
    /// `process_one` was called before a successful `start`.
    #[error("operator not started: call start() before processing records")]
    NotStarted,

    #[error(transparent)]
    Load(#[from] ModelLoadError),

    /// A record failed and the exception policy chose to rethrow. The
    /// host runtime is expected to stop the stream on this worker.
    #[error("record scoring aborted: {0}")]
    Score(#[from] ScoreError),
}

/// A scoring operator: portable configuration plus, once started, a live
/// pipeline around the loaded evaluator.
pub struct ScoringOperator {
    config: OperatorConfig,
    registry: Arc<LoaderRegistry>,
    custom_projection: Option<Arc<dyn Projection>>,
    custom_exception_handler: Option<Arc<dyn ExceptionHandler>>,
    pipeline: Option<ScoringPipeline>,
    metrics: Arc<OperatorMetrics>,
}

impl ScoringOperator {
    /// Operator over `config`, loading models through `registry`.
    pub fn new(config: OperatorConfig, registry: Arc<LoaderRegistry>) -> Self {
        Self {
            config,
            registry,
            custom_projection: None,
            custom_exception_handler: None,
            pipeline: None,
            metrics: Arc::new(OperatorMetrics::new()),
        }
    }

    pub fn builder(config: OperatorConfig, registry: Arc<LoaderRegistry>) -> ScoringOperatorBuilder {
        ScoringOperatorBuilder { operator: Self::new(config, registry) }
    }

    /// Build the evaluator from the configured model source and assemble
    /// the pipeline.
    ///
    /// Must run on the execution unit that will process records, after
    /// placement; the portable configuration carries only the source
    /// identifier, never the handle. Fails with [`ModelLoadError`] when the
    /// source cannot be resolved or parsed, leaving the operator unstarted.
    pub fn start(&mut self) -> Result<(), OperatorError> {
        let evaluator = self.registry.load(&self.config.model_source)?;

        let extraction = match &self.custom_projection {
            Some(projection) => ResultExtractionStrategy::Custom(projection.clone()),
            None => self.config.result_extraction.into(),
        };
        let exception_handling = match &self.custom_exception_handler {
            Some(handler) => ExceptionHandlingStrategy::Custom(handler.clone()),
            None => self.config.exception_handling.into(),
        };

        self.pipeline = Some(
            ScoringPipeline::builder(evaluator)
                .missing_value(self.config.missing_value.clone().into())
                .preparation_error(self.config.preparation_error.clone().into())
                .result_extraction(extraction)
                .exception_handling(exception_handling)
                .build(),
        );
        self.metrics.mark_started();
        tracing::info!(model_source = %self.config.model_source, "scoring operator started");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Run one record through the pipeline, pushing zero or one records
    /// into `collector`.
    ///
    /// `Ok(())` means the stream continues, whether or not anything was
    /// emitted. `Err` is the propagate path: a substitute record from a
    /// custom handler is still collected first, then the error returns to
    /// the host, which is expected to stop processing on this worker.
    pub fn process_one(
        &mut self,
        record: &Record,
        collector: &mut dyn Collector,
    ) -> Result<(), OperatorError> {
        let pipeline = self.pipeline.as_ref().ok_or(OperatorError::NotStarted)?;
        self.metrics.record_received();

        match pipeline.process_one(record) {
            RecordOutcome::Emitted(output) => {
                self.metrics.record_emitted();
                collector.collect(output);
                Ok(())
            }
            RecordOutcome::Skipped => {
                self.metrics.record_skipped();
                Ok(())
            }
            RecordOutcome::Suppressed { substitute } => {
                self.metrics.record_suppressed();
                if let Some(output) = substitute {
                    self.metrics.record_emitted();
                    collector.collect(output);
                }
                Ok(())
            }
            RecordOutcome::Aborted { substitute, error } => {
                self.metrics.record_failed();
                if let Some(output) = substitute {
                    self.metrics.record_emitted();
                    collector.collect(output);
                }
                Err(error.into())
            }
        }
    }

    /// Release the evaluator handle. The operator can be started again.
    pub fn stop(&mut self) {
        if self.pipeline.take().is_some() {
            tracing::info!(model_source = %self.config.model_source, "scoring operator stopped");
        }
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    /// A cloneable handle on this operator's counters.
    pub fn metrics(&self) -> Arc<OperatorMetrics> {
        self.metrics.clone()
    }
}

/// Builder injecting the non-portable pieces of an operator.
pub struct ScoringOperatorBuilder {
    operator: ScoringOperator,
}

impl ScoringOperatorBuilder {
    /// Use a caller-supplied projection instead of the configured
    /// extraction selection.
    pub fn projection(mut self, projection: Arc<dyn Projection>) -> Self {
        self.operator.custom_projection = Some(projection);
        self
    }

    /// Use a caller-supplied exception handler instead of the configured
    /// selection.
    pub fn exception_handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.operator.custom_exception_handler = Some(handler);
        self
    }

    pub fn build(self) -> ScoringOperator {
        self.operator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExceptionHandlingConfig;
    use crate::loader::StaticModelLoader;
    use scoreflow_core::{
        EvaluationError, EvaluationOutput, ExceptionDecision, FieldKind, FieldValue, ModelSchema,
        ModelEvaluator, PreparedInput,
    };
    use serde_json::json;

    fn init_logs() {
        let _ = tracing_subscriber::fmt().with_test_writer().with_env_filter("scoreflow=debug").try_init();
    }

    /// Scores the §8-style risk model: low risk under age 40.
    struct RiskEvaluator {
        schema: ModelSchema,
        fail: bool,
    }

    impl RiskEvaluator {
        fn new(fail: bool) -> Self {
            let schema = ModelSchema::new()
                .with_input("age", FieldKind::Integer)
                .with_input("income", FieldKind::Float)
                .with_target("risk")
                .with_output("score");
            Self { schema, fail }
        }
    }

    impl ModelEvaluator for RiskEvaluator {
        fn schema(&self) -> &ModelSchema {
            &self.schema
        }

        fn evaluate(&self, input: &PreparedInput) -> Result<EvaluationOutput, EvaluationError> {
            if self.fail {
                return Err(EvaluationError::new("malformed model input"));
            }
            let risk = match input.get("age") {
                Some(FieldValue::Integer(age)) if *age < 40 => "low",
                _ => "high",
            };
            Ok(EvaluationOutput::from([
                ("risk".into(), json!(risk)),
                ("score".into(), json!(0.12)),
            ]))
        }
    }

    fn registry(fail: bool) -> Arc<LoaderRegistry> {
        let mut static_loader = StaticModelLoader::new();
        static_loader.insert("risk", move || Box::new(RiskEvaluator::new(fail)));

        let mut registry = LoaderRegistry::new();
        registry.register(Arc::new(static_loader));
        Arc::new(registry)
    }

    fn started_operator(config: OperatorConfig) -> ScoringOperator {
        let mut operator = ScoringOperator::new(config, registry(false));
        operator.start().unwrap();
        operator
    }

    #[test]
    fn test_happy_path_emits_targets_and_outputs() {
        init_logs();
        let mut operator = started_operator(OperatorConfig::new("static:risk"));
        let mut collected: Vec<Record> = Vec::new();

        let record = Record::from([("age".into(), json!(34)), ("income".into(), json!(50000))]);
        operator.process_one(&record, &mut collected).unwrap();

        assert_eq!(
            collected,
            vec![Record::from([("risk".into(), json!("low")), ("score".into(), json!(0.12))])]
        );
        assert_eq!(operator.metrics().snapshot().emitted, 1);
    }

    #[test]
    fn test_missing_field_suppresses_once_and_emits_nothing() {
        init_logs();
        let mut operator = started_operator(OperatorConfig::new("static:risk"));
        let mut collected: Vec<Record> = Vec::new();

        let record = Record::from([("income".into(), json!(50000))]);
        operator.process_one(&record, &mut collected).unwrap();

        assert!(collected.is_empty());
        let snapshot = operator.metrics().snapshot();
        assert_eq!(snapshot.suppressed, 1);
        assert_eq!(snapshot.emitted, 0);
    }

    #[test]
    fn test_propagate_strategy_aborts_the_stream() {
        init_logs();
        let mut config = OperatorConfig::new("static:risk");
        config.exception_handling = ExceptionHandlingConfig::Propagate;

        let mut operator = ScoringOperator::new(config, registry(true));
        operator.start().unwrap();
        let mut collected: Vec<Record> = Vec::new();

        let record = Record::from([("age".into(), json!(34)), ("income".into(), json!(50000))]);
        let err = operator.process_one(&record, &mut collected).unwrap_err();

        assert!(matches!(err, OperatorError::Score(ScoreError::Evaluation(_))));
        assert!(collected.is_empty());
        assert_eq!(operator.metrics().snapshot().failed, 1);
    }

    #[test]
    fn test_process_before_start_is_rejected() {
        let mut operator = ScoringOperator::new(OperatorConfig::new("static:risk"), registry(false));
        let mut collected: Vec<Record> = Vec::new();

        let err = operator.process_one(&Record::new(), &mut collected).unwrap_err();

        assert!(matches!(err, OperatorError::NotStarted));
    }

    #[test]
    fn test_failed_start_leaves_the_operator_unstarted() {
        let mut operator =
            ScoringOperator::new(OperatorConfig::new("static:unknown"), registry(false));

        let err = operator.start().unwrap_err();

        assert!(matches!(err, OperatorError::Load(ModelLoadError::UnknownSource(_))));
        assert!(!operator.is_started());
    }

    #[test]
    fn test_stop_releases_the_evaluator() {
        let mut operator = started_operator(OperatorConfig::new("static:risk"));
        assert!(operator.is_started());

        operator.stop();

        assert!(!operator.is_started());
        let mut collected: Vec<Record> = Vec::new();
        assert!(matches!(
            operator.process_one(&Record::new(), &mut collected),
            Err(OperatorError::NotStarted)
        ));
    }

    #[test]
    fn test_output_order_follows_input_order_across_drops() {
        init_logs();
        let mut operator = started_operator(OperatorConfig::new("static:risk"));
        let mut collected: Vec<Record> = Vec::new();

        let records = vec![
            Record::from([("age".into(), json!(20)), ("income".into(), json!(1000))]),
            Record::from([("income".into(), json!(50000))]), // suppressed
            Record::from([("age".into(), json!(60)), ("income".into(), json!(2000))]),
        ];
        for record in &records {
            operator.process_one(record, &mut collected).unwrap();
        }

        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].get("risk"), Some(&json!("low")));
        assert_eq!(collected[1].get("risk"), Some(&json!("high")));

        let snapshot = operator.metrics().snapshot();
        assert_eq!(snapshot.received, 3);
        assert_eq!(snapshot.emitted, 2);
        assert_eq!(snapshot.suppressed, 1);
    }

    #[test]
    fn test_custom_handler_substitute_is_collected_before_the_error_returns() {
        struct Tombstone;

        impl ExceptionHandler for Tombstone {
            fn handle(&self, error: &ScoreError, _record: &Record) -> ExceptionDecision {
                ExceptionDecision {
                    emit: Some(Record::from([("dropped".to_string(), json!(error.stage()))])),
                    rethrow: true,
                }
            }
        }

        let mut operator =
            ScoringOperator::builder(OperatorConfig::new("static:risk"), registry(false))
                .exception_handler(Arc::new(Tombstone))
                .build();
        operator.start().unwrap();
        let mut collected: Vec<Record> = Vec::new();

        let record = Record::from([("income".into(), json!(50000))]); // missing age
        let err = operator.process_one(&record, &mut collected).unwrap_err();

        assert!(matches!(err, OperatorError::Score(ScoreError::MissingFields { .. })));
        assert_eq!(collected, vec![Record::from([("dropped".into(), json!("missing-value"))])]);
    }

    #[test]
    fn test_restart_after_stop() {
        let mut operator = started_operator(OperatorConfig::new("static:risk"));
        operator.stop();

        operator.start().unwrap();

        assert!(operator.is_started());
    }
}

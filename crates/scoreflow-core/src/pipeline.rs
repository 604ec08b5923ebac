//! The per-record evaluation pipeline.
//!
//! One pipeline instance owns the evaluator handle and the four policies,
//! all fixed at construction and read-only across records. Every record
//! runs the same ordered sequence:
//!
//! 1. normalize the raw record against the model's declared inputs
//! 2. resolve absent fields through the missing-value policy
//! 3. resolve malformed fields through the preparation-error policy
//! 4. invoke the evaluator
//! 5. shape the emitted record through the extraction policy
//!
//! A skip decision from step 2 or 3 ends the record with no emission and
//! no error; that policy was the decision point. Any stage error funnels
//! into the exception handling policy, the single terminal consumer,
//! which decides between per-record suppression and aborting the caller.
//!
//! Records are processed independently: the only state shared across
//! calls is the evaluator handle and the policies, none of which are
//! written during processing, so a record's outcome never depends on the
//! records before it.

use crate::errors::ScoreError;
use crate::evaluator::ModelEvaluator;
use crate::normalizer::{normalize, NormalizedRecord};
use crate::record::Record;
use crate::schema::ModelSchema;
use crate::strategies::{
    ExceptionHandlingStrategy, MissingValueDecision, MissingValueStrategy, PreparationDecision,
    PreparationErrorStrategy, ResultExtractionStrategy,
};

/// Outcome of scoring one record. At most one record is ever emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// One output record to deliver downstream.
    Emitted(Record),

    /// Dropped by a missing-value or preparation-error policy; not an
    /// error, nothing is emitted.
    Skipped,

    /// A stage failed and the exception policy suppressed the error.
    /// A custom handler may have produced a substitute record.
    Suppressed { substitute: Option<Record> },

    /// A stage failed and the exception policy chose to rethrow. The
    /// caller is expected to stop processing the stream on this worker.
    Aborted { substitute: Option<Record>, error: ScoreError },
}

impl RecordOutcome {
    pub fn is_emitted(&self) -> bool {
        matches!(self, RecordOutcome::Emitted(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RecordOutcome::Skipped)
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, RecordOutcome::Suppressed { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, RecordOutcome::Aborted { .. })
    }

    /// The emitted record, if this outcome carries one.
    pub fn emitted(&self) -> Option<&Record> {
        match self {
            RecordOutcome::Emitted(record) => Some(record),
            RecordOutcome::Suppressed { substitute } => substitute.as_ref(),
            RecordOutcome::Aborted { substitute, .. } => substitute.as_ref(),
            RecordOutcome::Skipped => None,
        }
    }
}

/// The per-record scoring pipeline.
pub struct ScoringPipeline {
    evaluator: Box<dyn ModelEvaluator>,
    missing_value: MissingValueStrategy,
    preparation_error: PreparationErrorStrategy,
    result_extraction: ResultExtractionStrategy,
    exception_handling: ExceptionHandlingStrategy,
}

impl ScoringPipeline {
    /// Pipeline over `evaluator` with the default policies: propagate
    /// missing values and preparation errors, extract targets and
    /// outputs, suppress and log failures.
    pub fn new(evaluator: Box<dyn ModelEvaluator>) -> Self {
        Self::builder(evaluator).build()
    }

    pub fn builder(evaluator: Box<dyn ModelEvaluator>) -> ScoringPipelineBuilder {
        ScoringPipelineBuilder {
            evaluator,
            missing_value: MissingValueStrategy::default(),
            preparation_error: PreparationErrorStrategy::default(),
            result_extraction: ResultExtractionStrategy::default(),
            exception_handling: ExceptionHandlingStrategy::default(),
        }
    }

    pub fn schema(&self) -> &ModelSchema {
        self.evaluator.schema()
    }

    /// Score one record.
    pub fn process_one(&self, record: &Record) -> RecordOutcome {
        let error = match self.run(record) {
            Ok(Some(emitted)) => return RecordOutcome::Emitted(emitted),
            Ok(None) => return RecordOutcome::Skipped,
            Err(error) => error,
        };

        let decision = self.exception_handling.handle(&error, record);
        if decision.rethrow {
            RecordOutcome::Aborted { substitute: decision.emit, error }
        } else {
            RecordOutcome::Suppressed { substitute: decision.emit }
        }
    }

    /// The happy path: `Ok(Some)` emits, `Ok(None)` is a policy skip,
    /// `Err` goes to the exception policy.
    fn run(&self, record: &Record) -> Result<Option<Record>, ScoreError> {
        let schema = self.evaluator.schema();
        let NormalizedRecord { mut prepared, missing, invalid } = normalize(schema, record);

        // Absent fields resolve before malformed ones; a record dropped
        // here never consults the preparation-error policy.
        if !missing.is_empty() {
            match self.missing_value.resolve(&missing, schema, record) {
                MissingValueDecision::Resolved(additions) => prepared.extend(additions),
                MissingValueDecision::SkipRecord => {
                    tracing::debug!(fields = ?missing, "record skipped by missing-value policy");
                    return Ok(None);
                }
                MissingValueDecision::Fail(error) => return Err(error),
            }
        }

        if !invalid.is_empty() {
            match self.preparation_error.resolve(&invalid, schema, record) {
                PreparationDecision::Resolved(additions) => prepared.extend(additions),
                PreparationDecision::SkipRecord => {
                    tracing::debug!(
                        fields = ?invalid.iter().map(|i| i.field.as_str()).collect::<Vec<_>>(),
                        "record skipped by preparation-error policy"
                    );
                    return Ok(None);
                }
                PreparationDecision::Fail(error) => return Err(error),
            }
        }

        // The evaluator must never see a partial input.
        let unresolved: Vec<String> = schema
            .input_names()
            .filter(|name| !prepared.contains(name))
            .map(String::from)
            .collect();
        if !unresolved.is_empty() {
            return Err(ScoreError::MissingFields { fields: unresolved });
        }

        let output = self.evaluator.evaluate(&prepared)?;
        let emitted = self.result_extraction.extract(&output, schema)?;
        Ok(Some(emitted))
    }
}

/// Builder fixing the policies of a [`ScoringPipeline`].
pub struct ScoringPipelineBuilder {
    evaluator: Box<dyn ModelEvaluator>,
    missing_value: MissingValueStrategy,
    preparation_error: PreparationErrorStrategy,
    result_extraction: ResultExtractionStrategy,
    exception_handling: ExceptionHandlingStrategy,
}

impl ScoringPipelineBuilder {
    pub fn missing_value(mut self, strategy: MissingValueStrategy) -> Self {
        self.missing_value = strategy;
        self
    }

    pub fn preparation_error(mut self, strategy: PreparationErrorStrategy) -> Self {
        self.preparation_error = strategy;
        self
    }

    pub fn result_extraction(mut self, strategy: ResultExtractionStrategy) -> Self {
        self.result_extraction = strategy;
        self
    }

    pub fn exception_handling(mut self, strategy: ExceptionHandlingStrategy) -> Self {
        self.exception_handling = strategy;
        self
    }

    pub fn build(self) -> ScoringPipeline {
        ScoringPipeline {
            evaluator: self.evaluator,
            missing_value: self.missing_value,
            preparation_error: self.preparation_error,
            result_extraction: self.result_extraction,
            exception_handling: self.exception_handling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EvaluationError;
    use crate::record::{EvaluationOutput, FieldKind, FieldValue, PreparedInput};
    use crate::strategies::{ExceptionDecision, ExceptionHandler, Projection};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Deterministic stand-in for the external evaluation engine.
    struct StubEvaluator {
        schema: ModelSchema,
        fail: bool,
    }

    impl StubEvaluator {
        fn new() -> Self {
            let schema = ModelSchema::new()
                .with_input("age", FieldKind::Integer)
                .with_input("income", FieldKind::Float)
                .with_target("risk")
                .with_output("score");
            Self { schema, fail: false }
        }

        fn failing() -> Self {
            Self { fail: true, ..Self::new() }
        }
    }

    impl ModelEvaluator for StubEvaluator {
        fn schema(&self) -> &ModelSchema {
            &self.schema
        }

        fn evaluate(&self, input: &PreparedInput) -> Result<EvaluationOutput, EvaluationError> {
            if self.fail {
                return Err(EvaluationError::new("malformed model input"));
            }
            assert_eq!(input.len(), self.schema.input_fields.len());
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

    fn full_record() -> Record {
        Record::from([("age".into(), json!(34)), ("income".into(), json!(50000))])
    }

    fn record_missing_age() -> Record {
        Record::from([("income".into(), json!(50000))])
    }

    fn record_bad_age() -> Record {
        Record::from([("age".into(), json!("thirty-four")), ("income".into(), json!(50000))])
    }

    /// Counts how often the exception path was taken.
    struct CountingHandler {
        calls: AtomicUsize,
    }

    impl CountingHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0) })
        }
    }

    impl ExceptionHandler for CountingHandler {
        fn handle(&self, _error: &ScoreError, _record: &Record) -> ExceptionDecision {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ExceptionDecision::suppress()
        }
    }

    #[test]
    fn test_complete_record_emits_exactly_one_output() {
        let pipeline = ScoringPipeline::new(Box::new(StubEvaluator::new()));

        let outcome = pipeline.process_one(&full_record());

        assert_eq!(
            outcome,
            RecordOutcome::Emitted(Record::from([
                ("risk".into(), json!("low")),
                ("score".into(), json!(0.12)),
            ]))
        );
    }

    #[test]
    fn test_missing_field_is_suppressed_by_default() {
        let handler = CountingHandler::new();
        let pipeline = ScoringPipeline::builder(Box::new(StubEvaluator::new()))
            .exception_handling(ExceptionHandlingStrategy::Custom(handler.clone()))
            .build();

        let outcome = pipeline.process_one(&record_missing_age());

        assert_eq!(outcome, RecordOutcome::Suppressed { substitute: None });
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_field_behaves_like_the_missing_case() {
        let handler = CountingHandler::new();
        let pipeline = ScoringPipeline::builder(Box::new(StubEvaluator::new()))
            .exception_handling(ExceptionHandlingStrategy::Custom(handler.clone()))
            .build();

        let outcome = pipeline.process_one(&record_bad_age());

        assert_eq!(outcome, RecordOutcome::Suppressed { substitute: None });
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_propagate_aborts_on_evaluation_failure() {
        let pipeline = ScoringPipeline::builder(Box::new(StubEvaluator::failing()))
            .exception_handling(ExceptionHandlingStrategy::Propagate)
            .build();

        let outcome = pipeline.process_one(&full_record());

        let RecordOutcome::Aborted { substitute, error } = outcome else {
            panic!("expected Aborted");
        };
        assert_eq!(substitute, None);
        assert_eq!(error.stage(), "evaluation");
    }

    #[test]
    fn test_drop_policies_skip_without_touching_the_exception_path() {
        let handler = CountingHandler::new();
        let pipeline = ScoringPipeline::builder(Box::new(StubEvaluator::new()))
            .missing_value(MissingValueStrategy::Drop)
            .preparation_error(PreparationErrorStrategy::Drop)
            .exception_handling(ExceptionHandlingStrategy::Custom(handler.clone()))
            .build();

        assert_eq!(pipeline.process_one(&record_missing_age()), RecordOutcome::Skipped);
        assert_eq!(pipeline.process_one(&record_bad_age()), RecordOutcome::Skipped);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_substituted_default_reaches_the_evaluator() {
        let pipeline = ScoringPipeline::builder(Box::new(StubEvaluator::new()))
            .missing_value(MissingValueStrategy::SubstituteDefaults {
                defaults: HashMap::from([("age".to_string(), json!(70))]),
            })
            .build();

        let outcome = pipeline.process_one(&record_missing_age());

        let RecordOutcome::Emitted(record) = outcome else {
            panic!("expected Emitted");
        };
        assert_eq!(record.get("risk"), Some(&json!("high")));
    }

    #[test]
    fn test_missing_resolution_runs_before_preparation_resolution() {
        // Record with one absent and one malformed field: the drop decision
        // of the missing-value policy wins, the preparation policy is never
        // consulted even though it would have failed.
        let record = Record::from([("income".into(), json!("not-a-number"))]);
        let pipeline = ScoringPipeline::builder(Box::new(StubEvaluator::new()))
            .missing_value(MissingValueStrategy::Drop)
            .exception_handling(ExceptionHandlingStrategy::Propagate)
            .build();

        assert_eq!(pipeline.process_one(&record), RecordOutcome::Skipped);
    }

    #[test]
    fn test_extraction_failure_funnels_into_the_exception_policy() {
        struct NoScoreEvaluator(ModelSchema);

        impl ModelEvaluator for NoScoreEvaluator {
            fn schema(&self) -> &ModelSchema {
                &self.0
            }

            fn evaluate(&self, _: &PreparedInput) -> Result<EvaluationOutput, EvaluationError> {
                // Declares "score" but never computes it
                Ok(EvaluationOutput::from([("risk".into(), json!("low"))]))
            }
        }

        let schema = ModelSchema::new()
            .with_input("age", FieldKind::Integer)
            .with_target("risk")
            .with_output("score");
        let pipeline = ScoringPipeline::builder(Box::new(NoScoreEvaluator(schema)))
            .exception_handling(ExceptionHandlingStrategy::Propagate)
            .build();

        let outcome = pipeline.process_one(&Record::from([("age".into(), json!(34))]));

        let RecordOutcome::Aborted { error, .. } = outcome else {
            panic!("expected Aborted");
        };
        assert_eq!(error, ScoreError::Extraction { fields: vec!["score".to_string()] });
    }

    #[test]
    fn test_custom_handler_substitute_is_carried_in_the_outcome() {
        struct Tombstone;

        impl ExceptionHandler for Tombstone {
            fn handle(&self, error: &ScoreError, _record: &Record) -> ExceptionDecision {
                ExceptionDecision::substitute(Record::from([(
                    "dropped".to_string(),
                    json!(error.stage()),
                )]))
            }
        }

        let pipeline = ScoringPipeline::builder(Box::new(StubEvaluator::new()))
            .exception_handling(ExceptionHandlingStrategy::Custom(Arc::new(Tombstone)))
            .build();

        let outcome = pipeline.process_one(&record_missing_age());

        assert_eq!(
            outcome,
            RecordOutcome::Suppressed {
                substitute: Some(Record::from([("dropped".into(), json!("missing-value"))])),
            }
        );
    }

    #[test]
    fn test_custom_projection_shapes_the_emission() {
        struct TargetsUppercased;

        impl Projection for TargetsUppercased {
            fn project(
                &self,
                output: &EvaluationOutput,
                schema: &ModelSchema,
            ) -> Result<Record, ScoreError> {
                let mut record = Record::new();
                for name in &schema.target_fields {
                    let value = output.get(name).cloned().ok_or_else(|| {
                        ScoreError::Extraction { fields: vec![name.clone()] }
                    })?;
                    record.insert(name.to_uppercase(), value);
                }
                Ok(record)
            }
        }

        let pipeline = ScoringPipeline::builder(Box::new(StubEvaluator::new()))
            .result_extraction(ResultExtractionStrategy::Custom(Arc::new(TargetsUppercased)))
            .build();

        let outcome = pipeline.process_one(&full_record());

        assert_eq!(
            outcome,
            RecordOutcome::Emitted(Record::from([("RISK".into(), json!("low"))]))
        );
    }

    #[test]
    fn test_processing_is_idempotent() {
        let pipeline = ScoringPipeline::new(Box::new(StubEvaluator::new()));
        let record = full_record();

        assert_eq!(pipeline.process_one(&record), pipeline.process_one(&record));
    }

    #[test]
    fn test_emission_order_follows_input_order() {
        let pipeline = ScoringPipeline::new(Box::new(StubEvaluator::new()));
        let records = vec![
            Record::from([("age".into(), json!(20)), ("income".into(), json!(1000))]),
            record_missing_age(), // suppressed
            Record::from([("age".into(), json!(60)), ("income".into(), json!(2000))]),
        ];

        let emitted: Vec<Record> = records
            .iter()
            .map(|r| pipeline.process_one(r))
            .filter_map(|outcome| match outcome {
                RecordOutcome::Emitted(record) => Some(record),
                _ => None,
            })
            .collect();

        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].get("risk"), Some(&json!("low")));
        assert_eq!(emitted[1].get("risk"), Some(&json!("high")));
    }
}

//! Missing-value policy: what happens when declared inputs are absent.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::ScoreError;
use crate::normalizer::coerce;
use crate::record::{FieldValue, Record};
use crate::schema::ModelSchema;

/// Outcome of resolving absent fields for one record.
#[derive(Debug, Clone, PartialEq)]
pub enum MissingValueDecision {
    /// Substituted values for every absent field; scoring continues.
    Resolved(HashMap<String, FieldValue>),

    /// Drop the record silently; nothing is emitted and no error is raised.
    SkipRecord,

    /// Abort the record with the given error.
    Fail(ScoreError),
}

/// Policy for declared input fields absent from a record.
///
/// One variant is active per pipeline instance. Decisions are
/// deterministic: the same missing-field set on the same record always
/// yields the same outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum MissingValueStrategy {
    /// Fail the record immediately.
    Propagate,

    /// Fill absent fields from declared defaults, coerced against the
    /// schema; fails when an absent field has no default.
    SubstituteDefaults { defaults: HashMap<String, Value> },

    /// Drop the record silently.
    Drop,
}

impl Default for MissingValueStrategy {
    fn default() -> Self {
        Self::Propagate
    }
}

impl MissingValueStrategy {
    /// Decide what to do about the absent fields of one record.
    ///
    /// `missing` is the normalizer's absent-field set for `record`; names
    /// are guaranteed to come from the schema's declared inputs.
    pub fn resolve(
        &self,
        missing: &[String],
        schema: &ModelSchema,
        _record: &Record,
    ) -> MissingValueDecision {
        match self {
            MissingValueStrategy::Propagate => {
                MissingValueDecision::Fail(ScoreError::MissingFields { fields: missing.to_vec() })
            }

            MissingValueStrategy::Drop => MissingValueDecision::SkipRecord,

            MissingValueStrategy::SubstituteDefaults { defaults } => {
                let mut additions = HashMap::new();
                let mut unresolved = Vec::new();

                for field in missing {
                    let Some(spec) = schema.input(field) else {
                        unresolved.push(field.clone());
                        continue;
                    };
                    match defaults.get(field) {
                        None => unresolved.push(field.clone()),
                        Some(raw) => match coerce(spec.kind, raw) {
                            Ok(value) => {
                                additions.insert(field.clone(), value);
                            }
                            Err(reason) => {
                                return MissingValueDecision::Fail(ScoreError::Preparation {
                                    field: field.clone(),
                                    reason: format!("default value: {reason}"),
                                });
                            }
                        },
                    }
                }

                if unresolved.is_empty() {
                    MissingValueDecision::Resolved(additions)
                } else {
                    MissingValueDecision::Fail(ScoreError::MissingFields { fields: unresolved })
                }
            }
        }
    }
}

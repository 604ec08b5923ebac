//! Preparation-error policy: fields present but malformed.
//!
//! A separate extension point from the missing-value policy: "field
//! absent" and "field present but invalid shape" are distinct failure
//! causes, and callers may want to drop malformed records silently while
//! failing hard on missing fields, or vice versa.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::ScoreError;
use crate::normalizer::{coerce, InvalidField};
use crate::record::{FieldValue, Record};
use crate::schema::ModelSchema;

/// Outcome of resolving malformed fields for one record.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparationDecision {
    /// Substituted values for every malformed field; scoring continues.
    Resolved(HashMap<String, FieldValue>),

    /// Drop the record silently; nothing is emitted and no error is raised.
    SkipRecord,

    /// Abort the record with the given error.
    Fail(ScoreError),
}

/// Policy for declared input fields that were present but uncoercible.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparationErrorStrategy {
    /// Fail the record immediately, reporting the first malformed field.
    Propagate,

    /// Replace malformed values from declared defaults, coerced against
    /// the schema; fails when a malformed field has no default.
    Substitute { defaults: HashMap<String, Value> },

    /// Drop the record silently.
    Drop,
}

impl Default for PreparationErrorStrategy {
    fn default() -> Self {
        Self::Propagate
    }
}

impl PreparationErrorStrategy {
    /// Decide what to do about the malformed fields of one record.
    ///
    /// `invalid` is the normalizer's uncoercible-field set for `record`,
    /// in schema declaration order.
    pub fn resolve(
        &self,
        invalid: &[InvalidField],
        schema: &ModelSchema,
        _record: &Record,
    ) -> PreparationDecision {
        match self {
            PreparationErrorStrategy::Propagate => match invalid.first() {
                Some(first) => PreparationDecision::Fail(ScoreError::Preparation {
                    field: first.field.clone(),
                    reason: first.reason.clone(),
                }),
                None => PreparationDecision::Resolved(HashMap::new()),
            },

            PreparationErrorStrategy::Drop => PreparationDecision::SkipRecord,

            PreparationErrorStrategy::Substitute { defaults } => {
                let mut additions = HashMap::new();

                for entry in invalid {
                    let Some(spec) = schema.input(&entry.field) else {
                        return PreparationDecision::Fail(ScoreError::Preparation {
                            field: entry.field.clone(),
                            reason: entry.reason.clone(),
                        });
                    };
                    let Some(raw) = defaults.get(&entry.field) else {
                        return PreparationDecision::Fail(ScoreError::Preparation {
                            field: entry.field.clone(),
                            reason: entry.reason.clone(),
                        });
                    };
                    match coerce(spec.kind, raw) {
                        Ok(value) => {
                            additions.insert(entry.field.clone(), value);
                        }
                        Err(reason) => {
                            return PreparationDecision::Fail(ScoreError::Preparation {
                                field: entry.field.clone(),
                                reason: format!("default value: {reason}"),
                            });
                        }
                    }
                }

                PreparationDecision::Resolved(additions)
            }
        }
    }
}

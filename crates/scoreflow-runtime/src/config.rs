//! Portable operator configuration.
//!
//! The configuration is the serializable half of an operator: the
//! model-source identifier plus the strategy selections. It never carries
//! the evaluator handle, so it can cross process boundaries freely; the
//! handle is rebuilt from `model_source` when the operator starts on its
//! execution unit.
//!
//! Custom projections and exception handlers are code, not data; they are
//! injected through the operator builder and have no representation here.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use scoreflow_core::{
    ExceptionHandlingStrategy, MissingValueStrategy, PreparationErrorStrategy,
    ResultExtractionStrategy,
};

/// Errors that can occur when parsing operator configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Missing-value strategy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MissingValueConfig {
    Propagate,
    SubstituteDefaults { defaults: HashMap<String, Value> },
    Drop,
}

impl Default for MissingValueConfig {
    fn default() -> Self {
        Self::Propagate
    }
}

impl From<MissingValueConfig> for MissingValueStrategy {
    fn from(config: MissingValueConfig) -> Self {
        match config {
            MissingValueConfig::Propagate => MissingValueStrategy::Propagate,
            MissingValueConfig::SubstituteDefaults { defaults } => {
                MissingValueStrategy::SubstituteDefaults { defaults }
            }
            MissingValueConfig::Drop => MissingValueStrategy::Drop,
        }
    }
}

/// Preparation-error strategy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PreparationErrorConfig {
    Propagate,
    Substitute { defaults: HashMap<String, Value> },
    Drop,
}

impl Default for PreparationErrorConfig {
    fn default() -> Self {
        Self::Propagate
    }
}

impl From<PreparationErrorConfig> for PreparationErrorStrategy {
    fn from(config: PreparationErrorConfig) -> Self {
        match config {
            PreparationErrorConfig::Propagate => PreparationErrorStrategy::Propagate,
            PreparationErrorConfig::Substitute { defaults } => {
                PreparationErrorStrategy::Substitute { defaults }
            }
            PreparationErrorConfig::Drop => PreparationErrorStrategy::Drop,
        }
    }
}

/// Result-extraction strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionConfig {
    TargetsOnly,
    OutputsOnly,
    TargetsAndOutputs,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::TargetsAndOutputs
    }
}

impl From<ExtractionConfig> for ResultExtractionStrategy {
    fn from(config: ExtractionConfig) -> Self {
        match config {
            ExtractionConfig::TargetsOnly => ResultExtractionStrategy::TargetsOnly,
            ExtractionConfig::OutputsOnly => ResultExtractionStrategy::OutputsOnly,
            ExtractionConfig::TargetsAndOutputs => ResultExtractionStrategy::TargetsAndOutputs,
        }
    }
}

/// Exception-handling strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionHandlingConfig {
    SuppressAndLog,
    Propagate,
}

impl Default for ExceptionHandlingConfig {
    fn default() -> Self {
        Self::SuppressAndLog
    }
}

impl From<ExceptionHandlingConfig> for ExceptionHandlingStrategy {
    fn from(config: ExceptionHandlingConfig) -> Self {
        match config {
            ExceptionHandlingConfig::SuppressAndLog => ExceptionHandlingStrategy::SuppressAndLog,
            ExceptionHandlingConfig::Propagate => ExceptionHandlingStrategy::Propagate,
        }
    }
}

/// Portable configuration of one scoring operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Where to load the model from, as `scheme:name`.
    pub model_source: String,

    #[serde(default)]
    pub missing_value: MissingValueConfig,

    #[serde(default)]
    pub preparation_error: PreparationErrorConfig,

    #[serde(default)]
    pub result_extraction: ExtractionConfig,

    #[serde(default)]
    pub exception_handling: ExceptionHandlingConfig,
}

impl OperatorConfig {
    /// Configuration with the default policies for a model source.
    pub fn new(model_source: impl Into<String>) -> Self {
        Self {
            model_source: model_source.into(),
            missing_value: MissingValueConfig::default(),
            preparation_error: PreparationErrorConfig::default(),
            result_extraction: ExtractionConfig::default(),
            exception_handling: ExceptionHandlingConfig::default(),
        }
    }

    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: OperatorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: OperatorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.model_source.trim().is_empty() {
            return Err(ConfigError::Invalid("model_source must not be empty".to_string()));
        }
        Ok(())
    }
}

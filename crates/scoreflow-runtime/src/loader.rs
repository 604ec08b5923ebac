//! Model loading boundary and source registry.
//!
//! Parsing a model definition is a collaborator concern; the runtime only
//! resolves a model-source identifier to a registered backend and asks it
//! for a ready evaluator. Identifiers take the form `scheme:rest`
//! (e.g. `static:fraud-v3`); the scheme selects the backend, the rest is
//! the backend-local name.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;

use scoreflow_core::ModelEvaluator;

/// Errors while building an evaluator from a model source.
///
/// These are startup-time failures and fatal to the operator instance: no
/// per-record recovery is possible when no evaluator exists.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    /// No registered backend recognizes the source identifier.
    #[error("no loader registered for model source '{0}'")]
    UnknownSource(String),

    /// The source was found but its definition could not be parsed.
    #[error("failed to parse model definition from '{source}': {reason}")]
    Parse { source: String, reason: String },

    /// The backend failed for a reason of its own (I/O, remote store, ...).
    #[error("model load failed: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Backend able to produce evaluators for one family of model sources.
///
/// Implement this to plug a model format or store into the runtime
/// without touching the operator. Each backend owns:
/// 1. a unique source scheme
/// 2. resolving backend-local names to model definitions
/// 3. turning a definition into a ready [`ModelEvaluator`]
pub trait ModelLoader: Send + Sync {
    /// The source scheme this backend serves (e.g. `"static"`).
    fn scheme(&self) -> &'static str;

    /// Build a ready evaluator from the backend-local part of the source.
    fn load(&self, name: &str) -> Result<Box<dyn ModelEvaluator>, ModelLoadError>;
}

/// Registry of loader backends keyed by source scheme.
#[derive(Default)]
pub struct LoaderRegistry {
    backends: BTreeMap<String, Arc<dyn ModelLoader>>,
}

impl LoaderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader backend.
    ///
    /// If a backend with the same scheme already exists, it is replaced.
    pub fn register(&mut self, loader: Arc<dyn ModelLoader>) {
        self.backends.insert(loader.scheme().to_string(), loader);
    }

    /// Resolve `scheme:rest` and delegate to the backend.
    ///
    /// A source without a scheme separator is rejected as unknown.
    pub fn load(&self, source: &str) -> Result<Box<dyn ModelEvaluator>, ModelLoadError> {
        let (scheme, name) = source
            .split_once(':')
            .ok_or_else(|| ModelLoadError::UnknownSource(source.to_string()))?;

        self.backends
            .get(scheme)
            .ok_or_else(|| ModelLoadError::UnknownSource(source.to_string()))?
            .load(name)
    }

    /// List registered source schemes.
    pub fn available_schemes(&self) -> Vec<&str> {
        self.backends.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a scheme is registered.
    pub fn has_scheme(&self, scheme: &str) -> bool {
        self.backends.contains_key(scheme)
    }
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("schemes", &self.available_schemes())
            .finish()
    }
}

/// Factory producing a fresh evaluator per operator instance.
pub type EvaluatorFactory = dyn Fn() -> Box<dyn ModelEvaluator> + Send + Sync;

/// Loader serving evaluators registered in memory under the `static`
/// scheme.
///
/// Useful for embedding and tests; real deployments register their own
/// format-aware backends.
#[derive(Default)]
pub struct StaticModelLoader {
    models: HashMap<String, Arc<EvaluatorFactory>>,
}

impl StaticModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named evaluator factory.
    pub fn insert<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ModelEvaluator> + Send + Sync + 'static,
    {
        self.models.insert(name.into(), Arc::new(factory));
    }
}

impl ModelLoader for StaticModelLoader {
    fn scheme(&self) -> &'static str {
        "static"
    }

    fn load(&self, name: &str) -> Result<Box<dyn ModelEvaluator>, ModelLoadError> {
        self.models
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| ModelLoadError::UnknownSource(format!("static:{name}")))
    }
}

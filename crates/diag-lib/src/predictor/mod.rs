//! Prediction adapter: feature binding, model families and output normalization

mod adapter;
mod error;
mod fallback;
mod features;
mod inference;
mod loader;
mod native;
mod output;


pub use adapter::PredictionAdapter;
pub use error::{ModelLoadError, PredictionError};
pub use fallback::{FallbackProbability, Scored};
pub use features::{bind, coerce, missing_features};
pub use inference::OnnxClassifier;
pub use loader::{
    load_domain, resolve_artifact, LoadedModel, ModelConfig, ARTIFACT_EXTENSIONS,
    DEFAULT_MODEL_DIR, MODEL_DIR_ENV,
};
pub use native::{
    DecisionTree, LinearSvm, LogisticRegression, NativeModel, RandomForest, StandardScaler,
    TreeNode,
};
pub use output::{OutputConfig, OutputFormatter, ProbabilityPolicy, PROBABILITY_PRECISION};

use crate::models::RawPrediction;
use anyhow::Result;

/// A pre-trained binary classifier over a fixed-width numeric row.
///
/// Label and probability come from the same inference call so they can
/// never disagree. Implementations must be reentrant: one instance serves
/// concurrent requests without locking.
pub trait Classifier: Send + Sync {
    /// Model family name, e.g. `logistic_regression`
    fn family(&self) -> &str;

    /// Number of input columns the model was trained on
    fn n_features(&self) -> usize;

    /// Whether `classify` reports a positive-class probability
    fn supports_probability(&self) -> bool;

    /// Classify a single row
    fn classify(&self, row: &[f64]) -> Result<RawPrediction>;
}

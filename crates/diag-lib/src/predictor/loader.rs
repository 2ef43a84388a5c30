//! Startup-time model artifact loading
//!
//! Each domain's artifact is resolved inside the model directory by stem,
//! preferring `<stem>.onnx` over `<stem>.json`. The file is read once,
//! checksummed, deserialized and shape-checked against the domain's
//! feature order. Nothing here runs on the request path.

use super::error::ModelLoadError;
use super::fallback::FallbackProbability;
use super::inference::OnnxClassifier;
use super::native::NativeModel;
use super::output::OutputConfig;
use super::Classifier;
use crate::domain::Domain;
use crate::models::ModelInfo;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the model directory
pub const MODEL_DIR_ENV: &str = "MODEL_DIR";

/// Model directory used when nothing is configured
pub const DEFAULT_MODEL_DIR: &str = "saved_models";

/// Supported artifact extensions, in lookup order
pub const ARTIFACT_EXTENSIONS: [&str; 2] = ["onnx", "json"];

/// Where models live and how their outputs are normalized
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_dir: PathBuf,
    pub output: OutputConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            output: OutputConfig::default(),
        }
    }
}

impl ModelConfig {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            output: OutputConfig::default(),
        }
    }

    /// Read the model directory from `MODEL_DIR`, falling back to the default
    pub fn from_env() -> Self {
        match std::env::var(MODEL_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self::new(dir),
            _ => Self::default(),
        }
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }
}

/// A ready model: fallback-wrapped classifier plus its metadata
pub struct LoadedModel {
    pub(crate) scorer: FallbackProbability<dyn Classifier>,
    pub(crate) info: ModelInfo,
}

impl LoadedModel {
    /// Wrap an in-process classifier after checking its input width
    pub fn from_classifier(
        domain: Domain,
        classifier: Box<dyn Classifier>,
        path: Option<PathBuf>,
        checksum: Option<String>,
    ) -> Result<Self, ModelLoadError> {
        let expected = domain.feature_count();
        let actual = classifier.n_features();
        if actual != expected {
            return Err(ModelLoadError::ShapeMismatch {
                domain,
                expected,
                actual,
            });
        }

        let info = ModelInfo {
            domain,
            family: classifier.family().to_string(),
            path,
            checksum,
            n_features: actual,
            supports_probability: classifier.supports_probability(),
            loaded_at: chrono::Utc::now().timestamp(),
        };

        Ok(Self {
            scorer: FallbackProbability::new(classifier),
            info,
        })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

/// Locate the artifact for `domain` inside `dir`
pub fn resolve_artifact(domain: Domain, dir: &Path) -> Result<PathBuf, ModelLoadError> {
    let candidates: Vec<String> = ARTIFACT_EXTENSIONS
        .iter()
        .map(|ext| format!("{}.{}", domain.artifact_stem(), ext))
        .collect();

    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| ModelLoadError::NotFound {
            domain,
            dir: dir.to_path_buf(),
            candidates,
        })
}

/// Load and validate the model for one domain
pub fn load_domain(domain: Domain, config: &ModelConfig) -> Result<LoadedModel, ModelLoadError> {
    let path = resolve_artifact(domain, &config.model_dir)?;
    debug!(domain = %domain, path = ?path, "Loading model artifact");

    let bytes = fs::read(&path).map_err(|source| ModelLoadError::Io {
        domain,
        path: path.clone(),
        source,
    })?;
    let checksum = hex::encode(Sha256::digest(&bytes));

    let classifier = deserialize(domain, &path, &bytes)?;
    let loaded = LoadedModel::from_classifier(domain, classifier, Some(path), Some(checksum))?;

    info!(
        domain = %domain,
        family = %loaded.info.family,
        supports_probability = loaded.info.supports_probability,
        "Model loaded"
    );
    Ok(loaded)
}

fn deserialize(domain: Domain, path: &Path, bytes: &[u8]) -> Result<Box<dyn Classifier>, ModelLoadError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match extension {
        "onnx" => {
            let model = OnnxClassifier::from_bytes(bytes, domain.feature_count()).map_err(|e| {
                ModelLoadError::Parse {
                    domain,
                    path: path.to_path_buf(),
                    reason: format!("{:#}", e),
                }
            })?;
            Ok(Box::new(model))
        }
        _ => {
            // Structural errors come back from validation, syntax errors from serde
            let model: NativeModel = serde_json::from_slice(bytes).map_err(|e| ModelLoadError::Parse {
                domain,
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            model
                .validate()
                .map_err(|reason| ModelLoadError::Invalid { domain, reason })?;
            Ok(Box::new(model))
        }
    }
}

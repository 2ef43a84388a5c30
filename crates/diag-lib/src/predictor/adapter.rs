//! Uniform prediction entry point over every loaded domain model

use super::error::{ModelLoadError, PredictionError};
use super::features;
use super::loader::{load_domain, LoadedModel, ModelConfig};
use super::output::{OutputConfig, OutputFormatter};
use super::Classifier;
use crate::domain::Domain;
use crate::models::{FeatureSet, ModelInfo, PredictionResult};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Hides model-type variability behind one call per diagnostic domain.
///
/// Built once at startup and never mutated afterwards; share it behind an
/// `Arc` so every caller uses the same instance.
pub struct PredictionAdapter {
    models: BTreeMap<Domain, LoadedModel>,
    formatter: OutputFormatter,
}

impl PredictionAdapter {
    /// An adapter with no models; add some with `with_classifier` or `insert`
    pub fn empty(output: OutputConfig) -> Self {
        Self {
            models: BTreeMap::new(),
            formatter: OutputFormatter::with_config(output),
        }
    }

    /// Load every domain; any failure aborts
    pub fn load(config: &ModelConfig) -> Result<Self, ModelLoadError> {
        let mut adapter = Self::empty(config.output);
        for domain in Domain::ALL {
            adapter.insert(domain, load_domain(domain, config)?);
        }
        Ok(adapter)
    }

    /// Load what can be loaded; failing domains stay disabled
    pub fn load_available(config: &ModelConfig) -> (Self, Vec<ModelLoadError>) {
        let mut adapter = Self::empty(config.output);
        let mut failures = Vec::new();
        for domain in Domain::ALL {
            match load_domain(domain, config) {
                Ok(model) => adapter.insert(domain, model),
                Err(e) => {
                    warn!(domain = %domain, error = %e, "Model failed to load, domain disabled");
                    failures.push(e);
                }
            }
        }
        (adapter, failures)
    }

    /// Register an in-process classifier for `domain`
    pub fn with_classifier(
        mut self,
        domain: Domain,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, ModelLoadError> {
        let model = LoadedModel::from_classifier(domain, classifier, None, None)?;
        self.insert(domain, model);
        Ok(self)
    }

    pub fn insert(&mut self, domain: Domain, model: LoadedModel) {
        self.models.insert(domain, model);
    }

    pub fn is_available(&self, domain: Domain) -> bool {
        self.models.contains_key(&domain)
    }

    /// Domains whose model loaded, in stable order
    pub fn available_domains(&self) -> Vec<Domain> {
        self.models.keys().copied().collect()
    }

    pub fn model_info(&self, domain: Domain) -> Option<&ModelInfo> {
        self.models.get(&domain).map(LoadedModel::info)
    }

    /// Bind, classify and normalize one request for `domain`
    pub fn predict(
        &self,
        domain: Domain,
        features: &FeatureSet,
    ) -> Result<PredictionResult, PredictionError> {
        let model = self
            .models
            .get(&domain)
            .ok_or(PredictionError::DomainUnavailable { domain })?;

        let row = features::bind(domain, features)?;

        let scored = model
            .scorer
            .score(&row)
            .map_err(|e| PredictionError::Inference {
                domain,
                reason: format!("{:#}", e),
            })?;

        let result = self.formatter.format(domain, scored)?;
        debug!(
            domain = %domain,
            label = result.label,
            probability = result.probability,
            calibrated = result.calibrated,
            "Prediction computed"
        );
        Ok(result)
    }

    pub fn predict_diabetes(&self, features: &FeatureSet) -> Result<PredictionResult, PredictionError> {
        self.predict(Domain::Diabetes, features)
    }

    pub fn predict_heart(&self, features: &FeatureSet) -> Result<PredictionResult, PredictionError> {
        self.predict(Domain::Heart, features)
    }

    pub fn predict_parkinson(&self, features: &FeatureSet) -> Result<PredictionResult, PredictionError> {
        self.predict(Domain::Parkinsons, features)
    }
}

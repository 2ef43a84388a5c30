//! Service configuration

use anyhow::{Context, Result};
use diag_lib::{Language, ModelConfig, OutputConfig, ProbabilityPolicy};
use serde::Deserialize;
use std::path::PathBuf;

/// Service configuration, read from `MEDDIAG_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Instance name reported in structured logs
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// HTTP port for prediction, health and metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding the three model artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Fail startup when any domain model cannot be loaded
    #[serde(default)]
    pub require_all_models: bool,

    /// What to do with probabilities outside [0, 1]
    #[serde(default)]
    pub probability_policy: ProbabilityPolicy,

    /// SQLite file for patients and diagnoses
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Disable to run predictions without any persistence
    #[serde(default = "default_persistence_enabled")]
    pub persistence_enabled: bool,

    /// Language used when a request does not ask for one
    #[serde(default)]
    pub default_language: Language,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "meddiag".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_model_dir() -> PathBuf {
    // The library-level MODEL_DIR variable is honoured as a fallback
    ModelConfig::from_env().model_dir
}

fn default_database_path() -> PathBuf {
    PathBuf::from("meddiag.db")
}

fn default_persistence_enabled() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            model_dir: default_model_dir(),
            require_all_models: false,
            probability_policy: ProbabilityPolicy::default(),
            database_path: default_database_path(),
            persistence_enabled: default_persistence_enabled(),
            default_language: Language::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("MEDDIAG").try_parsing(true))
            .build()
            .context("Failed to read MEDDIAG_* environment")?;

        config
            .try_deserialize()
            .context("Invalid MEDDIAG_* configuration")
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig::new(&self.model_dir).with_output(OutputConfig {
            policy: self.probability_policy,
            ..OutputConfig::default()
        })
    }
}

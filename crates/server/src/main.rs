//! Medical diagnosis prediction service
//!
//! Loads the per-domain models once at startup and serves predictions,
//! patient history, health and metrics over HTTP.

use anyhow::{Context, Result};
use diag_lib::{
    health::{components, HealthRegistry},
    observability::{DiagMetrics, StructuredLogger},
    DiagnosisStore, Domain, PredictionAdapter,
};
use meddiag_server::{api, config::ServiceConfig};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting meddiag-server");

    let config = ServiceConfig::load()?;
    info!(
        instance = %config.instance_name,
        model_dir = %config.model_dir.display(),
        "Service configured"
    );

    let health_registry = HealthRegistry::new();
    let metrics = DiagMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);

    let model_config = config.model_config();
    let (adapter, failures) = if config.require_all_models {
        let adapter =
            PredictionAdapter::load(&model_config).context("Failed to load domain models")?;
        (adapter, Vec::new())
    } else {
        PredictionAdapter::load_available(&model_config)
    };

    for domain in Domain::ALL {
        match adapter.model_info(domain) {
            Some(info) => {
                health_registry.model_loaded(domain).await;
                logger.log_model_loaded(domain, &info.family, info.checksum.as_deref());
            }
            None => {
                let reason = failures
                    .iter()
                    .find(|f| f.domain() == domain)
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| format!("no model loaded for {}", domain));
                logger.log_model_load_failed(domain, &reason);
                health_registry.model_unavailable(domain, reason).await;
            }
        }
    }
    metrics.set_models_loaded(adapter.available_domains().len() as i64);

    let store = if config.persistence_enabled {
        health_registry.register(components::RECORD_STORE).await;
        match DiagnosisStore::open(&config.database_path) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                warn!(
                    path = %config.database_path.display(),
                    error = %e,
                    "Record store unavailable, predictions will not be persisted"
                );
                health_registry
                    .set_degraded(components::RECORD_STORE, e.to_string())
                    .await;
                None
            }
        }
    } else {
        None
    };

    logger.log_startup(SERVICE_VERSION, &adapter.available_domains());

    let mut app_state = api::AppState::new(
        Arc::new(adapter),
        health_registry.clone(),
        metrics,
        logger.clone(),
    )
    .with_default_language(config.default_language);
    if let Some(store) = store {
        app_state = app_state.with_store(store);
    }

    health_registry.mark_initialized().await;

    let api_handle = tokio::spawn(api::serve(config.api_port, Arc::new(app_state)));

    tokio::select! {
        result = api_handle => {
            result.context("API server task panicked")??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
            info!("Shutting down");
        }
    }

    Ok(())
}

//! Health check infrastructure for the diagnosis service
//!
//! Tracks one component per domain model plus the record store, and
//! reports liveness and readiness for the HTTP health endpoints. A domain whose
//! model failed to load degrades the service without taking it down;
//! readiness is lost only when nothing is left to serve.

use crate::domain::Domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still serving, with reduced capability
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    /// Returns true if the component is at least partially operational
    pub fn is_operational(&self) -> bool {
        *self != ComponentStatus::Unhealthy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the component entered its current status
    pub since: DateTime<Utc>,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            since: Utc::now(),
        }
    }

    pub fn healthy() -> Self {
        Self::new(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::new(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::new(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

/// Overall health: the worst component status wins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReadinessResponse {
    fn not_ready(reason: &str) -> Self {
        Self {
            ready: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Component names for health tracking
pub mod components {
    use crate::domain::Domain;

    pub const DIABETES_MODEL: &str = "diabetes_model";
    pub const HEART_MODEL: &str = "heart_model";
    pub const PARKINSONS_MODEL: &str = "parkinsons_model";
    pub const RECORD_STORE: &str = "record_store";

    /// Component tracking the model of `domain`
    pub fn model(domain: Domain) -> &'static str {
        match domain {
            Domain::Diabetes => DIABETES_MODEL,
            Domain::Heart => HEART_MODEL,
            Domain::Parkinsons => PARKINSONS_MODEL,
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    components: BTreeMap<String, ComponentHealth>,
    initialized: bool,
}

/// Shared, cloneable view of component health
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component as healthy
    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        let mut state = self.state.write().await;
        state.components.insert(name.to_string(), health);
    }

    pub async fn set_healthy(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    /// Record that the model for `domain` is loaded and serving
    pub async fn model_loaded(&self, domain: Domain) {
        self.set_healthy(components::model(domain)).await;
    }

    /// Record that `domain` is disabled because its model could not be loaded
    pub async fn model_unavailable(&self, domain: Domain, reason: impl Into<String>) {
        self.set_degraded(components::model(domain), reason).await;
    }

    /// Startup finished; readiness now depends on component health only
    pub async fn mark_initialized(&self) {
        self.state.write().await.initialized = true;
    }

    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;
        let status = state
            .components
            .values()
            .map(|c| c.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy);
        HealthResponse {
            status,
            components: state.components.clone(),
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;

        if !state.initialized {
            return ReadinessResponse::not_ready("Service not yet initialized");
        }
        if state
            .components
            .values()
            .any(|c| c.status == ComponentStatus::Unhealthy)
        {
            return ReadinessResponse::not_ready("Critical component unhealthy");
        }

        let models: Vec<&ComponentHealth> = Domain::ALL
            .iter()
            .filter_map(|&d| state.components.get(components::model(d)))
            .collect();
        if !models.is_empty() && models.iter().all(|c| c.status != ComponentStatus::Healthy) {
            return ReadinessResponse::not_ready("No diagnostic model loaded");
        }

        ReadinessResponse {
            ready: true,
            reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn registry_with_models() -> HealthRegistry {
        let registry = HealthRegistry::new();
        for domain in Domain::ALL {
            registry.model_loaded(domain).await;
        }
        registry
    }

    #[tokio::test]
    async fn empty_registry_is_healthy() {
        let health = HealthRegistry::new().health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn one_component_per_domain_model() {
        let health = registry_with_models().await.health().await;

        assert_eq!(health.components.len(), 3);
        let names: Vec<&str> = health.components.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["diabetes_model", "heart_model", "parkinsons_model"]);
    }

    #[tokio::test]
    async fn unavailable_model_degrades_but_stays_operational() {
        let registry = registry_with_models().await;
        registry
            .model_unavailable(Domain::Heart, "artifact missing")
            .await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert!(health.status.is_operational());
        assert_eq!(
            health.components[components::HEART_MODEL].message.as_deref(),
            Some("artifact missing")
        );
    }

    #[tokio::test]
    async fn worst_status_wins() {
        let registry = registry_with_models().await;
        registry.register(components::RECORD_STORE).await;
        registry.model_unavailable(Domain::Diabetes, "disabled").await;
        registry
            .set_unhealthy(components::RECORD_STORE, "database locked")
            .await;

        assert_eq!(registry.health().await.status, ComponentStatus::Unhealthy);
    }

    #[tokio::test]
    async fn not_ready_before_initialization() {
        let readiness = registry_with_models().await.readiness().await;

        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Service not yet initialized"));
    }

    #[tokio::test]
    async fn ready_with_a_disabled_domain() {
        let registry = registry_with_models().await;
        registry.model_unavailable(Domain::Parkinsons, "disabled").await;
        registry.mark_initialized().await;

        assert!(registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn not_ready_without_any_model() {
        let registry = HealthRegistry::new();
        for domain in Domain::ALL {
            registry.model_unavailable(domain, "artifact missing").await;
        }
        registry.mark_initialized().await;

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("No diagnostic model loaded"));
    }

    #[tokio::test]
    async fn not_ready_when_a_component_is_unhealthy() {
        let registry = registry_with_models().await;
        registry.register(components::RECORD_STORE).await;
        registry.mark_initialized().await;
        registry.set_unhealthy(components::RECORD_STORE, "Failed").await;

        assert!(!registry.readiness().await.ready);
    }
}

//! Health check endpoints
//!
//! Provides endpoints for monitoring and container orchestration:
//! - `/health` - Full health check with per-provider status
//! - `/health/ready` - Readiness probe
//! - `/health/live` - Liveness probe

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::proxy::ProviderRegistry;
use crate::AppState;

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Provider entry in the health report
#[derive(Debug, Serialize)]
pub struct ProviderHealth {
    pub name: String,
    pub base_url: String,
    /// Whether the provider secret was present at startup
    pub configured: bool,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub providers: Vec<ProviderHealth>,
}

/// Simple health response for liveness/readiness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

/// Overall status from provider configuration
///
/// Unhealthy when no provider can serve, degraded when some cannot.
pub fn registry_status(registry: &ProviderRegistry) -> HealthStatus {
    let configured = registry.configured_count();
    if configured == 0 {
        HealthStatus::Unhealthy
    } else if configured < registry.len() {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

fn status_code(status: &HealthStatus) -> StatusCode {
    match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Full health check endpoint
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let registry = state.dispatcher.registry();
    let status = registry_status(registry);

    let providers = registry
        .providers()
        .into_iter()
        .map(|provider| ProviderHealth {
            name: provider.name.clone(),
            base_url: provider.base_url.to_string(),
            configured: provider.is_configured(),
        })
        .collect();

    let response = HealthResponse {
        status: status.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        providers,
    };

    (status_code(&status), Json(response))
}

/// Readiness probe endpoint
///
/// Ready once at least one provider has a secret.
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SimpleHealthResponse>) {
    let status = match registry_status(state.dispatcher.registry()) {
        HealthStatus::Unhealthy => HealthStatus::Unhealthy,
        _ => HealthStatus::Healthy,
    };

    (status_code(&status), Json(SimpleHealthResponse { status }))
}

/// Liveness probe endpoint
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}

//! HTTP routes for llm-relay
//!
//! Health and metrics are served directly; every other path is handed to the
//! proxy fallback.

pub mod health;
pub mod metrics;
pub mod proxy;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{middleware::auth::internal_token_middleware, AppState};

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Proxied traffic: any method, any path not matched below
    let proxy_routes = Router::new()
        .fallback(proxy::proxy_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            internal_token_middleware,
        ));

    // Public routes (health checks, metrics) - no token required
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(proxy_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

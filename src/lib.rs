//! llm-relay - minimal credential-injecting reverse proxy for LLM APIs
//!
//! Requests to `/{provider}/{path}` are forwarded to the provider's base URL
//! with the provider's API key attached, and the response is streamed back.

pub mod config;
pub mod error;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod streaming;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use crate::config::Config;
pub use crate::proxy::{Dispatcher, ProviderRegistry, ReqwestTransport, UpstreamTransport};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// Forwards proxied requests; owns the provider registry
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        let transport: Arc<dyn UpstreamTransport> = Arc::new(ReqwestTransport::from_config(&config)?);
        Self::with_transport(config, transport)
    }

    /// Create application state around a custom transport
    pub fn with_transport(config: Config, transport: Arc<dyn UpstreamTransport>) -> Result<Self> {
        let registry = Arc::new(ProviderRegistry::from_config(&config)?);

        let dispatcher = Dispatcher::new(registry, transport, config.internal_token_header.clone())
            .with_idle_timeout(config.idle_timeout);

        Ok(Self {
            config,
            start_time: Instant::now(),
            dispatcher,
        })
    }
}

//! Request logging utilities for provider proxying
//!
//! Provides structured logging with correlation IDs for tracing a request
//! from arrival through the end of the streamed response. Destination URLs
//! are logged without their query string since it may carry a credential.

use std::time::Instant;

use axum::http::Method;
use reqwest::Url;
use tracing::{debug, error, info, warn, Span};
use uuid::Uuid;

/// Context for tracking a request through the system
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (for log correlation)
    pub trace_id: String,
    /// When the request started
    pub start_time: Instant,
    /// Provider handling this request
    pub provider: String,
    pub method: Method,
    /// Upstream path (provider segment stripped)
    pub path: String,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(provider: &str, method: &Method, path: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(), // Short ID for readability
            start_time: Instant::now(),
            provider: provider.to_string(),
            method: method.clone(),
            path: path.to_string(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Log request initiation
    pub fn log_request_start(&self) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            method = %self.method,
            path = %self.path,
            "Request started"
        );
    }

    /// Log headers being sent (debug level)
    pub fn log_headers_prepared(&self, header_count: usize) {
        debug!(
            trace_id = %self.trace_id,
            header_count = %header_count,
            "Headers prepared for upstream request"
        );
    }

    /// Log request being sent to upstream
    pub fn log_upstream_request(&self, url: &Url) {
        debug!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            host = ?url.host_str(),
            path = %url.path(),
            elapsed_ms = %self.elapsed_ms(),
            "Sending request to upstream"
        );
    }

    /// Log response received from upstream
    pub fn log_upstream_response(&self, status: u16) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            path = %self.path,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    /// Log stream ended
    pub fn log_stream_ended(&self, chunks: usize, bytes: u64) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            path = %self.path,
            chunks = %chunks,
            bytes = %bytes,
            elapsed_ms = %self.elapsed_ms(),
            "Streaming response ended"
        );
    }

    /// Log a stream that was cut off mid-body
    pub fn log_stream_failed(&self, error: &str, bytes: u64) {
        warn!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            path = %self.path,
            bytes = %bytes,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Streaming response aborted"
        );
    }

    /// Log request failure
    pub fn log_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            method = %self.method,
            path = %self.path,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Request failed"
        );
    }

    /// Log connection error (specific for debugging connectivity issues)
    pub fn log_connection_error(&self, error: &str, url: &Url) {
        error!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            host = ?url.host_str(),
            path = %url.path(),
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Connection to upstream failed"
        );
    }

    /// Create a tracing span for this request
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "relay_request",
            trace_id = %self.trace_id,
            provider = %self.provider,
            method = %self.method,
        )
    }
}

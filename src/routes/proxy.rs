//! Proxy handler
//!
//! Catch-all handler that forwards `/{provider}/*` to the provider without
//! reading the body. The response body is streamed back as it arrives.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, response::Response};

use crate::{
    error::AppError,
    routes::metrics::{record_error, record_request},
    AppState,
};

/// Forward any request to the provider named by its first path segment
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    request: axum::extract::Request,
) -> Result<Response, AppError> {
    let start_time = Instant::now();
    let provider = state.dispatcher.provider_label(request.uri().path());

    let result = state.dispatcher.dispatch(request).await;

    // Duration covers the time to upstream headers, not the streamed body
    let duration = start_time.elapsed().as_secs_f64();
    match &result {
        Ok(response) => record_request(&provider, response.status().as_str(), duration),
        Err(err) => {
            record_request(&provider, "error", duration);
            record_error(&provider, err.kind());
        }
    }

    result
}

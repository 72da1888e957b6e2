//! Internal token middleware
//!
//! When an internal token is configured, proxied requests must carry it in the
//! trust-boundary header. The header itself is stripped by the dispatcher
//! whether or not verification is enabled.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use tracing::{instrument, warn};

use crate::{error::AppError, AppState};

/// Compare two tokens by SHA-256 digest
pub fn tokens_match(presented: &[u8], expected: &[u8]) -> bool {
    Sha256::digest(presented) == Sha256::digest(expected)
}

/// Internal token middleware
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn internal_token_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.internal_token.as_ref() else {
        return Ok(next.run(request).await);
    };

    let presented = request
        .headers()
        .get(&state.config.internal_token_header)
        .ok_or_else(|| {
            warn!("Request without internal token rejected");
            AppError::Unauthorized
        })?;

    if !tokens_match(presented.as_bytes(), expected.expose().as_bytes()) {
        warn!("Request with invalid internal token rejected");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

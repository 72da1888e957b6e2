//! Request dispatcher
//!
//! Runs one proxied exchange: parse the provider from the path, build the
//! destination URL, sanitize headers, inject credentials, send through the
//! transport and hand the normalized response back as a stream.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderName, Request, Response};
use reqwest::Url;
use tracing::Instrument;

use crate::error::{AppError, AppResult};
use crate::proxy::headers::{filter_response_headers, sanitize_request_headers};
use crate::proxy::logging::RequestContext;
use crate::proxy::registry::ProviderRegistry;
use crate::proxy::upstream::{OutboundRequest, UpstreamTransport};
use crate::streaming;

/// Split `/{provider}/{rest...}` into the provider segment and the upstream path
///
/// The upstream path keeps its leading slash and is empty when nothing follows
/// the provider segment. Returns `None` when there is no provider segment.
pub fn split_provider_path(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.strip_prefix('/')?;
    let (provider, rest) = match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, ""),
    };

    if provider.is_empty() {
        None
    } else {
        Some((provider, rest))
    }
}

/// Destination URL: provider base with the upstream path and the inbound query
///
/// Path and query are already percent-encoded and are copied as-is.
pub fn build_destination(base: &Url, upstream_path: &str, query: Option<&str>) -> Url {
    let mut url = base.clone();
    url.set_path(if upstream_path.is_empty() { "/" } else { upstream_path });
    url.set_query(query);
    url
}

pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    transport: Arc<dyn UpstreamTransport>,
    internal_token_header: HeaderName,
    idle_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        transport: Arc<dyn UpstreamTransport>,
        internal_token_header: HeaderName,
    ) -> Self {
        Self {
            registry,
            transport,
            internal_token_header,
            idle_timeout: None,
        }
    }

    /// Abort response streams that stall for longer than `idle`
    pub fn with_idle_timeout(mut self, idle: Option<Duration>) -> Self {
        self.idle_timeout = idle;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Provider name for metrics labels; unregistered segments collapse to `unknown`
    pub fn provider_label(&self, path: &str) -> String {
        split_provider_path(path)
            .and_then(|(name, _)| self.registry.resolve(name).ok())
            .map(|provider| provider.name.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Forward `request` to its provider and return the upstream response
    ///
    /// Routing and credential failures return an error before any network
    /// call. Upstream HTTP errors are returned as ordinary responses.
    pub async fn dispatch(&self, request: Request<Body>) -> AppResult<Response<Body>> {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path();

        let (provider_name, upstream_path) = split_provider_path(path)
            .ok_or_else(|| AppError::UnknownProvider(path.to_string()))?;
        let provider = self.registry.resolve(provider_name)?;

        let ctx = RequestContext::new(&provider.name, &parts.method, upstream_path);
        let span = ctx.create_span();
        ctx.log_request_start();

        let mut url = build_destination(&provider.base_url, upstream_path, parts.uri.query());
        let mut headers = sanitize_request_headers(&parts.headers, &self.internal_token_header);

        if let Err(err) = provider.inject(&mut headers, &mut url) {
            ctx.log_error(&err.to_string());
            return Err(err);
        }
        ctx.log_headers_prepared(headers.len());
        ctx.log_upstream_request(&url);

        let outbound = OutboundRequest {
            method: parts.method.clone(),
            url: url.clone(),
            headers,
            body,
        };

        let upstream = match self.transport.send(outbound).instrument(span).await {
            Ok(upstream) => upstream,
            Err(err) => {
                ctx.log_connection_error(&err.to_string(), &url);
                return Err(err);
            }
        };
        ctx.log_upstream_response(upstream.status.as_u16());

        let mut stream = upstream.body;
        if let Some(idle) = self.idle_timeout {
            stream = streaming::with_idle_timeout(stream, idle);
        }
        let stream = streaming::observe(stream, ctx);

        let mut response = Response::new(Body::from_stream(stream));
        *response.status_mut() = upstream.status;
        *response.headers_mut() = filter_response_headers(&upstream.headers);

        Ok(response)
    }
}

//! Upstream transport
//!
//! The dispatcher talks to providers through `UpstreamTransport` so that the
//! network call can be replaced in tests. `ReqwestTransport` is the production
//! implementation: request and response bodies are streamed, never collected.

use std::pin::Pin;

use async_trait::async_trait;
use axum::body::{Body, HttpBody};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::BoxError;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::{redirect, Url};

use crate::config::Config;
use crate::error::AppResult;

/// Stream type for upstream response bodies
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// A fully prepared request for a provider
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
}

/// Status line, headers and body stream of a provider response
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

/// Issues outbound requests to providers
///
/// Implementations must not retry and must not buffer bodies. Any HTTP status
/// is a successful exchange; only transport failures are errors.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> AppResult<UpstreamResponse>;
}

/// reqwest-backed transport with connection pooling
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build the HTTP client from configured timeouts
    ///
    /// Redirects are returned to the caller rather than followed.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .connect_timeout(config.connect_timeout)
            .redirect(redirect::Policy::none());

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self::new(builder.build()?))
    }
}

#[async_trait]
impl UpstreamTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> AppResult<UpstreamResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        // Bodiless requests stay bodiless instead of becoming an empty chunked stream
        if !request.body.is_end_stream() {
            builder = builder.body(reqwest::Body::wrap_stream(request.body.into_data_stream()));
        }

        let response = builder.send().await?;

        Ok(UpstreamResponse {
            status: response.status(),
            headers: response.headers().clone(),
            body: Box::pin(response.bytes_stream().map_err(BoxError::from)),
        })
    }
}

//! Mock provider upstream for testing
//!
//! A single wiremock server plays OpenAI, Gemini and Anthropic; tests point
//! every provider's base URL at it and assert on what it received.
//!
//! # Example
//!
//! ```rust,ignore
//! let upstream = MockUpstream::start().await;
//! upstream.mock_json("POST", "/v1/chat/completions", 200, json!({"ok": true})).await;
//!
//! let server = test_server(test_config(&upstream.uri()));
//! server.post("/openai/v1/chat/completions").await.assert_status_ok();
//! ```

use serde_json::Value;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

/// `{"id":"msg_1","content":"hello from upstream"}` gzip-compressed
pub const GZIPPED_JSON: &[u8] = &[
    0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03, 0xab, 0x56, 0xca, 0x4c, 0x51,
    0xb2, 0x52, 0xca, 0x2d, 0x4e, 0x8f, 0x37, 0x54, 0xd2, 0x51, 0x4a, 0xce, 0xcf, 0x2b, 0x49,
    0xcd, 0x2b, 0x01, 0x8a, 0x64, 0xa4, 0xe6, 0xe4, 0xe4, 0x2b, 0xa4, 0x15, 0xe5, 0xe7, 0x2a,
    0x94, 0x16, 0x14, 0x97, 0x14, 0xa5, 0x26, 0xe6, 0x2a, 0xd5, 0x02, 0x00, 0xf8, 0x3a, 0x0b,
    0x12, 0x2e, 0x00, 0x00, 0x00,
];

/// Plain text of `GZIPPED_JSON`
pub const GZIPPED_JSON_PLAIN: &str = r#"{"id":"msg_1","content":"hello from upstream"}"#;

/// Mock upstream server wrapper
pub struct MockUpstream {
    server: MockServer,
}

impl MockUpstream {
    /// Start a new mock upstream
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Get the mock server URI
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Access the underlying server for custom matchers
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Respond to `verb path` with a JSON body
    pub async fn mock_json(&self, verb: &str, route: &str, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Respond with a gzip-encoded JSON body
    pub async fn mock_gzip_json(&self, verb: &str, route: &str) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-encoding", "gzip")
                    .insert_header("content-type", "application/json")
                    .insert_header("x-request-id", "req_gzip")
                    .set_body_bytes(GZIPPED_JSON),
            )
            .mount(&self.server)
            .await;
    }

    /// Respond with an SSE stream in a single body
    pub async fn mock_sse(&self, route: &str) {
        let stream_data = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"!\"}}]}\n\n",
            "data: [DONE]\n\n"
        );

        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(stream_data, "text/event-stream")
                    .insert_header("cache-control", "no-cache"),
            )
            .mount(&self.server)
            .await;
    }

    /// Requests the upstream has received so far
    pub async fn received(&self) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .expect("request recording is enabled")
    }

    /// The single request the upstream received
    pub async fn single_request(&self) -> Request {
        let mut requests = self.received().await;
        assert_eq!(requests.len(), 1, "expected exactly one upstream request");
        requests.remove(0)
    }
}

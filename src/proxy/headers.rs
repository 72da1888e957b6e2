//! Header utilities for provider proxying
//!
//! Request headers are forwarded almost verbatim; only transport-level headers
//! and the internal trust token are removed so the token never reaches an
//! external provider. `HeaderName` is lowercase-normalized, which makes every
//! comparison here case-insensitive.

use axum::http::header::{self, HeaderMap, HeaderName};

/// Hop-by-hop headers that must never be forwarded
const HOP_BY_HOP_HEADERS: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Request headers the transport recomputes for the destination
const REQUEST_EXCLUDED_HEADERS: &[HeaderName] = &[header::HOST, header::CONTENT_LENGTH];

/// Response headers that no longer describe the body once the client has decoded it
const RESPONSE_EXCLUDED_HEADERS: &[HeaderName] = &[header::CONTENT_ENCODING, header::CONTENT_LENGTH];

/// Check if a header is a hop-by-hop header that should not be forwarded
pub fn is_hop_by_hop_header(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(name) || name.as_str() == "keep-alive"
}

/// Copy inbound headers for the upstream request
///
/// Drops `host`, `content-length`, hop-by-hop headers and `internal_token_header`.
/// Repeated headers keep all their values.
pub fn sanitize_request_headers(incoming: &HeaderMap, internal_token_header: &HeaderName) -> HeaderMap {
    let mut sanitized = HeaderMap::with_capacity(incoming.len());

    for (name, value) in incoming {
        if REQUEST_EXCLUDED_HEADERS.contains(name)
            || name == internal_token_header
            || is_hop_by_hop_header(name)
        {
            continue;
        }
        sanitized.append(name.clone(), value.clone());
    }

    sanitized
}

/// Filter upstream response headers before returning them to the client
///
/// The HTTP client transparently decompresses bodies, so `content-encoding` and
/// `content-length` would describe bytes the client never receives.
pub fn filter_response_headers(response_headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(response_headers.len());

    for (name, value) in response_headers {
        if RESPONSE_EXCLUDED_HEADERS.contains(name) || is_hop_by_hop_header(name) {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }

    filtered
}

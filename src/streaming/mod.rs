//! Response body streaming utilities
//!
//! Wrappers around upstream byte streams. Each wrapper pulls one chunk at a
//! time from the stream it wraps, so backpressure from the client reaches the
//! upstream connection unchanged.

use std::io;
use std::time::Duration;

use axum::BoxError;
use futures::StreamExt;

use crate::proxy::logging::RequestContext;
use crate::proxy::upstream::ByteStream;

/// End the stream with a `TimedOut` error when no chunk arrives within `idle`.
pub fn with_idle_timeout(stream: ByteStream, idle: Duration) -> ByteStream {
    Box::pin(async_stream::stream! {
        let mut stream = stream;
        loop {
            match tokio::time::timeout(idle, stream.next()).await {
                Ok(Some(item)) => yield item,
                Ok(None) => break,
                Err(_) => {
                    let err = io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("no data from upstream for {:?}", idle),
                    );
                    yield Err(BoxError::from(err));
                    break;
                }
            }
        }
    })
}

/// Log completion or failure of a response body.
///
/// The first error is passed through and ends the stream, which makes the
/// server abort the client connection instead of leaving it hanging.
pub fn observe(stream: ByteStream, ctx: RequestContext) -> ByteStream {
    Box::pin(async_stream::stream! {
        let mut stream = stream;
        let mut chunks = 0usize;
        let mut bytes = 0u64;

        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    chunks += 1;
                    bytes += chunk.len() as u64;
                    yield Ok(chunk);
                }
                Err(err) => {
                    ctx.log_stream_failed(&err.to_string(), bytes);
                    yield Err(err);
                    return;
                }
            }
        }

        ctx.log_stream_ended(chunks, bytes);
    })
}

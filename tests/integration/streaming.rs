//! Streaming integration tests
//!
//! Runs the relay on a real TCP listener in front of a hand-written axum
//! upstream whose bodies are fed from channels, so the tests control exactly
//! when each chunk exists:
//! - response bytes reach the client before the upstream finishes
//! - request bytes reach the upstream before the client finishes
//! - stalled upstreams are cut off by the idle timeout
//! - a departed client releases the upstream connection

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{body::Body, extract::State, routing::any, Router};
use bytes::Bytes;
use futures::channel::{mpsc, oneshot};
use futures::StreamExt;
use tokio::time::timeout;

use crate::common::{spawn_relay, spawn_upstream, test_config};

type Chunk = Result<Bytes, std::io::Error>;
type SharedReceiver = Arc<Mutex<Option<mpsc::UnboundedReceiver<Chunk>>>>;

const WAIT: Duration = Duration::from_secs(10);

/// Upstream whose `/stream` response body is whatever the test pushes into the channel
async fn channel_upstream() -> (String, mpsc::UnboundedSender<Chunk>) {
    async fn stream_handler(State(receiver): State<SharedReceiver>) -> Body {
        let receiver = receiver
            .lock()
            .unwrap()
            .take()
            .expect("stream requested twice");
        Body::from_stream(receiver)
    }

    let (tx, rx) = mpsc::unbounded();
    let shared: SharedReceiver = Arc::new(Mutex::new(Some(rx)));
    let app = Router::new()
        .route("/stream", any(stream_handler))
        .with_state(shared);

    (spawn_upstream(app).await, tx)
}

/// Read from `response` until at least `len` bytes arrived
async fn read_at_least(response: &mut reqwest::Response, len: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    while buf.len() < len {
        match response.chunk().await.expect("chunk error") {
            Some(chunk) => buf.extend_from_slice(&chunk),
            None => break,
        }
    }
    buf
}

#[tokio::test]
async fn test_response_bytes_arrive_before_upstream_finishes() {
    let (upstream, tx) = channel_upstream().await;
    let relay = spawn_relay(test_config(&upstream)).await;

    tx.unbounded_send(Ok(Bytes::from_static(b"data: first\n\n"))).unwrap();

    let mut response = reqwest::get(format!("http://{}/openai/stream", relay))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // The upstream body is still open: only the first event exists yet
    let first = timeout(WAIT, read_at_least(&mut response, 13)).await.unwrap();
    assert_eq!(first, b"data: first\n\n");

    tx.unbounded_send(Ok(Bytes::from_static(b"data: second\n\n"))).unwrap();
    drop(tx);

    let rest = timeout(WAIT, response.bytes()).await.unwrap().unwrap();
    assert_eq!(rest, Bytes::from_static(b"data: second\n\n"));
}

#[tokio::test]
async fn test_large_response_is_streamed_intact() {
    let (upstream, tx) = channel_upstream().await;
    let relay = spawn_relay(test_config(&upstream)).await;

    let chunk = Bytes::from(vec![b'x'; 64 * 1024]);
    let chunks = 64;
    tokio::spawn(async move {
        for _ in 0..chunks {
            if tx.unbounded_send(Ok(chunk.clone())).is_err() {
                break;
            }
            tokio::task::yield_now().await;
        }
    });

    let response = reqwest::get(format!("http://{}/openai/stream", relay))
        .await
        .unwrap();
    assert!(response.headers().get("content-length").is_none());

    let mut total = 0usize;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = timeout(WAIT, stream.next()).await.unwrap() {
        let chunk = chunk.unwrap();
        assert!(chunk.iter().all(|b| *b == b'x'));
        total += chunk.len();
    }
    assert_eq!(total, 64 * 64 * 1024);
}

#[tokio::test]
async fn test_request_bytes_reach_upstream_before_client_finishes() {
    type FirstChunkSignal = Arc<Mutex<Option<oneshot::Sender<Bytes>>>>;

    async fn upload_handler(State(signal): State<FirstChunkSignal>, body: Body) -> String {
        let mut stream = body.into_data_stream();
        let mut total = 0usize;

        if let Some(Ok(first)) = stream.next().await {
            total += first.len();
            if let Some(sender) = signal.lock().unwrap().take() {
                let _ = sender.send(first);
            }
        }
        while let Some(Ok(chunk)) = stream.next().await {
            total += chunk.len();
        }

        total.to_string()
    }

    let (signal_tx, signal_rx) = oneshot::channel();
    let app = Router::new()
        .route("/upload", any(upload_handler))
        .with_state(Arc::new(Mutex::new(Some(signal_tx))) as FirstChunkSignal);
    let upstream = spawn_upstream(app).await;
    let relay = spawn_relay(test_config(&upstream)).await;

    let (body_tx, body_rx) = mpsc::unbounded::<Chunk>();
    let request = tokio::spawn(async move {
        reqwest::Client::new()
            .post(format!("http://{}/openai/upload", relay))
            .body(reqwest::Body::wrap_stream(body_rx))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap()
    });

    body_tx.unbounded_send(Ok(Bytes::from_static(b"part-1;"))).unwrap();

    // The client has not finished its body, yet the upstream already has the first part
    let first = timeout(WAIT, signal_rx).await.unwrap().unwrap();
    assert_eq!(first, Bytes::from_static(b"part-1;"));

    body_tx.unbounded_send(Ok(Bytes::from_static(b"part-2;"))).unwrap();
    body_tx.unbounded_send(Ok(Bytes::from_static(b"part-3;"))).unwrap();
    drop(body_tx);

    let echoed = timeout(WAIT, request).await.unwrap().unwrap();
    assert_eq!(echoed, "21");
}

#[tokio::test]
async fn test_stalled_upstream_is_cut_off_by_idle_timeout() {
    let (upstream, tx) = channel_upstream().await;
    let mut config = test_config(&upstream);
    config.idle_timeout = Some(Duration::from_secs(1));
    let relay = spawn_relay(config).await;

    tx.unbounded_send(Ok(Bytes::from_static(b"partial"))).unwrap();

    let mut response = reqwest::get(format!("http://{}/openai/stream", relay))
        .await
        .unwrap();
    let first = timeout(WAIT, read_at_least(&mut response, 7)).await.unwrap();
    assert_eq!(first, b"partial");

    // No more data: the relay must abort the body instead of hanging
    let next = timeout(WAIT, response.chunk()).await.expect("relay kept the stream open");
    assert!(next.is_err());

    drop(tx);
}

#[tokio::test]
async fn test_client_disconnect_releases_upstream() {
    let (upstream, tx) = channel_upstream().await;
    let relay = spawn_relay(test_config(&upstream)).await;

    tx.unbounded_send(Ok(Bytes::from_static(b"hello"))).unwrap();

    let client = reqwest::Client::new();
    let mut response = client
        .get(format!("http://{}/openai/stream", relay))
        .send()
        .await
        .unwrap();
    let first = timeout(WAIT, read_at_least(&mut response, 5)).await.unwrap();
    assert_eq!(first, b"hello");

    drop(response);
    drop(client);

    // Keep producing until the upstream body is dropped; writes to the closed
    // connections make every hop notice the disconnect.
    let released = timeout(WAIT, async {
        loop {
            if tx
                .unbounded_send(Ok(Bytes::from(vec![b'z'; 16 * 1024])))
                .is_err()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    assert!(released.is_ok(), "upstream stream was never dropped");
}

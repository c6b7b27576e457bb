//! Tests for the HTTP writer client against an in-process writer stub
//!
//! The stub records every request it receives and answers with a fixed status,
//! so the tests see exactly what goes over the wire.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use concordance_transformer::error::WriterError;
use concordance_transformer::writer::{ConcordanceWriter, HttpConcordanceWriter};
use concordance_transformer::ConcordanceRecord;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
struct ReceivedRequest {
    method: Method,
    path: String,
    transaction_id: Option<String>,
    body: Vec<u8>,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

async fn record_request(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    state.received.lock().unwrap().push(ReceivedRequest {
        method,
        path: uri.path().to_string(),
        transaction_id: headers
            .get("X-Request-Id")
            .map(|v| v.to_str().unwrap().to_string()),
        body: body.to_vec(),
    });
    state.status
}

/// Test helper: Start a writer stub answering `status`, returning its base address
async fn start_stub(status: StatusCode) -> (String, Arc<Mutex<Vec<ReceivedRequest>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(record_request).with_state(StubState {
        status,
        received: received.clone(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/__concordance-rw", addr), received)
}

fn client(base: &str) -> HttpConcordanceWriter {
    HttpConcordanceWriter::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_write_puts_record_json() {
    let (base, received) = start_stub(StatusCode::CREATED).await;
    let record = ConcordanceRecord::new(
        "20db1bd6-59f9-4404-adb5-3165a448f8b0",
        vec!["93c9b7d2-a539-3c0e-ab4d-cd01878be150".to_string()],
    );

    let status = client(&base).write(&record, "tid_write").await.unwrap();

    assert_eq!(status, 201);
    let requests = received.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::PUT);
    assert_eq!(
        request.path,
        "/__concordance-rw/concordances/20db1bd6-59f9-4404-adb5-3165a448f8b0"
    );
    assert_eq!(request.transaction_id.as_deref(), Some("tid_write"));

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "uuid": "20db1bd6-59f9-4404-adb5-3165a448f8b0",
            "concordedIds": ["93c9b7d2-a539-3c0e-ab4d-cd01878be150"]
        })
    );
}

#[tokio::test]
async fn test_delete_sends_bodyless_delete() {
    let (base, received) = start_stub(StatusCode::NOT_FOUND).await;

    let status = client(&base)
        .delete("20db1bd6-59f9-4404-adb5-3165a448f8b0", "tid_delete")
        .await
        .unwrap();

    assert_eq!(status, 404);
    let requests = received.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::DELETE);
    assert_eq!(
        requests[0].path,
        "/__concordance-rw/concordances/20db1bd6-59f9-4404-adb5-3165a448f8b0"
    );
    assert_eq!(requests[0].transaction_id.as_deref(), Some("tid_delete"));
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_good_to_go_probes_readiness_endpoint() {
    let (base, received) = start_stub(StatusCode::OK).await;
    let writer = client(&base);

    assert_eq!(writer.good_to_go().await.unwrap(), 200);

    let requests = received.lock().unwrap().clone();
    assert_eq!(requests[0].method, Method::GET);
    assert_eq!(requests[0].path, "/__concordance-rw/__gtg");
}

#[tokio::test]
async fn test_non_success_status_is_not_an_error() {
    let (base, _) = start_stub(StatusCode::SERVICE_UNAVAILABLE).await;

    let status = client(&base)
        .delete("20db1bd6-59f9-4404-adb5-3165a448f8b0", "tid_503")
        .await
        .unwrap();

    assert_eq!(status, 503);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let writer = client(&format!("http://{}/", addr));
    let result = writer.good_to_go().await;

    assert!(matches!(result, Err(WriterError::Transport(_))));
}

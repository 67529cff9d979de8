//! End-to-end tests over a real TCP listener.

mod common;

use common::{send_request, start_test_server};

#[tokio::test]
async fn health_endpoint_answers_with_request_id_and_security_headers() {
    let (addr, _metrics) = start_test_server().await;

    let resp = send_request(addr, "GET", "/health", "").await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "ok");
    assert!(
        resp.headers.contains_key("x-request-id"),
        "missing x-request-id: {:?}",
        resp.headers
    );
    assert_eq!(
        resp.headers.get("x-content-type-options").map(String::as_str),
        Some("nosniff")
    );
}

#[tokio::test]
async fn inbound_request_id_is_echoed_back() {
    let (addr, _metrics) = start_test_server().await;

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream
        .write_all(
            b"GET /health HTTP/1.1\r\nHost: localhost\r\nX-Request-Id: trace-me-7\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8_lossy(&raw).to_lowercase();
    assert!(raw.contains("x-request-id: trace-me-7"), "got: {raw}");
}

#[tokio::test]
async fn unknown_path_is_a_generic_404() {
    let (addr, _metrics) = start_test_server().await;

    let resp = send_request(addr, "GET", "/nothing/here", "").await;
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body, r#"{"error":"Not Found"}"#);
}

#[tokio::test]
async fn path_parameters_reach_handlers() {
    let (addr, _metrics) = start_test_server().await;

    let resp = send_request(addr, "GET", "/echo/world", "").await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "world");
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let (addr, _metrics) = start_test_server().await;

    let big = "x".repeat(200);
    let resp = send_request(addr, "POST", "/ingest", &big).await;
    assert_eq!(resp.status, 413);

    let small = "x".repeat(10);
    let resp = send_request(addr, "POST", "/ingest", &small).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "10");
}

#[tokio::test]
async fn metrics_reflect_served_requests() {
    let (addr, metrics) = start_test_server().await;

    send_request(addr, "GET", "/health", "").await;
    send_request(addr, "GET", "/missing", "").await;

    let snapshot = metrics.snapshot();
    assert!(snapshot.requests_total >= 2, "got {:?}", snapshot);
    assert!(snapshot.errors_total >= 1, "got {:?}", snapshot);

    // The exposition route serves the same numbers as JSON.
    let resp = send_request(addr, "GET", "/metrics", "").await;
    assert_eq!(resp.status, 200);
    assert!(resp.body.contains("requests_total"), "got: {}", resp.body);
}

//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use chassis::config::RuntimeConfig;
use chassis::http::{HttpServer, Response};
use chassis::observability::MetricsCollector;
use chassis::pipeline::{AccessLog, BodyLimit, Pipeline, RequestIdMiddleware, SecurityHeaders};
use chassis::routing::{handler, Router};

/// A parsed raw HTTP/1.1 response.
pub struct RawResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Send one raw HTTP/1.1 request and read the full response.
pub async fn send_request(addr: SocketAddr, method: &str, path: &str, body: &str) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    parse_response(&String::from_utf8_lossy(&raw))
}

fn parse_response(raw: &str) -> RawResponse {
    let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
    let mut lines = head.lines();
    let status_line = lines.next().unwrap_or_default();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }

    RawResponse {
        status,
        headers,
        body: body.to_string(),
    }
}

/// Boot a small application on an ephemeral port and return its address plus
/// the metrics collector backing its `/metrics` route.
pub async fn start_test_server() -> (SocketAddr, Arc<MetricsCollector>) {
    let metrics = Arc::new(MetricsCollector::new());

    let mut router = Router::new();
    router.add_route(
        Method::GET,
        "/health",
        handler(|_req| async { Ok(Response::text(StatusCode::OK, "ok")) }),
    );
    let snapshot_metrics = metrics.clone();
    router.add_route(
        Method::GET,
        "/metrics",
        handler(move |_req| {
            let metrics = snapshot_metrics.clone();
            async move { Ok(Response::json(StatusCode::OK, &metrics.snapshot())) }
        }),
    );
    router.add_route(
        Method::GET,
        "/echo/{name}",
        handler(|req| async move {
            let name = req.path_params.get("name").unwrap_or_default().to_string();
            Ok(Response::text(StatusCode::OK, &name))
        }),
    );
    router.add_route(
        Method::POST,
        "/ingest",
        handler(|req| async move {
            Ok(Response::text(StatusCode::OK, &req.body.len().to_string()))
        }),
    );

    let pipeline = Pipeline::builder()
        .with(RequestIdMiddleware)
        .with(AccessLog::new(metrics.clone(), Duration::from_secs(1)))
        .with(SecurityHeaders)
        .with(BodyLimit::new(64))
        .build(Arc::new(router));

    let config = RuntimeConfig::default();
    let server = HttpServer::new(&config, Arc::new(pipeline));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    // Let the accept loop come up.
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, metrics)
}

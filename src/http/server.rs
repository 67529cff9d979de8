//! HTTP transport adapter.
//!
//! # Responsibilities
//! - Create the Axum router with a catch-all entry point
//! - Wire up transport layers (timeout, tracing)
//! - Bind the server to a listener with graceful shutdown
//! - Convert the transport request into the pipeline's [`Request`] and the
//!   pipeline's [`Response`] back out
//!
//! # Design Decisions
//! - All application routing happens inside the pipeline's terminal dispatch
//!   node; the transport sees exactly one catch-all route
//! - The body is buffered up to the configured limit before entering the
//!   pipeline, so handlers and middleware work with a complete body

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::IntoResponse,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RuntimeConfig;
use crate::http::{PeerAddr, Request, Response};
use crate::pipeline::Pipeline;

/// Application state injected into the entry handler.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    max_body_bytes: usize,
}

/// HTTP server hosting one pipeline.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server dispatching into the given pipeline.
    pub fn new(config: &RuntimeConfig, pipeline: Arc<Pipeline>) -> Self {
        let state = AppState {
            pipeline,
            max_body_bytes: config.limits.max_body_bytes,
        };
        let router = Router::new()
            .route("/{*path}", any(entry))
            .route("/", any(entry))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all entry point: adapt, dispatch, adapt back.
async fn entry(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: axum::http::Request<Body>,
) -> impl IntoResponse {
    let (parts, body) = request.into_parts();

    let query = parts
        .uri
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    // Buffer the body; anything past the limit is rejected at the transport
    // so the pipeline never sees a truncated body.
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = %err, "request body exceeded transport limit");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large").into_response();
        }
    };

    let mut req = Request::new(parts.method, parts.uri.path());
    req.headers = parts.headers;
    req.query = query;
    req.body = body;
    req.extensions.insert(PeerAddr(addr));

    into_axum(state.pipeline.handle(req).await)
}

fn into_axum(resp: Response) -> axum::response::Response {
    let mut out = axum::response::Response::new(Body::from(resp.body));
    *out.status_mut() = resp.status;
    *out.headers_mut() = resp.headers;
    out
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}

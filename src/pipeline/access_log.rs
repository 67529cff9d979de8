//! Access logging and timing middleware.
//!
//! # Responsibilities
//! - Measure elapsed time around the rest of the chain
//! - Record every outcome into the injected metrics collector, including
//!   short-circuited responses and errors
//! - Warn on slow requests
//!
//! # Design Decisions
//! - Wrap pattern: the after logic runs on every exit path, so a rate-limited
//!   429 produced downstream is still timed and counted
//! - Errors are recorded as 500 before propagating; the boundary serializes
//!   the generic body

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::StatusCode;

use crate::http::{Request, Response};
use crate::observability::MetricsCollector;
use crate::pipeline::{BoxError, Middleware, Next};

/// Timing, access logging, and metrics recording around the inner chain.
pub struct AccessLog {
    metrics: Arc<MetricsCollector>,
    slow_threshold: Duration,
}

impl AccessLog {
    pub fn new(metrics: Arc<MetricsCollector>, slow_threshold: Duration) -> Self {
        Self {
            metrics,
            slow_threshold,
        }
    }
}

#[async_trait]
impl Middleware for AccessLog {
    async fn handle(&self, req: Request, next: Next<'_>) -> Result<Response, BoxError> {
        let start = Instant::now();
        let method = req.method.clone();
        let path = req.path.clone();
        let request_id = req.request_id().unwrap_or("-").to_string();

        let result = next.run(req).await;
        let elapsed = start.elapsed();

        let status = match &result {
            Ok(resp) => resp.status,
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        self.metrics.record(status.as_u16(), elapsed);

        tracing::info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "request completed"
        );
        if elapsed > self.slow_threshold {
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                elapsed_ms = elapsed.as_millis() as u64,
                "slow request"
            );
        }

        result
    }
}

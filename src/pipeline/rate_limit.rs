//! Rate limiting middleware.
//!
//! # Responsibilities
//! - Enforce a per-client request rate with burst allowance
//! - Key on the authenticated principal when present, else the peer address
//!
//! # Design Decisions
//! - Token bucket per key, stored in a concurrent map; refill is computed
//!   lazily from elapsed time so idle buckets cost nothing
//! - Fail closed: exhausted bucket short-circuits with 429

use std::time::Instant;

use async_trait::async_trait;
use axum::http::StatusCode;
use dashmap::DashMap;

use crate::http::{PeerAddr, Request, Response};
use crate::pipeline::auth::Principal;
use crate::pipeline::{BoxError, Middleware, Next};

/// A simple token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-client token-bucket limiter.
pub struct RateLimit {
    buckets: DashMap<String, TokenBucket>,
    rps: f64,
    burst: f64,
}

impl RateLimit {
    pub fn new(rps: u32, burst: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            rps: rps as f64,
            burst: burst as f64,
        }
    }

    fn check(&self, key: &str) -> bool {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.burst));
        bucket.try_acquire(self.burst, self.rps)
    }

    fn client_key(req: &Request) -> String {
        if let Some(principal) = req.extensions.get::<Principal>() {
            return principal.subject.clone();
        }
        match req.extensions.get::<PeerAddr>() {
            Some(peer) => peer.0.ip().to_string(),
            None => "unknown".to_string(),
        }
    }
}

#[async_trait]
impl Middleware for RateLimit {
    async fn handle(&self, req: Request, next: Next<'_>) -> Result<Response, BoxError> {
        let key = Self::client_key(&req);
        if self.check(&key) {
            next.run(req).await
        } else {
            tracing::warn!(client = %key, path = %req.path, "rate limit exceeded");
            Ok(Response::json(
                StatusCode::TOO_MANY_REQUESTS,
                &serde_json::json!({"error": "Too Many Requests"}),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::routing::{handler, Router};
    use axum::http::Method;
    use std::net::SocketAddr;
    use std::sync::Arc;

    fn pipeline(rps: u32, burst: u32) -> Pipeline {
        let mut router = Router::new();
        router.add_route(
            Method::GET,
            "/ok",
            handler(|_req| async { Ok(Response::text(StatusCode::OK, "ok")) }),
        );
        Pipeline::builder()
            .with(RateLimit::new(rps, burst))
            .build(Arc::new(router))
    }

    fn request_from(addr: &str) -> Request {
        let mut req = Request::new(Method::GET, "/ok");
        req.extensions
            .insert(PeerAddr(addr.parse::<SocketAddr>().unwrap()));
        req
    }

    #[tokio::test]
    async fn burst_is_allowed_then_excess_is_rejected() {
        let p = pipeline(1, 3);
        for _ in 0..3 {
            let resp = p.handle(request_from("10.0.0.1:5000")).await;
            assert_eq!(resp.status, StatusCode::OK);
        }
        let resp = p.handle(request_from("10.0.0.1:5000")).await;
        assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn clients_are_limited_independently() {
        let p = pipeline(1, 1);
        assert_eq!(p.handle(request_from("10.0.0.1:1")).await.status, StatusCode::OK);
        assert_eq!(
            p.handle(request_from("10.0.0.1:1")).await.status,
            StatusCode::TOO_MANY_REQUESTS
        );
        // A different client still has its full bucket.
        assert_eq!(p.handle(request_from("10.0.0.2:1")).await.status, StatusCode::OK);
    }
}

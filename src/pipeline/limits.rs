//! Request size limiting middleware.
//!
//! # Responsibilities
//! - Reject oversized request bodies before any body-dependent stage
//! - Check the declared Content-Length and the actual buffered length
//!
//! # Design Decisions
//! - Early rejection with 413; an unparseable Content-Length is ignored and
//!   the actual length decides

use async_trait::async_trait;
use axum::http::{header, StatusCode};

use crate::http::{Request, Response};
use crate::pipeline::{BoxError, Middleware, Next};

/// Rejects bodies larger than the configured maximum.
#[derive(Debug)]
pub struct BodyLimit {
    max_bytes: usize,
}

impl BodyLimit {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    fn reject(&self, req: &Request, declared: usize) -> Response {
        tracing::warn!(
            path = %req.path,
            declared_bytes = declared,
            max_bytes = self.max_bytes,
            "request body exceeds limit"
        );
        Response::json(
            StatusCode::PAYLOAD_TOO_LARGE,
            &serde_json::json!({
                "error": "Payload Too Large",
                "max_bytes": self.max_bytes,
            }),
        )
    }
}

#[async_trait]
impl Middleware for BodyLimit {
    async fn handle(&self, req: Request, next: Next<'_>) -> Result<Response, BoxError> {
        if let Some(declared) = req
            .header(header::CONTENT_LENGTH.as_str())
            .and_then(|v| v.parse::<usize>().ok())
        {
            if declared > self.max_bytes {
                return Ok(self.reject(&req, declared));
            }
        }
        if req.body.len() > self.max_bytes {
            return Ok(self.reject(&req, req.body.len()));
        }
        next.run(req).await
    }
}

//! Security response headers middleware.
//!
//! # Responsibilities
//! - Stamp standard security headers on every response, including
//!   short-circuited ones
//!
//! # Design Decisions
//! - Pure after logic; never short-circuits and never overrides a header a
//!   handler set deliberately

use async_trait::async_trait;

use crate::http::{Request, Response};
use crate::pipeline::{BoxError, Middleware, Next};

const HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("cache-control", "no-store"),
];

/// Adds defensive response headers on the way out.
#[derive(Debug, Default)]
pub struct SecurityHeaders;

#[async_trait]
impl Middleware for SecurityHeaders {
    async fn handle(&self, req: Request, next: Next<'_>) -> Result<Response, BoxError> {
        let mut resp = next.run(req).await?;
        for (name, value) in HEADERS {
            if resp.header(name).is_none() {
                resp.set_header(name, value);
            }
        }
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::routing::Router;
    use axum::http::{Method, StatusCode};
    use std::sync::Arc;

    #[tokio::test]
    async fn headers_are_stamped_even_on_404() {
        let pipeline = Pipeline::builder()
            .with(SecurityHeaders)
            .build(Arc::new(Router::new()));

        let resp = pipeline.handle(Request::new(Method::GET, "/nope")).await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(resp.header("x-frame-options"), Some("DENY"));
    }
}

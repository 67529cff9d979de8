//! Cross-origin resource sharing middleware.
//!
//! # Responsibilities
//! - Answer preflight `OPTIONS` requests without invoking the rest of the
//!   chain
//! - Stamp CORS response headers for allowed origins, including on
//!   short-circuited responses
//!
//! # Design Decisions
//! - An origin outside the allow list still reaches the handler; it just
//!   receives no CORS headers and the browser enforces the block
//! - Must run before authentication: preflights carry no credentials

use async_trait::async_trait;
use axum::http::StatusCode;

use crate::http::{Request, Response};
use crate::pipeline::{BoxError, Middleware, Next};

const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS,PATCH";
const ALLOWED_HEADERS: &str = "authorization,content-type,x-request-id";
const MAX_AGE_SECS: &str = "3600";

/// Handles preflights and stamps CORS headers for allowed origins.
pub struct Cors {
    allowed_origins: Vec<String>,
    allow_credentials: bool,
}

impl Cors {
    pub fn new(allowed_origins: Vec<String>, allow_credentials: bool) -> Self {
        Self {
            allowed_origins,
            allow_credentials,
        }
    }

    /// Allow every origin, without credentials.
    pub fn allow_any() -> Self {
        Self::new(vec!["*".to_string()], false)
    }

    fn wildcard(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    /// The `access-control-allow-origin` value for this request: `*` under a
    /// wildcard policy, the echoed origin when listed, nothing otherwise.
    fn allow_origin(&self, origin: Option<&str>) -> Option<String> {
        if self.wildcard() {
            return Some("*".to_string());
        }
        origin
            .filter(|o| self.allowed_origins.iter().any(|allowed| allowed == o))
            .map(str::to_string)
    }

    fn stamp(&self, resp: &mut Response, allow_origin: &str) {
        resp.set_header("access-control-allow-origin", allow_origin);
        resp.set_header("access-control-allow-methods", ALLOWED_METHODS);
        resp.set_header("access-control-allow-headers", ALLOWED_HEADERS);
        resp.set_header("access-control-max-age", MAX_AGE_SECS);
        if self.allow_credentials {
            resp.set_header("access-control-allow-credentials", "true");
        }
    }
}

#[async_trait]
impl Middleware for Cors {
    async fn handle(&self, req: Request, next: Next<'_>) -> Result<Response, BoxError> {
        let allow_origin = self.allow_origin(req.header("origin"));

        // Preflight: answer here, the rest of the chain never runs.
        if req.method == axum::http::Method::OPTIONS {
            let mut resp = Response::new(StatusCode::OK);
            if let Some(origin) = &allow_origin {
                self.stamp(&mut resp, origin);
            }
            return Ok(resp);
        }

        let mut resp = next.run(req).await?;
        if let Some(origin) = &allow_origin {
            self.stamp(&mut resp, origin);
        }
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::routing::{handler, Router};
    use axum::http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn pipeline_with(cors: Cors, hits: Arc<AtomicUsize>) -> Pipeline {
        let mut router = Router::new();
        router.add_route(
            Method::GET,
            "/data",
            handler(move |_req| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok(Response::text(StatusCode::OK, "data"))
                }
            }),
        );
        Pipeline::builder().with(cors).build(Arc::new(router))
    }

    #[tokio::test]
    async fn preflight_short_circuits_before_the_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let p = pipeline_with(Cors::allow_any(), hits.clone());

        let req = Request::new(Method::OPTIONS, "/data").with_header("origin", "https://app.example");
        let resp = p.handle(req).await;

        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
        assert_eq!(
            resp.header("access-control-allow-methods"),
            Some(ALLOWED_METHODS)
        );
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn listed_origin_is_echoed_back() {
        let hits = Arc::new(AtomicUsize::new(0));
        let p = pipeline_with(
            Cors::new(vec!["https://app.example".to_string()], true),
            hits.clone(),
        );

        let req = Request::new(Method::GET, "/data").with_header("origin", "https://app.example");
        let resp = p.handle(req).await;

        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(
            resp.header("access-control-allow-origin"),
            Some("https://app.example")
        );
        assert_eq!(resp.header("access-control-allow-credentials"), Some("true"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unlisted_origin_still_reaches_the_handler_without_cors_headers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let p = pipeline_with(
            Cors::new(vec!["https://app.example".to_string()], false),
            hits.clone(),
        );

        let req = Request::new(Method::GET, "/data").with_header("origin", "https://evil.example");
        let resp = p.handle(req).await;

        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.header("access-control-allow-origin").is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn short_circuited_responses_are_stamped_too() {
        // 404 from the terminal node is still a short circuit of the handler.
        let p = pipeline_with(Cors::allow_any(), Arc::new(AtomicUsize::new(0)));
        let req = Request::new(Method::GET, "/missing").with_header("origin", "https://app.example");
        let resp = p.handle(req).await;

        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
    }
}

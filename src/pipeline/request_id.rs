//! Request id middleware.
//!
//! # Responsibilities
//! - Reuse an inbound `x-request-id` (from a load balancer) or generate one
//! - Attach the id as a request extension and a response header
//! - Log errors escaping the inner chain under this id and convert them to a
//!   generic 500 that still carries the id header
//!
//! # Design Decisions
//! - Must be the first middleware: everything downstream logs with this id
//! - Handles the error-to-500 conversion itself so the client and the error
//!   log share an id; `Pipeline::handle` remains the fallback boundary for
//!   chains without it

use async_trait::async_trait;
use uuid::Uuid;

use crate::http::{Request, RequestId, Response};
use crate::pipeline::{BoxError, Middleware, Next};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Establishes request identity for the rest of the chain.
#[derive(Debug, Default)]
pub struct RequestIdMiddleware;

#[async_trait]
impl Middleware for RequestIdMiddleware {
    async fn handle(&self, mut req: Request, next: Next<'_>) -> Result<Response, BoxError> {
        let id = match req.header(X_REQUEST_ID) {
            Some(existing) if !existing.is_empty() => existing.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        req.extensions.insert(RequestId(id.clone()));

        let mut resp = match next.run(req).await {
            Ok(resp) => resp,
            Err(err) => {
                tracing::error!(
                    request_id = %id,
                    error = %err,
                    "unhandled error in request pipeline"
                );
                Response::internal_error()
            }
        };
        resp.set_header(X_REQUEST_ID, &id);
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use crate::pipeline::Pipeline;
    use crate::routing::{handler, Router};
    use axum::http::{Method, StatusCode};
    use std::sync::Arc;

    fn echo_id_router() -> Arc<Router> {
        let mut router = Router::new();
        router.add_route(
            Method::GET,
            "/id",
            handler(|req| async move {
                let id = req.request_id().unwrap_or("missing").to_string();
                Ok(Response::text(StatusCode::OK, &id))
            }),
        );
        Arc::new(router)
    }

    #[tokio::test]
    async fn generates_an_id_and_echoes_it_in_the_response() {
        let pipeline = Pipeline::builder()
            .with(RequestIdMiddleware)
            .build(echo_id_router());

        let resp = pipeline.handle(Request::new(Method::GET, "/id")).await;
        let body = String::from_utf8(resp.body.to_vec()).unwrap();
        assert_ne!(body, "missing");
        assert_eq!(resp.header(X_REQUEST_ID), Some(body.as_str()));
    }

    #[tokio::test]
    async fn escaped_errors_become_a_500_that_carries_the_id() {
        let mut router = Router::new();
        router.add_route(
            Method::GET,
            "/fail",
            handler(|_req| async {
                Err::<Response, crate::pipeline::BoxError>("connection reset by pool".into())
            }),
        );
        let pipeline = Pipeline::builder()
            .with(RequestIdMiddleware)
            .build(Arc::new(router));

        let req = Request::new(Method::GET, "/fail").with_header(X_REQUEST_ID, "boom-1");
        let resp = pipeline.handle(req).await;

        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.header(X_REQUEST_ID), Some("boom-1"));
        let body = String::from_utf8(resp.body.to_vec()).unwrap();
        assert!(!body.contains("connection reset"), "internal detail leaked: {body}");
    }

    #[tokio::test]
    async fn reuses_an_inbound_id() {
        let pipeline = Pipeline::builder()
            .with(RequestIdMiddleware)
            .build(echo_id_router());

        let req = Request::new(Method::GET, "/id").with_header(X_REQUEST_ID, "lb-7");
        let resp = pipeline.handle(req).await;
        assert_eq!(String::from_utf8(resp.body.to_vec()).unwrap(), "lb-7");
    }
}

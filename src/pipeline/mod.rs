//! Request pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! transport → Pipeline::handle(request)
//!     → middleware 1 (before) → middleware 2 (before) → ...
//!     → terminal node: Router::find → handler(request)
//!     → ... (after) ← middleware 2 (after) ← middleware 1 (after)
//!     → Response back to transport
//!
//! Any middleware may short-circuit by returning a response without calling
//! next; outer middleware that wrapped the call still run their after logic.
//! ```
//!
//! # Design Decisions
//! - Registration order is execution order and a correctness requirement:
//!   request id → access log → security headers → cors → body limit →
//!   rate limit → authentication → handlers
//! - The chain is fixed at startup and immutable while serving
//! - `Pipeline::handle` is the outermost error boundary: escaped errors are
//!   logged in full and turned into a generic 500 with no internal detail

pub mod access_log;
pub mod auth;
pub mod cors;
pub mod headers;
pub mod limits;
pub mod rate_limit;
pub mod request_id;

pub use access_log::AccessLog;
pub use auth::{Authenticator, BearerAuth, Principal};
pub use cors::Cors;
pub use headers::SecurityHeaders;
pub use limits::BodyLimit;
pub use rate_limit::RateLimit;
pub use request_id::RequestIdMiddleware;

use std::sync::Arc;

use async_trait::async_trait;

use crate::http::{Request, Response};
use crate::routing::Router;

/// Error type at the pipeline seam. Middleware and handlers propagate
/// whatever they like; the boundary decides what the client sees.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A pipeline stage wrapping the remainder of request processing.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Inspect or mutate the request, then either delegate via
    /// `next.run(req)` (and optionally act on the returned response) or
    /// short-circuit by returning a response directly.
    async fn handle(&self, req: Request, next: Next<'_>) -> Result<Response, BoxError>;
}

/// The remainder of the chain, ending in router dispatch.
pub struct Next<'a> {
    stack: &'a [Arc<dyn Middleware>],
    router: &'a Router,
}

impl Next<'_> {
    /// Run the rest of the chain. The empty tail is the terminal node: route
    /// lookup and handler invocation. A missing route is a client-visible
    /// 404, not an error.
    pub async fn run(mut self, mut req: Request) -> Result<Response, BoxError> {
        if let Some((head, rest)) = self.stack.split_first() {
            self.stack = rest;
            return head.handle(req, self).await;
        }

        match self.router.find(&req.method, &req.path) {
            Some(matched) => {
                req.path_params = matched.params;
                (matched.handler)(req).await
            }
            None => {
                tracing::debug!(method = %req.method, path = %req.path, "no route matched");
                Ok(Response::not_found())
            }
        }
    }
}

/// Ordered middleware chain terminating in router dispatch.
pub struct Pipeline {
    stack: Vec<Arc<dyn Middleware>>,
    router: Arc<Router>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder { stack: Vec::new() }
    }

    /// Entry point for the transport. Never fails: errors escaping the chain
    /// are logged with full detail and converted to a generic 500.
    pub async fn handle(&self, req: Request) -> Response {
        let request_id = req.request_id().map(str::to_string);
        let next = Next {
            stack: &self.stack,
            router: &self.router,
        };
        match next.run(req).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(
                    request_id = request_id.as_deref().unwrap_or("-"),
                    error = %err,
                    "unhandled error in request pipeline"
                );
                Response::internal_error()
            }
        }
    }
}

/// Append-only builder; the chain is sealed before serving begins.
pub struct PipelineBuilder {
    stack: Vec<Arc<dyn Middleware>>,
}

impl PipelineBuilder {
    /// Append a middleware. Registration order is execution order.
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.stack.push(Arc::new(middleware));
        self
    }

    pub fn build(self, router: Arc<Router>) -> Pipeline {
        Pipeline {
            stack: self.stack,
            router,
        }
    }
}

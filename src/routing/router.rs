//! Route table lookup and dispatch.
//!
//! # Responsibilities
//! - Store registered routes in registration order
//! - Look up a handler for (method, path), preferring exact literal matches
//! - Return the matched handler plus extracted path parameters
//!
//! # Design Decisions
//! - Immutable after startup registration (shared via `Arc`, no locks)
//! - Exact literal lookup is O(1); template scan is O(routes) in
//!   registration order, first match wins
//! - Duplicate (method, template) registration replaces the handler in
//!   place: last registration wins, original matching position retained
//! - Explicit `None` on no match rather than a silent default

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;
use futures_util::future::BoxFuture;

use crate::http::{Request, Response};
use crate::pipeline::BoxError;
use crate::routing::matcher::{PathParams, PathTemplate};

/// A registered request handler.
pub type Handler =
    Arc<dyn Fn(Request) -> BoxFuture<'static, Result<Response, BoxError>> + Send + Sync>;

/// Adapt an async function or closure into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Response, BoxError>> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

struct Route {
    method: Method,
    template: PathTemplate,
    handler: Handler,
}

/// Successful lookup: the handler to invoke and the parameters extracted
/// from the path.
pub struct RouteMatch {
    pub handler: Handler,
    pub params: PathParams,
}

/// Maps (method, path template) to handlers.
#[derive(Default)]
pub struct Router {
    /// O(1) lookup for literal templates, keyed by (method, exact path).
    exact: HashMap<(Method, String), Handler>,
    /// All routes in registration order, scanned for template matches.
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. A duplicate (method, exact template text) silently
    /// replaces the prior handler.
    pub fn add_route(&mut self, method: Method, template: &str, handler: Handler) {
        let template = PathTemplate::parse(template);
        if !template.has_params() {
            self.exact
                .insert((method.clone(), template.raw().to_string()), handler.clone());
        }

        if let Some(existing) = self
            .routes
            .iter_mut()
            .find(|r| r.method == method && r.template.raw() == template.raw())
        {
            tracing::debug!(
                method = %method,
                template = template.raw(),
                "route re-registered, replacing handler"
            );
            existing.handler = handler;
            return;
        }

        self.routes.push(Route {
            method,
            template,
            handler,
        });
    }

    /// Look up a handler for the request line. Exact literal matches win over
    /// templates; among templates, registration order decides.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        if let Some(handler) = self.exact.get(&(method.clone(), path.to_string())) {
            return Some(RouteMatch {
                handler: handler.clone(),
                params: PathParams::default(),
            });
        }

        for route in &self.routes {
            if route.method != *method {
                continue;
            }
            if let Some(params) = route.template.matches(path) {
                return Some(RouteMatch {
                    handler: route.handler.clone(),
                    params,
                });
            }
        }
        None
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn tagged(tag: &'static str) -> Handler {
        handler(move |_req| async move { Ok(Response::text(StatusCode::OK, tag)) })
    }

    async fn invoke(m: &RouteMatch) -> String {
        let req = Request::new(Method::GET, "/");
        let resp = (m.handler)(req).await.unwrap();
        String::from_utf8(resp.body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn exact_literal_wins_over_template() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/a/{x}/b", tagged("template"));
        router.add_route(Method::GET, "/a/42/b", tagged("literal"));

        let m = router.find(&Method::GET, "/a/42/b").unwrap();
        assert_eq!(invoke(&m).await, "literal");
        assert!(m.params.is_empty());

        let m = router.find(&Method::GET, "/a/7/b").unwrap();
        assert_eq!(invoke(&m).await, "template");
        assert_eq!(m.params.get("x"), Some("7"));
    }

    #[tokio::test]
    async fn first_registered_template_wins() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/v/{a}", tagged("first"));
        router.add_route(Method::GET, "/v/{b}", tagged("second"));

        let m = router.find(&Method::GET, "/v/1").unwrap();
        assert_eq!(invoke(&m).await, "first");
    }

    #[tokio::test]
    async fn duplicate_registration_replaces_handler_in_place() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/users/{id}", tagged("old"));
        router.add_route(Method::GET, "/other/{id}", tagged("other"));
        router.add_route(Method::GET, "/users/{id}", tagged("new"));

        assert_eq!(router.len(), 2);
        let m = router.find(&Method::GET, "/users/9").unwrap();
        assert_eq!(invoke(&m).await, "new");
    }

    #[test]
    fn method_must_match() {
        let mut router = Router::new();
        router.add_route(Method::POST, "/users", tagged("create"));

        assert!(router.find(&Method::GET, "/users").is_none());
        assert!(router.find(&Method::POST, "/users").is_some());
    }

    #[test]
    fn no_match_is_explicit() {
        let router = Router::new();
        assert!(router.find(&Method::GET, "/missing").is_none());
    }
}

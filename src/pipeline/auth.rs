//! Bearer authentication middleware.
//!
//! # Responsibilities
//! - Extract and validate the `Authorization: Bearer` credential
//! - Attach the authenticated principal for downstream authorization checks
//! - Short-circuit unauthenticated requests with 401
//!
//! # Design Decisions
//! - Token validation lives behind the `Authenticator` trait; the concrete
//!   implementation (JWT, opaque tokens) is a collaborator resolved from the
//!   registry, not part of this core
//! - Public path prefixes bypass authentication entirely
//! - Must run after request id and rate limiting, before business handlers

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, StatusCode};

use crate::http::{Request, Response};
use crate::pipeline::{BoxError, Middleware, Next};

/// Validates a bearer credential. Implementations are registered as beans.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Option<Principal>;
}

/// Identity attached to authenticated requests.
#[derive(Debug, Clone)]
pub struct Principal {
    pub subject: String,
    pub roles: Vec<String>,
}

/// Enforces bearer authentication outside the public path prefixes.
pub struct BearerAuth {
    authenticator: Arc<dyn Authenticator>,
    public_prefixes: Vec<String>,
}

impl BearerAuth {
    pub fn new(authenticator: Arc<dyn Authenticator>, public_prefixes: Vec<String>) -> Self {
        Self {
            authenticator,
            public_prefixes,
        }
    }

    fn is_public(&self, path: &str) -> bool {
        self.public_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn unauthorized() -> Response {
        let mut resp = Response::json(
            StatusCode::UNAUTHORIZED,
            &serde_json::json!({"error": "Unauthorized"}),
        );
        resp.set_header("www-authenticate", "Bearer");
        resp
    }
}

#[async_trait]
impl Middleware for BearerAuth {
    async fn handle(&self, mut req: Request, next: Next<'_>) -> Result<Response, BoxError> {
        if self.is_public(&req.path) {
            return next.run(req).await;
        }

        let token = req
            .header(header::AUTHORIZATION.as_str())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);

        let Some(token) = token else {
            tracing::debug!(path = %req.path, "missing bearer credential");
            return Ok(Self::unauthorized());
        };

        match self.authenticator.authenticate(&token) {
            Some(principal) => {
                req.extensions.insert(principal);
                next.run(req).await
            }
            None => {
                tracing::debug!(path = %req.path, "bearer credential rejected");
                Ok(Self::unauthorized())
            }
        }
    }
}

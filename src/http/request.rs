//! The request value handed into the pipeline.
//!
//! # Responsibilities
//! - Carry everything the transport extracted: method, path, headers, query,
//!   body
//! - Hold per-request state produced inside the chain: path parameters and
//!   typed extensions (request id, authenticated principal, peer address)
//!
//! # Design Decisions
//! - Owned value, moved through the chain; middleware may mutate freely
//! - Path is kept raw (trailing slash preserved, no normalization)
//! - Extensions are a small typemap so middleware can attach context without
//!   the core knowing the types

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::net::SocketAddr;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};

use crate::routing::PathParams;

/// Typed per-request state attached by middleware.
#[derive(Default)]
pub struct Extensions(HashMap<TypeId, Box<dyn Any + Send + Sync>>);

impl Extensions {
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.0.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.0
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }
}

/// Peer address of the inbound connection, attached by the transport.
#[derive(Debug, Clone, Copy)]
pub struct PeerAddr(pub SocketAddr);

/// Unique id for this request, attached by the request-id middleware.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// An inbound request at the pipeline boundary.
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub query: HashMap<String, String>,
    pub body: Bytes,
    /// Filled by the terminal dispatch node once a route matches.
    pub path_params: PathParams,
    pub extensions: Extensions,
}

impl Request {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            query: HashMap::new(),
            body: Bytes::new(),
            path_params: PathParams::default(),
            extensions: Extensions::default(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The request id attached by the request-id middleware, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.extensions.get::<RequestId>().map(|id| id.0.as_str())
    }
}

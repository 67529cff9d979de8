//! The response value produced by handlers and middleware.
//!
//! # Responsibilities
//! - Carry status, headers, and body back to the transport
//! - Provide the small set of constructors the runtime itself needs
//!
//! # Design Decisions
//! - Error bodies are a fixed `{"error": ...}` shape with no internal detail;
//!   full detail goes to the logs, never to the client

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;

/// An outbound response at the pipeline boundary.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Plain-text response.
    pub fn text(status: StatusCode, body: &str) -> Self {
        let mut resp = Self::new(status);
        resp.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        resp.body = Bytes::from(body.to_string());
        resp
    }

    /// JSON response. Serialization failure degrades to a generic 500; the
    /// cause is logged.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                let mut resp = Self::new(status);
                resp.headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                resp.body = Bytes::from(bytes);
                resp
            }
            Err(err) => {
                tracing::error!(error = %err, "response body serialization failed");
                Self::internal_error()
            }
        }
    }

    /// Client-visible not-found response.
    pub fn not_found() -> Self {
        Self::json(
            StatusCode::NOT_FOUND,
            &serde_json::json!({"error": "Not Found"}),
        )
    }

    /// Generic failure response; leaks nothing about the cause.
    pub fn internal_error() -> Self {
        let mut resp = Self::new(StatusCode::INTERNAL_SERVER_ERROR);
        resp.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        resp.body = Bytes::from_static(br#"{"error":"Internal Server Error"}"#);
        resp
    }

    /// Set a header, replacing any existing value. Invalid values are
    /// dropped.
    pub fn set_header(&mut self, name: &'static str, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

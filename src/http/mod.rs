//! HTTP boundary types and the transport adapter.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum catch-all, body buffering, peer address)
//!     → Request (owned, transport-neutral)
//!     → pipeline
//!     → Response
//!     → server.rs (back to the wire)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Extensions, PeerAddr, Request, RequestId};
pub use response::Response;
pub use server::HttpServer;

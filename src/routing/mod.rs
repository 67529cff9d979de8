//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! startup:
//!     add_route(method, "/users/{id}", handler)
//!         → matcher.rs (template parsed into segments)
//!         → router.rs (exact index + ordered route list)
//!
//! per request (from the pipeline's terminal node):
//!     find(method, path)
//!         → exact literal hit, or
//!         → template scan in registration order
//!         → RouteMatch { handler, params } | None (→ 404)
//! ```
//!
//! # Design Decisions
//! - Route table is fixed at startup and shared immutably
//! - Exact-vs-template preference is the only specificity rule; templates
//!   compete in registration order

pub mod matcher;
pub mod router;

pub use matcher::{PathParams, PathTemplate, Segment};
pub use router::{handler, Handler, RouteMatch, Router};

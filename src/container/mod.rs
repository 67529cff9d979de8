//! Dependency container subsystem.
//!
//! # Data Flow
//! ```text
//! startup:
//!     register_singleton / register (Bean<T> recipes)
//!         → definition list (registration order preserved)
//!     verify() → declared-graph cycle check
//!
//! per request:
//!     handler → registry.resolve::<T>()
//!         → instance cache hit, or
//!         → factory runs (Resolver tracks the live path)
//!         → singleton cached, per-request returned fresh
//! ```
//!
//! # Design Decisions
//! - Explicit factories instead of runtime constructor discovery
//! - Resolution is lock-free for cache hits; construction happens outside
//!   any lock and the first cached instance wins a race
//! - Cycles fail with the full chain, both at startup (declared edges) and
//!   at resolution time (actual edges)

pub mod definition;
pub mod registry;
pub mod resolver;

pub use definition::{Bean, Scope};
pub use registry::Registry;
pub use resolver::Resolver;

use thiserror::Error;

/// Why a resolution failed. Fatal to the requesting operation, never to the
/// process or to resolutions of unrelated types.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No instance, no definition, and no interface binding for the type.
    #[error("no provider registered for `{type_name}`")]
    Resolution { type_name: &'static str },

    /// A factory failed while building the type; wraps the cause.
    #[error("constructing `{type_name}`")]
    Construction {
        type_name: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Resolution re-entered a type already being resolved.
    #[error("cyclic dependency: {chain}")]
    Cycle { chain: String },
}

impl ResolveError {
    /// Wrap a factory failure for bean type `T`.
    pub fn construction<T>(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        ResolveError::Construction {
            type_name: std::any::type_name::<T>(),
            source: Box::new(source),
        }
    }
}

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit structured log events (tracing)
//!     → logging.rs installs the subscriber once at startup
//!
//! access-log middleware records request outcomes
//!     → metrics.rs (explicit collector, atomic counters)
//!     → snapshot exposed by whatever handler the application registers
//! ```
//!
//! # Design Decisions
//! - The metrics collector is an injected dependency, resolved from the
//!   registry, never a process-wide static
//! - Request ids flow through log events via explicit fields

pub mod logging;
pub mod metrics;

pub use metrics::{MetricsCollector, MetricsSnapshot};

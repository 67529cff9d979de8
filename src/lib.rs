//! Chassis: an embeddable HTTP application runtime.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────┐
//!                      │                    CHASSIS                     │
//!                      │                                                │
//!   Client Request     │  ┌─────────┐   ┌──────────────────────────┐   │
//!   ──────────────────▶│  │  http   │──▶│        pipeline          │   │
//!                      │  │ server  │   │ request id → access log  │   │
//!                      │  └─────────┘   │ → headers → limits       │   │
//!                      │                │ → rate limit → auth      │   │
//!                      │                └───────────┬──────────────┘   │
//!                      │                            ▼                  │
//!                      │                    ┌──────────────┐           │
//!                      │                    │   routing    │           │
//!                      │                    │ exact + {x}  │           │
//!                      │                    └──────┬───────┘           │
//!                      │                           ▼                   │
//!   Client Response    │  ┌─────────┐       ┌──────────────┐          │
//!   ◀──────────────────┼──│response │◀──────│   handlers   │          │
//!                      │  └─────────┘       └──────┬───────┘          │
//!                      │                           │                   │
//!                      │  ┌────────────────────────▼─────────────────┐ │
//!                      │  │          Cross-Cutting Concerns          │ │
//!                      │  │ ┌─────────┐ ┌───────────┐ ┌────────────┐ │ │
//!                      │  │ │ config  │ │ container │ │     tx     │ │ │
//!                      │  │ │         │ │  (beans)  │ │  (scopes)  │ │ │
//!                      │  │ └─────────┘ └───────────┘ └────────────┘ │ │
//!                      │  │ ┌───────────────────────────────────────┐ │ │
//!                      │  │ │      observability (logs, metrics)    │ │ │
//!                      │  │ └───────────────────────────────────────┘ │ │
//!                      │  └──────────────────────────────────────────┘ │
//!                      └────────────────────────────────────────────────┘
//! ```
//!
//! Applications register their services as beans in the [`container`],
//! declare routes on the [`routing::Router`], compose a
//! [`pipeline::Pipeline`] of middleware, and hand the result to
//! [`http::HttpServer`]. Transactional work goes through
//! [`tx::TransactionScope`] with explicitly passed contexts.

// Core subsystems
pub mod container;
pub mod http;
pub mod pipeline;
pub mod routing;
pub mod tx;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::RuntimeConfig;
pub use container::Registry;
pub use http::HttpServer;
pub use pipeline::Pipeline;
pub use routing::Router;

//! Transactional resource abstraction.
//!
//! # Responsibilities
//! - Define how a resource handle is acquired, committed, and rolled back
//! - Keep the concrete resource (a database connection, a unit of work) out
//!   of the core
//!
//! # Design Decisions
//! - `commit`/`rollback` borrow the handle; releasing it back to its pool is
//!   the handle's own drop behavior, so release happens on every exit path

use async_trait::async_trait;
use thiserror::Error;

/// Provider of transactional resource handles. Implementations wrap a
/// connection pool or an in-memory store; the scope never looks inside the
/// handle.
#[async_trait]
pub trait TxDriver: Send + Sync + 'static {
    /// The resource shared by every operation inside one transaction.
    type Handle: Send + Sync + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Acquire a handle with a transaction already begun on it.
    async fn acquire(&self) -> Result<Self::Handle, Self::Error>;

    async fn commit(&self, handle: &Self::Handle) -> Result<(), Self::Error>;

    async fn rollback(&self, handle: &Self::Handle) -> Result<(), Self::Error>;
}

/// Why a transactional operation failed.
#[derive(Debug, Error)]
pub enum TxError<E> {
    /// Acquiring the resource handle failed; the operation never ran.
    #[error("acquiring transaction handle")]
    Resource(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The operation succeeded but the commit did not.
    #[error("transaction commit failed")]
    Commit(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The operation failed; rollback was attempted and the original error
    /// is preserved here regardless of the rollback outcome.
    #[error("transaction aborted: {0}")]
    Aborted(E),
}

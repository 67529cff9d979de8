//! Transactional execution: explicit context, one boundary per call stack.
//!
//! # Responsibilities
//! - Acquire, commit, and roll back resource handles through [`TxDriver`]
//! - Share one handle across nested transactional entries
//!
//! # Data Flow
//! Handler -> `TransactionScope::run_in_transaction(None, ..)` acquires a
//! handle and builds a [`TxContext`] -> the operation (and anything it calls
//! with `Some(ctx)`) works against that handle -> the outermost entry commits
//! or rolls back and the handle drops.

pub mod driver;
pub mod scope;

pub use driver::{TxDriver, TxError};
pub use scope::{TransactionScope, TxContext};

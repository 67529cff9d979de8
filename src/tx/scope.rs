//! Transaction scope: one handle, one commit boundary per logical call.
//!
//! # Responsibilities
//! - Acquire a handle on the outermost entry and share it with nested entries
//! - Commit exactly once on success, roll back exactly once on failure
//! - Keep concurrent logical calls fully isolated from each other
//!
//! # Design Decisions
//! - The context is passed explicitly; there is no thread-local or task-local
//!   ambient state, so cross-task propagation is just passing the value
//! - Nested entries receive a child context (depth + 1) over the same handle
//!   and never own the commit/rollback boundary
//! - A rollback failure is logged and never masks the operation's own error

use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::driver::{TxDriver, TxError};

/// Per-logical-call transaction state: the shared resource handle and the
/// reentrancy depth. Created by the outermost [`TransactionScope::run_in_transaction`]
/// and passed explicitly to everything that needs the handle.
pub struct TxContext<H> {
    handle: Arc<H>,
    depth: usize,
}

impl<H> TxContext<H> {
    /// The resource handle established by the outermost entry.
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Reentrancy depth: 1 for the outermost entry.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn enter(&self) -> TxContext<H> {
        TxContext {
            handle: self.handle.clone(),
            depth: self.depth + 1,
        }
    }
}

/// Runs operations with exactly one commit/rollback boundary per logical
/// call stack.
pub struct TransactionScope<D: TxDriver> {
    driver: Arc<D>,
}

impl<D: TxDriver> TransactionScope<D> {
    pub fn new(driver: Arc<D>) -> Self {
        Self { driver }
    }

    /// Run `op` transactionally.
    ///
    /// With `current == None` this is the outermost entry: a handle is
    /// acquired, the operation runs against it, and success commits while
    /// failure rolls back — then the original error is re-raised. With
    /// `Some(ctx)` the operation joins the enclosing transaction: it runs
    /// with a child context over the same handle and the outer call owns the
    /// boundary.
    pub async fn run_in_transaction<T, E, F>(
        &self,
        current: Option<&TxContext<D::Handle>>,
        op: F,
    ) -> Result<T, TxError<E>>
    where
        F: for<'c> FnOnce(&'c TxContext<D::Handle>) -> BoxFuture<'c, Result<T, E>>,
        E: std::fmt::Display,
    {
        if let Some(ctx) = current {
            let nested = ctx.enter();
            return op(&nested).await.map_err(TxError::Aborted);
        }

        let handle = self
            .driver
            .acquire()
            .await
            .map_err(|e| TxError::Resource(Box::new(e)))?;
        let ctx = TxContext {
            handle: Arc::new(handle),
            depth: 1,
        };

        match op(&ctx).await {
            Ok(value) => {
                self.driver
                    .commit(ctx.handle())
                    .await
                    .map_err(|e| TxError::Commit(Box::new(e)))?;
                tracing::debug!("transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.driver.rollback(ctx.handle()).await {
                    // Never masks the operation's own failure.
                    tracing::error!(
                        error = %rollback_err,
                        cause = %err,
                        "rollback failed after operation error"
                    );
                } else {
                    tracing::warn!(cause = %err, "transaction rolled back");
                }
                Err(TxError::Aborted(err))
            }
        }
        // ctx drops here on every path, releasing the handle.
    }
}

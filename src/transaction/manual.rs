use super::{MultiTransactionManager, TxOptions, TxScope};
use crate::core::Result;
use std::sync::Arc;

/// Imperative boundary control for callers outside declarative wrapping.
///
/// One `begin`/`commit`-or-`rollback`/`close` cycle is equivalent to one
/// [`Transactional`](super::Transactional) cycle with a default descriptor.
pub struct ManualTransaction {
    manager: Arc<MultiTransactionManager>,
    options: TxOptions,
}

impl ManualTransaction {
    pub fn new(manager: Arc<MultiTransactionManager>) -> Self {
        Self {
            manager,
            options: TxOptions::new(),
        }
    }

    /// Install a default boundary descriptor; inherited if one is active.
    pub fn begin(&self, scope: &TxScope) {
        self.manager.start_boundary(scope, self.options.clone());
    }

    /// Commit every resource touched in this scope.
    pub fn commit(&self, scope: &TxScope) -> Result<()> {
        self.manager.commit_all(scope, false)
    }

    /// Roll back every resource touched in this scope.
    pub fn rollback(&self, scope: &TxScope) -> Result<()> {
        self.manager.rollback_all(scope, false)
    }

    /// Close every touched session and end the boundary.
    pub fn close(&self, scope: &TxScope) -> Result<()> {
        self.manager.close_all(scope)
    }
}

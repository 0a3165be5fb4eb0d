// ============================================================================
// Transaction Coordinator
// ============================================================================

use super::{TxOptions, TxScope};
use crate::core::{ResourceFailure, Result, TxError};
use crate::session::SessionManager;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info};

/// Process-wide registry of resources plus the begin/commit/rollback/close
/// orchestration across them.
///
/// Resources are registered during setup; the registry seals on the first
/// boundary (or an explicit [`seal`](Self::seal)) and is read-only
/// thereafter, so boundary execution never contends on it.
///
/// The commit/rollback/close sweeps are best-effort and **not atomic**: each
/// resource is attempted independently, failures are collected, and a
/// failure on one resource never prevents the attempt on the next. A commit
/// that fails mid-sweep leaves earlier resources committed.
pub struct MultiTransactionManager {
    managers: RwLock<HashMap<String, Arc<SessionManager>>>,
    sealed: AtomicBool,
}

impl Default for MultiTransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiTransactionManager {
    pub fn new() -> Self {
        Self {
            managers: RwLock::new(HashMap::new()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Register a resource. Setup-time only: fails once the registry is
    /// sealed, and on a duplicate identifier.
    pub fn register(
        &self,
        resource_id: impl Into<String>,
        manager: Arc<SessionManager>,
    ) -> Result<()> {
        if self.is_sealed() {
            return Err(TxError::RegistrySealed);
        }
        let resource_id = resource_id.into();
        let mut managers = self.managers.write()?;
        if managers.contains_key(&resource_id) {
            return Err(TxError::DuplicateResource(resource_id));
        }
        info!(resource = %resource_id, "registered session manager");
        managers.insert(resource_id, manager);
        Ok(())
    }

    /// One-time transition to the read-only state. Also happens implicitly
    /// when the first boundary starts.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Mint a fresh execution-scoped context handle.
    pub fn scope(&self) -> TxScope {
        TxScope::new()
    }

    /// Install the boundary descriptor unless the scope already carries one;
    /// an inherited boundary keeps the original descriptor and the nested
    /// one is discarded.
    pub fn start_boundary(&self, scope: &TxScope, options: TxOptions) {
        self.seal();
        if !scope.install_boundary(options) {
            debug!("boundary already active, inheriting existing descriptor");
        }
    }

    pub fn is_within_boundary(&self, scope: &TxScope) -> bool {
        scope.in_boundary()
    }

    pub fn active_boundary(&self, scope: &TxScope) -> Option<TxOptions> {
        scope.boundary()
    }

    pub fn end_boundary(&self, scope: &TxScope) {
        scope.clear_boundary();
    }

    /// Commit every resource with a started session in this scope.
    /// Best-effort: failures are collected and reported together.
    pub fn commit_all(&self, scope: &TxScope, force: bool) -> Result<()> {
        let failures = self.sweep(scope, "committing", |manager| manager.commit(scope, force))?;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TxError::CommitFailed(failures))
        }
    }

    /// Roll back every resource with a started session in this scope.
    pub fn rollback_all(&self, scope: &TxScope, force: bool) -> Result<()> {
        let failures = self.sweep(scope, "rolling back", |manager| {
            manager.rollback(scope, force)
        })?;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TxError::RollbackFailed(failures))
        }
    }

    /// Close every started session, then clear the scope's boundary slot.
    /// The slot is cleared even when some closes failed.
    pub fn close_all(&self, scope: &TxScope) -> Result<()> {
        let sweep_result = self.sweep(scope, "closing", |manager| manager.close(scope));

        // The boundary slot must not outlive the sweep, whatever its outcome.
        self.end_boundary(scope);

        let failures = sweep_result?;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TxError::CloseFailed(failures))
        }
    }

    /// Apply `op` to every registered resource whose manager reports a
    /// started session, continuing past individual failures. No cross-resource
    /// ordering is defined.
    fn sweep(
        &self,
        scope: &TxScope,
        action: &'static str,
        mut op: impl FnMut(&SessionManager) -> anyhow::Result<()>,
    ) -> Result<Vec<ResourceFailure>> {
        let managers = self.managers.read()?;
        let mut failures = Vec::new();
        for (resource_id, manager) in managers.iter() {
            if !manager.has_started_session(scope) {
                continue;
            }
            debug!(resource = %resource_id, "{} transaction", action);
            if let Err(err) = op(manager) {
                error!(resource = %resource_id, error = %err, "failed while {} transaction", action);
                failures.push(ResourceFailure {
                    resource: resource_id.clone(),
                    error: err,
                });
            }
        }
        Ok(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_seals_once() {
        let manager = MultiTransactionManager::new();
        assert!(!manager.is_sealed());

        manager.seal();
        assert!(manager.is_sealed());

        let err = manager
            .register("orders", dummy_manager("orders"))
            .unwrap_err();
        assert!(matches!(err, TxError::RegistrySealed));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let manager = MultiTransactionManager::new();
        manager
            .register("orders", dummy_manager("orders"))
            .unwrap();
        let err = manager
            .register("orders", dummy_manager("orders"))
            .unwrap_err();
        assert!(matches!(err, TxError::DuplicateResource(id) if id == "orders"));
    }

    #[test]
    fn starting_a_boundary_seals_the_registry() {
        let manager = MultiTransactionManager::new();
        let scope = manager.scope();
        manager.start_boundary(&scope, TxOptions::new());
        assert!(manager.is_sealed());
        assert!(manager.is_within_boundary(&scope));
    }

    fn dummy_manager(id: &str) -> Arc<SessionManager> {
        struct NoFactory;
        impl crate::session::SessionFactory for NoFactory {
            fn open_session(&self) -> anyhow::Result<Box<dyn crate::session::Session>> {
                anyhow::bail!("no sessions in this test")
            }
            fn open_session_with(
                &self,
                _isolation: super::super::IsolationLevel,
                _executor_type: super::super::ExecutorType,
            ) -> anyhow::Result<Box<dyn crate::session::Session>> {
                anyhow::bail!("no sessions in this test")
            }
        }
        Arc::new(SessionManager::new(id, Arc::new(NoFactory)))
    }
}

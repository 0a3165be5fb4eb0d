// ============================================================================
// Session Manager
// ============================================================================

use super::{Params, Session, SessionFactory, Value};
use crate::core::TxError;
use crate::transaction::{TxOptions, TxScope};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Per-resource session wrapper.
///
/// Lazily starts at most one physical session per [`TxScope`] and redirects
/// every data operation onto it. The manager itself holds no per-call state:
/// the started session lives in the scope, so the manager can be shared
/// freely across threads.
///
/// Outside a transactional boundary, data operations either run on a
/// throwaway auto-session (when [`allow_auto_transaction`] is set) or fail
/// with [`TxError::NoTransactionContext`].
///
/// [`allow_auto_transaction`]: SessionManager::allow_auto_transaction
pub struct SessionManager {
    resource_id: String,
    factory: Arc<dyn SessionFactory>,
    allow_auto_transaction: bool,
}

impl SessionManager {
    pub fn new(resource_id: impl Into<String>, factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            resource_id: resource_id.into(),
            factory,
            allow_auto_transaction: false,
        }
    }

    /// Permit data operations outside any boundary to run on a throwaway
    /// session that is committed or rolled back and closed within the call.
    pub fn allow_auto_transaction(mut self, allow: bool) -> Self {
        self.allow_auto_transaction = allow;
        self
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Start a managed session for this scope using the boundary's isolation
    /// level and executor mode. Idempotent: a scope that already holds a
    /// session for this resource is left untouched.
    pub fn start_session(&self, scope: &TxScope, options: &TxOptions) -> anyhow::Result<()> {
        if scope.has_session(&self.resource_id) {
            return Ok(());
        }

        debug!(
            resource = %self.resource_id,
            isolation = ?options.isolation,
            executor = ?options.executor_type,
            "starting managed session"
        );
        let session = self
            .factory
            .open_session_with(options.isolation, options.executor_type)?;
        scope.put_session(&self.resource_id, session);
        Ok(())
    }

    /// Whether this scope holds a started session for this resource.
    pub fn has_started_session(&self, scope: &TxScope) -> bool {
        scope.has_session(&self.resource_id)
    }

    // ------------------------------------------------------------------
    // Pass-through data operations (lazy start / auto-session fallback)
    // ------------------------------------------------------------------

    pub fn select_one(
        &self,
        scope: &TxScope,
        statement: &str,
        params: Params,
    ) -> anyhow::Result<Option<Value>> {
        self.forward(scope, |s| s.select_one(statement, params))
    }

    pub fn select_list(
        &self,
        scope: &TxScope,
        statement: &str,
        params: Params,
    ) -> anyhow::Result<Vec<Value>> {
        self.forward(scope, |s| s.select_list(statement, params))
    }

    pub fn select_map(
        &self,
        scope: &TxScope,
        statement: &str,
        params: Params,
        map_key: &str,
    ) -> anyhow::Result<HashMap<String, Value>> {
        self.forward(scope, |s| s.select_map(statement, params, map_key))
    }

    pub fn insert(&self, scope: &TxScope, statement: &str, params: Params) -> anyhow::Result<u64> {
        self.forward(scope, |s| s.insert(statement, params))
    }

    pub fn update(&self, scope: &TxScope, statement: &str, params: Params) -> anyhow::Result<u64> {
        self.forward(scope, |s| s.update(statement, params))
    }

    pub fn delete(&self, scope: &TxScope, statement: &str, params: Params) -> anyhow::Result<u64> {
        self.forward(scope, |s| s.delete(statement, params))
    }

    // ------------------------------------------------------------------
    // Guarded operations (require a started session)
    // ------------------------------------------------------------------

    pub fn commit(&self, scope: &TxScope, force: bool) -> anyhow::Result<()> {
        self.with_started(scope, "commit", |s| s.commit(force))
    }

    pub fn rollback(&self, scope: &TxScope, force: bool) -> anyhow::Result<()> {
        self.with_started(scope, "rollback", |s| s.rollback(force))
    }

    pub fn flush_statements(&self, scope: &TxScope) -> anyhow::Result<Vec<u64>> {
        self.with_started(scope, "flush statements", |s| s.flush_statements())
    }

    pub fn clear_cache(&self, scope: &TxScope) -> anyhow::Result<()> {
        self.with_started(scope, "clear the cache", |s| {
            s.clear_cache();
            Ok(())
        })
    }

    /// Close the started session. The scope's slot is cleared before the
    /// delegate call, so the session is released on every exit path.
    pub fn close(&self, scope: &TxScope) -> anyhow::Result<()> {
        let mut session =
            scope
                .take_session(&self.resource_id)
                .ok_or_else(|| TxError::NoActiveSession {
                    resource: self.resource_id.clone(),
                    operation: "close",
                })?;
        session.close()
    }

    // ------------------------------------------------------------------

    fn with_started<R>(
        &self,
        scope: &TxScope,
        operation: &'static str,
        op: impl FnOnce(&mut dyn Session) -> anyhow::Result<R>,
    ) -> anyhow::Result<R> {
        match scope.with_session(&self.resource_id, op) {
            Some(result) => result,
            None => Err(TxError::NoActiveSession {
                resource: self.resource_id.clone(),
                operation,
            }
            .into()),
        }
    }

    fn forward<R>(
        &self,
        scope: &TxScope,
        op: impl FnOnce(&mut dyn Session) -> anyhow::Result<R>,
    ) -> anyhow::Result<R> {
        match scope.boundary() {
            Some(options) => {
                self.start_session(scope, &options)?;
                match scope.with_session(&self.resource_id, op) {
                    Some(result) => result,
                    None => Err(TxError::NoActiveSession {
                        resource: self.resource_id.clone(),
                        operation: "execute",
                    }
                    .into()),
                }
            }
            None if self.allow_auto_transaction => self.auto_call(op),
            None => Err(TxError::NoTransactionContext {
                resource: self.resource_id.clone(),
            }
            .into()),
        }
    }

    /// Scoped-acquisition fallback: open a throwaway session, run the single
    /// call, commit on success / roll back on failure, always close.
    fn auto_call<R>(
        &self,
        op: impl FnOnce(&mut dyn Session) -> anyhow::Result<R>,
    ) -> anyhow::Result<R> {
        warn!(resource = %self.resource_id, "no transactional context, starting a throwaway session");
        let mut session = self.factory.open_session()?;

        let outcome = op(session.as_mut()).and_then(|value| {
            session.commit(false)?;
            Ok(value)
        });
        let outcome = match outcome {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Err(rb_err) = session.rollback(false) {
                    error!(resource = %self.resource_id, error = %rb_err, "failed to roll back auto-session");
                }
                Err(err)
            }
        };

        let outcome = match session.close() {
            Ok(()) => outcome,
            Err(close_err) if outcome.is_ok() => Err(close_err),
            Err(close_err) => {
                error!(resource = %self.resource_id, error = %close_err, "failed to close auto-session");
                outcome
            }
        };
        debug!(resource = %self.resource_id, "auto-session closed");
        outcome
    }
}

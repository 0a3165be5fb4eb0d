// ============================================================================
// Session API
// ============================================================================

pub mod manager;

pub use manager::SessionManager;

use crate::transaction::{ExecutorType, IsolationLevel};
use std::collections::HashMap;

/// Statement parameters, carried as a JSON value.
pub type Params = serde_json::Value;

/// A single row, carried as a JSON value.
pub type Value = serde_json::Value;

/// A physical, connection-bound session on one resource.
///
/// This is the finite pass-through surface redirected by [`SessionManager`]:
/// every operation executes against one open connection and takes effect only
/// when the session commits. Implemented per resource by the underlying
/// engine's session layer.
pub trait Session {
    fn select_one(&mut self, statement: &str, params: Params) -> anyhow::Result<Option<Value>>;

    fn select_list(&mut self, statement: &str, params: Params) -> anyhow::Result<Vec<Value>>;

    /// Run a list query and key each row by the value of `map_key`.
    fn select_map(
        &mut self,
        statement: &str,
        params: Params,
        map_key: &str,
    ) -> anyhow::Result<HashMap<String, Value>>;

    /// Returns the number of inserted rows.
    fn insert(&mut self, statement: &str, params: Params) -> anyhow::Result<u64>;

    /// Returns the number of updated rows.
    fn update(&mut self, statement: &str, params: Params) -> anyhow::Result<u64>;

    /// Returns the number of deleted rows.
    fn delete(&mut self, statement: &str, params: Params) -> anyhow::Result<u64>;

    /// Flush batched statements, returning the affected-row count per batch.
    fn flush_statements(&mut self) -> anyhow::Result<Vec<u64>>;

    fn clear_cache(&mut self);

    /// `force` commits even when the engine saw no writes on this session.
    fn commit(&mut self, force: bool) -> anyhow::Result<()>;

    fn rollback(&mut self, force: bool) -> anyhow::Result<()>;

    fn close(&mut self) -> anyhow::Result<()>;
}

/// Opens physical sessions on one resource.
///
/// One factory per configured resource; the factory is shared across threads
/// while the sessions it opens are not.
pub trait SessionFactory: Send + Sync {
    /// Open a session with the engine's default settings.
    fn open_session(&self) -> anyhow::Result<Box<dyn Session>>;

    /// Open a session with an explicit isolation level and executor mode.
    fn open_session_with(
        &self,
        isolation: IsolationLevel,
        executor_type: ExecutorType,
    ) -> anyhow::Result<Box<dyn Session>>;
}

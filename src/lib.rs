// ============================================================================
// multitx — multi-resource transaction coordination
// ============================================================================

//! Run business logic that touches several independently configured database
//! resources (separate pools, schemas, or engines) inside one logical
//! transactional boundary per call chain, without tracking which resources
//! were actually used.
//!
//! - A [`TxScope`] carries the boundary descriptor and every lazily started
//!   session through a call chain.
//! - A [`SessionManager`] per resource opens a physical session only when
//!   the resource is first touched and redirects the full session API onto
//!   it.
//! - The [`MultiTransactionManager`] commits, rolls back, and closes every
//!   session that was actually started, collecting partial failures.
//! - [`Transactional`] wraps a unit of work with the boundary policy:
//!   inheritance for nested calls, rollback-only mode, error classification,
//!   and an auto-transaction fallback for callers outside any boundary.
//!
//! # Not a distributed transaction manager
//!
//! There is no two-phase commit and no atomicity across resources. The
//! commit sweep is best-effort: if resource B fails to commit after resource
//! A already committed, A stays committed and the failure is surfaced as a
//! [`TxError::CommitFailed`] naming B. Callers needing cross-resource
//! atomicity need an XA coordinator, not this crate.
//!
//! # Example
//!
//! ```ignore
//! use multitx::{MultiTransactionManager, SessionManager, Transactional, TxOptions};
//! use std::sync::Arc;
//!
//! let manager = Arc::new(MultiTransactionManager::new());
//! manager.register("orders", Arc::new(SessionManager::new("orders", orders_factory)))?;
//! manager.register("billing", Arc::new(SessionManager::new("billing", billing_factory)))?;
//!
//! let orders = manager_for("orders");
//! let boundary = Transactional::with_options(manager.clone(), TxOptions::new());
//! let scope = manager.scope();
//! boundary.execute(&scope, |scope| {
//!     orders.insert(scope, "insertOrder", params)?;
//!     Ok(())
//! })?;
//! ```

pub mod core;
pub mod session;
pub mod transaction;

// Re-export main types for convenience
pub use crate::core::{ResourceFailure, Result, TxError};
pub use crate::session::{Params, Session, SessionFactory, SessionManager, Value};
pub use crate::transaction::{
    ErrorPredicate, ExecutorType, IsolationLevel, ManualTransaction, MultiTransactionManager,
    RethrowPolicy, Transactional, TxOptions, TxScope,
};

// ============================================================================
// Transaction coordination
// ============================================================================

pub mod coordinator;
pub mod interceptor;
pub mod manual;
pub mod options;
pub mod scope;

pub use coordinator::MultiTransactionManager;
pub use interceptor::Transactional;
pub use manual::ManualTransaction;
pub use options::{ErrorPredicate, ExecutorType, IsolationLevel, RethrowPolicy, TxOptions};
pub use scope::TxScope;

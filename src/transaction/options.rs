use std::fmt;
use std::sync::Arc;

/// Transaction isolation level requested when a managed session opens.
///
/// `Default` defers to the engine's configured level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// How the engine should execute statements inside the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutorType {
    /// A fresh statement per execution.
    #[default]
    Simple,
    /// Reuse prepared statements.
    Reuse,
    /// Batch updates until flushed.
    Batch,
}

/// Predicate deciding whether a body error belongs to a declared error set.
pub type ErrorPredicate = Arc<dyn Fn(&anyhow::Error) -> bool + Send + Sync>;

/// Rethrow policy for one configured error kind, resolved at configuration
/// time: a match predicate plus the factories used to wrap a foreign error
/// into that kind.
#[derive(Clone)]
pub struct RethrowPolicy {
    matches: ErrorPredicate,
    from_message_and_cause: Option<Arc<dyn Fn(String, anyhow::Error) -> anyhow::Error + Send + Sync>>,
    from_cause: Option<Arc<dyn Fn(anyhow::Error) -> anyhow::Error + Send + Sync>>,
}

impl RethrowPolicy {
    /// `matches` recognizes errors that already are the configured kind;
    /// those are rethrown unchanged instead of wrapped.
    pub fn new(matches: impl Fn(&anyhow::Error) -> bool + Send + Sync + 'static) -> Self {
        Self {
            matches: Arc::new(matches),
            from_message_and_cause: None,
            from_cause: None,
        }
    }

    /// Factory used when the boundary carries a message template.
    pub fn with_message_and_cause(
        mut self,
        factory: impl Fn(String, anyhow::Error) -> anyhow::Error + Send + Sync + 'static,
    ) -> Self {
        self.from_message_and_cause = Some(Arc::new(factory));
        self
    }

    /// Factory used when no message template is configured.
    pub fn with_cause(
        mut self,
        factory: impl Fn(anyhow::Error) -> anyhow::Error + Send + Sync + 'static,
    ) -> Self {
        self.from_cause = Some(Arc::new(factory));
        self
    }

    pub(crate) fn matches(&self, error: &anyhow::Error) -> bool {
        self.matches.as_ref()(error)
    }

    pub(crate) fn build_with_message(
        &self,
        message: String,
        cause: anyhow::Error,
    ) -> Option<anyhow::Error> {
        self.from_message_and_cause
            .as_ref()
            .map(|f| f.as_ref()(message, cause))
    }

    pub(crate) fn build_from_cause(&self, cause: anyhow::Error) -> Option<anyhow::Error> {
        self.from_cause.as_ref().map(|f| f.as_ref()(cause))
    }
}

impl fmt::Debug for RethrowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RethrowPolicy")
            .field("from_message_and_cause", &self.from_message_and_cause.is_some())
            .field("from_cause", &self.from_cause.is_some())
            .finish()
    }
}

/// Boundary descriptor attached to a transactional unit of work.
///
/// Immutable once installed for a call chain: the outermost boundary's
/// options win, nested boundaries inherit them and their own options are
/// discarded.
#[derive(Clone, Default)]
pub struct TxOptions {
    /// Isolation level for sessions opened under this boundary.
    pub isolation: IsolationLevel,

    /// Executor mode for sessions opened under this boundary.
    pub executor_type: ExecutorType,

    /// Never commit: normal completion rolls the boundary back instead.
    /// Useful for dry-run and validation flows that still exercise the
    /// data path.
    pub rollback_only: bool,

    /// Force the commit/rollback through to sessions the engine considers
    /// clean.
    pub force: bool,

    /// Message template for wrapped rethrows; `%s` placeholders are filled
    /// from the call's arguments.
    pub exception_message: Option<String>,

    /// Error kind foreign body errors are rethrown as.
    pub rethrow: Option<RethrowPolicy>,

    /// Error kinds the unit of work declares: matching errors are always
    /// rethrown unchanged.
    pub declared_errors: Vec<ErrorPredicate>,
}

impl TxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn executor_type(mut self, executor_type: ExecutorType) -> Self {
        self.executor_type = executor_type;
        self
    }

    pub fn rollback_only(mut self, rollback_only: bool) -> Self {
        self.rollback_only = rollback_only;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn exception_message(mut self, template: impl Into<String>) -> Self {
        self.exception_message = Some(template.into());
        self
    }

    pub fn rethrow_as(mut self, policy: RethrowPolicy) -> Self {
        self.rethrow = Some(policy);
        self
    }

    pub fn declare_error(
        mut self,
        predicate: impl Fn(&anyhow::Error) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.declared_errors.push(Arc::new(predicate));
        self
    }
}

impl fmt::Debug for TxOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxOptions")
            .field("isolation", &self.isolation)
            .field("executor_type", &self.executor_type)
            .field("rollback_only", &self.rollback_only)
            .field("force", &self.force)
            .field("exception_message", &self.exception_message)
            .field("rethrow", &self.rethrow)
            .field("declared_errors", &self.declared_errors.len())
            .finish()
    }
}

use super::TxOptions;
use crate::session::Session;
use std::cell::RefCell;
use std::collections::HashMap;

/// Execution-scoped transaction context.
///
/// One scope carries the state of one logical call chain: the installed
/// boundary descriptor plus every lazily started session, keyed by resource
/// identifier. Callers create a scope (see
/// [`MultiTransactionManager::scope`](super::MultiTransactionManager::scope))
/// and pass it through the chain instead of relying on ambient thread-local
/// storage.
///
/// The scope is deliberately not `Send`: a boundary belongs to the chain
/// that opened it, and handing it to a worker thread is a bug this type
/// turns into a compile error.
#[derive(Default)]
pub struct TxScope {
    boundary: RefCell<Option<TxOptions>>,
    sessions: RefCell<HashMap<String, Box<dyn Session>>>,
}

impl TxScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a boundary descriptor is installed.
    pub fn in_boundary(&self) -> bool {
        self.boundary.borrow().is_some()
    }

    pub(crate) fn boundary(&self) -> Option<TxOptions> {
        self.boundary.borrow().clone()
    }

    /// Install the descriptor unless one is already present. Returns whether
    /// the descriptor was installed (false means it was inherited).
    pub(crate) fn install_boundary(&self, options: TxOptions) -> bool {
        let mut slot = self.boundary.borrow_mut();
        if slot.is_some() {
            return false;
        }
        *slot = Some(options);
        true
    }

    pub(crate) fn clear_boundary(&self) {
        self.boundary.borrow_mut().take();
    }

    pub(crate) fn has_session(&self, resource: &str) -> bool {
        self.sessions.borrow().contains_key(resource)
    }

    pub(crate) fn put_session(&self, resource: &str, session: Box<dyn Session>) {
        self.sessions
            .borrow_mut()
            .insert(resource.to_string(), session);
    }

    pub(crate) fn take_session(&self, resource: &str) -> Option<Box<dyn Session>> {
        self.sessions.borrow_mut().remove(resource)
    }

    /// Run `op` against the started session for `resource`, if any.
    pub(crate) fn with_session<R>(
        &self,
        resource: &str,
        op: impl FnOnce(&mut dyn Session) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.borrow_mut();
        sessions.get_mut(resource).map(|s| op(s.as_mut()))
    }
}

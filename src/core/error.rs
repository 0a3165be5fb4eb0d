use thiserror::Error;

/// A single resource's failure inside a best-effort sweep.
#[derive(Debug)]
pub struct ResourceFailure {
    pub resource: String,
    pub error: anyhow::Error,
}

#[derive(Error, Debug)]
pub enum TxError {
    #[error("cannot {operation}: no managed session is started for resource '{resource}'")]
    NoActiveSession {
        resource: String,
        operation: &'static str,
    },

    #[error("no transactional context for resource '{resource}' and auto-transactions are disabled")]
    NoTransactionContext { resource: String },

    #[error("one or more resources failed to commit: [{}]", resource_list(.0))]
    CommitFailed(Vec<ResourceFailure>),

    #[error("one or more resources failed to roll back: [{}]", resource_list(.0))]
    RollbackFailed(Vec<ResourceFailure>),

    #[error("one or more resources failed to close: [{}]", resource_list(.0))]
    CloseFailed(Vec<ResourceFailure>),

    #[error("resource registry is sealed; resources must be registered before any boundary executes")]
    RegistrySealed,

    #[error("resource '{0}' is already registered")]
    DuplicateResource(String),

    #[error("cannot rethrow as the configured error kind: {0}")]
    RethrowConstruction(String),

    #[error("lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, TxError>;

impl TxError {
    /// Identifiers of the resources that failed, for the aggregate variants.
    pub fn failed_resources(&self) -> Vec<&str> {
        match self {
            Self::CommitFailed(failures)
            | Self::RollbackFailed(failures)
            | Self::CloseFailed(failures) => {
                failures.iter().map(|f| f.resource.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn resource_list(failures: &[ResourceFailure]) -> String {
    failures
        .iter()
        .map(|f| f.resource.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl<T> From<std::sync::PoisonError<T>> for TxError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_message_lists_resource_ids() {
        let err = TxError::CommitFailed(vec![
            ResourceFailure {
                resource: "orders".into(),
                error: anyhow::anyhow!("connection reset"),
            },
            ResourceFailure {
                resource: "billing".into(),
                error: anyhow::anyhow!("timeout"),
            },
        ]);

        let message = err.to_string();
        assert!(message.contains("orders, billing"));
        assert_eq!(err.failed_resources(), vec!["orders", "billing"]);
    }

    #[test]
    fn non_aggregate_has_no_failed_resources() {
        let err = TxError::NoTransactionContext {
            resource: "orders".into(),
        };
        assert!(err.failed_resources().is_empty());
    }
}

// ============================================================================
// Boundary Interceptor
// ============================================================================

use super::{MultiTransactionManager, TxOptions, TxScope};
use crate::core::TxError;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Wraps a unit of work in a transactional boundary.
///
/// On entry the boundary descriptor is installed (or inherited when the
/// scope already carries one); on normal return the outermost boundary
/// commits every touched resource; on error it rolls them back and applies
/// the rethrow policy; the outermost boundary always ends the context and
/// closes every touched session on the way out. Inherited boundaries never
/// commit, roll back, or close — teardown belongs to the outermost call
/// exclusively.
pub struct Transactional {
    manager: Arc<MultiTransactionManager>,
    options: TxOptions,
}

impl Transactional {
    /// Boundary with default options.
    pub fn new(manager: Arc<MultiTransactionManager>) -> Self {
        Self::with_options(manager, TxOptions::new())
    }

    pub fn with_options(manager: Arc<MultiTransactionManager>, options: TxOptions) -> Self {
        Self { manager, options }
    }

    pub fn options(&self) -> &TxOptions {
        &self.options
    }

    /// Run `body` inside the boundary.
    pub fn execute<T>(
        &self,
        scope: &TxScope,
        body: impl FnOnce(&TxScope) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        self.execute_with_args(scope, &[], body)
    }

    /// Run `body` inside the boundary; `args` fill the `%s` placeholders of
    /// the configured exception-message template when a body error has to be
    /// wrapped.
    pub fn execute_with_args<T>(
        &self,
        scope: &TxScope,
        args: &[&dyn fmt::Display],
        body: impl FnOnce(&TxScope) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let inherited = self.manager.is_within_boundary(scope);
        self.manager.start_boundary(scope, self.options.clone());

        if inherited {
            debug!("boundary already set for this scope, inheriting it");
        } else {
            debug!(options = ?self.options, "boundary not set for this scope, installing descriptor");
        }

        let mut result: anyhow::Result<T> = match body(scope) {
            Ok(value) => {
                if !inherited && !self.options.rollback_only {
                    match self.manager.commit_all(scope, self.options.force) {
                        Ok(()) => Ok(value),
                        Err(err) => Err(err.into()),
                    }
                } else {
                    Ok(value)
                }
            }
            Err(err) => {
                // The rollback attempt always precedes classification.
                match self.manager.rollback_all(scope, self.options.force) {
                    Ok(()) => Err(self.classify(err, args)),
                    Err(sweep_err) => {
                        error!(error = %err, "body error superseded by rollback sweep failure");
                        Err(sweep_err.into())
                    }
                }
            }
        };

        if inherited {
            debug!("boundary is inherited, skipping teardown");
            return result;
        }

        if self.options.rollback_only && result.is_ok() {
            debug!("boundary was in rollback-only mode, rolling it back");
            if let Err(err) = self.manager.rollback_all(scope, true) {
                result = Err(err.into());
            }
        }

        self.manager.end_boundary(scope);
        if let Err(close_err) = self.manager.close_all(scope) {
            match &result {
                Ok(_) => result = Err(close_err.into()),
                Err(prior) => {
                    error!(error = %close_err, prior = %prior, "failed to close sessions after boundary error")
                }
            }
        }

        result
    }

    /// Classification precedence: declared error kinds are rethrown
    /// unchanged, then errors already of the configured rethrow kind, then a
    /// wrapper constructed by the policy's factory, then a generic
    /// construction failure when no factory was registered.
    fn classify(&self, error: anyhow::Error, args: &[&dyn fmt::Display]) -> anyhow::Error {
        for declared in &self.options.declared_errors {
            if declared.as_ref()(&error) {
                return error;
            }
        }

        let Some(policy) = &self.options.rethrow else {
            return error;
        };
        if policy.matches(&error) {
            return error;
        }

        match &self.options.exception_message {
            Some(template) => {
                let message = render_template(template, args);
                policy
                    .build_with_message(message, error)
                    .unwrap_or_else(|| rethrow_failure("a (message, cause) factory"))
            }
            None => policy
                .build_from_cause(error)
                .unwrap_or_else(|| rethrow_failure("a (cause) factory")),
        }
    }
}

fn rethrow_failure(needed: &str) -> anyhow::Error {
    let message =
        format!("the configured rethrow kind is missing {needed}; register one on its RethrowPolicy");
    error!("{message}");
    TxError::RethrowConstruction(message).into()
}

/// `%s` positional substitution. Placeholders without a matching argument
/// are left as-is; surplus arguments are ignored.
fn render_template(template: &str, args: &[&dyn fmt::Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut pieces = template.split("%s").peekable();
    while let Some(piece) = pieces.next() {
        out.push_str(piece);
        if pieces.peek().is_some() {
            match args.next() {
                Some(arg) => out.push_str(&arg.to_string()),
                None => out.push_str("%s"),
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_substitutes_positionally() {
        let id = 42;
        let name = "alice";
        let rendered = render_template(
            "op %s failed for %s",
            &[&id as &dyn std::fmt::Display, &name],
        );
        assert_eq!(rendered, "op 42 failed for alice");
    }

    #[test]
    fn missing_arguments_leave_placeholders() {
        let rendered = render_template("op failed: %s / %s", &[&"first"]);
        assert_eq!(rendered, "op failed: first / %s");
    }

    #[test]
    fn surplus_arguments_are_ignored() {
        let rendered = render_template("no placeholders", &[&"unused"]);
        assert_eq!(rendered, "no placeholders");
    }
}

use std::sync::Arc;

use tracing::warn;

use crate::{DeleteError, PruneError, Reference};

type PolicyFn = dyn Fn(DeleteError, &Reference) -> Option<PruneError> + Send + Sync;

/// Decides what a failed deletion means.
///
/// Called for every transport error other than [`DeleteError::NotFound`].
/// Returning `None` counts the child as pruned and drops it from the ledger;
/// returning `Some(err)` keeps the child for the next pass and fails the prune.
#[derive(Clone)]
pub struct ErrorPolicy {
    name: &'static str,
    decide: Arc<PolicyFn>,
}

impl ErrorPolicy {
    /// Default: keep every failure as [`PruneError::DeletionFailed`].
    pub fn aggregate() -> Self {
        Self {
            name: "aggregate",
            decide: Arc::new(|source: DeleteError, reference: &Reference| {
                Some(PruneError::DeletionFailed {
                    reference: reference.clone(),
                    source,
                })
            }),
        }
    }

    /// Log the failure and treat the child as gone.
    pub fn log_and_continue() -> Self {
        Self {
            name: "log_and_continue",
            decide: Arc::new(|source: DeleteError, reference: &Reference| {
                warn!(reference = %reference, error = %source, "ignoring failed child deletion");
                None
            }),
        }
    }

    pub fn custom<F>(decide: F) -> Self
    where
        F: Fn(DeleteError, &Reference) -> Option<PruneError> + Send + Sync + 'static,
    {
        Self {
            name: "custom",
            decide: Arc::new(decide),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, error: DeleteError, reference: &Reference) -> Option<PruneError> {
        (self.decide)(error, reference)
    }
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::aggregate()
    }
}

impl std::fmt::Debug for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorPolicy").field("name", &self.name).finish()
    }
}

/// Per-session configuration.
#[derive(Clone, Debug, Default)]
pub struct PruneOptions {
    pub dry_run: bool,
    pub error_policy: ErrorPolicy,
}

impl PruneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate deletions: the transport only validates, stale children are
    /// reported as skipped and stay in the ledger.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeIdentity;

    fn job() -> Reference {
        Reference::new(TypeIdentity::new("batch/v1", "Job"), "ci", "nightly", "u-1")
    }

    #[test]
    fn default_policy_wraps_the_error() {
        let policy = PruneOptions::new().error_policy;
        assert_eq!(policy.name(), "aggregate");
        assert_eq!(
            policy.apply(DeleteError::rejected("conflict"), &job()),
            Some(PruneError::DeletionFailed {
                reference: job(),
                source: DeleteError::rejected("conflict"),
            })
        );
    }

    #[test]
    fn log_and_continue_suppresses() {
        let policy = ErrorPolicy::log_and_continue();
        assert_eq!(policy.apply(DeleteError::Cancelled, &job()), None);
    }

    #[test]
    fn custom_policy_can_rewrite() {
        let policy = ErrorPolicy::custom(|err, reference| match err {
            DeleteError::Cancelled => None,
            other => Some(PruneError::Policy {
                reference: reference.clone(),
                message: format!("blocked by admission: {other}"),
            }),
        });

        assert_eq!(policy.apply(DeleteError::Cancelled, &job()), None);
        assert!(matches!(
            policy.apply(DeleteError::rejected("denied"), &job()),
            Some(PruneError::Policy { message, .. }) if message == "blocked by admission: denied"
        ));
    }
}

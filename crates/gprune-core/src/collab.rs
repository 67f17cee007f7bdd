//! Collaborator seams.
//!
//! The engine has no dependency on any resource-management client. Callers
//! wire their environment in through these narrow traits; test doubles
//! implement them directly.
//!
//! - [`Generational`]: the parent's configuration-generation counter
//! - [`ResourceHandle`]: a child as the caller's environment represents it
//! - [`TypeResolver`]: handle -> type identity, and back
//! - [`DeletionTransport`]: delete a handle, reporting "already absent" distinctly

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::{DeleteError, ResolveError, TypeIdentity};

// ---------------------------------------------------------------------------
// Parent
// ---------------------------------------------------------------------------

/// Exposes the parent's monotonically nondecreasing generation counter.
///
/// Read twice per pass: once by `Session::new` (and every `mark_reconciled`)
/// and once at the start of `Session::prune`.
pub trait Generational {
    fn generation(&self) -> i64;
}

impl Generational for i64 {
    fn generation(&self) -> i64 {
        *self
    }
}

impl Generational for std::cell::Cell<i64> {
    fn generation(&self) -> i64 {
        self.get()
    }
}

impl<G: Generational + ?Sized> Generational for &G {
    fn generation(&self) -> i64 {
        (**self).generation()
    }
}

// ---------------------------------------------------------------------------
// Children
// ---------------------------------------------------------------------------

/// A child resource handle from the caller's environment.
pub trait ResourceHandle {
    fn namespace(&self) -> &str;
    fn name(&self) -> &str;
    /// Creation identifier; empty until the resource has been created.
    fn uid(&self) -> &str;
}

/// Resolves type identities.
///
/// # Contract
/// Both directions must fail deterministically for an unknown type.
pub trait TypeResolver {
    type Handle: ResourceHandle;

    fn type_of(&self, handle: &Self::Handle) -> Result<TypeIdentity, ResolveError>;

    /// Construct an empty handle addressing `namespace/name` of the given type.
    /// Used to turn a stored reference back into something deletable.
    fn empty_handle(
        &self,
        type_identity: &TypeIdentity,
        namespace: &str,
        name: &str,
    ) -> Result<Self::Handle, ResolveError>;
}

/// Whether a deletion is committed or only validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteMode {
    Commit,
    /// Server-side dry run: validate the deletion, change nothing.
    Validate,
}

/// Deletes children.
///
/// # Contract
/// - Must return [`DeleteError::NotFound`] when the resource is already absent.
/// - Cancellation and timeouts are the transport's business; it should honour
///   [`PruneContext`] and surface them as ordinary errors.
/// - In [`DeleteMode::Validate`] it must not remove anything.
pub trait DeletionTransport<H> {
    fn delete(&self, handle: &H, mode: DeleteMode, ctx: &PruneContext) -> Result<(), DeleteError>;
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Passed verbatim to the transport on every delete. The engine itself never
/// inspects it: no timers, no retries.
#[derive(Clone, Debug, Default)]
pub struct PruneContext {
    cancel: CancelToken,
    deadline: Option<Instant>,
}

impl PruneContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Convenience for transports: `Err(Cancelled)` once the token fired or
    /// the deadline passed.
    pub fn check(&self) -> Result<(), DeleteError> {
        if self.cancel.is_cancelled() {
            return Err(DeleteError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(DeleteError::Cancelled),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cancel_token_clones_share_state() {
        let token = CancelToken::new();
        let ctx = PruneContext::new().with_cancel_token(token.clone());
        assert!(ctx.check().is_ok());

        token.cancel();
        assert_eq!(ctx.check(), Err(DeleteError::Cancelled));
    }

    #[test]
    fn past_deadline_reports_cancelled() {
        let past = Instant::now()
            .checked_sub(Duration::from_millis(1))
            .unwrap_or_else(Instant::now);
        let ctx = PruneContext::new().with_deadline(past);
        assert_eq!(ctx.check(), Err(DeleteError::Cancelled));

        let future = Instant::now() + Duration::from_secs(3600);
        assert!(PruneContext::new().with_deadline(future).check().is_ok());
    }

    #[test]
    fn cell_generation_is_read_at_call_time() {
        let counter = std::cell::Cell::new(3);
        assert_eq!(counter.generation(), 3);
        counter.set(4);
        assert_eq!((&counter).generation(), 4);
    }
}

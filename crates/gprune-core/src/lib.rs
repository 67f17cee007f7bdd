//! gprune-core
//!
//! Generation-aware reconciliation and pruning of child resources.
//!
//! Architectural decisions:
//! - One [`Session`] per reconciliation pass; it is consumed by [`Session::prune`]
//! - The baseline generation is captured at construction, before any mutation
//! - Children marked this pass, or stamped after the baseline, always survive
//! - Prune never fails fast: every stale child is attempted, failures are aggregated
//! - Dry-run never removes a ledger entry
//!
//! Deterministic logic. The only IO is whatever the caller's
//! [`DeletionTransport`] performs.
//!
//! # Ownership
//!
//! The [`ChildLedger`] belongs to the parent's persisted status. A session
//! borrows it mutably for its whole lifetime; the caller persists it after
//! `prune` returns, on success and on failure alike.

mod baseline;
mod collab;
mod error;
mod ledger;
mod policy;
mod prune;
mod reference;
mod session;

pub use baseline::{baseline_generation, high_water_mark};
pub use collab::{
    CancelToken, DeleteMode, DeletionTransport, Generational, PruneContext, ResourceHandle,
    TypeResolver,
};
pub use error::{AggregateFailure, DeleteError, MarkError, PruneError, ResolveError};
pub use ledger::{ChildLedger, LedgerEntry, Upsert};
pub use policy::{ErrorPolicy, PruneOptions};
pub use prune::{classify, Disposition, PruneResult};
pub use reference::{reference_for, Reference, TypeIdentity};
pub use session::Session;

//! Prune executor.
//!
//! Partitions the ledger into keep / stale, attempts every stale child in
//! ledger order, and rewrites the ledger with exactly the survivors.
//!
//! # Survivors
//!
//! - [`Disposition::KeepDesired`]: marked in this pass.
//! - [`Disposition::KeepFresh`]: stamped after the baseline.
//! - Stale children whose removal failed (error policy kept the error, or the
//!   stored reference could not be resolved). They are retried next pass.
//! - Every stale child in dry-run mode.
//!
//! A stale entry whose type/namespace/name was re-created under a new uid and
//! marked this pass is dropped (kept as skipped under dry-run) without a
//! delete call: the transport addresses by name, so the delete would land on
//! the live child.
//!
//! The scan never stops early; failures are collected into one
//! [`AggregateFailure`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    AggregateFailure, ChildLedger, DeleteMode, DeletionTransport, LedgerEntry, PruneContext,
    PruneError, PruneOptions, Reference, TypeResolver,
};

/// What a prune pass did. Empty lists are omitted when persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneResult {
    /// Stale children deleted (or already absent).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pruned: Vec<Reference>,
    /// Stale children that dry-run left in place.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Reference>,
}

impl PruneResult {
    pub fn is_empty(&self) -> bool {
        self.pruned.is_empty() && self.skipped.is_empty()
    }
}

/// Classification of one ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    KeepDesired,
    KeepFresh,
    Stale,
}

impl Disposition {
    pub fn is_stale(self) -> bool {
        self == Disposition::Stale
    }
}

/// Desired membership is checked first, so a child that is both desired and
/// fresh reports [`Disposition::KeepDesired`].
pub fn classify(entry: &LedgerEntry, desired: &HashSet<Reference>, baseline: i64) -> Disposition {
    if desired.contains(&entry.reference) {
        Disposition::KeepDesired
    } else if entry.observed_generation > baseline {
        Disposition::KeepFresh
    } else {
        Disposition::Stale
    }
}

enum StaleOutcome {
    Pruned,
    Skipped(Option<PruneError>),
    Retained(PruneError),
}

pub(crate) struct Executor<'s, R: ?Sized, T: ?Sized> {
    pub resolver: &'s R,
    pub transport: &'s T,
    pub options: &'s PruneOptions,
}

impl<'s, R, T> Executor<'s, R, T>
where
    R: TypeResolver + ?Sized,
    T: DeletionTransport<R::Handle> + ?Sized,
{
    pub fn run(
        &self,
        ledger: &mut ChildLedger,
        desired: &HashSet<Reference>,
        baseline: i64,
        ctx: &PruneContext,
    ) -> Result<PruneResult, AggregateFailure> {
        let mut result = PruneResult::default();
        let mut errors: Vec<PruneError> = Vec::new();

        let entries = ledger.take_entries();
        let mut retained: Vec<LedgerEntry> = Vec::with_capacity(entries.len());

        for entry in entries {
            let disposition = classify(&entry, desired, baseline);
            debug!(
                reference = %entry.reference,
                observed_generation = entry.observed_generation,
                baseline,
                ?disposition,
                "classified child"
            );
            if !disposition.is_stale() {
                retained.push(entry);
                continue;
            }

            match self.remove_stale(&entry.reference, desired, ctx) {
                StaleOutcome::Pruned => {
                    info!(reference = %entry.reference, "pruned stale child");
                    result.pruned.push(entry.reference);
                }
                StaleOutcome::Skipped(err) => {
                    info!(reference = %entry.reference, "dry-run: would prune stale child");
                    result.skipped.push(entry.reference.clone());
                    errors.extend(err);
                    retained.push(entry);
                }
                StaleOutcome::Retained(err) => {
                    warn!(reference = %entry.reference, error = %err, "stale child retained for retry");
                    errors.push(err);
                    retained.push(entry);
                }
            }
        }

        ledger.replace_entries(retained);

        info!(
            pruned = result.pruned.len(),
            skipped = result.skipped.len(),
            failed = errors.len(),
            retained = ledger.len(),
            "prune pass finished"
        );

        if errors.is_empty() {
            Ok(result)
        } else {
            Err(AggregateFailure { result, errors })
        }
    }

    fn remove_stale(
        &self,
        reference: &Reference,
        desired: &HashSet<Reference>,
        ctx: &PruneContext,
    ) -> StaleOutcome {
        let dry_run = self.options.dry_run;
        let failed = |err: PruneError| {
            if dry_run {
                StaleOutcome::Skipped(Some(err))
            } else {
                StaleOutcome::Retained(err)
            }
        };
        let removed = if dry_run {
            StaleOutcome::Skipped(None)
        } else {
            StaleOutcome::Pruned
        };

        // The handle addresses type/namespace/name only. If that name was
        // re-created and marked this pass, deleting it would hit the live
        // incarnation; the stale one is already gone.
        if let Some(current) = desired.iter().find(|d| same_address(d, reference)) {
            debug!(
                reference = %reference,
                current_uid = current.uid(),
                "stale child superseded by a re-created incarnation"
            );
            return removed;
        }

        let handle = match self.resolver.empty_handle(
            &reference.type_identity(),
            reference.namespace(),
            reference.name(),
        ) {
            Ok(handle) => handle,
            Err(source) => {
                return failed(PruneError::ReferenceConstructionFailed {
                    reference: reference.clone(),
                    source,
                })
            }
        };

        let mode = if dry_run {
            DeleteMode::Validate
        } else {
            DeleteMode::Commit
        };

        match self.transport.delete(&handle, mode, ctx) {
            Ok(()) => removed,
            Err(err) if err.is_not_found() => {
                debug!(reference = %reference, "stale child already absent");
                removed
            }
            Err(err) => match self.options.error_policy.apply(err, reference) {
                None => removed,
                Some(kept) => failed(kept),
            },
        }
    }
}

/// Same type, namespace and name; the uid may differ.
fn same_address(a: &Reference, b: &Reference) -> bool {
    a.api_version() == b.api_version()
        && a.kind() == b.kind()
        && a.namespace() == b.namespace()
        && a.name() == b.name()
}

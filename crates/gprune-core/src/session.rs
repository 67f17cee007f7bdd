//! Reconciliation session.
//!
//! ```text
//! Session::new ──> mark_reconciled* ──> prune ──> Ok(PruneResult) | Err(AggregateFailure)
//! ```
//!
//! `prune` consumes the session, so a session cannot be pruned twice or
//! marked after pruning. Build a new session for the next pass.
//!
//! # Preconditions (not enforced beyond the borrow checker)
//!
//! - One session per parent at a time. Nothing else may edit the ledger while
//!   the session holds it.
//! - Every desired child is applied by the caller and then marked before
//!   `prune` runs.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::prune::Executor;
use crate::{
    baseline_generation, reference_for, AggregateFailure, ChildLedger, DeletionTransport,
    Generational, MarkError, PruneContext, PruneOptions, PruneResult, Reference, TypeResolver,
    Upsert,
};

/// One reconciliation pass over a parent's children.
pub struct Session<'a, P: ?Sized, R, T> {
    parent: &'a P,
    ledger: &'a mut ChildLedger,
    resolver: &'a R,
    transport: &'a T,
    options: PruneOptions,
    desired: HashSet<Reference>,
    baseline: i64,
}

impl<'a, P, R, T> Session<'a, P, R, T>
where
    P: Generational + ?Sized,
    R: TypeResolver,
    T: DeletionTransport<R::Handle>,
{
    /// Start a pass. The baseline generation is captured here, before the
    /// session touches the ledger.
    pub fn new(
        parent: &'a P,
        ledger: &'a mut ChildLedger,
        resolver: &'a R,
        transport: &'a T,
        options: PruneOptions,
    ) -> Self {
        let current = parent.generation();
        let baseline = baseline_generation(ledger, current);
        debug!(
            generation = current,
            baseline,
            children = ledger.len(),
            dry_run = options.dry_run,
            error_policy = options.error_policy.name(),
            "reconcile session started"
        );

        Self {
            parent,
            ledger,
            resolver,
            transport,
            options,
            desired: HashSet::new(),
            baseline,
        }
    }

    /// Record an applied child as desired for this pass and stamp it with the
    /// parent's current generation.
    ///
    /// On error nothing is recorded.
    pub fn mark_reconciled(&mut self, resource: &R::Handle) -> Result<(), MarkError> {
        let reference = reference_for(self.resolver, resource)?;
        let generation = self.parent.generation();

        match self.ledger.upsert(reference.clone(), generation) {
            Upsert::Inserted => {
                debug!(reference = %reference, generation, "tracking new child")
            }
            Upsert::Updated {
                previous_generation,
            } => debug!(
                reference = %reference,
                previous_generation,
                generation,
                "restamped child"
            ),
        }
        self.desired.insert(reference);
        Ok(())
    }

    /// Delete stale children and rewrite the ledger.
    ///
    /// Nothing is pruned unless the parent's generation has moved past the
    /// baseline. On failure the partial result travels inside the
    /// [`AggregateFailure`]; either way the ledger reflects what actually
    /// happened and should be persisted.
    pub fn prune(self, ctx: &PruneContext) -> Result<PruneResult, AggregateFailure> {
        let current = self.parent.generation();
        if current <= self.baseline {
            info!(
                generation = current,
                baseline = self.baseline,
                "generation unchanged since last pass; nothing to prune"
            );
            return Ok(PruneResult::default());
        }

        let executor = Executor {
            resolver: self.resolver,
            transport: self.transport,
            options: &self.options,
        };
        executor.run(self.ledger, &self.desired, self.baseline, ctx)
    }

    pub fn baseline(&self) -> i64 {
        self.baseline
    }

    pub fn is_desired(&self, reference: &Reference) -> bool {
        self.desired.contains(reference)
    }

    pub fn desired_count(&self) -> usize {
        self.desired.len()
    }

    pub fn ledger(&self) -> &ChildLedger {
        &*self.ledger
    }

    pub fn options(&self) -> &PruneOptions {
        &self.options
    }
}

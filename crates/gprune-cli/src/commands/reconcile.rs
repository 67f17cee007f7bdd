//! `gprune reconcile`: one pass over a parent state file.

use anyhow::{Context, Result};
use chrono::Utc;
use gprune_config::PruneSettings;
use gprune_core::{PruneContext, Session};
use tracing::info;

use super::inventory::FileInventory;
use super::state::ParentState;
use super::{read_json, write_json};

/// Apply + mark every desired child, prune, then persist state and inventory.
///
/// Apply/mark failures abort before anything is written. A prune failure
/// still writes both files (the ledger already reflects what was removed)
/// and is returned afterwards.
pub fn run(state_path: &str, inventory_path: &str, settings: &PruneSettings) -> Result<()> {
    let mut state: ParentState = read_json(state_path)?;
    let inventory = FileInventory::load(inventory_path)?;
    let options = settings.to_options();

    let generation = state.metadata.generation;
    info!(
        parent = %state.metadata.name,
        generation,
        desired = state.spec.children.len(),
        objects = inventory.object_count(),
        dry_run = settings.dry_run,
        error_policy = settings.error_policy.as_str(),
        "reconcile starting"
    );

    let (outcome, baseline) = {
        let mut session = Session::new(
            &state.metadata,
            &mut state.status.children,
            &inventory,
            &inventory,
            options,
        );
        let baseline = session.baseline();
        for child in &state.spec.children {
            let applied = inventory
                .apply(child)
                .with_context(|| format!("apply {}/{} failed", child.kind, child.name))?;
            session.mark_reconciled(&applied)?;
        }
        (session.prune(&PruneContext::new()), baseline)
    };

    let (result, failure) = match outcome {
        Ok(result) => (result, None),
        Err(failure) => (failure.result.clone(), Some(failure)),
    };

    state.status.last_prune = Some(result.clone());
    state.status.last_reconcile_time = Some(Utc::now());
    inventory.save(inventory_path)?;
    write_json(state_path, &state)?;

    println!("generation={}", generation);
    println!("baseline={}", baseline);
    println!("dry_run={}", settings.dry_run);
    println!(
        "{}",
        serde_json::to_string(&result).context("serialize prune result failed")?
    );

    match failure {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}

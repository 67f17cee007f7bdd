use anyhow::Result;

use super::read_json;
use super::state::ParentState;

/// Print parent metadata and one line per ledger entry.
pub fn run(state_path: &str) -> Result<()> {
    let state: ParentState = read_json(state_path)?;

    println!("parent={}", state.metadata.name);
    println!("generation={}", state.metadata.generation);
    println!("tracked_children={}", state.status.children.len());
    println!(
        "last_reconcile_time={}",
        state
            .status
            .last_reconcile_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "NULL".to_string())
    );
    for entry in &state.status.children {
        println!(
            "child={} uid={} observed_generation={}",
            entry.reference,
            entry.reference.uid(),
            entry.observed_generation
        );
    }
    Ok(())
}

//! Scenario: stale partition is exact
//!
//! # Invariant under test
//! For any ledger and desired set, one prune pass splits the prior ledger
//! into two disjoint parts: children pruned, and children still tracked.
//! Desired children are never pruned. Nothing is pruned unless the
//! generation advanced past the ledger's high-water mark.

use std::collections::HashSet;

use gprune_core::{PruneContext, PruneOptions, Reference};
use gprune_testkit::{configmap, standard_cluster, TestParent};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prune_partitions_prior_ledger(
        children in prop::collection::vec((0i64..5, any::<bool>()), 1..8),
        bump in 0i64..3,
    ) {
        let cluster = standard_cluster();
        let mut parent = TestParent::new("app", 0);

        let mut desired = Vec::new();
        for (i, (stamp, wanted)) in children.iter().enumerate() {
            let obj = cluster.apply(&configmap(&format!("cm-{i}"))).unwrap();
            parent.status.children.upsert(obj.reference(), *stamp);
            if *wanted {
                desired.push(obj);
            }
        }
        let high_water = children.iter().map(|(s, _)| *s).max().unwrap_or(0);
        parent.metadata.generation = high_water + bump;

        let before: Vec<Reference> = parent.ledger().iter().map(|e| e.reference.clone()).collect();
        let desired_refs: HashSet<Reference> = desired.iter().map(|o| o.reference()).collect();

        let mut session = parent.session(&cluster, PruneOptions::new());
        prop_assert_eq!(session.baseline(), high_water);
        for obj in &desired {
            session.mark_reconciled(obj).unwrap();
        }
        let result = session.prune(&PruneContext::new()).unwrap();

        let after: HashSet<Reference> = parent.ledger().iter().map(|e| e.reference.clone()).collect();
        let pruned: HashSet<Reference> = result.pruned.iter().cloned().collect();

        prop_assert!(pruned.is_disjoint(&after));
        prop_assert!(pruned.is_disjoint(&desired_refs));
        prop_assert_eq!(pruned.len() + after.len(), before.len());
        for r in &before {
            prop_assert!(pruned.contains(r) || after.contains(r));
        }
        for r in &desired_refs {
            prop_assert!(after.contains(r), "desired child {} must stay tracked", r);
        }

        if bump == 0 {
            prop_assert!(pruned.is_empty(), "unchanged generation prunes nothing");
        } else {
            let expected: HashSet<Reference> =
                before.iter().filter(|r| !desired_refs.contains(*r)).cloned().collect();
            prop_assert_eq!(&pruned, &expected);
            prop_assert_eq!(cluster.object_count(), desired_refs.len());
        }
        prop_assert!(result.skipped.is_empty());
    }
}

//! Scenario: generation-gated pruning
//!
//! # Invariant under test
//! A child the ledger tracks is deleted only when (a) the parent's
//! generation has moved past the baseline captured at session start and
//! (b) the child was neither marked in this pass nor stamped after the
//! baseline.
//!
//! Covers:
//! 1) First reconcile of a fresh parent prunes nothing.
//! 2) A generation bump prunes exactly the undesired children.
//! 3) Re-running at an unchanged generation never deletes.
//! 4) A second session at the same generation is a no-op even with a
//!    reduced desired set.
//! 5) A child deleted out of band and re-created under the same name is not
//!    deleted through its stale predecessor's entry.

use gprune_core::{PruneContext, PruneOptions};
use gprune_testkit::{configmap, deployment, standard_cluster, TestParent};

// ---------------------------------------------------------------------------
// 1) First reconcile
// ---------------------------------------------------------------------------

#[test]
fn first_reconcile_tracks_children_and_prunes_nothing() {
    let cluster = standard_cluster();
    let mut parent = TestParent::new("app", 1);

    let result = parent
        .reconcile(
            &cluster,
            &[deployment("web"), configmap("cfg")],
            PruneOptions::new(),
            &PruneContext::new(),
        )
        .expect("first pass must succeed");

    assert!(result.is_empty(), "nothing to prune on first pass");
    assert_eq!(parent.ledger().len(), 2);
    assert!(parent.ledger().iter().all(|e| e.observed_generation == 1));
    assert!(cluster.delete_calls().is_empty(), "no transport traffic");
}

// ---------------------------------------------------------------------------
// 2) Generation bump prunes dropped children
// ---------------------------------------------------------------------------

#[test]
fn generation_bump_prunes_dropped_child() {
    let cluster = standard_cluster();
    let ctx = PruneContext::new();
    let mut parent = TestParent::new("app", 1);

    parent
        .reconcile(&cluster, &[deployment("web"), configmap("cfg")], PruneOptions::new(), &ctx)
        .unwrap();
    let cfg = cluster.apply(&configmap("cfg")).unwrap();

    parent.bump_generation();
    let result = parent
        .reconcile(&cluster, &[deployment("web")], PruneOptions::new(), &ctx)
        .expect("second pass must succeed");

    assert_eq!(result.pruned, vec![cfg.reference()], "only cfg is stale");
    assert!(result.skipped.is_empty());
    assert!(!cluster.exists(&cfg), "cfg removed from the cluster");
    assert!(cluster.exists(&deployment("web")));

    assert_eq!(parent.ledger().len(), 1);
    let web = &parent.ledger().entries()[0];
    assert_eq!(web.reference.name(), "web");
    assert_eq!(web.observed_generation, 2, "kept child is restamped");
}

// ---------------------------------------------------------------------------
// 3) Idempotence at unchanged generation
// ---------------------------------------------------------------------------

#[test]
fn repeated_reconcile_at_same_generation_never_deletes() {
    let cluster = standard_cluster();
    let ctx = PruneContext::new();
    let mut parent = TestParent::new("app", 3);
    let desired = [deployment("web"), configmap("cfg")];

    for _ in 0..3 {
        let result = parent
            .reconcile(&cluster, &desired, PruneOptions::new(), &ctx)
            .unwrap();
        assert!(result.is_empty());
    }

    assert_eq!(parent.ledger().len(), 2);
    assert_eq!(cluster.object_count(), 2);
    assert!(cluster.delete_calls().is_empty());
}

// ---------------------------------------------------------------------------
// 4) No premature deletion
// ---------------------------------------------------------------------------

#[test]
fn reduced_desired_set_at_same_generation_is_not_pruned() {
    let cluster = standard_cluster();
    let ctx = PruneContext::new();
    let mut parent = TestParent::new("app", 5);

    parent
        .reconcile(&cluster, &[deployment("web"), configmap("cfg")], PruneOptions::new(), &ctx)
        .unwrap();

    // Same generation, cfg not marked: the parent's configuration is
    // unchanged, so the missing mark is not evidence the child is unwanted.
    let result = parent
        .reconcile(&cluster, &[deployment("web")], PruneOptions::new(), &ctx)
        .unwrap();

    assert!(result.is_empty(), "same generation must not prune");
    assert_eq!(parent.ledger().len(), 2);
    assert!(cluster.exists(&configmap("cfg")));
}

#[test]
fn child_stamped_at_baseline_is_stale_once_unmarked() {
    let cluster = standard_cluster();
    let ctx = PruneContext::new();
    let mut parent = TestParent::new("app", 1);
    parent
        .reconcile(&cluster, &[deployment("web")], PruneOptions::new(), &ctx)
        .unwrap();

    // An earlier pass at generation 3 added cfg; the ledger's max is now 3,
    // so baseline for a generation-4 session is 3.
    parent.metadata.generation = 3;
    parent
        .reconcile(&cluster, &[deployment("web"), configmap("cfg")], PruneOptions::new(), &ctx)
        .unwrap();

    parent.metadata.generation = 4;
    let mut session = parent.session(&cluster, PruneOptions::new());
    assert_eq!(session.baseline(), 3);
    let web = cluster.apply(&deployment("web")).unwrap();
    session.mark_reconciled(&web).unwrap();
    let result = session.prune(&ctx).unwrap();

    assert_eq!(result.pruned.len(), 1, "cfg was stamped at the baseline");
    assert_eq!(result.pruned[0].name(), "cfg");
}

// ---------------------------------------------------------------------------
// 5) Re-created child
// ---------------------------------------------------------------------------

#[test]
fn recreated_child_survives_its_stale_predecessor() {
    let cluster = standard_cluster();
    let ctx = PruneContext::new();
    let mut parent = TestParent::new("app", 1);

    parent
        .reconcile(&cluster, &[configmap("cfg")], PruneOptions::new(), &ctx)
        .unwrap();
    let first = cluster.apply(&configmap("cfg")).unwrap();
    assert!(cluster.delete_out_of_band(&first));

    parent.bump_generation();
    let result = parent
        .reconcile(&cluster, &[configmap("cfg")], PruneOptions::new(), &ctx)
        .expect("pass must succeed");
    let second = cluster.apply(&configmap("cfg")).unwrap();
    assert_ne!(first.uid, second.uid, "re-created under a new uid");

    assert!(cluster.exists(&configmap("cfg")), "live child must not be deleted");
    assert_eq!(cluster.commit_count(), 0, "no delete reaches the transport");
    assert_eq!(result.pruned, vec![first.reference()], "old incarnation is gone");

    let tracked: Vec<(String, i64)> = parent
        .ledger()
        .iter()
        .map(|e| (e.reference.uid().to_string(), e.observed_generation))
        .collect();
    assert_eq!(tracked, vec![(second.uid.clone(), 2)]);
}

#[test]
fn recreated_child_under_dry_run_is_skipped_without_validation() {
    let cluster = standard_cluster();
    let ctx = PruneContext::new();
    let mut parent = TestParent::new("app", 1);

    parent
        .reconcile(&cluster, &[configmap("cfg")], PruneOptions::new(), &ctx)
        .unwrap();
    let first = cluster.apply(&configmap("cfg")).unwrap();
    cluster.delete_out_of_band(&first);

    parent.bump_generation();
    let result = parent
        .reconcile(
            &cluster,
            &[configmap("cfg")],
            PruneOptions::new().with_dry_run(true),
            &ctx,
        )
        .unwrap();

    assert_eq!(result.skipped, vec![first.reference()]);
    assert!(cluster.delete_calls().is_empty());
    assert_eq!(parent.ledger().len(), 2, "dry-run keeps both incarnations");
}

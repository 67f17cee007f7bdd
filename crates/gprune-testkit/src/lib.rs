//! gprune-testkit
//!
//! In-memory collaborators for exercising reconcile/prune passes end to end.
//!
//! - [`MemoryCluster`]: type registry + object store + deletion transport,
//!   with per-object fault injection and a call journal.
//! - [`TestParent`]: a parent record carrying a generation and a persisted
//!   child ledger, with helpers to run a full pass.
//!
//! No randomness, no network IO. Uids are assigned from a counter.

mod cluster;
mod parent;

pub use cluster::{DeleteCall, MemoryCluster, Object};
pub use parent::{ParentMeta, ParentStatus, TestParent};

/// `apps/v1 Deployment` in `default`, not yet applied.
pub fn deployment(name: &str) -> Object {
    Object::new("apps/v1", "Deployment", "default", name)
}

/// `v1 ConfigMap` in `default`, not yet applied.
pub fn configmap(name: &str) -> Object {
    Object::new("v1", "ConfigMap", "default", name)
}

/// A cluster that knows Deployments, ConfigMaps and Services.
pub fn standard_cluster() -> MemoryCluster {
    MemoryCluster::new()
        .with_type("apps/v1", "Deployment")
        .with_type("v1", "ConfigMap")
        .with_type("v1", "Service")
}

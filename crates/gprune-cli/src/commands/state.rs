//! Parent state file.
//!
//! ```json
//! {
//!   "metadata": {"name": "app", "namespace": "default", "generation": 2},
//!   "spec":     {"children": [{"apiVersion": "v1", "kind": "ConfigMap", "name": "cfg"}]},
//!   "status":   {"children": [{"objectReference": {...}, "observedGeneration": 1}],
//!                "lastPrune": {"pruned": [...]}, "lastReconcileTime": "..."}
//! }
//! ```

use chrono::{DateTime, Utc};
use gprune_core::{ChildLedger, Generational, PruneResult};
use serde::{Deserialize, Serialize};

use super::inventory::Child;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub generation: i64,
}

impl Generational for Metadata {
    fn generation(&self) -> i64 {
        self.generation
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Spec {
    /// Desired children, in apply order.
    #[serde(default)]
    pub children: Vec<Child>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default)]
    pub children: ChildLedger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_prune: Option<PruneResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconcile_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParentState {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: Spec,
    #[serde(default)]
    pub status: Status,
}

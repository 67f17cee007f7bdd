use anyhow::{Context, Result};
use gprune_core::{ChildLedger, Generational, PruneContext, PruneOptions, PruneResult, Session};
use serde::{Deserialize, Serialize};

use crate::{MemoryCluster, Object};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    pub generation: i64,
}

impl Generational for ParentMeta {
    fn generation(&self) -> i64 {
        self.generation
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentStatus {
    #[serde(default)]
    pub children: ChildLedger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_prune: Option<PruneResult>,
}

/// A parent record: metadata carrying the generation, status carrying the
/// persisted child ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestParent {
    pub metadata: ParentMeta,
    #[serde(default)]
    pub status: ParentStatus,
}

impl TestParent {
    pub fn new(name: &str, generation: i64) -> Self {
        Self {
            metadata: ParentMeta {
                name: name.to_string(),
                namespace: "default".to_string(),
                generation,
            },
            status: ParentStatus::default(),
        }
    }

    /// Simulates an edit to the parent's desired configuration.
    pub fn bump_generation(&mut self) -> i64 {
        self.metadata.generation += 1;
        self.metadata.generation
    }

    pub fn ledger(&self) -> &ChildLedger {
        &self.status.children
    }

    /// Start a session over this parent's ledger, with the cluster acting as
    /// both resolver and transport.
    pub fn session<'a>(
        &'a mut self,
        cluster: &'a MemoryCluster,
        options: PruneOptions,
    ) -> Session<'a, ParentMeta, MemoryCluster, MemoryCluster> {
        Session::new(
            &self.metadata,
            &mut self.status.children,
            cluster,
            cluster,
            options,
        )
    }

    /// One full pass: apply and mark every desired object, then prune.
    ///
    /// `status.last_prune` is updated from the (possibly partial) result.
    /// A failed prune comes back as an `anyhow::Error` wrapping
    /// [`gprune_core::AggregateFailure`].
    pub fn reconcile(
        &mut self,
        cluster: &MemoryCluster,
        desired: &[Object],
        options: PruneOptions,
        ctx: &PruneContext,
    ) -> Result<PruneResult> {
        let outcome = {
            let mut session = self.session(cluster, options);
            for obj in desired {
                let applied = cluster
                    .apply(obj)
                    .with_context(|| format!("apply {}/{}", obj.namespace, obj.name))?;
                session.mark_reconciled(&applied)?;
            }
            session.prune(ctx)
        };

        match outcome {
            Ok(result) => {
                self.status.last_prune = Some(result.clone());
                Ok(result)
            }
            Err(failure) => {
                self.status.last_prune = Some(failure.result.clone());
                Err(failure.into())
            }
        }
    }

    /// Round-trip through JSON, as a controller persisting status would.
    pub fn reload(&self) -> Result<Self> {
        let json = serde_json::to_string(self).context("serialize parent")?;
        serde_json::from_str(&json).context("deserialize parent")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{configmap, standard_cluster};

    #[test]
    fn status_persists_with_wire_field_names() {
        let cluster = standard_cluster();
        let mut parent = TestParent::new("app", 1);
        parent
            .reconcile(&cluster, &[configmap("a")], PruneOptions::new(), &PruneContext::new())
            .unwrap();

        let json = serde_json::to_value(&parent).unwrap();
        let child = &json["status"]["children"][0];
        assert_eq!(child["observedGeneration"], 1);
        assert_eq!(child["objectReference"]["kind"], "ConfigMap");
        assert_eq!(child["objectReference"]["name"], "a");

        assert_eq!(parent.reload().unwrap(), parent);
    }
}

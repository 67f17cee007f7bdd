//! gprune-config
//!
//! Layered YAML configuration for reconcile/prune runs.
//!
//! - Documents merge in order: earlier docs are the base, later docs override
//!   (maps merge recursively, everything else is replaced).
//! - The merged document is canonicalised to JSON and hashed (SHA-256) so a
//!   run can log exactly which configuration it used.
//! - [`PruneSettings`] is the typed view the engine consumes.
//! - [`report_unused_keys`] flags keys nothing reads.
//!
//! The merge, canonical hash and JSON Pointer walk are the stock layered
//! loader, kept as-is. What this crate adds on top is the prune surface:
//! the [`PruneSettings`] / [`ErrorPolicyMode`] view and its mapping to
//! engine options, the consumed-key registry for `prune` and `logging`,
//! [`LoadedConfig::empty`] / [`LoadedConfig::settings`], and skipping empty
//! YAML documents during the merge.

mod consumption;
mod settings;

pub use consumption::{
    consumed_pointers, report_unused_keys, UnusedKeyPolicy, UnusedKeyReport,
};
pub use settings::{ErrorPolicyMode, PruneSettings};

use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// The configuration of a run started with no config files.
    pub fn empty() -> Result<Self> {
        load_layered_yaml_from_strings(&[])
    }

    pub fn settings(&self) -> Result<PruneSettings> {
        PruneSettings::from_config_json(&self.config_json)
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty document parses as null; treat it as "no overrides".
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json::Map is BTreeMap-backed (no preserve_order), so keys serialize sorted.
    let s = serde_json::to_string(v).context("canonical json serialize failed")?;
    Ok(s)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_layers_override_nested_keys() {
        let base = "prune:\n  dry_run: false\n  error_policy: aggregate\n";
        let overlay = "prune:\n  dry_run: true\n";

        let loaded = load_layered_yaml_from_strings(&[base, overlay]).unwrap();
        assert_eq!(loaded.config_json.pointer("/prune/dry_run"), Some(&Value::Bool(true)));
        assert_eq!(
            loaded.config_json.pointer("/prune/error_policy"),
            Some(&Value::String("aggregate".to_string())),
            "untouched sibling keys survive the merge"
        );
    }

    #[test]
    fn empty_documents_are_ignored() {
        let a = load_layered_yaml_from_strings(&["", "prune:\n  dry_run: true\n"]).unwrap();
        let b = load_layered_yaml_from_strings(&["prune:\n  dry_run: true\n"]).unwrap();
        assert_eq!(a.config_hash, b.config_hash);
    }

    #[test]
    fn no_documents_is_an_empty_object() {
        let loaded = LoadedConfig::empty().unwrap();
        assert_eq!(loaded.canonical_json, "{}");
        assert_eq!(loaded.config_hash.len(), 64);
    }

    #[test]
    fn blank_layers_only_yield_default_settings() {
        let loaded = load_layered_yaml_from_strings(&["", "\n"]).unwrap();
        assert_eq!(loaded.config_hash, LoadedConfig::empty().unwrap().config_hash);
        assert_eq!(loaded.settings().unwrap(), PruneSettings::default());
    }
}

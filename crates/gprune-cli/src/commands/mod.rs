//! Command handler modules for gprune.
//!
//! Shared file IO lives here; command-specific logic lives in the submodules.

pub mod inventory;
pub mod reconcile;
pub mod state;
pub mod status;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Read a JSON file. A UTF-8 BOM is tolerated.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read failed: {}", path))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    serde_json::from_slice(bytes).with_context(|| format!("invalid JSON in {}", path))
}

/// Write pretty JSON via a sibling temp file + rename, so a crash never
/// leaves a half-written state file.
pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let mut raw = serde_json::to_string_pretty(value).context("serialize failed")?;
    raw.push('\n');
    let tmp = format!("{}.tmp", path);
    fs::write(&tmp, raw).with_context(|| format!("write failed: {}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("rename {} -> {} failed", tmp, path))?;
    Ok(())
}

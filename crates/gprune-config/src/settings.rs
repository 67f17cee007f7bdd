use anyhow::{bail, Result};
use gprune_core::{ErrorPolicy, PruneOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Built-in error policies selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicyMode {
    /// Keep every failed deletion; the pass fails and the child is retried.
    #[default]
    Aggregate,
    /// Log failed deletions and treat the child as gone.
    LogAndContinue,
}

impl ErrorPolicyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPolicyMode::Aggregate => "aggregate",
            ErrorPolicyMode::LogAndContinue => "log_and_continue",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "aggregate" => Ok(ErrorPolicyMode::Aggregate),
            "log_and_continue" => Ok(ErrorPolicyMode::LogAndContinue),
            other => bail!(
                "CONFIG_INVALID: prune.error_policy '{}' is not one of: aggregate | log_and_continue",
                other
            ),
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        match self {
            ErrorPolicyMode::Aggregate => ErrorPolicy::aggregate(),
            ErrorPolicyMode::LogAndContinue => ErrorPolicy::log_and_continue(),
        }
    }
}

/// Typed view of the merged configuration.
///
/// Reads:
/// - `/prune/dry_run`       bool, default `false`
/// - `/prune/error_policy`  `aggregate` | `log_and_continue`, default `aggregate`
/// - `/logging/filter`      tracing `EnvFilter` directive, default `info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneSettings {
    pub dry_run: bool,
    pub error_policy: ErrorPolicyMode,
    pub log_filter: String,
}

impl Default for PruneSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            error_policy: ErrorPolicyMode::Aggregate,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl PruneSettings {
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let mut settings = PruneSettings::default();

        match cfg.pointer("/prune/dry_run") {
            None | Some(Value::Null) => {}
            Some(Value::Bool(b)) => settings.dry_run = *b,
            Some(other) => bail!("CONFIG_INVALID: prune.dry_run must be a bool, got {other}"),
        }

        match cfg.pointer("/prune/error_policy") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => settings.error_policy = ErrorPolicyMode::parse(s)?,
            Some(other) => {
                bail!("CONFIG_INVALID: prune.error_policy must be a string, got {other}")
            }
        }

        match cfg.pointer("/logging/filter") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if !s.trim().is_empty() => {
                settings.log_filter = s.trim().to_string()
            }
            Some(other) => {
                bail!("CONFIG_INVALID: logging.filter must be a non-empty string, got {other}")
            }
        }

        Ok(settings)
    }

    pub fn to_options(&self) -> PruneOptions {
        PruneOptions::new()
            .with_dry_run(self.dry_run)
            .with_error_policy(self.error_policy.policy())
    }
}

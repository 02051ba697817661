// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The validated, immutable configuration handle threaded through
/// `build_engine` and `Attachments::process` (§6, §9 "No mutable
/// globals"). Every field has a default, so `AppConfig::default()` is a
/// fully usable configuration on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Repository/response probe budget in bytes before a LOAD degrades
    /// to `SizeBudgetExceeded` (§5, §7). `[budget:force]` on the DSL
    /// overrides this per-source.
    pub size_budget_bytes: u64,

    /// Default character count a truncation REFINE handler trims to when
    /// the DSL doesn't specify one (§9 Open Questions - resolved in
    /// `DESIGN.md` as 5000, matching the source's own constant - §9 only
    /// objects to it being non-configurable, not to its value).
    pub truncation_chars: usize,

    /// Directory (or `PATH`-style, OS-separator-joined list of files) of
    /// `cdylib` plugins to discover at startup (§6 "Environment inputs").
    /// `None` disables plugin discovery entirely.
    pub plugin_dir: Option<String>,

    /// Minimum `tracing` level: `trace`/`debug`/`info`/`warn`/`error`.
    pub log_level: String,

    /// `ATTACHMENTS_LOG_FORMAT` - `"pretty"` (default, human-readable to
    /// stderr) or `"json"` (§6 "Logging output").
    pub log_format: String,

    /// Gates `rayon`-parallel execution across independent sources in the
    /// high-level API (§5). Off by default: the registry is read-only
    /// after construction either way, but sequential execution keeps
    /// `pipeline_trace` ordering trivially reproducible for callers who
    /// haven't opted in.
    pub parallel: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            size_budget_bytes: 100 * 1024 * 1024,
            truncation_chars: 5000,
            plugin_dir: None,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            parallel: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl AppConfig {
    /// Loads configuration the way §6 describes: an optional file (named
    /// by `ATTACHMENTS_CONFIG`, defaulting to `attachments.toml` in the
    /// current directory) layered under `ATTACHMENTS_*` environment
    /// variables, falling back to `AppConfig::default()` for anything
    /// neither source sets.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("ATTACHMENTS_CONFIG").unwrap_or_else(|_| "attachments.toml".to_string());
        let defaults = AppConfig::default();
        let built = config::Config::builder()
            .set_default("size_budget_bytes", defaults.size_budget_bytes)?
            .set_default("truncation_chars", defaults.truncation_chars as i64)?
            .set_default("log_level", defaults.log_level.clone())?
            .set_default("log_format", defaults.log_format.clone())?
            .set_default("parallel", defaults.parallel)?
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("ATTACHMENTS").try_parsing(true))
            .build()?;
        Ok(built.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let config = AppConfig::default();
        assert!(config.size_budget_bytes > 0);
        assert!(config.truncation_chars > 0);
        assert!(config.plugin_dir.is_none());
    }

    #[test]
    fn load_without_file_or_env_falls_back_to_defaults() {
        // SAFETY: test-only, single-threaded access to process env within
        // this test body; no other test in this module touches these keys.
        unsafe {
            std::env::remove_var("ATTACHMENTS_CONFIG");
        }
        let loaded = AppConfig::load().unwrap();
        assert_eq!(loaded, AppConfig::default());
    }
}

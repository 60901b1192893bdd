//! Pruner configuration stored in `pruner.toml` at the repository root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

/// File name looked up in the repository root.
pub const CONFIG_FILE_NAME: &str = "pruner.toml";

/// Pruner configuration (TOML).
///
/// Every field is optional in the file; missing fields take the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PrunerConfig {
    /// Minimum log level: `trace`, `debug`, `info`, `warn`, `error` or `off`.
    pub log_level: String,

    /// External manifest, relative to the repository root. The built-in
    /// manifest is used when unset.
    pub manifest: Option<PathBuf>,
}

impl Default for PrunerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            manifest: None,
        }
    }
}

impl PrunerConfig {
    pub fn validate(&self) -> Result<()> {
        self.level_filter()?;
        if self
            .manifest
            .as_ref()
            .is_some_and(|manifest| manifest.as_os_str().is_empty())
        {
            return Err(anyhow!("manifest must be a non-empty path"));
        }
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        parse_level(&self.log_level)
    }
}

/// Parse a log level name (case-insensitive).
pub fn parse_level(name: &str) -> Result<LevelFilter> {
    name.trim()
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("unknown log level {name:?} (expected trace, debug, info, warn, error or off)"))
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PrunerConfig::default()`.
pub fn load_config(path: &Path) -> Result<PrunerConfig> {
    if !path.exists() {
        return Ok(PrunerConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PrunerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

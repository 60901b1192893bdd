//! Orchestration for exporting a repository: resolve settings, then run or
//! plan the manifest against the tree on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::core::manifest::{Manifest, canonical_manifest};
use crate::core::types::{PlannedStep, RunSummary};
use crate::engine::Engine;
use crate::io::config::{CONFIG_FILE_NAME, load_config, parse_level};
use crate::io::fs::DiskFs;
use crate::io::manifest_store::load_manifest;
use crate::logging::LogConfig;

/// Command-line overrides applied on top of `pruner.toml`.
#[derive(Debug, Clone, Default)]
pub struct ExportOverrides {
    /// Manifest file, relative to the current directory.
    pub manifest: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Everything a run needs, resolved from config and overrides.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub root: PathBuf,
    pub manifest: Manifest,
    pub log: LogConfig,
}

/// Resolve settings for the repository at `root`.
///
/// Precedence: command-line overrides, then `pruner.toml`, then built-in
/// defaults (canonical manifest, `info` logging).
pub fn resolve_settings(root: &Path, overrides: &ExportOverrides) -> Result<ExportSettings> {
    if !root.is_dir() {
        bail!("repository root {} is not a directory", root.display());
    }
    let config = load_config(&root.join(CONFIG_FILE_NAME))?;

    let level = overrides.log_level.as_deref().unwrap_or(&config.log_level);
    let log = LogConfig::new(parse_level(level)?);

    let manifest_path = match (&overrides.manifest, &config.manifest) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(path)) => Some(root.join(path)),
        (None, None) => None,
    };
    let manifest = match manifest_path {
        Some(path) => {
            debug!(path = %path.display(), "using external manifest");
            load_manifest(&path)?
        }
        None => {
            debug!("using canonical manifest");
            canonical_manifest()
        }
    };

    Ok(ExportSettings {
        root: root.to_path_buf(),
        manifest,
        log,
    })
}

/// Apply the manifest to the tree on disk.
pub fn run_export(settings: &ExportSettings) -> Result<RunSummary> {
    let engine = Engine::new(DiskFs::new(&settings.root), settings.log);
    engine
        .run(&settings.manifest)
        .with_context(|| format!("prune {}", settings.root.display()))
}

/// Describe the run without touching the tree.
pub fn plan_export(settings: &ExportSettings) -> Result<Vec<PlannedStep>> {
    let engine = Engine::new(DiskFs::new(&settings.root), settings.log);
    engine.plan(&settings.manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::{RemovalEntry, RemovalGroup};
    use crate::io::manifest_store::write_manifest;
    use crate::test_support::TestTree;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn defaults_to_canonical_manifest() {
        let tree = TestTree::new().expect("tree");
        let settings = resolve_settings(tree.path(), &ExportOverrides::default()).expect("resolve");
        assert_eq!(settings.manifest, canonical_manifest());
        assert_eq!(settings.log, LogConfig::default());
    }

    #[test]
    fn config_manifest_is_relative_to_root() {
        let tree = TestTree::new().expect("tree");
        let manifest = Manifest {
            groups: vec![RemovalGroup::new("scratch", vec![RemovalEntry::tree("scratch")])],
            substitutions: Vec::new(),
        };
        tree.mkdir("release").expect("mkdir");
        write_manifest(&tree.path().join("release/manifest.toml"), &manifest).expect("write");
        tree.write(
            "pruner.toml",
            "log_level = \"debug\"\nmanifest = \"release/manifest.toml\"\n",
        )
        .expect("write config");

        let settings = resolve_settings(tree.path(), &ExportOverrides::default()).expect("resolve");
        assert_eq!(settings.manifest, manifest);
        assert_eq!(settings.log.minimum_level, LevelFilter::DEBUG);
    }

    #[test]
    fn overrides_beat_config() {
        let tree = TestTree::new().expect("tree");
        tree.write("pruner.toml", "log_level = \"debug\"\n").expect("write config");
        let overrides = ExportOverrides {
            manifest: None,
            log_level: Some("warn".to_string()),
        };

        let settings = resolve_settings(tree.path(), &overrides).expect("resolve");
        assert_eq!(settings.log.minimum_level, LevelFilter::WARN);
    }

    #[test]
    fn missing_root_is_rejected() {
        let tree = TestTree::new().expect("tree");
        let err = resolve_settings(&tree.path().join("nope"), &ExportOverrides::default())
            .expect_err("missing root");
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn run_export_prunes_seeded_repo() {
        let tree = TestTree::new().expect("tree");
        tree.seed_proof_repo().expect("seed");
        let settings = resolve_settings(tree.path(), &ExportOverrides::default()).expect("resolve");

        let summary = run_export(&settings).expect("run");
        assert_eq!(summary.substituted, 1);
        assert_eq!(summary.removed, 9);
        assert_eq!(summary.not_found, 1);
        assert_eq!(tree.read("CMakeLists.txt").expect("read"), "NEW");
        assert!(tree.exists("src/tools/gain_map.hpp"));
        assert!(!tree.exists("src/tools/plotting"));
    }
}

//! The pruning engine.
//!
//! Applies a [`Manifest`] to a repository tree through a [`FileSystem`]:
//! every removal entry in order, then every substitution. Each operation is
//! idempotent, so a run that aborted part way converges to the same final
//! tree when simply run again. There is no rollback: the first error aborts
//! the run and leaves earlier entries applied.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::Level;

use crate::core::manifest::{Manifest, RemovalEntry};
use crate::core::path::{to_native, validate_relative};
use crate::core::types::{PlannedAction, PlannedStep, Presence, RunSummary};
use crate::io::fs::FileSystem;
use crate::logging::LogConfig;

/// Emit a tracing event only when the engine's [`LogConfig`] allows `$level`.
macro_rules! log_at {
    ($config:expr, $level:expr, $($arg:tt)+) => {
        if $config.enables($level) {
            tracing::event!($level, $($arg)+);
        }
    };
}

/// Stateless pruning engine over a filesystem capability.
#[derive(Debug, Clone)]
pub struct Engine<F> {
    fs: F,
    log: LogConfig,
}

impl<F: FileSystem> Engine<F> {
    pub fn new(fs: F, log: LogConfig) -> Self {
        Self { fs, log }
    }

    /// Delete the file at `path` if present. An absent path is a no-op.
    pub fn remove_file(&self, path: &str) -> Result<Presence> {
        self.remove(path, "file", |fs, native| fs.remove_file(native))
    }

    /// Delete the directory subtree at `path` if present. An absent path is a
    /// no-op.
    pub fn remove_tree(&self, path: &str) -> Result<Presence> {
        self.remove(path, "tree", |fs, native| fs.remove_tree(native))
    }

    /// Replace `target` with a byte copy of `source`.
    ///
    /// A missing `source` is a configuration error and is reported before
    /// `target` is touched.
    pub fn substitute_config(&self, target: &str, source: &str) -> Result<()> {
        validate_relative(target).context("substitution target")?;
        validate_relative(source).context("substitution source")?;
        if target == source {
            bail!("substitution target and source are both {target}");
        }
        let source_native = to_native(source);
        if !self
            .fs
            .exists(&source_native)
            .with_context(|| format!("check {source}"))?
        {
            bail!("substitution source {source} not found (needed to replace {target})");
        }

        self.remove_file(target)?;

        log_at!(self.log, Level::DEBUG, path = target, "Copying {source} to {target}...");
        self.fs
            .copy(&source_native, &to_native(target))
            .with_context(|| format!("copy {source} to {target}"))?;
        log_at!(self.log, Level::DEBUG, path = target, "Ok.");
        Ok(())
    }

    /// Apply every removal entry, then every substitution, in manifest order.
    ///
    /// Fails fast: on the first error the remaining steps are not attempted.
    pub fn run(&self, manifest: &Manifest) -> Result<RunSummary> {
        manifest.validate().context("invalid manifest")?;
        let mut summary = RunSummary::default();

        for group in &manifest.groups {
            log_at!(self.log, Level::INFO, "Removing {}...", group.category);
            for entry in &group.entries {
                let presence = self
                    .apply(entry)
                    .with_context(|| format!("removing {}", group.category))?;
                summary.record(presence);
            }
        }

        for substitution in &manifest.substitutions {
            log_at!(
                self.log,
                Level::INFO,
                "Replacing {} with {}...",
                substitution.target,
                substitution.source
            );
            self.substitute_config(&substitution.target, &substitution.source)?;
            summary.substituted += 1;
        }

        log_at!(
            self.log,
            Level::INFO,
            removed = summary.removed,
            not_found = summary.not_found,
            substituted = summary.substituted,
            "Done."
        );
        Ok(summary)
    }

    /// Describe what [`Engine::run`] would do without touching the tree.
    ///
    /// Missing substitution sources fail here exactly as they would in a run.
    pub fn plan(&self, manifest: &Manifest) -> Result<Vec<PlannedStep>> {
        manifest.validate().context("invalid manifest")?;
        let mut steps = Vec::new();

        for group in &manifest.groups {
            for entry in &group.entries {
                let action = match entry {
                    RemovalEntry::File { .. } => PlannedAction::RemoveFile,
                    RemovalEntry::Tree { .. } => PlannedAction::RemoveTree,
                };
                steps.push(PlannedStep {
                    category: group.category.clone(),
                    action,
                    path: entry.path().to_string(),
                    present: self.exists(entry.path())?,
                    source: None,
                });
            }
        }

        for substitution in &manifest.substitutions {
            if !self.exists(&substitution.source)? {
                bail!(
                    "substitution source {} not found (needed to replace {})",
                    substitution.source,
                    substitution.target
                );
            }
            steps.push(PlannedStep {
                category: format!("replace {}", substitution.target),
                action: PlannedAction::Substitute,
                path: substitution.target.clone(),
                present: self.exists(&substitution.target)?,
                source: Some(substitution.source.clone()),
            });
        }

        Ok(steps)
    }

    fn apply(&self, entry: &RemovalEntry) -> Result<Presence> {
        match entry {
            RemovalEntry::File { path } => self.remove_file(path),
            RemovalEntry::Tree { path } => self.remove_tree(path),
        }
    }

    fn exists(&self, path: &str) -> Result<bool> {
        self.fs
            .exists(&to_native(path))
            .with_context(|| format!("check {path}"))
    }

    fn remove(
        &self,
        path: &str,
        kind: &str,
        op: impl FnOnce(&F, &Path) -> Result<()>,
    ) -> Result<Presence> {
        validate_relative(path)?;
        log_at!(self.log, Level::DEBUG, path, "Removing {kind} {path}...");

        let native = to_native(path);
        let presence = if self.exists(path)? {
            op(&self.fs, &native).with_context(|| format!("remove {kind} {path}"))?;
            Presence::Removed
        } else {
            Presence::NotFound
        };

        log_at!(self.log, Level::DEBUG, path, "{}", presence.marker());
        Ok(presence)
    }
}

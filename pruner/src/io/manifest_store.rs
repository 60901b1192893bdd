//! Manifest load/save helpers (TOML) with validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::manifest::Manifest;

/// Load and validate a manifest from a TOML file.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    debug!(path = %path.display(), "loading manifest");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read manifest {}", path.display()))?;
    parse_manifest(&contents).with_context(|| format!("load manifest {}", path.display()))
}

/// Parse and validate a manifest from TOML text.
pub fn parse_manifest(contents: &str) -> Result<Manifest> {
    let manifest: Manifest = toml::from_str(contents).context("parse manifest toml")?;
    manifest.validate()?;
    debug!(
        groups = manifest.groups.len(),
        entries = manifest.entries().count(),
        substitutions = manifest.substitutions.len(),
        "manifest parsed"
    );
    Ok(manifest)
}

/// Render a manifest as pretty TOML with a trailing newline.
pub fn render_manifest(manifest: &Manifest) -> Result<String> {
    manifest.validate()?;
    let mut buf = toml::to_string_pretty(manifest).context("serialize manifest toml")?;
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
    Ok(buf)
}

/// Validate and write a manifest to disk.
pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    let buf = render_manifest(manifest)?;
    fs::write(path, buf).with_context(|| format!("write manifest {}", path.display()))
}

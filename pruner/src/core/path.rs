//! Helpers for validating and resolving repository-relative manifest paths.
//!
//! Manifest paths are always `/`-separated and relative to the repository
//! root, independent of the host platform.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Reject paths that are empty, absolute, or escape the repository root.
pub fn validate_relative(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        bail!("path must be non-empty");
    }
    if path.contains('\\') {
        bail!("path {path:?} must use '/' separators");
    }
    if path.starts_with('/') || Path::new(path).has_root() || Path::new(path).is_absolute() {
        bail!("path {path:?} must be relative to the repository root");
    }
    for component in path.split('/') {
        match component {
            "" => bail!("path {path:?} contains an empty component"),
            "." | ".." => bail!("path {path:?} must not contain {component:?} components"),
            _ => {}
        }
    }
    Ok(())
}

/// Convert a validated `/`-separated path into a native relative path.
pub fn to_native(path: &str) -> PathBuf {
    path.split('/').collect()
}

//! Filesystem capability used by the pruning engine.
//!
//! The engine only needs four primitives, so it depends on the narrow
//! [`FileSystem`] trait instead of `std::fs` directly. [`DiskFs`] is the real
//! adapter; tests substitute an in-memory fake.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Filesystem primitives over paths relative to a repository root.
pub trait FileSystem {
    /// Whether any entry (file, directory or symlink) exists at `path`.
    fn exists(&self, path: &Path) -> Result<bool>;
    /// Delete a single non-directory entry.
    fn remove_file(&self, path: &Path) -> Result<()>;
    /// Delete a directory and everything below it.
    fn remove_tree(&self, path: &Path) -> Result<()>;
    /// Copy the bytes of `source` to `target`, overwriting `target`.
    fn copy(&self, source: &Path, target: &Path) -> Result<()>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn exists(&self, path: &Path) -> Result<bool> {
        (**self).exists(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        (**self).remove_file(path)
    }

    fn remove_tree(&self, path: &Path) -> Result<()> {
        (**self).remove_tree(path)
    }

    fn copy(&self, source: &Path, target: &Path) -> Result<()> {
        (**self).copy(source, target)
    }
}

/// [`FileSystem`] backed by the real disk, rooted at a repository directory.
#[derive(Debug, Clone)]
pub struct DiskFs {
    root: PathBuf,
}

impl DiskFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl FileSystem for DiskFs {
    fn exists(&self, path: &Path) -> Result<bool> {
        let full = self.resolve(path);
        // Symlinks are not followed: a dangling link still counts as present.
        match fs::symlink_metadata(&full) {
            Ok(_) => Ok(true),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                Ok(false)
            }
            Err(err) => Err(err).with_context(|| format!("stat {}", full.display())),
        }
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let full = self.resolve(path);
        fs::remove_file(&full).with_context(|| format!("remove file {}", full.display()))
    }

    fn remove_tree(&self, path: &Path) -> Result<()> {
        let full = self.resolve(path);
        match fs::remove_dir_all(&full) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                debug!(path = %full.display(), "granting owner access before retry");
                make_writable(&full)?;
                fs::remove_dir_all(&full)
                    .with_context(|| format!("remove tree {}", full.display()))
            }
            Err(err) => Err(err).with_context(|| format!("remove tree {}", full.display())),
        }
    }

    fn copy(&self, source: &Path, target: &Path) -> Result<()> {
        let source = self.resolve(source);
        let target = self.resolve(target);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::copy(&source, &target).with_context(|| {
            format!("copy {} to {}", source.display(), target.display())
        })?;
        Ok(())
    }
}

/// Recursively grant the owner access so `remove_dir_all` can proceed.
///
/// Directories get owner `rwx` before they are listed, so unreadable
/// directories can still be walked; files get owner write. Symlinks are left
/// alone.
fn make_writable(path: &Path) -> Result<()> {
    let metadata =
        fs::symlink_metadata(path).with_context(|| format!("stat {}", path.display()))?;
    if metadata.file_type().is_symlink() {
        return Ok(());
    }
    grant_owner_access(path, &metadata)?;
    if metadata.is_dir() {
        for entry in fs::read_dir(path).with_context(|| format!("read {}", path.display()))? {
            let entry = entry.with_context(|| format!("read entry in {}", path.display()))?;
            make_writable(&entry.path())?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn grant_owner_access(path: &Path, metadata: &fs::Metadata) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let wanted = if metadata.is_dir() { 0o700 } else { 0o200 };
    let mut permissions = metadata.permissions();
    let mode = permissions.mode();
    if mode & wanted != wanted {
        permissions.set_mode(mode | wanted);
        fs::set_permissions(path, permissions)
            .with_context(|| format!("make writable {}", path.display()))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn grant_owner_access(path: &Path, metadata: &fs::Metadata) -> Result<()> {
    let mut permissions = metadata.permissions();
    if permissions.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        fs::set_permissions(path, permissions)
            .with_context(|| format!("make writable {}", path.display()))?;
    }
    Ok(())
}

//! Test-only filesystems: an in-memory fake and a temporary on-disk tree.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::core::path::to_native;
use crate::io::fs::FileSystem;

/// A node in [`MemoryFs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryEntry {
    File(Vec<u8>),
    Dir,
}

/// In-memory [`FileSystem`] with failure injection and an operation log.
///
/// Paths passed to the helpers are `/`-separated; parent directories are
/// created implicitly.
#[derive(Debug, Default)]
pub struct MemoryFs {
    entries: RefCell<BTreeMap<PathBuf, MemoryEntry>>,
    failing: RefCell<BTreeSet<PathBuf>>,
    operations: RefCell<Vec<String>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: &str, contents: impl AsRef<[u8]>) {
        let native = to_native(path);
        self.add_parents(&native);
        self.entries
            .borrow_mut()
            .insert(native, MemoryEntry::File(contents.as_ref().to_vec()));
    }

    pub fn add_dir(&self, path: &str) {
        let native = to_native(path);
        self.add_parents(&native);
        self.entries.borrow_mut().insert(native, MemoryEntry::Dir);
    }

    /// Make any removal of `path` fail, as if permission were denied.
    pub fn fail_removal_of(&self, path: &str) {
        self.failing.borrow_mut().insert(to_native(path));
    }

    pub fn clear_failures(&self) {
        self.failing.borrow_mut().clear();
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.borrow().contains_key(&to_native(path))
    }

    /// File contents at `path`, or `None` for directories and missing paths.
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        match self.entries.borrow().get(&to_native(path)) {
            Some(MemoryEntry::File(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> BTreeMap<PathBuf, MemoryEntry> {
        self.entries.borrow().clone()
    }

    /// Mutating operations attempted so far, e.g. `remove_tree src/plot_1`.
    pub fn operations(&self) -> Vec<String> {
        self.operations.borrow().clone()
    }

    fn add_parents(&self, path: &Path) {
        let mut entries = self.entries.borrow_mut();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(MemoryEntry::Dir);
        }
    }

    fn record(&self, operation: &str, path: &Path) -> Result<()> {
        self.operations
            .borrow_mut()
            .push(format!("{operation} {}", display(path)));
        if self.failing.borrow().contains(path) {
            bail!("permission denied: {}", display(path));
        }
        Ok(())
    }
}

impl FileSystem for MemoryFs {
    fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self.entries.borrow().contains_key(path))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.record("remove_file", path)?;
        let mut entries = self.entries.borrow_mut();
        match entries.get(path) {
            Some(MemoryEntry::File(_)) => {
                entries.remove(path);
                Ok(())
            }
            Some(MemoryEntry::Dir) => bail!("is a directory: {}", display(path)),
            None => bail!("no such file: {}", display(path)),
        }
    }

    fn remove_tree(&self, path: &Path) -> Result<()> {
        self.record("remove_tree", path)?;
        let mut entries = self.entries.borrow_mut();
        match entries.get(path) {
            Some(MemoryEntry::Dir) => {
                entries.retain(|key, _| !key.starts_with(path));
                Ok(())
            }
            Some(MemoryEntry::File(_)) => bail!("not a directory: {}", display(path)),
            None => bail!("no such directory: {}", display(path)),
        }
    }

    fn copy(&self, source: &Path, target: &Path) -> Result<()> {
        self.operations
            .borrow_mut()
            .push(format!("copy {} {}", display(source), display(target)));
        let bytes = match self.entries.borrow().get(source) {
            Some(MemoryEntry::File(bytes)) => bytes.clone(),
            Some(MemoryEntry::Dir) => bail!("is a directory: {}", display(source)),
            None => bail!("no such file: {}", display(source)),
        };
        if matches!(self.entries.borrow().get(target), Some(MemoryEntry::Dir)) {
            bail!("is a directory: {}", display(target));
        }
        self.add_parents(target);
        self.entries
            .borrow_mut()
            .insert(target.to_path_buf(), MemoryEntry::File(bytes));
        Ok(())
    }
}

fn display(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Temporary on-disk repository tree.
pub struct TestTree {
    temp: tempfile::TempDir,
}

impl TestTree {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        Ok(Self { temp })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write `contents` at the `/`-separated `rel` path, creating parents.
    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.path().join(to_native(rel));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    pub fn mkdir(&self, rel: &str) -> Result<()> {
        let path = self.path().join(to_native(rel));
        fs::create_dir_all(&path).with_context(|| format!("create directory {}", path.display()))
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        let path = self.path().join(to_native(rel));
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    pub fn exists(&self, rel: &str) -> bool {
        fs::symlink_metadata(self.path().join(to_native(rel))).is_ok()
    }

    /// Every entry below the root keyed by `/`-separated path; directories map
    /// to `None`, files to their bytes.
    pub fn snapshot(&self) -> Result<BTreeMap<String, Option<Vec<u8>>>> {
        let mut out = BTreeMap::new();
        snapshot_into(self.path(), self.path(), &mut out)?;
        Ok(out)
    }

    /// Seed the layout of a proof repository before export.
    pub fn seed_proof_repo(&self) -> Result<()> {
        self.write("CMakeLists.txt", "OLD")?;
        self.write("CMakeLists.proof_only.txt", "NEW")?;
        self.write("src/main.cpp", "int main() {}")?;
        self.write("src/capd_renderable.hpp", "#pragma once")?;
        self.write("src/plot_common/window_properties.hpp", "plot")?;
        self.write("src/plot_1/objects/interp.hpp", "plot")?;
        self.write("src/plot_2/gpg_plot.cpp", "plot")?;
        self.write("src/tools/plotting/solution_curve_interpolation.hpp", "plot")?;
        self.write("src/tools/gain_map.hpp", "keep")?;
        self.write("src/pcr3bp_obsolete/pcr3bp_reg_params.hpp", "old")?;
        self.write("src/pcr3bp_basic_test/standard_system_test.cpp", "test")?;
        self.write("src/pcr3bp_basic/standard_system.hpp", "keep")?;
        self.write("src/proof/homoclinic_orbit_origins_initial_test.cpp", "test")?;
        self.write("src/proof/g_map.hpp", "keep")?;
        Ok(())
    }
}

fn snapshot_into(
    root: &Path,
    dir: &Path,
    out: &mut BTreeMap<String, Option<Vec<u8>>>,
) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.context("read entry")?;
        let path = entry.path();
        let rel = display(path.strip_prefix(root).context("strip root")?);
        if entry.file_type().context("file type")?.is_dir() {
            out.insert(rel, None);
            snapshot_into(root, &path, out)?;
        } else {
            let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
            out.insert(rel, Some(bytes));
        }
    }
    Ok(())
}

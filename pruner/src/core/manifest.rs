//! Removal manifest data model.
//!
//! A manifest is pure data: ordered groups of removal entries followed by
//! configuration substitutions. Entry order only affects log readability;
//! entries are expected to be independent (no entry is an ancestor of
//! another), which the manifest author must preserve.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::path::validate_relative;

/// Build descriptor replaced at the end of every canonical run.
pub const BUILD_DESCRIPTOR: &str = "CMakeLists.txt";
/// Pre-authored build descriptor matching the pruned tree.
pub const PROOF_ONLY_DESCRIPTOR: &str = "CMakeLists.proof_only.txt";

/// A single path to remove, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemovalEntry {
    /// Delete a single file if present.
    File { path: String },
    /// Delete a directory subtree recursively if present.
    Tree { path: String },
}

impl RemovalEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self::File { path: path.into() }
    }

    pub fn tree(path: impl Into<String>) -> Self {
        Self::Tree { path: path.into() }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::File { path } | Self::Tree { path } => path,
        }
    }
}

/// Entries sharing a category, logged together as one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalGroup {
    /// Human-readable description, e.g. `plotting related code`.
    pub category: String,
    #[serde(default)]
    pub entries: Vec<RemovalEntry>,
}

impl RemovalGroup {
    pub fn new(category: impl Into<String>, entries: Vec<RemovalEntry>) -> Self {
        Self {
            category: category.into(),
            entries,
        }
    }
}

/// Delete `target` if present, then copy `source` to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub target: String,
    pub source: String,
}

impl Substitution {
    pub fn new(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
        }
    }
}

/// Ordered removal groups followed by ordered substitutions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub groups: Vec<RemovalGroup>,
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

impl Manifest {
    /// All removal entries in manifest order.
    pub fn entries(&self) -> impl Iterator<Item = &RemovalEntry> {
        self.groups.iter().flat_map(|group| group.entries.iter())
    }

    /// Check every path is a well-formed repository-relative path.
    ///
    /// Ancestor/descendant overlap between entries is not checked.
    pub fn validate(&self) -> Result<()> {
        for (group_index, group) in self.groups.iter().enumerate() {
            if group.category.trim().is_empty() {
                bail!("groups[{group_index}].category must be non-empty");
            }
            for (entry_index, entry) in group.entries.iter().enumerate() {
                validate_relative(entry.path()).with_context(|| {
                    format!("groups[{group_index}].entries[{entry_index}] invalid")
                })?;
            }
        }
        for (index, substitution) in self.substitutions.iter().enumerate() {
            validate_relative(&substitution.target)
                .with_context(|| format!("substitutions[{index}].target invalid"))?;
            validate_relative(&substitution.source)
                .with_context(|| format!("substitutions[{index}].source invalid"))?;
            if substitution.target == substitution.source {
                bail!("substitutions[{index}] target and source must differ");
            }
        }
        Ok(())
    }
}

/// The manifest used when no external manifest is configured.
///
/// Strips plotting, obsolete and exploratory test code from the proof
/// repository and swaps in the proof-only build descriptor.
pub fn canonical_manifest() -> Manifest {
    Manifest {
        groups: vec![
            RemovalGroup::new(
                "plotting related code",
                vec![
                    RemovalEntry::tree("src/plot_common"),
                    RemovalEntry::tree("src/plot_1"),
                    RemovalEntry::tree("src/plot_2"),
                    RemovalEntry::tree("src/bluesky"),
                    RemovalEntry::tree("src/tools/plotting"),
                    RemovalEntry::file("src/main.cpp"),
                    RemovalEntry::file("src/capd_renderable.hpp"),
                ],
            ),
            RemovalGroup::new(
                "obsolete code",
                vec![RemovalEntry::tree("src/pcr3bp_obsolete")],
            ),
            RemovalGroup::new(
                "basic test code",
                vec![RemovalEntry::tree("src/pcr3bp_basic_test")],
            ),
            RemovalGroup::new(
                "homoclinic initial test",
                vec![RemovalEntry::file(
                    "src/proof/homoclinic_orbit_origins_initial_test.cpp",
                )],
            ),
        ],
        substitutions: vec![Substitution::new(BUILD_DESCRIPTOR, PROOF_ONLY_DESCRIPTOR)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_manifest_is_valid() {
        canonical_manifest().validate().expect("canonical manifest valid");
    }

    /// No canonical entry may contain another; entries must commute.
    #[test]
    fn canonical_entries_are_independent() {
        let manifest = canonical_manifest();
        let paths: Vec<&str> = manifest.entries().map(RemovalEntry::path).collect();
        for (i, left) in paths.iter().enumerate() {
            for right in &paths[i + 1..] {
                assert_ne!(left, right);
                assert!(!right.starts_with(&format!("{left}/")), "{left} contains {right}");
                assert!(!left.starts_with(&format!("{right}/")), "{right} contains {left}");
            }
        }
    }

    #[test]
    fn entries_flatten_groups_in_order() {
        let manifest = Manifest {
            groups: vec![
                RemovalGroup::new("a", vec![RemovalEntry::tree("x"), RemovalEntry::file("y")]),
                RemovalGroup::new("b", vec![RemovalEntry::file("z")]),
            ],
            substitutions: Vec::new(),
        };
        let paths: Vec<&str> = manifest.entries().map(RemovalEntry::path).collect();
        assert_eq!(paths, vec!["x", "y", "z"]);
    }

    #[test]
    fn validate_reports_entry_position() {
        let manifest = Manifest {
            groups: vec![RemovalGroup::new(
                "bad",
                vec![RemovalEntry::file("ok"), RemovalEntry::tree("../escape")],
            )],
            substitutions: Vec::new(),
        };
        let err = manifest.validate().expect_err("invalid path");
        assert!(format!("{err:#}").contains("groups[0].entries[1]"));
    }

    #[test]
    fn validate_rejects_self_substitution() {
        let manifest = Manifest {
            groups: Vec::new(),
            substitutions: vec![Substitution::new("CMakeLists.txt", "CMakeLists.txt")],
        };
        let err = manifest.validate().expect_err("self substitution");
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn validate_rejects_blank_category() {
        let manifest = Manifest {
            groups: vec![RemovalGroup::new(" ", Vec::new())],
            substitutions: Vec::new(),
        };
        assert!(manifest.validate().is_err());
    }
}

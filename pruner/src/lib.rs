//! Manifest-driven pruning of a repository tree for external release.
//!
//! Given a source tree that mixes publishable proof code with scaffolding,
//! the pruner removes the paths listed in a removal manifest and swaps in a
//! replacement build descriptor. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic data (manifest, paths, result types).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations behind the narrow
//!   [`io::fs::FileSystem`] capability, plus config and manifest files.
//!
//! The [`engine`] applies a manifest through a filesystem; [`export`] wires
//! configuration, manifest and disk together for the CLI.

pub mod core;
pub mod engine;
pub mod exit_codes;
pub mod export;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

//! I/O helpers for pruner commands.

pub mod config;
pub mod fs;
pub mod manifest_store;

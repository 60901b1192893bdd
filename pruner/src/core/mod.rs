//! Deterministic, pure logic shared by the pruner.
//!
//! Core modules must be free of I/O side effects. They describe what a run
//! should do; the [`crate::engine`] applies it through [`crate::io::fs`].

pub mod manifest;
pub mod path;
pub mod types;

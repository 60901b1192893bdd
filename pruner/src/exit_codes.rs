//! Stable exit codes for the pruner CLI.

/// Every manifest step was applied (or planned) successfully.
pub const OK: i32 = 0;
/// The run aborted on the first error; earlier steps remain applied.
pub const FAILED: i32 = 1;

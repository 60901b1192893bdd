//! Shared deterministic types for pruning results.

use serde::Serialize;

/// What a removal found at its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// The entry existed and was deleted.
    Removed,
    /// Nothing existed at the path; the removal was a no-op.
    NotFound,
}

impl Presence {
    /// Result marker logged after each removal.
    pub fn marker(self) -> &'static str {
        match self {
            Presence::Removed => "Ok.",
            Presence::NotFound => "Not found.",
        }
    }
}

/// Counters for a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub removed: usize,
    pub not_found: usize,
    pub substituted: usize,
}

impl RunSummary {
    pub fn record(&mut self, presence: Presence) {
        match presence {
            Presence::Removed => self.removed += 1,
            Presence::NotFound => self.not_found += 1,
        }
    }
}

/// Action a manifest step would perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedAction {
    RemoveFile,
    RemoveTree,
    Substitute,
}

/// One step of a dry run: what would happen at `path` and whether it exists now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    pub category: String,
    pub action: PlannedAction,
    pub path: String,
    pub present: bool,
    /// Substitution source, for `Substitute` steps only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

use serde::{Deserialize, Serialize};
use crate::models::EntryError;

/// One named payload inside an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path-like name, unique within the archive
    pub name: String,
    pub payload: Vec<u8>,
    /// Directory entries carry no payload and are never converted
    pub is_dir: bool,
}

impl ArchiveEntry {
    pub fn file(name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload,
            is_dir: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Vec::new(),
            is_dir: true,
        }
    }
}

/// Phase reported for the entry currently being handled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EntryPhase {
    Processing,
    Converting,
    Skipped,
    Failed,
}

/// Progress update emitted once per entry transition
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSignal {
    pub completed_count: usize,
    pub total_count: usize,
    pub current_entry_name: String,
    pub current_entry_phase: EntryPhase,
}

impl ProgressSignal {
    /// Completed share of the image entries (0.0 - 1.0)
    pub fn fraction(&self) -> f32 {
        if self.total_count == 0 {
            return 0.0;
        }
        self.completed_count as f32 / self.total_count as f32
    }
}

/// Running tally for one conversion batch.
///
/// `converted` counts every image entry that finished, including
/// already-in-target skips and failures; only `failed` tells real
/// failures apart.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub converted: usize,
    pub skipped: usize,
    pub failed: Vec<String>,
}

impl Report {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Non-image entry passed through untouched
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Image entry converted, or already in the target format
    pub fn record_converted(&mut self) {
        self.converted += 1;
    }

    /// Image entry failed. Still counts toward `converted`.
    pub fn record_failed(&mut self, entry_name: &str) {
        self.converted += 1;
        self.failed.push(entry_name.to_string());
    }

    /// Entries of every kind that have been settled
    pub fn total_completed(&self) -> usize {
        self.converted + self.skipped
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Result of converting one entry
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    /// Replacement entry (renamed to the target extension)
    Converted(ArchiveEntry),
    SkippedAlreadyTarget,
    SkippedNotImage,
    Failed(EntryError),
}

impl ConversionOutcome {
    /// Phase reported once the outcome is known
    pub fn phase(&self) -> EntryPhase {
        match self {
            ConversionOutcome::Converted(_) => EntryPhase::Converting,
            ConversionOutcome::SkippedAlreadyTarget | ConversionOutcome::SkippedNotImage => {
                EntryPhase::Skipped
            }
            ConversionOutcome::Failed(_) => EntryPhase::Failed,
        }
    }
}

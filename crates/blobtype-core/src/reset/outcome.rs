//! Per-object outcomes and run totals.

use serde::{Deserialize, Serialize};

use crate::Error;

/// What the loop should do with an object, before any remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The name has no extension or an unmapped one.
    NoMapping,
    /// The stored content-type already matches.
    AlreadyCorrect,
    /// The stored content-type must become this value.
    Update(&'static str),
}

/// Terminal state of a single object after the loop visited it.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// Skipped: no mapping for the extension.
    NoMapping,
    /// Skipped: stored content-type already matches.
    AlreadyCorrect,
    /// The new content-type was persisted.
    Updated {
        /// Value now stored on the object.
        content_type: &'static str,
    },
    /// Persisting the new content-type failed; the object is unchanged.
    Failed {
        /// Value that could not be stored.
        content_type: &'static str,
        /// Error reported by the container.
        error: Error,
    },
}

/// Counts accumulated over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    /// Objects whose content-type was changed.
    pub updated: u64,
    /// Objects already carrying the resolved content-type.
    pub already_correct: u64,
    /// Objects without a mapping for their extension.
    pub no_mapping: u64,
    /// Objects whose update could not be persisted.
    pub failed: u64,
    /// The run was cancelled before the listing was exhausted.
    pub interrupted: bool,
}

impl UpdateSummary {
    /// Adds one object's outcome to the totals.
    pub fn record(&mut self, outcome: &UpdateOutcome) {
        match outcome {
            UpdateOutcome::NoMapping => self.no_mapping += 1,
            UpdateOutcome::AlreadyCorrect => self.already_correct += 1,
            UpdateOutcome::Updated { .. } => self.updated += 1,
            UpdateOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Total number of objects visited.
    pub fn scanned(&self) -> u64 {
        self.updated + self.already_correct + self.no_mapping + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_each_state() {
        let mut summary = UpdateSummary::default();
        summary.record(&UpdateOutcome::NoMapping);
        summary.record(&UpdateOutcome::AlreadyCorrect);
        summary.record(&UpdateOutcome::AlreadyCorrect);
        summary.record(&UpdateOutcome::Updated {
            content_type: "image/png",
        });
        summary.record(&UpdateOutcome::Failed {
            content_type: "image/png",
            error: Error::timeout(),
        });

        assert_eq!(summary.no_mapping, 1);
        assert_eq!(summary.already_correct, 2);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.scanned(), 5);
    }
}

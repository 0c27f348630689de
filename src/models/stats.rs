//! Running counters for a streaming session.

use serde::{Deserialize, Serialize};

/// Statistics for a streaming session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStats {
    /// FETCH round trips performed
    pub fetches: u64,

    /// Rows observed, markers included
    pub rows_seen: u64,

    /// Progress-marker rows
    pub progress_markers: u64,

    /// Trigger calls completed (or recorded in dry run)
    pub triggers: u64,

    /// Delete calls completed (or recorded in dry run)
    pub deletes: u64,

    /// Retractions dropped because retraction delivery is off
    pub retractions_skipped: u64,

    /// Checkpoint writes
    pub checkpoints_written: u64,
}

impl StreamStats {
    /// Data rows handled, whatever the outcome.
    pub fn data_rows(&self) -> u64 {
        self.triggers + self.deletes + self.retractions_skipped
    }
}

//! Checkpoint module for resumable streaming.
//!
//! Provides:
//! - `CheckpointStore`: Retention-aware reads and fatal-on-failure writes
//! - `CheckpointBackend`: Where the single progress value lives
//! - `TableBackend`: Single-row Materialize table
//! - `FileBackend`: JSON file with atomic write-then-rename
//! - `MemoryBackend`: In-process value for dry runs and tests

mod file;
mod store;
mod table;

pub use file::*;
pub use store::*;
pub use table::*;

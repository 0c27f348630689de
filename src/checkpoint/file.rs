//! File-backed checkpoint for local runs.
//!
//! Epistemic foundation:
//! - K_i: State is persisted to disk atomically (write-then-rename)
//! - B_i: Checkpoint file may not exist → created with 0 on initialize
//! - I^B: Crash during write → backup file provides recovery

use crate::checkpoint::CheckpointBackend;
use crate::models::{NotifyError, Result, Timestamp};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk checkpoint document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Feed timestamp (ms since epoch)
    pub timestamp: Timestamp,
    /// When the record was written
    pub updated_at: DateTime<Utc>,
}

/// Checkpoint stored as a JSON file.
pub struct FileBackend {
    /// Path to main checkpoint file
    checkpoint_path: PathBuf,
    /// Path to backup file
    backup_path: PathBuf,
    /// Path written before the atomic rename
    temp_path: PathBuf,
}

impl FileBackend {
    /// Create a file backend, creating the parent directory if needed.
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| NotifyError::io("creating checkpoint dir", e))?;
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "checkpoint".to_string());

        Ok(Self {
            checkpoint_path: path.to_path_buf(),
            backup_path: path.with_file_name(format!("{stem}.backup.json")),
            temp_path: path.with_file_name(format!("{stem}.tmp.json")),
        })
    }

    /// Check if a checkpoint exists.
    pub fn exists(&self) -> bool {
        self.checkpoint_path.exists()
    }

    fn read_record(&self) -> Result<CheckpointRecord> {
        let file = File::open(&self.checkpoint_path)
            .map_err(|e| NotifyError::io("opening checkpoint", e))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| NotifyError::ParseError(format!("Invalid checkpoint: {e}")))
    }

    fn write_record(&self, record: &CheckpointRecord) -> Result<()> {
        // Backup existing checkpoint
        if self.checkpoint_path.exists() {
            fs::copy(&self.checkpoint_path, &self.backup_path)
                .map_err(|e| NotifyError::io("backing up checkpoint", e))?;
        }

        {
            let file = File::create(&self.temp_path)
                .map_err(|e| NotifyError::io("creating temp checkpoint", e))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, record)
                .map_err(|e| NotifyError::Internal(format!("Serializing checkpoint: {e}")))?;
            writer
                .flush()
                .map_err(|e| NotifyError::io("flushing temp checkpoint", e))?;
            writer
                .get_ref()
                .sync_all()
                .map_err(|e| NotifyError::io("syncing temp checkpoint", e))?;
        }

        // Atomic rename
        fs::rename(&self.temp_path, &self.checkpoint_path)
            .map_err(|e| NotifyError::io("renaming checkpoint", e))?;

        debug!(checkpoint = record.timestamp, "Checkpoint saved");
        Ok(())
    }
}

#[async_trait]
impl CheckpointBackend for FileBackend {
    async fn initialize(&self) -> Result<()> {
        if self.exists() {
            info!("Found existing checkpoint file, no initialization needed");
            return Ok(());
        }

        info!(path = %self.checkpoint_path.display(), "Creating checkpoint file with a zero value");
        self.write_record(&CheckpointRecord {
            timestamp: 0,
            updated_at: Utc::now(),
        })
    }

    async fn load(&self) -> Result<Timestamp> {
        Ok(self.read_record()?.timestamp)
    }

    async fn store(&self, value: Timestamp) -> Result<()> {
        self.write_record(&CheckpointRecord {
            timestamp: value,
            updated_at: Utc::now(),
        })
    }

    fn describe(&self) -> String {
        format!("file {}", self.checkpoint_path.display())
    }
}

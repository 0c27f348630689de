//! Checkpoint store: the durable low-water mark for resume.
//!
//! Epistemic foundation:
//! - K_i: Exactly one value exists once `initialize` has run; fresh stores hold 0
//! - K_i: A lost write corrupts resume correctness → writes are fatal on failure
//! - B_i: Stored value is recent enough to trust → checked against retention
//! - I^B: Backend unreachable on read → resume from now, backlog dropped

use crate::checkpoint::{FileBackend, TableBackend};
use crate::feed::connect;
use crate::models::{CheckpointBackendKind, Config, ConfigError, NotifyError, Result, Timestamp};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info};

/// Current wall-clock time in feed units (ms since epoch).
pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis().max(0) as Timestamp
}

/// Storage for the single checkpoint value.
#[async_trait]
pub trait CheckpointBackend: Send + Sync {
    /// Create the backing storage if absent and seed it with 0 when empty.
    /// Must leave an existing value untouched.
    async fn initialize(&self) -> Result<()>;

    /// Read the stored value.
    async fn load(&self) -> Result<Timestamp>;

    /// Overwrite the stored value atomically.
    async fn store(&self, value: Timestamp) -> Result<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Retention-aware front end over a `CheckpointBackend`.
pub struct CheckpointStore {
    backend: Box<dyn CheckpointBackend>,
    retention: Duration,
}

impl CheckpointStore {
    pub fn new(backend: Box<dyn CheckpointBackend>, retention: Duration) -> Self {
        Self { backend, retention }
    }

    /// Build the configured backend.
    ///
    /// The table backend opens its own autocommit connection.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let checkpoint = &config.checkpoint;
        let backend: Box<dyn CheckpointBackend> = match checkpoint.backend {
            CheckpointBackendKind::Table => {
                let table = checkpoint.table.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("checkpoint.table is required for the table backend".to_string())
                })?;
                let client = connect(config, "checkpoint").await?;
                Box::new(TableBackend::new(client, table)?)
            }
            CheckpointBackendKind::File => {
                let path = checkpoint.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("checkpoint.path is required for the file backend".to_string())
                })?;
                Box::new(FileBackend::new(path)?)
            }
            CheckpointBackendKind::Memory => Box::new(MemoryBackend::new()),
        };

        Ok(Self::new(backend, config.retention_window()))
    }

    /// Where the value lives, for logs.
    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// Idempotent bootstrap of the backing storage.
    pub async fn initialize(&self) -> Result<()> {
        info!(location = %self.backend.describe(), "Initializing checkpoint store");
        self.backend.initialize().await
    }

    /// Raw stored value, retention not applied.
    pub async fn stored_value(&self) -> Result<Timestamp> {
        self.backend.load().await
    }

    /// Stored checkpoint if it lies within the retention window.
    pub async fn read(&self) -> Option<Timestamp> {
        self.read_at(now_millis()).await
    }

    /// `read` evaluated against an explicit clock.
    ///
    /// B_i(backend readable) → failure logged, treated as no checkpoint
    pub async fn read_at(&self, now: Timestamp) -> Option<Timestamp> {
        let stored = match self.backend.load().await {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "Unable to read checkpoint, will start from current time");
                return None;
            }
        };

        let age_ms = now.saturating_sub(stored);
        if u128::from(age_ms) <= self.retention.as_millis() {
            info!(checkpoint = stored, "Resuming from stored checkpoint");
            Some(stored)
        } else {
            info!(
                checkpoint = stored,
                retention_minutes = self.retention.as_secs() / 60,
                "Stored checkpoint is outside the retention window, starting from now"
            );
            None
        }
    }

    /// Position the feed should start from: the trusted checkpoint or now.
    pub async fn resume_position(&self) -> Timestamp {
        self.resume_position_at(now_millis()).await
    }

    pub async fn resume_position_at(&self, now: Timestamp) -> Timestamp {
        self.read_at(now).await.unwrap_or(now)
    }

    /// Persist a new checkpoint. Any failure is fatal to the caller.
    pub async fn write(&self, value: Timestamp) -> Result<()> {
        self.backend.store(value).await.map_err(|e| {
            error!(checkpoint = value, error = %e, "Unable to store checkpoint");
            NotifyError::CheckpointWrite {
                value,
                reason: e.to_string(),
            }
        })
    }
}

/// In-process checkpoint.
///
/// Clones share state, so a test can keep a handle while the store owns
/// another. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    value: Option<Timestamp>,
    writes: Vec<Timestamp>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that already holds `value`.
    pub fn with_value(value: Timestamp) -> Self {
        let backend = Self::new();
        backend.lock().value = Some(value);
        backend
    }

    pub fn value(&self) -> Option<Timestamp> {
        self.lock().value
    }

    /// Every value passed to `store`, in order.
    pub fn writes(&self) -> Vec<Timestamp> {
        self.lock().writes.clone()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CheckpointBackend for MemoryBackend {
    async fn initialize(&self) -> Result<()> {
        let mut state = self.lock();
        if state.value.is_none() {
            state.value = Some(0);
        }
        Ok(())
    }

    async fn load(&self) -> Result<Timestamp> {
        let state = self.lock();
        if state.fail_reads {
            return Err(NotifyError::Internal("memory checkpoint unavailable".to_string()));
        }
        state
            .value
            .ok_or_else(|| NotifyError::Internal("checkpoint not initialized".to_string()))
    }

    async fn store(&self, value: Timestamp) -> Result<()> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(NotifyError::Internal("memory checkpoint unavailable".to_string()));
        }
        state.value = Some(value);
        state.writes.push(value);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: u64 = 60 * 60 * 1000;

    fn store_over(backend: &MemoryBackend) -> CheckpointStore {
        CheckpointStore::new(Box::new(backend.clone()), Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_initialize_seeds_zero_once() {
        let backend = MemoryBackend::new();
        let store = store_over(&backend);

        store.initialize().await.unwrap();
        assert_eq!(backend.value(), Some(0));

        store.write(42).await.unwrap();
        store.initialize().await.unwrap();
        assert_eq!(backend.value(), Some(42));
    }

    #[tokio::test]
    async fn test_read_within_retention() {
        let now = 10 * HOUR_MS;
        let backend = MemoryBackend::with_value(now - HOUR_MS);
        let store = store_over(&backend);

        assert_eq!(store.read_at(now).await, Some(now - HOUR_MS));
        assert_eq!(store.resume_position_at(now).await, now - HOUR_MS);
    }

    #[tokio::test]
    async fn test_read_outside_retention_resumes_from_now() {
        let now = 10 * HOUR_MS;
        let backend = MemoryBackend::with_value(now - HOUR_MS - 1);
        let store = store_over(&backend);

        assert_eq!(store.read_at(now).await, None);
        assert_eq!(store.resume_position_at(now).await, now);
    }

    #[tokio::test]
    async fn test_fresh_store_resumes_from_now() {
        let backend = MemoryBackend::new();
        let store = store_over(&backend);
        store.initialize().await.unwrap();

        let now = 10 * HOUR_MS;
        assert_eq!(store.resume_position_at(now).await, now);
    }

    #[tokio::test]
    async fn test_read_failure_is_recovered() {
        let backend = MemoryBackend::with_value(5);
        backend.set_fail_reads(true);
        let store = store_over(&backend);

        assert_eq!(store.read_at(6).await, None);
        assert_eq!(store.resume_position_at(6).await, 6);
    }

    #[tokio::test]
    async fn test_from_config_builds_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut config: Config = toml::from_str(crate::models::EXAMPLE_CONFIG).unwrap();
        config.checkpoint.backend = CheckpointBackendKind::File;
        config.checkpoint.path = Some(dir.path().join("state/progress.json"));

        let store = CheckpointStore::from_config(&config).await.unwrap();
        store.initialize().await.unwrap();
        store.write(77).await.unwrap();

        assert!(store.describe().ends_with("progress.json"));
        assert!(dir.path().join("state/progress.json").exists());
    }

    #[tokio::test]
    async fn test_from_config_file_backend_requires_path() {
        let mut config: Config = toml::from_str(crate::models::EXAMPLE_CONFIG).unwrap();
        config.checkpoint.backend = CheckpointBackendKind::File;
        config.checkpoint.path = None;

        assert!(matches!(
            CheckpointStore::from_config(&config).await,
            Err(NotifyError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_write_failure_is_fatal() {
        let backend = MemoryBackend::with_value(5);
        backend.set_fail_writes(true);
        let store = store_over(&backend);

        let err = store.write(10).await.unwrap_err();
        assert!(matches!(err, NotifyError::CheckpointWrite { value: 10, .. }));
        assert_eq!(backend.value(), Some(5));
    }
}

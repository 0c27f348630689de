//! Dispatcher: per-event notification decision and checkpoint advance.
//!
//! Epistemic foundation:
//! - K_i: Checkpoint advances only after the dispatch decision completes
//! - K_i: Checkpoint never moves backwards (high-water mark)
//! - B_i: Downstream accepted the call → Result; failure propagates
//! - I^B: Crash between call and checkpoint write → re-delivery on restart
//!   (at-least-once, never silent loss)

use crate::checkpoint::CheckpointStore;
use crate::client::Notifier;
use crate::models::{ChangeEvent, Config, IdempotencyKey, Result, StreamStats, Timestamp};
use crate::pipeline::{RecipientResolver, Transformer};
use std::sync::Arc;
use tracing::{debug, info};

/// What the dispatcher did with one data event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Insert delivered as a workflow trigger
    Triggered {
        key: IdempotencyKey,
        recipients: usize,
    },
    /// Retraction delivered as a delete
    Deleted { key: IdempotencyKey },
    /// Retraction dropped because retraction delivery is off
    RetractionSkipped,
}

/// Turns data events into notification calls and persists progress.
pub struct Dispatcher {
    transformer: Transformer,
    resolver: RecipientResolver,
    notifier: Arc<dyn Notifier>,
    checkpoint: CheckpointStore,
    workflow: String,
    send_retractions: bool,
    /// Highest timestamp known to be handled; starts at the resume position
    high_water: Timestamp,
    stats: StreamStats,
}

impl Dispatcher {
    pub fn new(
        transformer: Transformer,
        resolver: RecipientResolver,
        notifier: Arc<dyn Notifier>,
        checkpoint: CheckpointStore,
        workflow: String,
        send_retractions: bool,
        resume_from: Timestamp,
    ) -> Self {
        Self {
            transformer,
            resolver,
            notifier,
            checkpoint,
            workflow,
            send_retractions,
            high_water: resume_from,
            stats: StreamStats::default(),
        }
    }

    /// Build from configuration.
    pub fn from_config(
        config: &Config,
        notifier: Arc<dyn Notifier>,
        checkpoint: CheckpointStore,
        resume_from: Timestamp,
    ) -> Self {
        Self::new(
            Transformer::new(config.source.payload_columns.clone()),
            RecipientResolver::from_config(&config.recipients),
            notifier,
            checkpoint,
            config.novu.workflow.clone(),
            config.dispatch.send_retractions,
            resume_from,
        )
    }

    /// Handle one event. Progress markers are ignored (`Ok(None)`).
    pub async fn dispatch(&mut self, event: &ChangeEvent) -> Result<Option<DispatchOutcome>> {
        let outcome = match event {
            ChangeEvent::Progress { .. } => return Ok(None),
            ChangeEvent::Retraction { columns, .. } => {
                if !self.send_retractions {
                    debug!("Retraction row skipped, retraction delivery is disabled");
                    self.stats.retractions_skipped += 1;
                    DispatchOutcome::RetractionSkipped
                } else {
                    let (_, key) = self.transformer.transform(columns)?;
                    info!(transaction_id = %key, "Retraction row, deleting notification");
                    self.notifier.delete(&key).await?;
                    self.stats.deletes += 1;
                    DispatchOutcome::Deleted { key }
                }
            }
            ChangeEvent::Insert { columns, .. } => {
                let (payload, key) = self.transformer.transform(columns)?;
                let recipients = self.resolver.resolve(&payload)?;
                self.notifier
                    .trigger(&self.workflow, &recipients, &payload, &key)
                    .await?;
                self.stats.triggers += 1;
                DispatchOutcome::Triggered {
                    key,
                    recipients: recipients.len(),
                }
            }
        };

        self.advance(event.timestamp()).await?;
        Ok(Some(outcome))
    }

    /// Persist `timestamp` if it moves the high-water mark forward.
    async fn advance(&mut self, timestamp: Timestamp) -> Result<bool> {
        if timestamp <= self.high_water {
            return Ok(false);
        }

        info!(checkpoint = timestamp, "Timestamp advanced, storing checkpoint");
        self.checkpoint.write(timestamp).await?;
        self.high_water = timestamp;
        self.stats.checkpoints_written += 1;
        Ok(true)
    }

    pub fn high_water(&self) -> Timestamp {
        self.high_water
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StreamStats {
        &mut self.stats
    }
}

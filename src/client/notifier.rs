//! Downstream notification seam.
//!
//! K_i: The dispatcher only ever needs two operations, trigger and delete.
//! Novu implements them over HTTP; dry-run mode records them instead.

use crate::client::NovuClient;
use crate::models::{Config, IdempotencyKey, Payload, RecipientSet, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Notification system the relay delivers to.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Start `workflow` for `recipients`, deduplicated downstream by `key`.
    async fn trigger(
        &self,
        workflow: &str,
        recipients: &RecipientSet,
        payload: &Payload,
        key: &IdempotencyKey,
    ) -> Result<()>;

    /// Cancel the notification previously triggered with `key`.
    async fn delete(&self, key: &IdempotencyKey) -> Result<()>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

/// Pick the notifier for this run: recording in dry-run mode, Novu otherwise.
///
/// B_i(API key resolvable) → only required when Novu is actually called
pub fn notifier_from_config(config: &Config) -> Result<Arc<dyn Notifier>> {
    if config.dispatch.dry_run {
        warn!("Dry run enabled, no requests will be sent to Novu");
        return Ok(Arc::new(DryRunNotifier::new()));
    }

    let api_key = config.resolve_api_key()?;
    Ok(Arc::new(NovuClient::new(
        api_key,
        Some(config.novu.base_url.clone()),
        Some(config.novu.timeout_secs),
    )?))
}

/// A call the relay decided to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchIntent {
    Trigger {
        workflow: String,
        recipients: RecipientSet,
        payload: Payload,
        key: IdempotencyKey,
    },
    Delete {
        key: IdempotencyKey,
    },
}

impl DispatchIntent {
    pub fn key(&self) -> &IdempotencyKey {
        match self {
            Self::Trigger { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Notifier that performs no network interaction and only records intent.
///
/// Clones share the recorded list.
#[derive(Debug, Clone, Default)]
pub struct DryRunNotifier {
    intents: Arc<Mutex<Vec<DispatchIntent>>>,
}

impl DryRunNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in call order.
    pub fn intents(&self) -> Vec<DispatchIntent> {
        self.lock().clone()
    }

    fn record(&self, intent: DispatchIntent) {
        self.lock().push(intent);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DispatchIntent>> {
        self.intents.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Notifier for DryRunNotifier {
    async fn trigger(
        &self,
        workflow: &str,
        recipients: &RecipientSet,
        payload: &Payload,
        key: &IdempotencyKey,
    ) -> Result<()> {
        info!(
            transaction_id = %key,
            workflow,
            recipients = recipients.len(),
            "Dry run, not sending trigger to Novu"
        );
        self.record(DispatchIntent::Trigger {
            workflow: workflow.to_string(),
            recipients: recipients.clone(),
            payload: payload.clone(),
            key: key.clone(),
        });
        Ok(())
    }

    async fn delete(&self, key: &IdempotencyKey) -> Result<()> {
        info!(transaction_id = %key, "Dry run, not sending delete to Novu");
        self.record(DispatchIntent::Delete { key: key.clone() });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}

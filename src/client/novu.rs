//! Novu API client.
//!
//! Epistemic foundation:
//! - K_i: Novu deduplicates triggers by `transactionId`
//! - K_i: A trigger can be cancelled by its `transactionId`
//! - B_i: API will respond within timeout (might fail)
//! - I^B: Network availability unknowable → fail fast, restart replays from
//!   the last checkpoint (no local retry)

use crate::client::Notifier;
use crate::models::{IdempotencyKey, NotifyError, NovuError, Payload, RecipientSet, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Trigger request payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TriggerRequest<'a> {
    name: &'a str,
    to: &'a RecipientSet,
    payload: &'a Payload,
    transaction_id: &'a IdempotencyKey,
}

/// Novu error response.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Novu API client.
pub struct NovuClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    triggers_sent: AtomicU64,
    deletes_sent: AtomicU64,
}

impl NovuClient {
    /// Create a new Novu client.
    pub fn new(api_key: String, base_url: Option<String>, timeout_secs: Option<u64>) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(30));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NotifyError::Network)?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://api.novu.co".to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout,
            triggers_sent: AtomicU64::new(0),
            deletes_sent: AtomicU64::new(0),
        })
    }

    /// Build headers for a request.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("ApiKey {}", self.api_key))
            .map_err(|_| NotifyError::Internal("Novu API key is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn trigger_url(&self) -> String {
        format!("{}/v1/events/trigger", self.base_url)
    }

    fn delete_url(&self, key: &IdempotencyKey) -> String {
        format!("{}/v1/events/trigger/{}", self.base_url, key)
    }

    /// Map a transport failure.
    fn transport_error(&self, e: reqwest::Error) -> NotifyError {
        if e.is_timeout() {
            NotifyError::Timeout(self.timeout)
        } else {
            NotifyError::Network(e)
        }
    }

    /// Turn a non-2xx response into an error; pass 2xx through.
    async fn check(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<f64>().ok());
        let body = response.text().await.unwrap_or_default();

        Err(NotifyError::Novu(api_error(status, retry_after, &body)))
    }

    /// Calls made so far: (triggers, deletes).
    pub fn calls_sent(&self) -> (u64, u64) {
        (
            self.triggers_sent.load(Ordering::Relaxed),
            self.deletes_sent.load(Ordering::Relaxed),
        )
    }
}

#[async_trait]
impl Notifier for NovuClient {
    async fn trigger(
        &self,
        workflow: &str,
        recipients: &RecipientSet,
        payload: &Payload,
        key: &IdempotencyKey,
    ) -> Result<()> {
        let request = TriggerRequest {
            name: workflow,
            to: recipients,
            payload,
            transaction_id: key,
        };

        info!(transaction_id = %key, workflow, "Calling Novu trigger");
        let response = self
            .client
            .post(self.trigger_url())
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::check(response).await?;
        self.triggers_sent.fetch_add(1, Ordering::Relaxed);
        debug!(transaction_id = %key, "Novu accepted trigger");
        Ok(())
    }

    async fn delete(&self, key: &IdempotencyKey) -> Result<()> {
        info!(transaction_id = %key, "Calling Novu delete");
        let response = self
            .client
            .delete(self.delete_url(key))
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::check(response).await?;
        self.deletes_sent.fetch_add(1, Ordering::Relaxed);
        debug!(transaction_id = %key, "Novu accepted delete");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "novu"
    }
}

/// Classify an unsuccessful Novu response.
fn api_error(status: StatusCode, retry_after_secs: Option<f64>, body: &str) -> NovuError {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|e| match e.message {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => e.error,
        })
        .unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED => NovuError::AuthenticationFailed,
        StatusCode::TOO_MANY_REQUESTS => NovuError::RateLimited {
            message,
            retry_after_secs,
        },
        _ => NovuError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

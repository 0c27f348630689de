//! Error types for mz-notify.
//!
//! Epistemic taxonomy:
//! - B_i falsified: Expected failures (bad config, malformed rows, no recipients)
//! - I^B materialized: Infrastructure failures (Materialize, Novu, filesystem)
//! - K_i violated: Internal invariant violations (bugs)

use std::time::Duration;
use thiserror::Error;

/// Exit status used when the stall monitor terminates the process.
///
/// Supervisors treat it as "safe to restart": progress is already persisted.
pub const STALL_EXIT_CODE: i32 = 124;

/// Top-level error type for mz-notify.
#[derive(Debug, Error)]
pub enum NotifyError {
    // ═══════════════════════════════════════════════════════════════════
    // B_i FALSIFIED: Belief proven wrong (expected failures)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Row carries {found} payload fields but {expected} columns are configured")]
    Transform { expected: usize, found: usize },

    #[error("Undecodable feed row: {0}")]
    Decode(String),

    #[error("Recipients unresolved: {0}")]
    RecipientsUnresolved(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    // ═══════════════════════════════════════════════════════════════════
    // I^B MATERIALIZED: Bounded ignorance became known-bad
    // ═══════════════════════════════════════════════════════════════════

    #[error("Materialize error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Failed to persist checkpoint {value}: {reason}")]
    CheckpointWrite { value: u64, reason: String },

    #[error("Novu API error: {0}")]
    Novu(#[from] NovuError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // ═══════════════════════════════════════════════════════════════════
    // K_i VIOLATED: Invariant broken (bug, should not happen)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Novu API specific errors.
#[derive(Debug, Error)]
pub enum NovuError {
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    #[error("Rate limited by Novu: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<f64>,
    },

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },
}

impl NotifyError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error stems from static misconfiguration rather than
    /// a transient fault. Restarting will not fix these.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Transform { .. }
                | Self::Novu(NovuError::AuthenticationFailed)
        )
    }
}

/// Result type alias for mz-notify.
pub type Result<T> = std::result::Result<T, NotifyError>;

//! SUBSCRIBE cursor polling.
//!
//! Epistemic foundation:
//! - K_i: One cursor, one transaction, one dedicated connection
//! - K_i: mz_timestamp is non-decreasing across the stream (source guarantee)
//! - B_i: A FETCH may return nothing → normal quiescent iteration
//! - I^B: Connection loss → error propagates, restart resumes from checkpoint

use crate::feed::{RawRow, decode_row};
use crate::models::{ChangeEvent, Result, SourceConfig, Timestamp, quote_identifier};
use async_trait::async_trait;
use std::time::Duration;
use tokio_postgres::{Client, SimpleQueryMessage};
use tracing::{debug, info};

const CURSOR_NAME: &str = "mz_notify_cursor";

/// Ordered source of decoded change events.
#[async_trait]
pub trait ChangeFeed: Send {
    /// One bounded-wait fetch. An empty batch is not an error.
    async fn fetch(&mut self) -> Result<Vec<ChangeEvent>>;
}

/// `SUBSCRIBE` cursor over a Materialize view.
pub struct SubscribeFeed {
    client: Client,
    fetch_sql: String,
}

impl SubscribeFeed {
    /// Begin a transaction on `client` and declare the cursor.
    ///
    /// Only changes after `as_of` are surfaced: snapshot disabled, progress on.
    pub async fn open(
        client: Client,
        source: &SourceConfig,
        as_of: Timestamp,
        fetch_timeout: Duration,
    ) -> Result<Self> {
        let declare = subscribe_sql(source, as_of)?;

        info!(as_of, view = %source.view, "Declaring cursor for SUBSCRIBE");
        client.batch_execute("BEGIN").await?;
        client.batch_execute(&declare).await?;

        Ok(Self {
            client,
            fetch_sql: fetch_sql(fetch_timeout),
        })
    }
}

#[async_trait]
impl ChangeFeed for SubscribeFeed {
    async fn fetch(&mut self) -> Result<Vec<ChangeEvent>> {
        debug!("Fetching from cursor");
        let messages = self.client.simple_query(&self.fetch_sql).await?;

        let mut events = Vec::new();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                let raw: RawRow = (0..row.len())
                    .map(|i| row.get(i).map(str::to_string))
                    .collect();
                events.push(decode_row(raw)?);
            }
        }

        debug!(rows = events.len(), "Fetched rows");
        Ok(events)
    }
}

/// Cursor declaration for the configured view and payload columns.
///
/// Identifiers are allow-list validated and quoted; `as_of` is an integer
/// we produced ourselves.
pub fn subscribe_sql(source: &SourceConfig, as_of: Timestamp) -> Result<String> {
    let view = quote_identifier(&source.view)?;
    let columns = source
        .payload_columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<std::result::Result<Vec<_>, _>>()?
        .join(", ");

    Ok(format!(
        "DECLARE {CURSOR_NAME} CURSOR FOR SUBSCRIBE (SELECT {columns} FROM {view}) \
         WITH (SNAPSHOT = false, PROGRESS = true) AS OF {as_of}"
    ))
}

/// Bounded-wait fetch statement.
pub fn fetch_sql(timeout: Duration) -> String {
    format!(
        "FETCH ALL {CURSOR_NAME} WITH (timeout = '{}ms')",
        timeout.as_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Config, EXAMPLE_CONFIG};

    fn source() -> SourceConfig {
        let config: Config = toml::from_str(EXAMPLE_CONFIG).unwrap();
        config.source
    }

    #[test]
    fn test_subscribe_sql_quotes_identifiers() {
        let sql = subscribe_sql(&source(), 1_700_000_000_000).unwrap();
        assert_eq!(
            sql,
            "DECLARE mz_notify_cursor CURSOR FOR SUBSCRIBE \
             (SELECT \"user_email\", \"alert_name\", \"severity\" FROM \"critical_alerts\") \
             WITH (SNAPSHOT = false, PROGRESS = true) AS OF 1700000000000"
        );
    }

    #[test]
    fn test_subscribe_sql_rejects_unsafe_column() {
        let mut source = source();
        source.payload_columns.push("severity); DROP VIEW x; --".to_string());
        assert!(subscribe_sql(&source, 0).is_err());
    }

    #[test]
    fn test_fetch_sql_uses_timeout() {
        assert_eq!(
            fetch_sql(Duration::from_secs(1)),
            "FETCH ALL mz_notify_cursor WITH (timeout = '1000ms')"
        );
    }
}

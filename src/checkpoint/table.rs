//! Checkpoint stored in a single-row Materialize table.
//!
//! Runs on its own autocommit connection so checkpoint commits never wait
//! on the transaction holding the SUBSCRIBE cursor.

use crate::checkpoint::CheckpointBackend;
use crate::models::{NotifyError, Result, Timestamp, quote_identifier};
use async_trait::async_trait;
use tokio_postgres::Client;
use tracing::info;

/// SQL for one checkpoint table, built from an allow-listed identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStatements {
    /// Validated, quoted table identifier
    pub table: String,
    pub create: String,
    pub select: String,
    pub seed: String,
    pub update: String,
}

impl TableStatements {
    pub fn new(table: &str) -> Result<Self> {
        let table = quote_identifier(table)?;
        Ok(Self {
            create: format!("CREATE TABLE IF NOT EXISTS {table} (\"timestamp\" numeric)"),
            select: format!("SELECT CAST(\"timestamp\" AS bigint) FROM {table} LIMIT 1"),
            seed: format!("INSERT INTO {table} VALUES (0)"),
            update: format!("UPDATE {table} SET \"timestamp\" = $1::bigint"),
            table,
        })
    }
}

/// `<table> ("timestamp" numeric)` holding exactly one row.
pub struct TableBackend {
    client: Client,
    sql: TableStatements,
}

impl TableBackend {
    /// Wrap an autocommit connection. The table name is allow-list checked.
    pub fn new(client: Client, table: &str) -> Result<Self> {
        Ok(Self {
            client,
            sql: TableStatements::new(table)?,
        })
    }
}

#[async_trait]
impl CheckpointBackend for TableBackend {
    async fn initialize(&self) -> Result<()> {
        info!(table = %self.sql.table, "Creating checkpoint table if it does not yet exist");
        self.client.batch_execute(&self.sql.create).await?;

        if self.client.query_opt(&self.sql.select, &[]).await?.is_some() {
            info!("Found existing checkpoint row, no initialization needed");
            return Ok(());
        }

        info!("Seeding checkpoint table with a zero value");
        self.client.execute(&self.sql.seed, &[]).await?;
        Ok(())
    }

    async fn load(&self) -> Result<Timestamp> {
        let row = self
            .client
            .query_opt(&self.sql.select, &[])
            .await?
            .ok_or_else(|| NotifyError::Internal(format!("checkpoint table {} is empty", self.sql.table)))?;

        let value: Option<i64> = row.try_get(0)?;
        Ok(value.unwrap_or(0).max(0) as Timestamp)
    }

    async fn store(&self, value: Timestamp) -> Result<()> {
        let value = i64::try_from(value)
            .map_err(|_| NotifyError::Internal(format!("checkpoint {value} out of range")))?;
        let updated = self.client.execute(&self.sql.update, &[&value]).await?;

        if updated == 0 {
            return Err(NotifyError::Internal(format!(
                "checkpoint table {} has no row to update",
                self.sql.table
            )));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("table {}", self.sql.table)
    }
}

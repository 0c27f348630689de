//! Event transformer: raw payload columns → named payload + idempotency key.

use crate::models::{IdempotencyKey, NotifyError, Payload, Result};

/// Maps positional payload columns onto the configured column names.
#[derive(Debug, Clone)]
pub struct Transformer {
    columns: Vec<String>,
}

impl Transformer {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Build the payload and its key.
    ///
    /// A short row means the configured column list does not match the
    /// SUBSCRIBE output; every later row will be equally malformed, so the
    /// error is fatal rather than a per-row skip.
    pub fn transform(&self, values: &[Option<String>]) -> Result<(Payload, IdempotencyKey)> {
        if values.len() < self.columns.len() {
            return Err(NotifyError::Transform {
                expected: self.columns.len(),
                found: values.len(),
            });
        }

        let payload = Payload::new(
            self.columns
                .iter()
                .cloned()
                .zip(values.iter().cloned())
                .collect(),
        );
        let key = payload.idempotency_key();
        Ok((payload, key))
    }
}

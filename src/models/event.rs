//! Change-feed event types for mz-notify.
//!
//! K_i: These types represent the core data flow through the relay.
//! Raw positional rows never travel past the feed reader; everything
//! downstream sees a decoded `ChangeEvent`.

use md5::{Digest, Md5};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Logical feed time, milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Direction of a data change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSign {
    /// Row appeared in the view
    Insert,
    /// Row disappeared from the view
    Retract,
}

/// A decoded feed row.
///
/// K_i: Exactly one of three shapes; progress markers carry no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// No further data exists before `timestamp`
    Progress { timestamp: Timestamp },
    /// A row was added
    Insert {
        timestamp: Timestamp,
        columns: Vec<Option<String>>,
    },
    /// A row was removed
    Retraction {
        timestamp: Timestamp,
        columns: Vec<Option<String>>,
    },
}

impl ChangeEvent {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Progress { timestamp }
            | Self::Insert { timestamp, .. }
            | Self::Retraction { timestamp, .. } => *timestamp,
        }
    }

    pub fn is_progress(&self) -> bool {
        matches!(self, Self::Progress { .. })
    }

    /// Sign of a data row; `None` for progress markers.
    pub fn diff_sign(&self) -> Option<DiffSign> {
        match self {
            Self::Progress { .. } => None,
            Self::Insert { .. } => Some(DiffSign::Insert),
            Self::Retraction { .. } => Some(DiffSign::Retract),
        }
    }
}

/// Ordered mapping from configured column name to row value.
///
/// Serializes as a JSON object whose key order matches the configured
/// column order. SQL NULL becomes JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    entries: Vec<(String, Option<String>)>,
}

impl Payload {
    pub fn new(entries: Vec<(String, Option<String>)>) -> Self {
        Self { entries }
    }

    /// Value of a column: `None` if the column is absent,
    /// `Some(None)` if present but NULL.
    pub fn get(&self, column: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    /// Deterministic key over the values, in declared order.
    pub fn idempotency_key(&self) -> IdempotencyKey {
        IdempotencyKey::from_values(self.entries.iter().map(|(_, v)| v.as_deref()))
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Text a NULL value contributes to an idempotency key.
pub const NULL_KEY_TEXT: &str = "None";

/// Content-derived notification identity (Novu `transactionId`).
///
/// K_i: Same values in the same order → same key, whatever the diff sign.
/// This is what lets a retraction delete the notification its insert created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// MD5 hex digest of the `|`-joined values. NULL renders as `None`.
    pub fn from_values<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let joined = values
            .into_iter()
            .map(|v| v.unwrap_or(NULL_KEY_TEXT))
            .collect::<Vec<_>>()
            .join("|");
        Self(hex::encode(Md5::digest(joined.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty, duplicate-free recipient list in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecipientSet(Vec<String>);

impl RecipientSet {
    /// Collect candidates, trimming and dropping blanks and duplicates.
    ///
    /// B_i(some candidate survives) → Option
    pub fn from_candidates<I, S>(candidates: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let recipients: Vec<String> = candidates
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| !c.is_empty() && seen.insert(c.clone()))
            .collect();

        if recipients.is_empty() {
            None
        } else {
            Some(Self(recipients))
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

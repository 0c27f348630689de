//! Decoding of raw SUBSCRIBE rows.
//!
//! Row shape with `PROGRESS = true`:
//! `[mz_timestamp, mz_progressed, mz_diff, ...payload]`, every value in text
//! form (simple query protocol). Progress rows carry NULL in `mz_diff` and in
//! every payload column.

use crate::models::{ChangeEvent, NotifyError, Result, Timestamp};

/// One row as received: positional, text-encoded, NULL as `None`.
pub type RawRow = Vec<Option<String>>;

/// Number of metadata columns preceding the payload.
pub const METADATA_COLUMNS: usize = 3;

/// Decode a raw row into a typed event.
///
/// Payload width is not checked here; that belongs to the transformer,
/// which knows the configured column list.
pub fn decode_row(mut row: RawRow) -> Result<ChangeEvent> {
    if row.len() < METADATA_COLUMNS {
        return Err(NotifyError::Decode(format!(
            "expected at least {METADATA_COLUMNS} columns, got {}",
            row.len()
        )));
    }

    let timestamp = parse_timestamp(row[0].as_deref())?;
    if parse_progressed(row[1].as_deref())? {
        return Ok(ChangeEvent::Progress { timestamp });
    }

    let diff = parse_diff(row[2].as_deref())?;
    let columns = row.split_off(METADATA_COLUMNS);

    if diff < 0 {
        Ok(ChangeEvent::Retraction { timestamp, columns })
    } else {
        Ok(ChangeEvent::Insert { timestamp, columns })
    }
}

/// `mz_timestamp` is `numeric`; accept a trailing fractional part.
fn parse_timestamp(raw: Option<&str>) -> Result<Timestamp> {
    let raw = raw.ok_or_else(|| NotifyError::Decode("mz_timestamp is NULL".to_string()))?;
    let integral = raw.trim().split('.').next().unwrap_or_default();
    integral
        .parse()
        .map_err(|_| NotifyError::Decode(format!("invalid mz_timestamp '{raw}'")))
}

fn parse_progressed(raw: Option<&str>) -> Result<bool> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("t" | "true") => Ok(true),
        Some("f" | "false") | None => Ok(false),
        Some(other) => Err(NotifyError::Decode(format!("invalid mz_progressed '{other}'"))),
    }
}

fn parse_diff(raw: Option<&str>) -> Result<i64> {
    let raw = raw.ok_or_else(|| NotifyError::Decode("mz_diff is NULL on a data row".to_string()))?;
    match raw.trim().parse::<i64>() {
        Ok(0) | Err(_) => Err(NotifyError::Decode(format!("invalid mz_diff '{raw}'"))),
        Ok(diff) => Ok(diff),
    }
}

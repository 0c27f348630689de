//! Recipient resolution for a transformed event.

use crate::models::{NotifyError, Payload, RecipientSet, RecipientsConfig, Result};

/// Combines recipients named in the payload with a static list.
#[derive(Debug, Clone)]
pub struct RecipientResolver {
    payload_column: Option<String>,
    static_list: Vec<String>,
    delimiter: String,
}

impl RecipientResolver {
    pub fn new(payload_column: Option<String>, static_list: Vec<String>, delimiter: String) -> Self {
        Self {
            payload_column,
            static_list,
            delimiter,
        }
    }

    pub fn from_config(config: &RecipientsConfig) -> Self {
        Self::new(
            config.payload_column.clone(),
            config.static_list.clone(),
            config.delimiter.clone(),
        )
    }

    /// B_i(at least one recipient) → Result
    pub fn resolve(&self, payload: &Payload) -> Result<RecipientSet> {
        let mut candidates: Vec<&str> = Vec::new();

        if let Some(column) = &self.payload_column {
            let value = payload.get(column).ok_or_else(|| {
                NotifyError::RecipientsUnresolved(format!(
                    "recipients column '{column}' not found in payload"
                ))
            })?;
            if let Some(value) = value {
                candidates.extend(value.split(self.delimiter.as_str()));
            }
        }

        for entry in &self.static_list {
            candidates.extend(entry.split(self.delimiter.as_str()));
        }

        RecipientSet::from_candidates(candidates).ok_or_else(|| {
            NotifyError::RecipientsUnresolved(
                "no recipients found in payload or static list".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(email: Option<&str>) -> Payload {
        Payload::new(vec![
            ("email".to_string(), email.map(str::to_string)),
            ("msg".to_string(), Some("x".to_string())),
        ])
    }

    #[test]
    fn test_union_of_payload_and_static() {
        let resolver = RecipientResolver::new(
            Some("email".to_string()),
            vec!["oncall".to_string(), "a@x.io".to_string()],
            ",".to_string(),
        );
        let set = resolver.resolve(&payload(Some("a@x.io, b@x.io"))).unwrap();
        assert_eq!(set.as_slice(), ["a@x.io", "b@x.io", "oncall"]);
    }

    #[test]
    fn test_static_only() {
        let resolver = RecipientResolver::new(None, vec!["ops,sre".to_string()], ",".to_string());
        let set = resolver.resolve(&payload(None)).unwrap();
        assert_eq!(set.as_slice(), ["ops", "sre"]);
    }

    #[test]
    fn test_custom_delimiter() {
        let resolver = RecipientResolver::new(Some("email".to_string()), Vec::new(), ";".to_string());
        let set = resolver.resolve(&payload(Some("a;b"))).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_missing_column_fails() {
        let resolver = RecipientResolver::new(
            Some("owner".to_string()),
            vec!["ops".to_string()],
            ",".to_string(),
        );
        assert!(matches!(
            resolver.resolve(&payload(Some("a@x.io"))),
            Err(NotifyError::RecipientsUnresolved(_))
        ));
    }

    #[test]
    fn test_empty_union_fails() {
        let resolver = RecipientResolver::new(Some("email".to_string()), Vec::new(), ",".to_string());
        assert!(matches!(
            resolver.resolve(&payload(Some(" , "))),
            Err(NotifyError::RecipientsUnresolved(_))
        ));
        assert!(matches!(
            resolver.resolve(&payload(None)),
            Err(NotifyError::RecipientsUnresolved(_))
        ));
    }
}

//! Configuration models for mz-notify.
//!
//! All I^R (resolvable ignorance) is parameterized here.
//! The operator resolves these unknowns once at startup, either through a
//! TOML file or through the legacy environment variables. The resulting
//! `Config` is immutable and handed to every component constructor.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Upper bound for minute-valued windows (one year).
pub const MAX_WINDOW_MINUTES: u64 = 365 * 24 * 60;

/// Example configuration printed by `mz-notify example`.
pub const EXAMPLE_CONFIG: &str = r#"# mz-notify configuration file

[source]
host = "abc123.us-east-1.aws.materialize.cloud"
port = 6875
user = "alerts@example.com"
# password = "${MTZ_PASSWORD}"
password_env = "MTZ_PASSWORD"
database = "materialize"
cluster = "quickstart"
ssl_mode = "require"
view = "critical_alerts"
payload_columns = ["user_email", "alert_name", "severity"]
fetch_timeout_secs = 1

[checkpoint]
backend = "table"          # table | file | memory
table = "alert_progress"
# path = "checkpoints/progress.json"
retention_minutes = 60

[novu]
# api_key = "${NOVU_API_KEY}"
api_key_env = "NOVU_API_KEY"
base_url = "https://api.novu.co"
workflow = "critical-alert"
timeout_secs = 30

[recipients]
payload_column = "user_email"
static_list = ["oncall"]
delimiter = ","

[dispatch]
send_retractions = false
dry_run = false
stall_timeout_minutes = 10

[logging]
level = "info"
output = "stdout"          # stdout | stderr | <file path>
"#;

/// Top-level configuration for mz-notify.
///
/// I^R resolved: All configurable parameters are explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Materialize connection and SUBSCRIBE target
    pub source: SourceConfig,

    /// Checkpoint persistence
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Novu API configuration
    pub novu: NovuConfig,

    /// Recipient resolution
    #[serde(default)]
    pub recipients: RecipientsConfig,

    /// Dispatch behavior and liveness
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Logging destination and verbosity
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// TLS mode for the Materialize connections.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// Plain TCP (local Materialize only)
    Disable,
    /// TLS required (Materialize Cloud)
    #[default]
    Require,
}

/// Materialize source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub user: String,

    /// Password (can also be set via `password_env`)
    #[serde(default)]
    pub password: Option<String>,

    /// Environment variable name for the password
    #[serde(default = "default_password_env")]
    pub password_env: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_cluster")]
    pub cluster: String,

    #[serde(default)]
    pub ssl_mode: SslMode,

    /// View (or table) to SUBSCRIBE to
    pub view: String,

    /// Ordered payload columns; order fixes both the SELECT list and the key
    pub payload_columns: Vec<String>,

    /// Server-side wait for each FETCH, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_port() -> u16 {
    6875
}

fn default_password_env() -> String {
    "MTZ_PASSWORD".to_string()
}

fn default_database() -> String {
    "materialize".to_string()
}

fn default_cluster() -> String {
    "quickstart".to_string()
}

fn default_fetch_timeout() -> u64 {
    1
}

/// Where the checkpoint lives.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackendKind {
    /// Single-row table in Materialize
    #[default]
    Table,
    /// JSON file on local disk
    File,
    /// Process memory (dry runs and tests; nothing survives a restart)
    Memory,
}

/// Checkpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    #[serde(default)]
    pub backend: CheckpointBackendKind,

    /// Table name for the `table` backend
    #[serde(default)]
    pub table: Option<String>,

    /// File path for the `file` backend
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Maximum age of a stored checkpoint that is still trusted on resume
    #[serde(default = "default_retention_minutes")]
    pub retention_minutes: u64,
}

fn default_retention_minutes() -> u64 {
    60
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            backend: CheckpointBackendKind::default(),
            table: None,
            path: None,
            retention_minutes: default_retention_minutes(),
        }
    }
}

/// Novu API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NovuConfig {
    /// API key (can also be set via NOVU_API_KEY env var)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable name for API key
    #[serde(default = "default_novu_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_novu_base_url")]
    pub base_url: String,

    /// Workflow triggered for every insert
    pub workflow: String,

    /// Request timeout in seconds
    #[serde(default = "default_novu_timeout")]
    pub timeout_secs: u64,
}

fn default_novu_api_key_env() -> String {
    "NOVU_API_KEY".to_string()
}

fn default_novu_base_url() -> String {
    "https://api.novu.co".to_string()
}

fn default_novu_timeout() -> u64 {
    30
}

/// Recipient resolution configuration.
///
/// At least one of `payload_column` and `static_list` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientsConfig {
    /// Payload column holding delimiter-separated recipients
    #[serde(default)]
    pub payload_column: Option<String>,

    /// Recipients notified for every insert
    #[serde(default)]
    pub static_list: Vec<String>,

    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for RecipientsConfig {
    fn default() -> Self {
        Self {
            payload_column: None,
            static_list: Vec::new(),
            delimiter: default_delimiter(),
        }
    }
}

/// Dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Delete the matching notification when a row is retracted
    #[serde(default)]
    pub send_retractions: bool,

    /// Record intended calls instead of contacting Novu
    #[serde(default)]
    pub dry_run: bool,

    /// Terminate when no feed row arrives for this long
    #[serde(default = "default_stall_timeout")]
    pub stall_timeout_minutes: u64,
}

fn default_stall_timeout() -> u64 {
    10
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            send_retractions: false,
            dry_run: false,
            stall_timeout_minutes: default_stall_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `stdout`, `stderr`, or a file path to append to
    #[serde(default = "default_log_output")]
    pub output: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_output() -> String {
    "stdout".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: default_log_output(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// B_i(file exists) → Result
    /// B_i(file is valid TOML) → Result
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Load configuration from the process environment using the legacy
    /// `MTZ_*` / `NOVU_*` variable names.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()))
        };
        let minutes = |key: &str, default: u64| -> Result<u64, ConfigError> {
            match lookup(key) {
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw,
                }),
                None => Ok(default),
            }
        };
        let flag = |key: &str| lookup(key).is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

        let api_key = required("NOVU_API_KEY")?;
        let workflow = required("NOVU_WORKFLOW_NAME")?;
        let user = required("MTZ_USER")?;
        let password = required("MTZ_PASSWORD")?;
        let host = required("MTZ_HOST")?;
        let view = required("MTZ_ALERT_VIEW")?;
        let table = required("MTZ_PERSIST_TABLE")?;
        let payload = required("MTZ_ALERT_PAYLOAD")?;

        let recipients = RecipientsConfig {
            payload_column: lookup("RECIPIENTS_IN_PAYLOAD").filter(|v| !v.trim().is_empty()),
            static_list: lookup("NOVU_RECIPIENTS")
                .map(|v| split_list(&v, ","))
                .unwrap_or_default(),
            delimiter: default_delimiter(),
        };

        Ok(Self {
            source: SourceConfig {
                host,
                port: default_port(),
                user,
                password: Some(password),
                password_env: default_password_env(),
                database: lookup("MTZ_DATABASE").unwrap_or_else(default_database),
                cluster: lookup("MTZ_CLUSTER").unwrap_or_else(default_cluster),
                ssl_mode: SslMode::Require,
                view,
                payload_columns: split_list(&payload, ","),
                fetch_timeout_secs: default_fetch_timeout(),
            },
            checkpoint: CheckpointConfig {
                backend: CheckpointBackendKind::Table,
                table: Some(table),
                path: None,
                retention_minutes: minutes("RETAIN_HISTORY", default_retention_minutes())?,
            },
            novu: NovuConfig {
                api_key: Some(api_key),
                api_key_env: default_novu_api_key_env(),
                base_url: default_novu_base_url(),
                workflow,
                timeout_secs: default_novu_timeout(),
            },
            recipients,
            dispatch: DispatchConfig {
                send_retractions: flag("SEND_RETRACTIONS"),
                dry_run: flag("TEST_MODE"),
                stall_timeout_minutes: minutes("PROGRESS_TIMEOUT_MINUTES", default_stall_timeout())?,
            },
            logging: LoggingConfig {
                level: lookup("LOG_LEVEL").unwrap_or_else(default_log_level),
                output: lookup("LOG_OUTPUT").unwrap_or_else(default_log_output),
            },
        })
    }

    /// Check everything that must hold before streaming may begin.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.payload_columns.is_empty() {
            return Err(ConfigError::Invalid(
                "source.payload_columns must list at least one column".to_string(),
            ));
        }
        if self.novu.workflow.trim().is_empty() {
            return Err(ConfigError::Invalid("novu.workflow must not be empty".to_string()));
        }
        if self.dispatch.stall_timeout_minutes == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.stall_timeout_minutes must be greater than zero".to_string(),
            ));
        }
        for (key, minutes) in [
            ("checkpoint.retention_minutes", self.checkpoint.retention_minutes),
            ("dispatch.stall_timeout_minutes", self.dispatch.stall_timeout_minutes),
        ] {
            if minutes > MAX_WINDOW_MINUTES {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: minutes.to_string(),
                });
            }
        }
        if self.source.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "source.fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.recipients.delimiter.is_empty() {
            return Err(ConfigError::Invalid("recipients.delimiter must not be empty".to_string()));
        }

        quote_identifier(&self.source.view)?;
        for column in &self.source.payload_columns {
            quote_identifier(column)?;
        }

        let has_static = self.recipients.static_list.iter().any(|r| !r.trim().is_empty());
        match &self.recipients.payload_column {
            None if !has_static => return Err(ConfigError::NoRecipientSource),
            Some(column) if !self.source.payload_columns.contains(column) => {
                return Err(ConfigError::Invalid(format!(
                    "recipients.payload_column '{column}' is not one of source.payload_columns"
                )));
            }
            _ => {}
        }

        match self.checkpoint.backend {
            CheckpointBackendKind::Table => {
                let table = self.checkpoint.table.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("checkpoint.table is required for the table backend".to_string())
                })?;
                quote_identifier(table)?;
            }
            CheckpointBackendKind::File => {
                if self.checkpoint.path.is_none() {
                    return Err(ConfigError::Invalid(
                        "checkpoint.path is required for the file backend".to_string(),
                    ));
                }
            }
            CheckpointBackendKind::Memory => {}
        }

        Ok(())
    }

    /// Resolve API key from config or environment.
    ///
    /// B_i(api key available) → Result
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = &self.novu.api_key {
            return Ok(expand_env_vars(key));
        }

        std::env::var(&self.novu.api_key_env).map_err(|_| ConfigError::MissingSecret {
            what: "Novu API key".to_string(),
            env_var: self.novu.api_key_env.clone(),
        })
    }

    /// Resolve the Materialize password from config or environment.
    pub fn resolve_password(&self) -> Result<String, ConfigError> {
        if let Some(password) = &self.source.password {
            return Ok(expand_env_vars(password));
        }

        std::env::var(&self.source.password_env).map_err(|_| ConfigError::MissingSecret {
            what: "Materialize password".to_string(),
            env_var: self.source.password_env.clone(),
        })
    }

    pub fn retention_window(&self) -> Duration {
        minutes_to_duration(self.checkpoint.retention_minutes)
    }

    pub fn stall_timeout(&self) -> Duration {
        minutes_to_duration(self.dispatch.stall_timeout_minutes)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.source.fetch_timeout_secs)
    }
}

fn minutes_to_duration(value: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(60))
}

/// Split a delimiter-separated list, trimming entries and dropping blanks.
pub fn split_list(raw: &str, delimiter: &str) -> Vec<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"))
}

/// Validate a possibly schema-qualified identifier against the allow-list
/// and return it double-quoted, ready for interpolation into SQL.
///
/// `db.schema.table` → `"db"."schema"."table"`
pub fn quote_identifier(name: &str) -> Result<String, ConfigError> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 3 || parts.iter().any(|p| !identifier_pattern().is_match(p)) {
        return Err(ConfigError::InvalidIdentifier(name.to_string()));
    }

    Ok(parts
        .iter()
        .map(|p| format!("\"{p}\""))
        .collect::<Vec<_>>()
        .join("."))
}

/// Expand environment variables in a string.
///
/// Supports ${VAR_NAME} syntax.
/// If the variable is not set, the placeholder is left unchanged.
pub fn expand_env_vars(s: &str) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"));

    let mut result = s.to_string();
    for cap in re.captures_iter(s) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

/// Configuration errors.
///
/// Epistemic origin:
/// - B_i falsified: File not found, parse error, unsafe identifier
/// - I^B materialized: Missing required values
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Required environment variable {0} is not set")]
    MissingVar(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Missing {what}: set {env_var} env var or the value in config")]
    MissingSecret { what: String, env_var: String },

    #[error("Identifier '{0}' is not allowed (letters, digits and underscores, optionally schema-qualified)")]
    InvalidIdentifier(String),

    #[error("Either recipients.payload_column or recipients.static_list must be set")]
    NoRecipientSource,

    #[error("{0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn legacy_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("NOVU_API_KEY", "nv-key"),
            ("NOVU_WORKFLOW_NAME", "critical-alert"),
            ("MTZ_USER", "alerts@example.com"),
            ("MTZ_PASSWORD", "secret"),
            ("MTZ_HOST", "mz.example.com"),
            ("MTZ_ALERT_VIEW", "critical_alerts"),
            ("MTZ_PERSIST_TABLE", "alert_progress"),
            ("MTZ_ALERT_PAYLOAD", "user_email, alert_name"),
            ("RECIPIENTS_IN_PAYLOAD", "user_email"),
        ])
    }

    fn lookup_in<'a>(
        env: &'a HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| env.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_example_config_is_valid() {
        let config: Config = toml::from_str(EXAMPLE_CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.source.payload_columns.len(), 3);
        assert_eq!(config.checkpoint.backend, CheckpointBackendKind::Table);
        assert_eq!(config.retention_window(), Duration::from_secs(3600));
        assert_eq!(config.stall_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn test_from_lookup_applies_legacy_defaults() {
        let env = legacy_env();
        let config = Config::from_lookup(lookup_in(&env)).unwrap();
        config.validate().unwrap();

        assert_eq!(config.source.payload_columns, vec!["user_email", "alert_name"]);
        assert_eq!(config.source.database, "materialize");
        assert_eq!(config.source.cluster, "quickstart");
        assert_eq!(config.checkpoint.retention_minutes, 60);
        assert_eq!(config.dispatch.stall_timeout_minutes, 10);
        assert!(!config.dispatch.send_retractions);
        assert!(!config.dispatch.dry_run);
        assert!(config.recipients.static_list.is_empty());
        assert_eq!(config.resolve_api_key().unwrap(), "nv-key");
    }

    #[test]
    fn test_from_lookup_reads_flags_and_windows() {
        let mut env = legacy_env();
        env.insert("SEND_RETRACTIONS", "True");
        env.insert("TEST_MODE", "true");
        env.insert("RETAIN_HISTORY", "15");
        env.insert("PROGRESS_TIMEOUT_MINUTES", "3");
        env.insert("NOVU_RECIPIENTS", "ops, ,sre");

        let config = Config::from_lookup(lookup_in(&env)).unwrap();
        assert!(config.dispatch.send_retractions);
        assert!(config.dispatch.dry_run);
        assert_eq!(config.checkpoint.retention_minutes, 15);
        assert_eq!(config.dispatch.stall_timeout_minutes, 3);
        assert_eq!(config.recipients.static_list, vec!["ops", "sre"]);
    }

    #[test]
    fn test_from_lookup_missing_required_var() {
        let mut env = legacy_env();
        env.remove("MTZ_HOST");
        let err = Config::from_lookup(lookup_in(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "MTZ_HOST"));
    }

    #[test]
    fn test_from_lookup_rejects_non_numeric_window() {
        let mut env = legacy_env();
        env.insert("RETAIN_HISTORY", "an hour");
        let err = Config::from_lookup(lookup_in(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_oversized_windows_are_rejected_not_overflowed() {
        let mut env = legacy_env();
        env.insert("RETAIN_HISTORY", "18446744073709551615");
        let config = Config::from_lookup(lookup_in(&env)).unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "checkpoint.retention_minutes"
        ));
        assert_eq!(config.retention_window(), Duration::from_secs(u64::MAX));

        let mut env = legacy_env();
        env.insert("PROGRESS_TIMEOUT_MINUTES", "600000");
        let config = Config::from_lookup(lookup_in(&env)).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "dispatch.stall_timeout_minutes"
        ));
        assert_eq!(config.stall_timeout(), Duration::from_secs(600_000 * 60));
    }

    #[test]
    fn test_window_at_ceiling_is_accepted() {
        let mut env = legacy_env();
        env.insert("RETAIN_HISTORY", "525600");
        let config = Config::from_lookup(lookup_in(&env)).unwrap();
        config.validate().unwrap();
        assert_eq!(config.retention_window(), Duration::from_secs(525_600 * 60));
    }

    #[test]
    fn test_validate_requires_a_recipient_source() {
        let mut env = legacy_env();
        env.remove("RECIPIENTS_IN_PAYLOAD");
        let config = Config::from_lookup(lookup_in(&env)).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::NoRecipientSource)));
    }

    #[test]
    fn test_validate_rejects_recipient_column_outside_payload() {
        let mut env = legacy_env();
        env.insert("RECIPIENTS_IN_PAYLOAD", "owner");
        let config = Config::from_lookup(lookup_in(&env)).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_unsafe_view_name() {
        let mut env = legacy_env();
        env.insert("MTZ_ALERT_VIEW", "alerts; DROP TABLE alert_progress");
        let config = Config::from_lookup(lookup_in(&env)).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("alerts").unwrap(), "\"alerts\"");
        assert_eq!(
            quote_identifier("materialize.public.alerts").unwrap(),
            "\"materialize\".\"public\".\"alerts\""
        );
        assert!(quote_identifier("").is_err());
        assert!(quote_identifier("a.b.c.d").is_err());
        assert!(quote_identifier("1alerts").is_err());
        assert!(quote_identifier("al\"erts").is_err());
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(split_list(" a,b ,, c ", ","), vec!["a", "b", "c"]);
        assert!(split_list("", ",").is_empty());
        assert_eq!(split_list("a;b", ";"), vec!["a", "b"]);
    }
}

//! Environment-driven configuration.
//!
//! # Responsibility
//! - Resolve database path and logging settings for roster entry points.
//!
//! # Invariants
//! - Missing variables fall back to defaults; malformed ones are errors.
//! - An unset or blank `ROSTER_LOG_DIR` leaves logging disabled.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "ROSTER_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "ROSTER_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "ROSTER_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "roster.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    EmptyDbPath,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{LOG_LEVEL_VAR}: {message}"),
            Self::EmptyDbPath => write!(f, "{DB_PATH_VAR} is set but blank"),
        }
    }
}

impl Error for ConfigError {}

/// Settings needed to open the store and start logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: Option<String>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl RosterConfig {
    /// Reads `ROSTER_DB_PATH`, `ROSTER_LOG_LEVEL` and `ROSTER_LOG_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RosterConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup(DB_PATH_VAR) {
            let trimmed = path.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::EmptyDbPath);
            }
            config.db_path = PathBuf::from(trimmed);
        }

        if let Some(level) = lookup(LOG_LEVEL_VAR) {
            config.log_level = normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?;
        }

        config.log_dir = lookup(LOG_DIR_VAR)
            .map(|dir| dir.trim().to_string())
            .filter(|dir| !dir.is_empty());

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, RosterConfig, DB_PATH_VAR, LOG_DIR_VAR, LOG_LEVEL_VAR};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = RosterConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("roster.sqlite3"));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn values_are_read_and_normalized() {
        let config = RosterConfig::from_lookup(lookup_from(&[
            (DB_PATH_VAR, " /var/lib/roster/db.sqlite3 "),
            (LOG_LEVEL_VAR, "WARNING"),
            (LOG_DIR_VAR, "/var/log/roster"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/roster/db.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/roster"));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = RosterConfig::from_lookup(lookup_from(&[(LOG_LEVEL_VAR, "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));

        let err = RosterConfig::from_lookup(lookup_from(&[(DB_PATH_VAR, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::EmptyDbPath);
    }

    #[test]
    fn blank_log_dir_disables_logging() {
        let config = RosterConfig::from_lookup(lookup_from(&[(LOG_DIR_VAR, " ")])).unwrap();
        assert_eq!(config.log_dir, None);
    }
}

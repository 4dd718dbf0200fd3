//! Persistence store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Define the keyed, relationship-aware store used by roster use-cases.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths validate entities before SQL mutations.
//! - Replacements are conditional on the caller's row version.
//! - Repository APIs return semantic errors (`NotFound`,
//!   `ConcurrencyConflict`) in addition to DB transport errors.

use crate::db::DbError;
use crate::model::{EntityKind, EntityValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod roster_store;
mod schema;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for roster persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntityValidationError),
    Db(DbError),
    NotFound {
        kind: EntityKind,
        id: i64,
    },
    /// The row was changed or removed since `expected_version` was read.
    ConcurrencyConflict {
        kind: EntityKind,
        id: i64,
        expected_version: i64,
    },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    pub(crate) fn not_found(kind: EntityKind, id: i64) -> Self {
        Self::NotFound { kind, id }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::ConcurrencyConflict {
                kind,
                id,
                expected_version,
            } => write!(
                f,
                "{kind} {id} was modified concurrently (expected version {expected_version})"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted roster data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EntityValidationError> for RepoError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

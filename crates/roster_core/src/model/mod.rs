//! Roster domain model.
//!
//! # Responsibility
//! - Define the persisted `Team` and `Player` shapes plus their create drafts.
//! - Provide the derived team-with-players read model.
//! - Validate user-provided shapes before they reach storage.
//!
//! # Invariants
//! - Entity ids are assigned by storage and never reused or mutated.
//! - `Player` owns the relationship through `team_id`; teams never store a
//!   back-reference to their players.
//! - Every successful write bumps the row `version` (concurrency token).
//! - Text fields are stored exactly as given; only a blank name is rejected.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod player;
pub mod team;

/// Version assigned to a freshly inserted row.
pub const INITIAL_VERSION: i64 = 1;

/// Entity family, used to label ids in errors and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Team,
    Player,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Player => "player",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural validation failure for a team or player shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityValidationError {
    /// `name` is empty after trimming.
    BlankName(EntityKind),
    /// Persisted or provided version is below [`INITIAL_VERSION`].
    InvalidVersion { kind: EntityKind, version: i64 },
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName(kind) => write!(f, "{kind} name must not be blank"),
            Self::InvalidVersion { kind, version } => {
                write!(f, "{kind} version must be >= {INITIAL_VERSION}, got {version}")
            }
        }
    }
}

impl Error for EntityValidationError {}

pub(crate) fn validate_name(kind: EntityKind, name: &str) -> Result<(), EntityValidationError> {
    if name.trim().is_empty() {
        return Err(EntityValidationError::BlankName(kind));
    }
    Ok(())
}

pub(crate) fn validate_version(kind: EntityKind, version: i64) -> Result<(), EntityValidationError> {
    if version < INITIAL_VERSION {
        return Err(EntityValidationError::InvalidVersion { kind, version });
    }
    Ok(())
}

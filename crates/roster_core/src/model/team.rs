//! Team domain model.
//!
//! # Responsibility
//! - Define the persisted team row and its create draft.
//! - Define `TeamWithPlayers`, the derived one-to-many projection.
//!
//! # Invariants
//! - `players` is computed from `Player.team_id`; it is never written back.

use super::player::Player;
use super::{validate_name, validate_version};
use super::{EntityKind, EntityValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned team identifier.
pub type TeamId = i64;

/// Persisted team row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default, alias = "avatarURL")]
    pub avatar_url: Option<String>,
    /// Concurrency token. Updates must carry the version they were based on.
    pub version: i64,
}

impl Team {
    /// Validates structural invariants before persistence.
    pub fn validate(&self) -> Result<(), EntityValidationError> {
        validate_name(EntityKind::Team, &self.name)?;
        validate_version(EntityKind::Team, self.version)
    }
}

/// Create request for a team; the store assigns `id` and `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub name: String,
    #[serde(default, alias = "avatarURL")]
    pub avatar_url: Option<String>,
}

impl NewTeam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar_url: None,
        }
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        validate_name(EntityKind::Team, &self.name)
    }
}

/// Team together with the players currently assigned to it.
///
/// Serializes flat, e.g. `{"id":1,"name":"Arsenal",...,"players":[...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamWithPlayers {
    #[serde(flatten)]
    pub team: Team,
    /// Players with `team_id == team.id`, ordered by player id.
    pub players: Vec<Player>,
}

impl TeamWithPlayers {
    pub fn id(&self) -> TeamId {
        self.team.id
    }
}

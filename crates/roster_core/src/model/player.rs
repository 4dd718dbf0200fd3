//! Player domain model.
//!
//! # Invariants
//! - `team_id == None` means the player is unassigned.
//! - `height` is an opaque attribute; no unit or range is enforced.

use super::team::TeamId;
use super::{validate_name, validate_version};
use super::{EntityKind, EntityValidationError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Store-assigned player identifier.
pub type PlayerId = i64;

/// Persisted player row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub height: i32,
    /// Timezone-less date/time, serialized as `1997-05-12T00:00:00`.
    #[serde(deserialize_with = "deserialize_birthday")]
    pub birthday: NaiveDateTime,
    #[serde(default, alias = "avatarURL")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    /// Concurrency token. Updates must carry the version they were based on.
    pub version: i64,
}

impl Player {
    /// Validates structural invariants before persistence.
    pub fn validate(&self) -> Result<(), EntityValidationError> {
        validate_name(EntityKind::Player, &self.name)?;
        validate_version(EntityKind::Player, self.version)
    }
}

/// Create request for a player; the store assigns `id` and `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub name: String,
    pub height: i32,
    #[serde(deserialize_with = "deserialize_birthday")]
    pub birthday: NaiveDateTime,
    #[serde(default, alias = "avatarURL")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

impl NewPlayer {
    /// Creates an unassigned player draft.
    pub fn new(name: impl Into<String>, height: i32, birthday: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            height,
            birthday,
            avatar_url: None,
            team_id: None,
        }
    }

    pub fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        validate_name(EntityKind::Player, &self.name)
    }
}

/// Accepts a full `YYYY-MM-DDTHH:MM:SS[.f]` value or a bare `YYYY-MM-DD`
/// date, which is read as midnight.
fn deserialize_birthday<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_birthday_text(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid birthday `{raw}`; expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS"
        ))
    })
}

fn parse_birthday_text(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<NaiveDateTime>() {
        return Some(value);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

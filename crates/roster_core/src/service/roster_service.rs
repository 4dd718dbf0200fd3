//! Roster use-case service.
//!
//! # Responsibility
//! - Provide one entry point per roster use-case (list, get, create, update,
//!   delete, associate).
//! - Enforce referential checks on create/associate and resolve optimistic
//!   concurrency conflicts on update.
//!
//! # Invariants
//! - Validation and id checks run before any store mutation.
//! - A conflict on update is resolved once: `NotFound` when the row is gone,
//!   otherwise surfaced as `ConcurrencyConflict`. There is no retry.
//! - The service remains storage-agnostic; it only talks to `RosterStore`.

use crate::model::player::{NewPlayer, Player, PlayerId};
use crate::model::team::{NewTeam, Team, TeamId, TeamWithPlayers};
use crate::model::{EntityKind, EntityValidationError};
use crate::repo::roster_store::RosterStore;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for roster use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Referenced entity does not exist.
    NotFound { kind: EntityKind, id: i64 },
    /// Path id and body id disagree.
    BadRequest(String),
    /// Required field missing or blank.
    Validation(EntityValidationError),
    /// Stale write against a row that still exists.
    ConcurrencyConflict {
        kind: EntityKind,
        id: i64,
        expected_version: i64,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ServiceError {
    /// HTTP status a request boundary should report for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::BadRequest(_) | Self::Validation(_) => 400,
            Self::ConcurrencyConflict { .. } => 409,
            Self::Repo(_) => 500,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Validation(_) => "validation_error",
            Self::ConcurrencyConflict { .. } => "concurrency_conflict",
            Self::Repo(_) => "storage_error",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::BadRequest(message) => write!(f, "bad request: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::ConcurrencyConflict {
                kind,
                id,
                expected_version,
            } => write!(
                f,
                "{kind} {id} changed since version {expected_version} was read"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::ConcurrencyConflict {
                kind,
                id,
                expected_version,
            } => Self::ConcurrencyConflict {
                kind,
                id,
                expected_version,
            },
            other => Self::Repo(other),
        }
    }
}

impl From<EntityValidationError> for ServiceError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Roster service facade over one store handle (one unit of work).
pub struct RosterService<S: RosterStore> {
    store: S,
}

impl<S: RosterStore> RosterService<S> {
    /// Creates a service using the provided store handle.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists all teams, each with its players populated.
    pub fn list_teams(&self) -> ServiceResult<Vec<TeamWithPlayers>> {
        let teams = self.store.list_teams()?;
        info!(
            "event=team_list module=service status=ok count={}",
            teams.len()
        );
        Ok(teams)
    }

    /// Gets one team with its players populated.
    pub fn get_team(&self, id: TeamId) -> ServiceResult<TeamWithPlayers> {
        self.store
            .get_team_with_players(id)?
            .ok_or(ServiceError::NotFound {
                kind: EntityKind::Team,
                id,
            })
    }

    /// Lists all players. Teams are not populated.
    pub fn list_players(&self) -> ServiceResult<Vec<Player>> {
        let players = self.store.list_players()?;
        info!(
            "event=player_list module=service status=ok count={}",
            players.len()
        );
        Ok(players)
    }

    pub fn get_player(&self, id: PlayerId) -> ServiceResult<Player> {
        self.store.get_player(id)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::Player,
            id,
        })
    }

    /// Creates one team. Boundary reports `201 Created` with the entity.
    pub fn create_team(&self, draft: NewTeam) -> ServiceResult<Team> {
        let started_at = Instant::now();
        draft.validate()?;

        let team = self.store.insert_team(&draft)?;
        info!(
            "event=team_create module=service status=ok team_id={} duration_ms={}",
            team.id,
            started_at.elapsed().as_millis()
        );
        Ok(team)
    }

    /// Creates one player, checking the referenced team first.
    ///
    /// Nothing is persisted when `team_id` names a missing team.
    pub fn create_player(&self, draft: NewPlayer) -> ServiceResult<Player> {
        let started_at = Instant::now();
        draft.validate()?;

        if let Some(team_id) = draft.team_id {
            if !self.store.team_exists(team_id)? {
                warn!(
                    "event=player_create module=service status=error error_code=team_not_found team_id={team_id}"
                );
                return Err(ServiceError::NotFound {
                    kind: EntityKind::Team,
                    id: team_id,
                });
            }
        }

        let player = self.store.insert_player(&draft)?;
        info!(
            "event=player_create module=service status=ok player_id={} duration_ms={}",
            player.id,
            started_at.elapsed().as_millis()
        );
        Ok(player)
    }

    /// Replaces a team based on the version it carries.
    ///
    /// Success carries no content; the boundary reports `204 No Content`.
    pub fn update_team(&self, id: TeamId, team: Team) -> ServiceResult<()> {
        ensure_path_matches_body(EntityKind::Team, id, team.id)?;
        team.validate()?;

        match self.store.replace_team(&team) {
            Ok(version) => {
                info!("event=team_update module=service status=ok team_id={id} version={version}");
                Ok(())
            }
            Err(RepoError::ConcurrencyConflict {
                expected_version, ..
            }) => Err(self.resolve_conflict(
                EntityKind::Team,
                id,
                expected_version,
                self.store.team_exists(id)?,
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Replaces a player based on the version it carries.
    ///
    /// `team_id` is written as given; only the store's foreign key guards it.
    /// Success carries no content; the boundary reports `204 No Content`.
    pub fn update_player(&self, id: PlayerId, player: Player) -> ServiceResult<()> {
        ensure_path_matches_body(EntityKind::Player, id, player.id)?;
        player.validate()?;

        match self.store.replace_player(&player) {
            Ok(version) => {
                info!(
                    "event=player_update module=service status=ok player_id={id} version={version}"
                );
                Ok(())
            }
            Err(RepoError::ConcurrencyConflict {
                expected_version, ..
            }) => Err(self.resolve_conflict(
                EntityKind::Player,
                id,
                expected_version,
                self.store.player_exists(id)?,
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes a team and unassigns its players.
    pub fn delete_team(&self, id: TeamId) -> ServiceResult<()> {
        let removed = self.store.remove_team(id)?;
        info!(
            "event=team_delete module=service status=ok team_id={}",
            removed.id
        );
        Ok(())
    }

    /// Deletes a player and returns the removed row.
    pub fn delete_player(&self, id: PlayerId) -> ServiceResult<Player> {
        let removed = self.store.remove_player(id)?;
        info!("event=player_delete module=service status=ok player_id={id}");
        Ok(removed)
    }

    /// Assigns a player to a team and returns the updated player.
    ///
    /// Both ids must exist; the team is checked first.
    pub fn associate_player_with_team(
        &self,
        player_id: PlayerId,
        team_id: TeamId,
    ) -> ServiceResult<Player> {
        if !self.store.team_exists(team_id)? {
            return Err(ServiceError::NotFound {
                kind: EntityKind::Team,
                id: team_id,
            });
        }
        if !self.store.player_exists(player_id)? {
            return Err(ServiceError::NotFound {
                kind: EntityKind::Player,
                id: player_id,
            });
        }

        let player = self.store.assign_player_team(player_id, team_id)?;
        info!(
            "event=player_associate module=service status=ok player_id={player_id} team_id={team_id}"
        );
        Ok(player)
    }

    fn resolve_conflict(
        &self,
        kind: EntityKind,
        id: i64,
        expected_version: i64,
        still_exists: bool,
    ) -> ServiceError {
        if !still_exists {
            info!(
                "event={kind}_update module=service status=error error_code=not_found {kind}_id={id}"
            );
            return ServiceError::NotFound { kind, id };
        }

        warn!(
            "event={kind}_update module=service status=error error_code=concurrency_conflict {kind}_id={id} expected_version={expected_version}"
        );
        ServiceError::ConcurrencyConflict {
            kind,
            id,
            expected_version,
        }
    }
}

fn ensure_path_matches_body(kind: EntityKind, path_id: i64, body_id: i64) -> ServiceResult<()> {
    if path_id != body_id {
        return Err(ServiceError::BadRequest(format!(
            "{kind} id {path_id} in path does not match id {body_id} in body"
        )));
    }
    Ok(())
}

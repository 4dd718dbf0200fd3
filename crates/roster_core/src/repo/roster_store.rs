//! Roster store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed get/list/insert/replace/remove over `teams` and `players`.
//! - Answer relationship queries (players of a team) without storing a
//!   back-reference on the team row.
//!
//! # Invariants
//! - `replace_*` only succeeds when the stored `version` equals the caller's
//!   version; it then bumps the version by one.
//! - Every write is one statement or one IMMEDIATE transaction, so a row is
//!   never left partially written.
//! - Removing a team unassigns its players in the same transaction.
//! - Read paths reject invalid persisted state instead of masking it.

use super::schema::ensure_connection_ready;
use super::{RepoError, RepoResult};
use crate::model::player::{NewPlayer, Player, PlayerId};
use crate::model::team::{NewTeam, Team, TeamId, TeamWithPlayers};
use crate::model::{EntityKind, INITIAL_VERSION};
use chrono::NaiveDateTime;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql, Transaction, TransactionBehavior};
use std::collections::HashMap;

const TEAM_SELECT_SQL: &str = "SELECT
    id,
    name,
    avatar_url,
    version
FROM teams";

const PLAYER_SELECT_SQL: &str = "SELECT
    id,
    name,
    height,
    birthday,
    avatar_url,
    team_id,
    version
FROM players";

/// Storage format for `players.birthday`.
const BIRTHDAY_DB_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
/// Also accepted on read; matches SQLite's own `datetime()` output.
const BIRTHDAY_DB_FORMAT_SPACED: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Persistence contract for teams and players.
///
/// One store value is one unit of work: callers open a handle per request
/// and pass it to the service explicitly.
pub trait RosterStore {
    fn get_team(&self, id: TeamId) -> RepoResult<Option<Team>>;
    /// Gets one team with its players populated.
    fn get_team_with_players(&self, id: TeamId) -> RepoResult<Option<TeamWithPlayers>>;
    /// Lists all teams ordered by id, each with its players populated.
    fn list_teams(&self) -> RepoResult<Vec<TeamWithPlayers>>;
    fn team_exists(&self, id: TeamId) -> RepoResult<bool>;
    /// Inserts a team and returns it with the assigned id and initial version.
    fn insert_team(&self, team: &NewTeam) -> RepoResult<Team>;
    /// Conditionally replaces a team; returns the new version.
    fn replace_team(&self, team: &Team) -> RepoResult<i64>;
    /// Removes a team, unassigning its players, and returns the removed row.
    fn remove_team(&self, id: TeamId) -> RepoResult<Team>;

    fn get_player(&self, id: PlayerId) -> RepoResult<Option<Player>>;
    /// Lists all players ordered by id. Teams are not populated.
    fn list_players(&self) -> RepoResult<Vec<Player>>;
    fn list_players_for_team(&self, team_id: TeamId) -> RepoResult<Vec<Player>>;
    fn player_exists(&self, id: PlayerId) -> RepoResult<bool>;
    /// Inserts a player and returns it with the assigned id and initial version.
    fn insert_player(&self, player: &NewPlayer) -> RepoResult<Player>;
    /// Conditionally replaces a player; returns the new version.
    fn replace_player(&self, player: &Player) -> RepoResult<i64>;
    /// Removes a player and returns the removed row.
    fn remove_player(&self, id: PlayerId) -> RepoResult<Player>;
    /// Points a player at a team and returns the updated row.
    fn assign_player_team(&self, player_id: PlayerId, team_id: TeamId) -> RepoResult<Player>;
}

/// SQLite-backed roster store borrowing one connection.
pub struct SqliteRosterStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRosterStore<'conn> {
    /// Constructs a store from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RosterStore for SqliteRosterStore<'_> {
    fn get_team(&self, id: TeamId) -> RepoResult<Option<Team>> {
        load_team(self.conn, id)
    }

    fn get_team_with_players(&self, id: TeamId) -> RepoResult<Option<TeamWithPlayers>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let Some(team) = load_team(&tx, id)? else {
            return Ok(None);
        };
        let players = query_players(
            &tx,
            "WHERE team_id = ?1 ORDER BY id ASC",
            params![team.id],
        )?;
        tx.commit()?;
        Ok(Some(TeamWithPlayers { team, players }))
    }

    fn list_teams(&self) -> RepoResult<Vec<TeamWithPlayers>> {
        // Both reads share one snapshot so a concurrent delete cannot split them.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let teams = query_teams(&tx, "ORDER BY id ASC", params![])?;
        let mut players_by_team: HashMap<TeamId, Vec<Player>> = HashMap::new();
        for player in query_players(&tx, "WHERE team_id IS NOT NULL ORDER BY id ASC", params![])? {
            if let Some(team_id) = player.team_id {
                players_by_team.entry(team_id).or_default().push(player);
            }
        }
        tx.commit()?;

        Ok(teams
            .into_iter()
            .map(|team| {
                let players = players_by_team.remove(&team.id).unwrap_or_default();
                TeamWithPlayers { team, players }
            })
            .collect())
    }

    fn team_exists(&self, id: TeamId) -> RepoResult<bool> {
        row_exists(self.conn, "teams", id)
    }

    fn insert_team(&self, team: &NewTeam) -> RepoResult<Team> {
        team.validate()?;

        self.conn.execute(
            "INSERT INTO teams (name, avatar_url, version) VALUES (?1, ?2, ?3);",
            params![team.name, team.avatar_url, INITIAL_VERSION],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("event=team_insert module=repo status=ok team_id={id}");

        Ok(Team {
            id,
            name: team.name.clone(),
            avatar_url: team.avatar_url.clone(),
            version: INITIAL_VERSION,
        })
    }

    fn replace_team(&self, team: &Team) -> RepoResult<i64> {
        team.validate()?;

        let changed = self.conn.execute(
            "UPDATE teams
             SET
                name = ?1,
                avatar_url = ?2,
                version = version + 1
             WHERE id = ?3
               AND version = ?4;",
            params![team.name, team.avatar_url, team.id, team.version],
        )?;

        if changed == 0 {
            return Err(RepoError::ConcurrencyConflict {
                kind: EntityKind::Team,
                id: team.id,
                expected_version: team.version,
            });
        }

        Ok(team.version + 1)
    }

    fn remove_team(&self, id: TeamId) -> RepoResult<Team> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let team = load_team(&tx, id)?.ok_or_else(|| RepoError::not_found(EntityKind::Team, id))?;

        let released = tx.execute(
            "UPDATE players
             SET
                team_id = NULL,
                version = version + 1
             WHERE team_id = ?1;",
            [id],
        )?;
        tx.execute("DELETE FROM teams WHERE id = ?1;", [id])?;
        tx.commit()?;

        debug!("event=team_remove module=repo status=ok team_id={id} released_players={released}");
        Ok(team)
    }

    fn get_player(&self, id: PlayerId) -> RepoResult<Option<Player>> {
        load_player(self.conn, id)
    }

    fn list_players(&self) -> RepoResult<Vec<Player>> {
        query_players(self.conn, "ORDER BY id ASC", params![])
    }

    fn list_players_for_team(&self, team_id: TeamId) -> RepoResult<Vec<Player>> {
        query_players(
            self.conn,
            "WHERE team_id = ?1 ORDER BY id ASC",
            params![team_id],
        )
    }

    fn player_exists(&self, id: PlayerId) -> RepoResult<bool> {
        row_exists(self.conn, "players", id)
    }

    fn insert_player(&self, player: &NewPlayer) -> RepoResult<Player> {
        player.validate()?;

        self.conn
            .execute(
                "INSERT INTO players (
                    name,
                    height,
                    birthday,
                    avatar_url,
                    team_id,
                    version
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    player.name,
                    player.height,
                    birthday_to_db(&player.birthday),
                    player.avatar_url,
                    player.team_id,
                    INITIAL_VERSION,
                ],
            )
            .map_err(|err| map_team_reference_error(err, player.team_id))?;
        let id = self.conn.last_insert_rowid();
        debug!("event=player_insert module=repo status=ok player_id={id}");

        Ok(Player {
            id,
            name: player.name.clone(),
            height: player.height,
            birthday: player.birthday,
            avatar_url: player.avatar_url.clone(),
            team_id: player.team_id,
            version: INITIAL_VERSION,
        })
    }

    fn replace_player(&self, player: &Player) -> RepoResult<i64> {
        player.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE players
                 SET
                    name = ?1,
                    height = ?2,
                    birthday = ?3,
                    avatar_url = ?4,
                    team_id = ?5,
                    version = version + 1
                 WHERE id = ?6
                   AND version = ?7;",
                params![
                    player.name,
                    player.height,
                    birthday_to_db(&player.birthday),
                    player.avatar_url,
                    player.team_id,
                    player.id,
                    player.version,
                ],
            )
            .map_err(|err| map_team_reference_error(err, player.team_id))?;

        if changed == 0 {
            return Err(RepoError::ConcurrencyConflict {
                kind: EntityKind::Player,
                id: player.id,
                expected_version: player.version,
            });
        }

        Ok(player.version + 1)
    }

    fn remove_player(&self, id: PlayerId) -> RepoResult<Player> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let player = load_player(&tx, id)?.ok_or_else(|| RepoError::not_found(EntityKind::Player, id))?;
        tx.execute("DELETE FROM players WHERE id = ?1;", [id])?;
        tx.commit()?;

        debug!("event=player_remove module=repo status=ok player_id={id}");
        Ok(player)
    }

    fn assign_player_team(&self, player_id: PlayerId, team_id: TeamId) -> RepoResult<Player> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "teams", team_id)? {
            return Err(RepoError::not_found(EntityKind::Team, team_id));
        }

        let changed = tx.execute(
            "UPDATE players
             SET
                team_id = ?1,
                version = version + 1
             WHERE id = ?2;",
            params![team_id, player_id],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Player, player_id));
        }

        let player = load_player(&tx, player_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("player {player_id} missing after team assignment"))
        })?;
        tx.commit()?;

        debug!(
            "event=player_assign module=repo status=ok player_id={player_id} team_id={team_id} version={}",
            player.version
        );
        Ok(player)
    }
}

fn load_team(conn: &Connection, id: TeamId) -> RepoResult<Option<Team>> {
    Ok(query_teams(conn, "WHERE id = ?1", params![id])?.into_iter().next())
}

fn load_player(conn: &Connection, id: PlayerId) -> RepoResult<Option<Player>> {
    Ok(query_players(conn, "WHERE id = ?1", params![id])?
        .into_iter()
        .next())
}

fn query_teams(conn: &Connection, clause: &str, args: &[&dyn ToSql]) -> RepoResult<Vec<Team>> {
    let mut stmt = conn.prepare(&format!("{TEAM_SELECT_SQL} {clause};"))?;
    let mut rows = stmt.query(args)?;
    let mut teams = Vec::new();
    while let Some(row) = rows.next()? {
        teams.push(parse_team_row(row)?);
    }
    Ok(teams)
}

fn query_players(
    conn: &Connection,
    clause: &str,
    args: &[&dyn ToSql],
) -> RepoResult<Vec<Player>> {
    let mut stmt = conn.prepare(&format!("{PLAYER_SELECT_SQL} {clause};"))?;
    let mut rows = stmt.query(args)?;
    let mut players = Vec::new();
    while let Some(row) = rows.next()? {
        players.push(parse_player_row(row)?);
    }
    Ok(players)
}

fn row_exists(conn: &Connection, table: &'static str, id: i64) -> RepoResult<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1;"),
            [id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_team_row(row: &Row<'_>) -> RepoResult<Team> {
    let team = Team {
        id: row.get("id")?,
        name: row.get("name")?,
        avatar_url: row.get("avatar_url")?,
        version: row.get("version")?,
    };
    team.validate()
        .map_err(|err| RepoError::InvalidData(format!("teams row {}: {err}", team.id)))?;
    Ok(team)
}

fn parse_player_row(row: &Row<'_>) -> RepoResult<Player> {
    let id: PlayerId = row.get("id")?;
    let birthday_text: String = row.get("birthday")?;
    let birthday = parse_birthday(&birthday_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid birthday `{birthday_text}` in players row {id}"
        ))
    })?;

    let player = Player {
        id,
        name: row.get("name")?,
        height: row.get("height")?,
        birthday,
        avatar_url: row.get("avatar_url")?,
        team_id: row.get("team_id")?,
        version: row.get("version")?,
    };
    player
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("players row {id}: {err}")))?;
    Ok(player)
}

fn birthday_to_db(value: &NaiveDateTime) -> String {
    value.format(BIRTHDAY_DB_FORMAT).to_string()
}

fn parse_birthday(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, BIRTHDAY_DB_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, BIRTHDAY_DB_FORMAT_SPACED))
        .ok()
}

/// Maps a foreign-key failure on `players.team_id` to a missing-team error.
fn map_team_reference_error(err: rusqlite::Error, team_id: Option<TeamId>) -> RepoError {
    match team_id {
        Some(team_id) if is_foreign_key_violation(&err) => {
            RepoError::not_found(EntityKind::Team, team_id)
        }
        _ => err.into(),
    }
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

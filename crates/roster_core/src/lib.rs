//! Core domain logic for the roster service.
//! This crate is the single source of truth for team/player invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, RosterConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::player::{NewPlayer, Player, PlayerId};
pub use model::team::{NewTeam, Team, TeamId, TeamWithPlayers};
pub use model::{EntityKind, EntityValidationError};
pub use repo::roster_store::{RosterStore, SqliteRosterStore};
pub use repo::{RepoError, RepoResult};
pub use service::roster_service::{RosterService, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

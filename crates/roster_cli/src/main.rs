//! Roster command-line tool.
//!
//! # Responsibility
//! - Verify `roster_core` linkage (`ping`, `version`).
//! - Print roster summaries from the configured database (`teams`, `players`).
//!
//! Store and logging flags fall back to `ROSTER_DB_PATH`, `ROSTER_LOG_LEVEL`
//! and `ROSTER_LOG_DIR`.

use clap::{Args, Parser, Subcommand};
use log::error;
use roster_core::config::{DB_PATH_VAR, LOG_DIR_VAR, LOG_LEVEL_VAR};
use roster_core::db::open_db;
use roster_core::{init_logging, RosterConfig, RosterService, SqliteRosterStore};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "roster_cli", version, about = "Inspect a roster database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the core library is linked (default)
    Ping,
    /// Print the core library version
    Version,
    /// List teams with their player counts
    Teams(StoreArgs),
    /// List players with their team assignment
    Players(StoreArgs),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Version => "version",
            Self::Teams(_) => "teams",
            Self::Players(_) => "players",
        }
    }
}

#[derive(Args, Debug, Default)]
struct StoreArgs {
    /// SQLite database file
    #[arg(long, env = DB_PATH_VAR)]
    db_path: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, env = LOG_LEVEL_VAR)]
    log_level: Option<String>,

    /// Absolute directory for rotating log files; logging stays off when unset
    #[arg(long, env = LOG_DIR_VAR)]
    log_dir: Option<String>,
}

impl StoreArgs {
    fn to_config(&self) -> Result<RosterConfig, String> {
        RosterConfig::from_lookup(|key| match key {
            DB_PATH_VAR => self.db_path.clone(),
            LOG_LEVEL_VAR => self.log_level.clone(),
            LOG_DIR_VAR => self.log_dir.clone(),
            _ => None,
        })
        .map_err(|err| err.to_string())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Ping);
    match run(&command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!(
                "event=cli_run module=cli status=error command={} error={message}",
                command.name()
            );
            eprintln!("roster_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Command) -> Result<(), String> {
    match command {
        Command::Ping => {
            println!("roster_core ping={}", roster_core::ping());
            Ok(())
        }
        Command::Version => {
            println!("roster_core version={}", roster_core::core_version());
            Ok(())
        }
        Command::Teams(args) => {
            let conn = open_configured(args)?;
            let store = SqliteRosterStore::try_new(&conn).map_err(|err| err.to_string())?;
            let service = RosterService::new(store);
            for entry in service.list_teams().map_err(|err| err.to_string())? {
                println!(
                    "team id={} name={:?} players={}",
                    entry.team.id,
                    entry.team.name,
                    entry.players.len()
                );
            }
            Ok(())
        }
        Command::Players(args) => {
            let conn = open_configured(args)?;
            let store = SqliteRosterStore::try_new(&conn).map_err(|err| err.to_string())?;
            let service = RosterService::new(store);
            for player in service.list_players().map_err(|err| err.to_string())? {
                let team = player
                    .team_id
                    .map_or_else(|| "-".to_string(), |id| id.to_string());
                println!(
                    "player id={} name={:?} team={team} birthday={}",
                    player.id,
                    player.name,
                    player.birthday.date()
                );
            }
            Ok(())
        }
    }
}

fn open_configured(args: &StoreArgs) -> Result<rusqlite::Connection, String> {
    let config = args.to_config()?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.log_level, log_dir)?;
    }
    open_db(&config.db_path).map_err(|err| err.to_string())
}

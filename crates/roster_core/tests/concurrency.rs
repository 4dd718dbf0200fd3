use chrono::NaiveDate;
use roster_core::db::open_db;
use roster_core::{
    EntityKind, NewPlayer, NewTeam, RosterService, ServiceError, SqliteRosterStore,
};
use std::sync::{Arc, Barrier};
use std::thread;

fn birthday() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2001, 9, 5)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn stale_update_on_existing_row_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("roster.db")).unwrap();
    let service = RosterService::new(SqliteRosterStore::try_new(&conn).unwrap());

    let player = service
        .create_player(NewPlayer::new("Bukayo Saka", 178, birthday()))
        .unwrap();

    let mut first = player.clone();
    first.height = 179;
    service.update_player(player.id, first).unwrap();

    let mut stale = player.clone();
    stale.height = 180;
    let err = service.update_player(player.id, stale).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::ConcurrencyConflict {
            kind: EntityKind::Player,
            expected_version: 1,
            ..
        }
    ));
    assert_eq!(err.status_code(), 409);
    assert_eq!(service.get_player(player.id).unwrap().height, 179);
}

#[test]
fn association_invalidates_previously_read_version() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("roster.db")).unwrap();
    let service = RosterService::new(SqliteRosterStore::try_new(&conn).unwrap());

    let team = service.create_team(NewTeam::new("Arsenal")).unwrap();
    let player = service
        .create_player(NewPlayer::new("Bukayo Saka", 178, birthday()))
        .unwrap();
    service
        .associate_player_with_team(player.id, team.id)
        .unwrap();

    let err = service.update_player(player.id, player.clone()).unwrap_err();
    assert!(matches!(err, ServiceError::ConcurrencyConflict { .. }));
    assert_eq!(
        service.get_player(player.id).unwrap().team_id,
        Some(team.id)
    );
}

#[test]
fn update_after_delete_on_another_connection_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.db");
    let conn_a = open_db(&path).unwrap();
    let conn_b = open_db(&path).unwrap();
    let service_a = RosterService::new(SqliteRosterStore::try_new(&conn_a).unwrap());
    let service_b = RosterService::new(SqliteRosterStore::try_new(&conn_b).unwrap());

    let team = service_a.create_team(NewTeam::new("Arsenal")).unwrap();
    let mut read_by_a = service_a.get_team(team.id).unwrap().team;

    service_b.delete_team(team.id).unwrap();

    read_by_a.name = "Arsenal FC".to_string();
    let err = service_a.update_team(team.id, read_by_a).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::Team,
            ..
        }
    ));
}

#[test]
fn concurrent_updates_from_same_version_let_at_most_one_win() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.db");
    let player_id = {
        let conn = open_db(&path).unwrap();
        let service = RosterService::new(SqliteRosterStore::try_new(&conn).unwrap());
        service
            .create_player(NewPlayer::new("Bukayo Saka", 178, birthday()))
            .unwrap()
            .id
    };

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [180, 181]
        .into_iter()
        .map(|height| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service = RosterService::new(SqliteRosterStore::try_new(&conn).unwrap());
                let mut player = service.get_player(player_id).unwrap();
                assert_eq!(player.version, 1);
                player.height = height;

                barrier.wait();
                service.update_player(player_id, player)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let winners = results.iter().filter(|result| result.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|result| matches!(result, Err(ServiceError::ConcurrencyConflict { .. })))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 1);

    let conn = open_db(&path).unwrap();
    let service = RosterService::new(SqliteRosterStore::try_new(&conn).unwrap());
    let stored = service.get_player(player_id).unwrap();
    assert_eq!(stored.version, 2);
    assert!(stored.height == 180 || stored.height == 181);
}

use std::sync::Arc;

use spycats::config::Config;
use spycats::consts::KEY_BIND;
use spycats::engine::MissionEngine;
use spycats::model::{NewMission, TargetInput};
use spycats::store::sqlite::SqliteStore;

#[test]
fn missions_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agency.db");
    let path = path.to_str().unwrap();

    let id = {
        let engine = MissionEngine::new(Arc::new(SqliteStore::open(path).unwrap()));
        engine
            .create(NewMission {
                targets: vec![TargetInput::new("A", "X").with_notes("first sighting")],
                ..NewMission::default()
            })
            .unwrap()
            .id
    };

    let engine = MissionEngine::new(Arc::new(SqliteStore::open(path).unwrap()));
    let mission = engine.get(id).unwrap();
    assert_eq!(mission.targets.len(), 1);
    assert_eq!(mission.targets[0].notes, "first sighting");
}

#[test]
fn store_and_config_share_a_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let path = path.to_str().unwrap();

    let store = SqliteStore::open(path).unwrap();
    let config = Config::open(path).unwrap();
    config.set(KEY_BIND, "127.0.0.1:9999").unwrap();

    let engine = MissionEngine::new(Arc::new(store));
    engine
        .create(NewMission {
            targets: vec![TargetInput::new("A", "X")],
            ..NewMission::default()
        })
        .unwrap();

    assert_eq!(config.get(KEY_BIND).unwrap().unwrap(), "127.0.0.1:9999");
    assert_eq!(engine.list().unwrap().len(), 1);
}

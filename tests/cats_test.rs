use std::sync::Arc;

use spycats::breeds::fixed::FixedBreeds;
use spycats::engine::MissionEngine;
use spycats::engine::cats::CatService;
use spycats::error::Error;
use spycats::model::{CatPatch, NewCat, NewMission, Salary, TargetInput};
use spycats::store::sqlite::SqliteStore;

fn service(breeds: FixedBreeds) -> (CatService, MissionEngine) {
    let store: Arc<dyn spycats::store::Store> = Arc::new(SqliteStore::in_memory().unwrap());
    (
        CatService::new(Arc::clone(&store), Arc::new(breeds)),
        MissionEngine::new(store),
    )
}

fn new_cat(name: &str, breed: &str) -> NewCat {
    NewCat {
        name: name.to_string(),
        years_experience: 4,
        breed: breed.to_string(),
        salary: Salary::from_cents(120_050),
    }
}

#[tokio::test]
async fn create_with_known_breed() {
    let (cats, _) = service(FixedBreeds::new(["Abyssinian"]));

    let cat = cats.create(new_cat("Whiskers", "abyssinian")).await.unwrap();

    assert_eq!(cat.name, "Whiskers");
    assert_eq!(cat.breed, "abyssinian");
    assert_eq!(cat.salary.to_string(), "1200.50");
    assert_eq!(cats.get(cat.id).unwrap().years_experience, 4);
}

#[tokio::test]
async fn create_rejects_unknown_breed() {
    let (cats, _) = service(FixedBreeds::new(["Abyssinian"]));

    let result = cats.create(new_cat("Whiskers", "Dragon")).await;

    assert!(matches!(result, Err(Error::Validation { field: "breed", .. })));
    assert!(cats.list().unwrap().is_empty());
}

#[tokio::test]
async fn registry_outage_fails_closed() {
    let (cats, _) = service(FixedBreeds::unavailable());

    let result = cats.create(new_cat("Whiskers", "Abyssinian")).await;

    match result {
        Err(Error::Validation { field, message }) => {
            assert_eq!(field, "breed");
            assert!(message.contains("could not validate breed"));
        }
        other => panic!("expected breed validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn create_rejects_blank_name() {
    let (cats, _) = service(FixedBreeds::new(["Abyssinian"]));
    let result = cats.create(new_cat("  ", "Abyssinian")).await;
    assert!(matches!(result, Err(Error::Validation { field: "name", .. })));
}

#[tokio::test]
async fn list_is_newest_first() {
    let (cats, _) = service(FixedBreeds::new(["Bengal"]));
    let first = cats.create(new_cat("One", "Bengal")).await.unwrap();
    let second = cats.create(new_cat("Two", "Bengal")).await.unwrap();

    let ids: Vec<_> = cats.list().unwrap().iter().map(|c| c.id).collect();
    assert_eq!(ids, [second.id, first.id]);
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let (cats, _) = service(FixedBreeds::new(["Bengal", "Sphynx"]));
    let cat = cats.create(new_cat("One", "Bengal")).await.unwrap();

    let updated = cats
        .update(
            cat.id,
            CatPatch {
                salary: Some(Salary::from_cents(99)),
                ..CatPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.salary.cents(), 99);
    assert_eq!(updated.name, "One");
    assert_eq!(updated.breed, "Bengal");
    assert!(updated.updated_at >= cat.updated_at);
}

#[tokio::test]
async fn update_validates_new_breed() {
    let (cats, _) = service(FixedBreeds::new(["Bengal"]));
    let cat = cats.create(new_cat("One", "Bengal")).await.unwrap();

    let result = cats
        .update(
            cat.id,
            CatPatch {
                breed: Some("Griffin".to_string()),
                ..CatPatch::default()
            },
        )
        .await;

    assert!(matches!(result, Err(Error::Validation { field: "breed", .. })));
    assert_eq!(cats.get(cat.id).unwrap().breed, "Bengal");
}

#[tokio::test]
async fn update_missing_cat_is_not_found() {
    let (cats, _) = service(FixedBreeds::new(["Bengal"]));
    let result = cats.update(5, CatPatch::default()).await;
    assert!(matches!(result, Err(Error::NotFound { entity: "cat", id: 5 })));
}

#[tokio::test]
async fn delete_unlinks_cat_and_keeps_mission() {
    let (cats, missions) = service(FixedBreeds::new(["Bengal"]));
    let cat = cats.create(new_cat("One", "Bengal")).await.unwrap();
    let mission = missions
        .create(NewMission {
            cat: Some(cat.id),
            targets: vec![TargetInput::new("A", "X")],
            ..NewMission::default()
        })
        .unwrap();

    cats.delete(cat.id).unwrap();

    assert!(matches!(cats.get(cat.id), Err(Error::NotFound { .. })));
    let mission = missions.get(mission.id).unwrap();
    assert!(mission.cat.is_none());
    // With the cat gone the mission can be deleted.
    missions.delete(mission.id).unwrap();
}

#[tokio::test]
async fn delete_missing_cat_is_not_found() {
    let (cats, _) = service(FixedBreeds::new(["Bengal"]));
    assert!(matches!(cats.delete(1), Err(Error::NotFound { .. })));
}

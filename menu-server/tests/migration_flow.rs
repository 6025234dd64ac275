//! End-to-end migration: nested subcollections → flat `menuItems`

use menu_server::db::repository::{Layout, MenuItemRepository, RepoError};
use menu_server::db::{DocumentStore, Fields, MENU_ITEMS, MemoryStore, RESTAURANTS, RedbStore};
use menu_server::migration::{
    MigrationConfig, MigrationEngine, MigrationError, MigrationMode, MigrationState, RunOutcome,
};
use serde_json::{Value, json};
use shared::util::ServerClock;
use std::sync::Arc;

fn obj(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

/// Two restaurants: r1 with 3 nested items, r2 with 5
async fn seed(store: &dyn DocumentStore) {
    store
        .set(RESTAURANTS, "r1", obj(json!({ "name": "Spice Hub" })), false)
        .await
        .unwrap();
    store
        .set(RESTAURANTS, "r2", obj(json!({ "name": "Noodle Bar" })), false)
        .await
        .unwrap();

    for i in 0..3 {
        store
            .set(
                "restaurants/r1/menuItems",
                &format!("a{i}"),
                obj(json!({ "id": format!("a{i}"), "name": format!("Curry {i}"), "price": 100 + i })),
                false,
            )
            .await
            .unwrap();
    }
    for i in 0..5 {
        store
            .set(
                "restaurants/r2/menuItems",
                &format!("b{i}"),
                obj(json!({ "name": format!("Noodles {i}"), "price": "9.5", "spicyLevel": i })),
                false,
            )
            .await
            .unwrap();
    }
}

fn engine(store: Arc<dyn DocumentStore>, mode: MigrationMode) -> MigrationEngine {
    MigrationEngine::new(
        store,
        MigrationConfig {
            concurrency: 2,
            mode,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_migrates_every_nested_item() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;
    let engine = engine(store.clone(), MigrationMode::Append);
    assert_eq!(engine.status().state, MigrationState::NotStarted);

    let report = engine.run().await.unwrap();
    assert_eq!(report.migrated_count, 8);
    assert_eq!(report.restaurants_processed, 2);
    assert_eq!(engine.status().state, MigrationState::Completed);

    let verify = engine.verify(None).await.unwrap();
    assert!(verify.count >= 8);
    assert_eq!(verify.sample.len(), 5);
    assert!(verify.orphaned.is_empty());
    assert!(verify.invalid.is_empty());

    // Nested copies are left in place
    assert_eq!(store.count("restaurants/r1/menuItems"), 3);
    assert_eq!(store.count("restaurants/r2/menuItems"), 5);
}

#[tokio::test]
async fn test_migrated_items_carry_foreign_key() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;
    engine(store.clone(), MigrationMode::Append).run().await.unwrap();

    let r1_items = store
        .query(MENU_ITEMS, &[menu_server::db::Filter::eq("restaurantId", "r1")])
        .await
        .unwrap();
    assert_eq!(r1_items.len(), 3);
    for doc in &r1_items {
        assert_eq!(doc.str_field("restaurantName"), Some("Spice Hub"));
        // Legacy id field is dropped and a fresh id assigned
        assert!(!doc.data.contains_key("id"));
        assert!(!["a0", "a1", "a2"].contains(&doc.id.as_str()));
    }

    // The flat repository reads the migrated data with coercion applied
    let repo = MenuItemRepository::new(store.clone(), Arc::new(ServerClock::new()), Layout::Flat);
    let r2_items = repo.list("r2").await.unwrap();
    assert_eq!(r2_items.len(), 5);
    assert!(r2_items.iter().all(|item| item.price == 9.5));
    assert!(r2_items.iter().all(|item| item.restaurant_name.as_deref() == Some("Noodle Bar")));
}

#[tokio::test]
async fn test_rerun_in_append_mode_duplicates() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;
    let engine = engine(store.clone(), MigrationMode::Append);

    engine.run().await.unwrap();
    let first = engine.verify(None).await.unwrap().count;
    engine.run().await.unwrap();
    let second = engine.verify(None).await.unwrap().count;

    assert_eq!(second, 2 * first);
    assert_eq!(engine.status().completed_runs, 2);
}

#[tokio::test]
async fn test_guarded_rerun_requires_acknowledgement() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;
    let engine = engine(store.clone(), MigrationMode::Append);

    assert!(matches!(
        engine.run_with_guard(false).await.unwrap(),
        RunOutcome::Completed(_)
    ));
    assert!(engine.status().warning.is_some());

    let refused = engine.run_with_guard(false).await.unwrap();
    assert!(matches!(refused, RunOutcome::Refused { .. }));
    assert_eq!(store.count(MENU_ITEMS), 8);

    assert!(matches!(
        engine.run_with_guard(true).await.unwrap(),
        RunOutcome::Completed(_)
    ));
    assert_eq!(store.count(MENU_ITEMS), 16);
}

#[tokio::test]
async fn test_upsert_mode_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;
    let engine = engine(store.clone(), MigrationMode::Upsert);

    engine.run().await.unwrap();
    engine.run().await.unwrap();
    assert_eq!(store.count(MENU_ITEMS), 8);
    assert!(engine.status().warning.is_none());

    let doc = store.get(MENU_ITEMS, "r1_a0").await.unwrap().unwrap();
    assert_eq!(doc.str_field("restaurantId"), Some("r1"));
    assert_eq!(doc.str_field("name"), Some("Curry 0"));
}

#[tokio::test]
async fn test_store_failure_reports_partial_progress() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;
    // Sequential so the failure point is deterministic
    let engine = MigrationEngine::new(
        store.clone(),
        MigrationConfig {
            concurrency: 1,
            ..Default::default()
        },
    );
    store.fail_writes_after(4);

    let (restaurants_processed, items_migrated) = match engine.run().await.unwrap_err() {
        MigrationError::PartialFailure {
            restaurants_processed,
            items_migrated,
            ..
        } => (restaurants_processed, items_migrated),
        other => panic!("expected PartialFailure, got {other:?}"),
    };
    assert_eq!(items_migrated, 4);
    assert_eq!(restaurants_processed, 1);
    // Inserts before the failure remain
    assert_eq!(store.count(MENU_ITEMS), 4);
    assert_eq!(engine.status().state, MigrationState::NotStarted);
}

#[tokio::test]
async fn test_restaurant_without_name_still_migrates() {
    let store = Arc::new(MemoryStore::new());
    store.set(RESTAURANTS, "r9", Fields::new(), false).await.unwrap();
    store
        .set("restaurants/r9/menuItems", "x", obj(json!({ "name": "Soup" })), false)
        .await
        .unwrap();

    let engine = engine(store.clone(), MigrationMode::Append);
    assert_eq!(engine.run().await.unwrap().migrated_count, 1);

    let flat = store.query(MENU_ITEMS, &[]).await.unwrap();
    assert_eq!(flat[0].str_field("restaurantId"), Some("r9"));
    assert!(!flat[0].data.contains_key("restaurantName"));
}

#[tokio::test]
async fn test_verify_flags_orphans_and_bad_records() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;
    store
        .set(MENU_ITEMS, "ghost", obj(json!({ "name": "Lost", "restaurantId": "gone" })), false)
        .await
        .unwrap();
    store
        .set(MENU_ITEMS, "broken", obj(json!({ "restaurantId": "r1" })), false)
        .await
        .unwrap();

    let report = engine(store.clone(), MigrationMode::Append)
        .verify(Some(10))
        .await
        .unwrap();
    assert_eq!(report.count, 2);
    assert_eq!(report.orphaned, ["ghost"]);
    assert_eq!(report.invalid, ["broken"]);
    assert_eq!(report.sample.len(), 1);
}

#[tokio::test]
async fn test_flat_repository_rejects_unknown_restaurant_after_migration() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;
    engine(store.clone(), MigrationMode::Append).run().await.unwrap();

    let repo = MenuItemRepository::new(store.clone(), Arc::new(ServerClock::new()), Layout::Flat);
    let err = repo
        .create(
            "nope",
            Some("Nope"),
            serde_json::from_value(json!({ "name": "Dal", "price": 1 })).unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[tokio::test]
async fn test_migration_on_redb_backend() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RedbStore::open(dir.path().join("menu.redb")).unwrap());
    seed(store.as_ref()).await;

    let engine = engine(store.clone(), MigrationMode::Append);
    assert_eq!(engine.run().await.unwrap().migrated_count, 8);
    assert_eq!(engine.verify(None).await.unwrap().count, 8);
}

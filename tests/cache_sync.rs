use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use gymform::{
    cache::{
        ApplyOutcome, CacheBinding, CachePolicy, CachedCollection, MutationAction, RefreshOutcome,
    },
    prelude::*,
};
use serde_json::{Value, json};

fn page(ids: &[&str], total: u64) -> CachedCollection {
    let items = ids.iter().map(|id| json!({"id": id})).collect();
    CachedCollection::new(items, total, 1, 10)
}

fn ids(collection: &CachedCollection) -> Vec<Value> {
    collection
        .items
        .iter()
        .map(|item| item["id"].clone())
        .collect()
}

#[test]
fn add_prepends_new_entity() {
    let store = CacheStore::default();
    let key = CacheKey::new("members", 1, 10);
    store.populate(&key, page(&["A", "B"], 2));
    let sync = OptimisticSync::new(store.clone());

    let outcome = sync.apply(&key, MutationIntent::add("id", json!({"id": "C"})));
    assert_eq!(outcome, ApplyOutcome::Applied);
    let cached = store.read(&key).expect("cached");
    assert_eq!(ids(&cached), [json!("C"), json!("A"), json!("B")]);
    assert_eq!(cached.total, 3);
    assert!(store.needs_refresh(&key));
}

#[test]
fn repeated_add_is_idempotent() {
    let store = CacheStore::default();
    let key = CacheKey::new("members", 1, 10);
    store.populate(&key, page(&["A"], 1));
    let sync = OptimisticSync::new(store.clone());

    let intent = MutationIntent::add("id", json!({"id": "C"}));
    assert_eq!(sync.apply(&key, intent.clone()), ApplyOutcome::Applied);
    assert_eq!(sync.apply(&key, intent), ApplyOutcome::Unchanged);
    assert_eq!(store.read(&key).expect("cached").total, 2);
}

#[test]
fn deleting_a_missing_entity_changes_nothing() {
    let store = CacheStore::default();
    let key = CacheKey::new("members", 1, 10);
    store.populate(&key, page(&["A", "B"], 2));
    let sync = OptimisticSync::new(store.clone());

    let before = store.read(&key);
    let outcome = sync.apply(&key, MutationIntent::delete("id", json!({"id": "Z"})));
    assert_eq!(outcome, ApplyOutcome::Unchanged);
    assert_eq!(store.read(&key), before);
    assert!(!store.needs_refresh(&key));
}

#[test]
fn uncached_keys_and_missing_identifiers_are_left_alone() {
    let store = CacheStore::default();
    let key = CacheKey::new("members", 1, 10);
    let sync = OptimisticSync::new(store.clone());
    assert_eq!(
        sync.apply(&key, MutationIntent::add("id", json!({"id": "C"}))),
        ApplyOutcome::NotCached
    );

    store.populate(&key, page(&["A"], 1));
    assert_eq!(
        sync.apply(&key, MutationIntent::add("id", json!({"nombre": "Sin id"}))),
        ApplyOutcome::Unchanged
    );
    assert_eq!(store.read(&key).expect("cached").total, 1);
}

#[test]
fn prefix_delete_reaches_every_page_of_the_scope() {
    let store = CacheStore::default();
    let first = CacheKey::new("plans", 1, 2).with_scope("sede-1");
    let second = CacheKey::new("plans", 2, 2).with_scope("sede-1");
    let search = CacheKey::new("plans", 1, 2)
        .with_scope("sede-1")
        .with_query("anual");
    let other_scope = CacheKey::new("plans", 1, 2).with_scope("sede-2");
    store.populate(&first, page(&["A", "B"], 4));
    store.populate(&second, page(&["C", "D"], 4));
    store.populate(&search, page(&["C"], 1));
    store.populate(&other_scope, page(&["C"], 1));
    let sync = OptimisticSync::new(store.clone());

    let applied = sync.apply_to_prefix(&first.prefix(), MutationIntent::delete("id", json!({"id": "C"})));
    assert_eq!(applied, 2);
    assert_eq!(ids(&store.read(&second).expect("page 2")), [json!("D")]);
    assert!(store.read(&search).expect("search").items.is_empty());
    assert_eq!(store.read(&other_scope).expect("other").total, 1);

    let refused = sync.apply_to_prefix(&first.prefix(), MutationIntent::add("id", json!({"id": "E"})));
    assert_eq!(refused, 0);
}

#[test]
fn edit_merges_into_the_cached_entity() {
    let store = CacheStore::default();
    let key = CacheKey::new("members", 1, 10);
    store.populate(
        &key,
        CachedCollection::new(vec![json!({"id": 5, "nombre": "Ana", "plan": "m"})], 1, 1, 10),
    );
    let sync = OptimisticSync::new(store.clone());
    sync.apply(&key, MutationIntent::edit("id", json!({"id": 5, "plan": "a"})));
    let cached = store.read(&key).expect("cached");
    assert_eq!(cached.items[0], json!({"id": 5, "nombre": "Ana", "plan": "a"}));
}

#[test]
fn refresh_replays_patches_made_while_fetching() {
    let store = CacheStore::default();
    let key = CacheKey::new("members", 1, 10);
    store.populate(&key, page(&["A", "B"], 2));
    let sync = OptimisticSync::new(store.clone());

    let ticket = store.begin_refresh(&key);
    sync.apply(&key, MutationIntent::add("id", json!({"id": "C"})));

    // The server snapshot was taken before C existed.
    let outcome = store.complete_refresh(ticket, page(&["A", "B"], 2));
    assert_eq!(outcome, RefreshOutcome::Stored { replayed: 1 });
    let cached = store.read(&key).expect("cached");
    assert_eq!(ids(&cached), [json!("C"), json!("A"), json!("B")]);
    assert_eq!(cached.total, 3);

    // A later fetch that already contains C settles the page.
    let ticket = store.begin_refresh(&key);
    let outcome = store.complete_refresh(ticket, page(&["C", "A", "B"], 3));
    assert_eq!(outcome, RefreshOutcome::Stored { replayed: 0 });
    assert!(!store.needs_refresh(&key));
}

#[test]
fn refresh_older_than_the_stored_page_is_discarded() {
    let store = CacheStore::default();
    let key = CacheKey::new("members", 1, 10);
    store.populate(&key, page(&["A"], 1));
    let sync = OptimisticSync::new(store.clone());

    let slow = store.begin_refresh(&key);
    sync.apply(&key, MutationIntent::add("id", json!({"id": "B"})));
    let fast = store.begin_refresh(&key);
    store.complete_refresh(fast, page(&["B", "A"], 2));

    assert_eq!(
        store.complete_refresh(slow, page(&["A"], 1)),
        RefreshOutcome::Discarded
    );
    assert_eq!(store.read(&key).expect("cached").total, 2);
}

#[test]
fn capacity_evicts_the_least_recently_refreshed_page() {
    let store = CacheStore::new(CachePolicy::default().with_max_entries(2));
    let keys: Vec<_> = (1..=3).map(|n| CacheKey::new("members", n, 10)).collect();
    for key in &keys {
        store.populate(key, page(&["A"], 1));
    }
    assert_eq!(store.len(), 2);
    assert!(store.read(&keys[0]).is_none());
    assert!(store.read(&keys[2]).is_some());
}

#[test]
fn stale_pages_need_refresh_and_can_be_evicted() {
    let store = CacheStore::new(CachePolicy::default().with_stale_after(Duration::ZERO));
    let key = CacheKey::new("members", 1, 10);
    store.populate(&key, page(&["A"], 1));
    assert!(store.is_stale(&key));
    assert!(store.reader().needs_refresh(&key));
    assert_eq!(store.evict_stale(), 1);
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn successful_submit_patches_the_bound_page() {
    let store = CacheStore::default();
    let key = CacheKey::new("plans", 1, 10);
    store.populate(&key, page(&["A", "B"], 2));
    let binding = CacheBinding::new(
        OptimisticSync::new(store.clone()),
        key.clone(),
        MutationAction::Add,
        "id",
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hook_seen = Arc::clone(&seen);

    let schema = FieldSchema::new([
        FieldDefinition::new("nombre", "Nombre", FieldKind::String).required(),
        FieldDefinition::new("precio", "Precio", FieldKind::Number),
        FieldDefinition::new("color", "Color", FieldKind::Color).with_default("#00aa00"),
    ])
    .expect("schema");
    let mut engine = FormEngine::new(schema, &Layout::stacked(["nombre", "precio", "color"]))
        .expect("engine")
        .with_cache_binding(binding)
        .with_options(FormOptions::default().with_reset_on_success(true))
        .with_on_submit(move |entity| {
            if let Ok(mut seen) = hook_seen.lock() {
                seen.push(entity["id"].clone());
            }
        });

    engine.change("nombre", "Funcional");
    engine.change("precio", "2500");
    let outcome = engine
        .submit(|payload| async move {
            assert_eq!(payload["precio"], json!(2500));
            let mut entity = Value::Object(payload);
            entity["id"] = json!("C");
            Ok::<_, anyhow::Error>(entity)
        })
        .await;
    assert!(matches!(outcome, SubmitOutcome::Submitted(_)));

    let cached = store.read(&key).expect("cached");
    assert_eq!(ids(&cached), [json!("C"), json!("A"), json!("B")]);
    assert_eq!(cached.total, 3);
    assert_eq!(*seen.lock().expect("hook log"), [json!("C")]);
    assert_eq!(engine.state().value("nombre"), "");
    assert_eq!(engine.state().value("color"), "#00aa00");
}

use super::*;
use crate::store::{JsonFileStore, MemoryStore};
use serde_json::{json, Value};

fn cache_with_clock(store: Arc<dyn KeyValueStore>) -> (ResultCache<Value>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let cache = ResultCache::new(store, clock.clone(), "analytics_");
    (cache, clock)
}

#[test]
fn returns_fresh_entries() {
    let (cache, clock) = cache_with_clock(Arc::new(MemoryStore::new()));
    cache.store("summary", &json!({ "average": 12 }));

    clock.advance(300_000);
    assert_eq!(cache.get("summary", 300_000), Some(json!({ "average": 12 })));
}

#[test]
fn expired_entries_are_evicted_on_read() {
    let store = Arc::new(MemoryStore::new());
    let (cache, clock) = cache_with_clock(store.clone());
    cache.store("summary", &json!(1));

    clock.advance(501);
    assert_eq!(cache.get("summary", 500), None);
    assert!(cache.entry("summary").is_none());
    assert!(store.keys().expect("keys").is_empty());

    // A later read with a generous max age still finds nothing.
    assert_eq!(cache.get("summary", i64::MAX), None);
}

#[test]
fn store_replaces_existing_entry() {
    let (cache, clock) = cache_with_clock(Arc::new(MemoryStore::new()));
    cache.store("k", &json!("old"));
    clock.advance(10);
    cache.store("k", &json!("new"));

    let entry = cache.entry("k").expect("entry");
    assert_eq!(entry.payload, json!("new"));
    assert_eq!(entry.stored_at_millis, 1_000_010);
    assert_eq!(entry.key, "k");
}

#[test]
fn persists_data_and_timestamp_under_namespace() {
    let store = Arc::new(MemoryStore::new());
    let (cache, _clock) = cache_with_clock(store.clone());
    cache.store("main", &json!({ "x": 1 }));

    let raw = store
        .get_item("analytics_main")
        .expect("get")
        .expect("stored");
    let stored: Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(stored, json!({ "data": { "x": 1 }, "timestamp": 1_000_000 }));
}

#[test]
fn reads_entries_written_by_other_clients() {
    let store = Arc::new(MemoryStore::new());
    store
        .set_item(
            "analytics_main",
            r#"{"data":{"cost_analysis":{"average":9000}},"timestamp":999000}"#.into(),
        )
        .expect("seed");
    let (cache, _clock) = cache_with_clock(store);

    let hit = cache.get("main", 300_000).expect("hit");
    assert_eq!(hit["cost_analysis"]["average"], 9000);
}

#[test]
fn invalidate_is_noop_for_missing_keys() {
    let (cache, _clock) = cache_with_clock(Arc::new(MemoryStore::new()));
    cache.invalidate("absent");
    cache.store("present", &json!(true));
    cache.invalidate("present");
    assert_eq!(cache.get("present", i64::MAX), None);
}

#[test]
fn clear_removes_only_matching_prefix() {
    let store = Arc::new(MemoryStore::new());
    store.set_item("theme", "dark".into()).expect("foreign key");
    let (cache, _clock) = cache_with_clock(store.clone());
    cache.store("summary:a", &json!(1));
    cache.store("summary:b", &json!(2));
    cache.store("compare:a", &json!(3));

    cache.clear("summary:");
    assert_eq!(cache.get("summary:a", i64::MAX), None);
    assert_eq!(cache.get("summary:b", i64::MAX), None);
    assert_eq!(cache.get("compare:a", i64::MAX), Some(json!(3)));

    cache.clear("");
    assert_eq!(cache.get("compare:a", i64::MAX), None);
    assert_eq!(
        store.get_item("theme").expect("get").as_deref(),
        Some("dark")
    );
}

#[test]
fn quota_failures_are_swallowed() {
    let (cache, _clock) = cache_with_clock(Arc::new(MemoryStore::with_quota(16)));
    cache.store("big", &json!("a payload far larger than the quota"));
    assert_eq!(cache.get("big", i64::MAX), None);
}

#[test]
fn unreadable_entries_are_evicted() {
    let store = Arc::new(MemoryStore::new());
    store
        .set_item("analytics_broken", "{not json".into())
        .expect("seed");
    let (cache, _clock) = cache_with_clock(store.clone());

    assert_eq!(cache.get("broken", i64::MAX), None);
    assert_eq!(store.get_item("analytics_broken").expect("get"), None);
}

#[test]
fn typed_payloads_round_trip_through_file_store() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Summary {
        count: u32,
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cache.json");
    let clock = Arc::new(ManualClock::new(5));
    {
        let store = Arc::new(JsonFileStore::open(&path).expect("open"));
        let cache: ResultCache<Summary> = ResultCache::new(store, clock.clone(), "analytics_");
        cache.store("s", &Summary { count: 3 });
    }

    let store = Arc::new(JsonFileStore::open(&path).expect("reopen"));
    let cache: ResultCache<Summary> = ResultCache::new(store, clock, "analytics_");
    assert_eq!(cache.get("s", 0), Some(Summary { count: 3 }));
}

#[test]
fn unusable_timestamps_are_evicted_instead_of_trusted() {
    let store = Arc::new(MemoryStore::new());
    store
        .set_item(
            "analytics_ancient",
            format!(r#"{{"data":1,"timestamp":{}}}"#, i64::MIN),
        )
        .expect("seed");
    store
        .set_item("analytics_future", r#"{"data":2,"timestamp":2000000}"#.into())
        .expect("seed");
    let (cache, _clock) = cache_with_clock(store.clone());

    assert_eq!(cache.get("ancient", 300_000), None);
    assert_eq!(cache.get("future", 300_000), None);
    assert!(store.keys().expect("keys").is_empty());
}

/*!
 * Store Integration Tests
 * Request flow: store an array once, read it from many requests
 */

use pretty_assertions::assert_eq;
use shared_array::{
    ArrayError, ArrayHandle, FlatValue, Key, RequestArena, SharedArray, SharedStore, Value,
};
use std::sync::Arc;

fn settings() -> Arc<SharedArray> {
    SharedArray::from_flat(&[
        (Key::from("timeout_ms"), FlatValue::Int(250)),
        (Key::from("region"), FlatValue::str("eu-west")),
        (
            Key::from("features"),
            FlatValue::Array(vec![
                (Key::Int(0), FlatValue::str("compact")),
                (Key::Int(1), FlatValue::str("batch")),
            ]),
        ),
    ])
    .unwrap()
}

#[test]
fn test_request_flow_read_only() {
    let store = SharedStore::new();
    store.insert("settings", settings());

    // One request: read, no copies, no mutation.
    let arena = RequestArena::new();
    let h = store.fetch_local("settings", &arena).unwrap();
    assert_eq!(h.get_str("timeout_ms").unwrap().as_int(), Some(250));
    assert!(!h.is_escalated());
    arena.sweep();

    // The store copy is untouched.
    let backing = store.fetch("settings").unwrap();
    assert_eq!(backing.len(), 3);
}

#[test]
fn test_request_flow_mutation_is_request_private() {
    let store = SharedStore::new();
    store.insert("settings", settings());

    let arena = RequestArena::new();
    let h = store.fetch_local("settings", &arena).unwrap();
    h.set(Key::from("region"), Value::str("us-east"));
    assert_eq!(h.get_str("region").unwrap().as_str(), Some("us-east"));
    arena.sweep();

    // A later request still sees the original.
    let arena2 = RequestArena::new();
    let h2 = store.fetch_local("settings", &arena2).unwrap();
    assert_eq!(h2.get_str("region").unwrap().as_str(), Some("eu-west"));
    arena2.sweep();
}

#[test]
fn test_concurrent_readers() {
    let store = Arc::new(SharedStore::new());
    store.insert("settings", settings());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                // Each request runs on its own thread with its own arena.
                let arena = RequestArena::new();
                let mut live = Vec::new();
                for _ in 0..50 {
                    let h = store.fetch_local("settings", &arena).unwrap();
                    assert_eq!(h.get_str("timeout_ms").unwrap().as_int(), Some(250));
                    let features = h.get_str("features").unwrap();
                    assert_eq!(features.as_array().unwrap().len(), 2);
                    live.push(h); // abrupt end of request: nothing dropped
                }
                let stats = arena.sweep();
                drop(live);
                stats
            })
        })
        .collect();

    for handle in handles {
        let stats = handle.join().unwrap();
        // 50 outer wrappers reaped; the 50 nested wrappers die with their
        // owner's cache before the sweep reaches their slot.
        assert_eq!(stats.registered, 100);
        assert_eq!(stats.reaped, 50);
    }
}

#[test]
fn test_add_vs_insert() {
    let store = SharedStore::new();
    store.add("a", settings()).unwrap();
    assert_eq!(
        store.add("a", settings()).unwrap_err(),
        ArrayError::AlreadyStored("a".into())
    );
    store.insert("a", settings()); // overwrite is fine
    assert_eq!(store.len(), 1);
}

#[test]
fn test_removed_entry_stays_readable_through_wrapper() {
    let store = SharedStore::new();
    store.insert("settings", settings());

    let arena = RequestArena::new();
    let h = store.fetch_local("settings", &arena).unwrap();
    store.remove("settings");

    assert!(store.fetch("settings").is_none());
    assert_eq!(h.get_str("region").unwrap().as_str(), Some("eu-west"));
    arena.sweep();
}

#[test]
fn test_round_trip_through_serialization_copy() {
    let store = SharedStore::new();
    store.insert("settings", settings());

    let arena = RequestArena::new();
    let h = store.fetch_local("settings", &arena).unwrap();
    let flat = h.copy_for_serialization();
    let json = serde_json::to_string(&flat).unwrap();
    let back: FlatValue = serde_json::from_str(&json).unwrap();
    assert_eq!(flat, back);

    // The flat tree can seed a new shared array.
    if let FlatValue::Array(entries) = back {
        let rebuilt = SharedArray::from_flat(&entries).unwrap();
        assert_eq!(rebuilt.len(), 3);
        let h2 = ArrayHandle::from_shared(rebuilt, &arena);
        assert_eq!(h2.get_str("region").unwrap().as_str(), Some("eu-west"));
    } else {
        panic!("expected array");
    }
    arena.sweep();
}

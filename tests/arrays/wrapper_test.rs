/*!
 * Wrapper Read-Path Tests
 * Lookups, materialization, iteration order
 */

use pretty_assertions::assert_eq;
use shared_array::{ArrayHandle, FlatValue, Key, RequestArena, SharedArray, Value};
use std::sync::Arc;

fn mixed_backing() -> Arc<SharedArray> {
    SharedArray::from_flat(&[
        (Key::Int(0), FlatValue::str("a")),
        (Key::Int(1), FlatValue::str("b")),
        (Key::from("x"), FlatValue::str("c")),
    ])
    .unwrap()
}

#[test]
fn test_lookup_hits_and_misses() {
    let arena = RequestArena::new();
    let h = ArrayHandle::from_shared(mixed_backing(), &arena);

    assert_eq!(h.get_int(0).unwrap().as_str(), Some("a"));
    assert_eq!(h.get_str("x").unwrap().as_str(), Some("c"));

    // Misses are "absent", never a fault.
    assert!(h.get_int(99).is_none());
    assert!(h.get_int(-1).is_none());
    assert!(h.get_str("nope").is_none());
    assert!(h.get_str("").is_none());
    assert!(!h.exists_int(i64::MAX));
    assert!(!h.exists_str("0x0"));
}

#[test]
fn test_canonical_integer_string_key_resolves() {
    let arena = RequestArena::new();
    let h = ArrayHandle::from_shared(mixed_backing(), &arena);

    // "1" is the same key as 1; "01" is not.
    assert_eq!(h.get_str("1").unwrap().as_str(), Some("b"));
    assert!(h.get_str("01").is_none());
}

#[test]
fn test_materialize_once_stable_identity() {
    let arena = RequestArena::new();
    let h = ArrayHandle::from_shared(mixed_backing(), &arena);

    for key in [Key::Int(0), Key::Int(1), Key::from("x")] {
        let first = h.get(&key).unwrap();
        let second = h.get(&key).unwrap();
        let third = h.get(&key).unwrap();
        assert!(
            Value::same_value(&first, &second) && Value::same_value(&second, &third),
            "repeated lookups of {} must return the identical value",
            key
        );
    }
}

#[test]
fn test_iteration_order_is_insertion_order() {
    let arena = RequestArena::new();
    let h = ArrayHandle::from_shared(mixed_backing(), &arena);

    let items: Vec<_> = h
        .iter()
        .map(|(k, v)| (k, v.as_str().unwrap().to_string()))
        .collect();
    assert_eq!(
        items,
        vec![
            (Key::Int(0), "a".to_string()),
            (Key::Int(1), "b".to_string()),
            (Key::from("x"), "c".to_string()),
        ]
    );
}

#[test]
fn test_iteration_no_skips_no_repeats() {
    let arena = RequestArena::new();
    let entries: Vec<(Key, FlatValue)> = (0..32)
        .map(|i| (Key::Int(i), FlatValue::Int(i * 10)))
        .collect();
    let h = ArrayHandle::from_shared(SharedArray::from_flat(&entries).unwrap(), &arena);

    let mut iter = h.iter();
    let mut positions = Vec::new();
    while !iter.is_end() {
        positions.push(iter.pos());
        iter.next().unwrap();
    }
    assert_eq!(positions, (0..32).collect::<Vec<_>>());
    assert!(iter.next().is_none());
}

#[test]
fn test_reads_never_escalate() {
    let arena = RequestArena::new();
    let h = ArrayHandle::from_shared(mixed_backing(), &arena);

    assert_eq!(h.len(), 3);
    assert!(!h.is_empty());
    assert!(h.exists_int(0));
    assert!(!h.is_vector());
    assert_eq!(h.key_at(2), Some(Key::from("x")));
    let _ = h.get_int(0);
    let _: Vec<_> = h.iter().collect();
    let _ = h.copy();

    assert!(!h.is_escalated(), "no read operation may escalate");
}

#[test]
fn test_vector_backing() {
    let arena = RequestArena::new();
    let h = ArrayHandle::from_shared(
        SharedArray::from_flat(&[
            (Key::Int(0), FlatValue::Int(7)),
            (Key::Int(1), FlatValue::Int(8)),
        ])
        .unwrap(),
        &arena,
    );
    assert!(h.is_vector());
}

#[test]
fn test_nested_shared_values_materialize_recursively() {
    let arena = RequestArena::new();
    let h = ArrayHandle::from_shared(
        SharedArray::from_flat(&[(
            Key::from("config"),
            FlatValue::Array(vec![
                (Key::from("retries"), FlatValue::Int(3)),
                (
                    Key::from("hosts"),
                    FlatValue::Array(vec![
                        (Key::Int(0), FlatValue::str("a.example")),
                        (Key::Int(1), FlatValue::str("b.example")),
                    ]),
                ),
            ]),
        )])
        .unwrap(),
        &arena,
    );

    let config = h.get_str("config").unwrap();
    let config = config.as_array().unwrap();
    assert_eq!(config.get_str("retries").unwrap().as_int(), Some(3));

    let hosts = config.get_str("hosts").unwrap();
    let hosts = hosts.as_array().unwrap();
    assert!(hosts.is_vector());
    assert_eq!(hosts.get_int(1).unwrap().as_str(), Some("b.example"));

    // The nested handle is itself an unescalated shared view.
    assert!(!hosts.is_escalated());
}

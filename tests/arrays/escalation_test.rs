/*!
 * Escalation Tests
 * Mutation-triggered conversion to the fully mutable representation
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
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

fn expected_flat() -> FlatValue {
    FlatValue::Array(vec![
        (Key::Int(0), FlatValue::str("a")),
        (Key::Int(1), FlatValue::str("b")),
        (Key::from("x"), FlatValue::str("c")),
    ])
}

#[test]
fn test_every_mutating_operation_escalates() {
    let arena = RequestArena::new();
    let ops: Vec<(&str, Box<dyn Fn(&ArrayHandle)>)> = vec![
        ("set", Box::new(|h| h.set(Key::Int(0), Value::Null))),
        ("remove", Box::new(|h| {
            h.remove(&Key::Int(0));
        })),
        ("append", Box::new(|h| {
            h.append(Value::Null);
        })),
        ("prepend", Box::new(|h| h.prepend(Value::Null))),
        ("renumber", Box::new(|h| h.renumber())),
        ("sort", Box::new(|h| h.sort(false))),
        ("ksort", Box::new(|h| h.ksort(false))),
        ("asort", Box::new(|h| h.asort(false))),
        ("usort", Box::new(|h| h.usort(Value::cmp_values))),
        ("uasort", Box::new(|h| h.uasort(Value::cmp_values))),
        ("uksort", Box::new(|h| h.uksort(Key::cmp))),
    ];

    for (name, op) in ops {
        let h = ArrayHandle::from_shared(mixed_backing(), &arena);
        assert!(!h.is_escalated());
        op(&h);
        assert!(h.is_escalated(), "{} must escalate", name);
    }
}

#[test]
fn test_escalation_equivalence_cold_and_warm() {
    let arena = RequestArena::new();

    // Cold: nothing read before escalation.
    let cold = ArrayHandle::from_shared(mixed_backing(), &arena);
    assert_eq!(cold.copy_for_serialization(), expected_flat());

    // Fully warm: everything read first.
    let warm = ArrayHandle::from_shared(mixed_backing(), &arena);
    let _: Vec<_> = warm.iter().collect();
    assert_eq!(warm.copy_for_serialization(), expected_flat());
}

#[test]
fn test_single_escalation_releases_backing_exactly_once() {
    let arena = RequestArena::new();
    let source = mixed_backing();
    let baseline = Arc::strong_count(&source);

    let h = ArrayHandle::from_shared(Arc::clone(&source), &arena);
    assert_eq!(Arc::strong_count(&source), baseline + 1);

    h.append(Value::Int(1));
    assert_eq!(Arc::strong_count(&source), baseline);

    // The second mutating call never re-touches the shared backing.
    h.sort(false);
    h.remove(&Key::Int(0));
    assert_eq!(Arc::strong_count(&source), baseline);
}

#[test]
fn test_append_renumbering_matches_delegate() {
    let arena = RequestArena::new();
    let h = ArrayHandle::from_shared(
        SharedArray::from_flat(&[
            (Key::Int(0), FlatValue::Int(10)),
            (Key::Int(5), FlatValue::Int(20)),
            (Key::from("k"), FlatValue::Int(30)),
        ])
        .unwrap(),
        &arena,
    );

    // Backing keys are sparse: the next append key is high-water + 1.
    assert_eq!(h.append(Value::Int(40)), Key::Int(6));
    assert_eq!(h.append(Value::Int(50)), Key::Int(7));
}

#[test]
fn test_sorts_against_shared_backing() {
    let arena = RequestArena::new();
    let h = ArrayHandle::from_shared(
        SharedArray::from_flat(&[
            (Key::from("b"), FlatValue::Int(3)),
            (Key::from("a"), FlatValue::Int(1)),
            (Key::from("c"), FlatValue::Int(2)),
        ])
        .unwrap(),
        &arena,
    );

    h.ksort(false);
    let keys: Vec<_> = h.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![Key::from("a"), Key::from("b"), Key::from("c")]);

    h.asort(false);
    let vals: Vec<_> = h.iter().map(|(_, v)| v.as_int().unwrap()).collect();
    assert_eq!(vals, vec![1, 2, 3]);
    assert!(h.exists_str("b"), "asort preserves keys");

    h.sort(true);
    assert!(h.is_vector(), "sort re-keys 0..len");
    let vals: Vec<_> = h.iter().map(|(_, v)| v.as_int().unwrap()).collect();
    assert_eq!(vals, vec![3, 2, 1]);
}

#[test]
fn test_user_comparator_runs_against_escalated_array() {
    let arena = RequestArena::new();
    let h = ArrayHandle::from_shared(mixed_backing(), &arena);

    let mut calls = 0;
    h.usort(|a, b| {
        calls += 1;
        Value::cmp_values(b, a)
    });
    assert!(calls > 0, "comparator actually invoked");
    assert!(h.is_escalated());
    let vals: Vec<_> = h.iter().map(|(_, v)| v.as_str().unwrap().to_string()).collect();
    assert_eq!(vals, vec!["c", "b", "a"]);
}

#[test]
fn test_merge_escalates_and_applies_merge_rules() {
    let arena = RequestArena::new();
    let target = ArrayHandle::from_shared(mixed_backing(), &arena);
    let other = ArrayHandle::from_entries(vec![
        (Key::from("x"), Value::str("overwritten")),
        (Key::Int(0), Value::str("appended")),
    ]);

    target.merge(&other);
    assert!(target.is_escalated());
    assert_eq!(target.len(), 4);
    assert_eq!(target.get_str("x").unwrap().as_str(), Some("overwritten"));
    assert_eq!(target.get_int(0).unwrap().as_str(), Some("a"));
    assert_eq!(target.get_int(2).unwrap().as_str(), Some("appended"));
}

proptest! {
    /// Escalation equivalence is independent of which subset of keys was
    /// read (and therefore cached) beforehand.
    #[test]
    fn prop_escalation_equivalence_any_warmth(pre_reads in proptest::collection::vec(0usize..8, 0..16)) {
        let entries: Vec<(Key, FlatValue)> = (0..8)
            .map(|i| (Key::Int(i), FlatValue::Int(i * 100)))
            .collect();
        let expected = FlatValue::Array(entries.clone());

        let arena = RequestArena::new();
        let h = ArrayHandle::from_shared(SharedArray::from_flat(&entries).unwrap(), &arena);

        for pos in pre_reads {
            let _ = h.value_at(pos);
        }

        prop_assert_eq!(h.copy_for_serialization(), expected);
    }

    /// Warm slots keep their identity through escalation.
    #[test]
    fn prop_escalation_reuses_cached_values(warm in 0usize..4) {
        let entries: Vec<(Key, FlatValue)> = (0..4)
            .map(|i| (Key::Int(i), FlatValue::Str(format!("v{}", i))))
            .collect();

        let arena = RequestArena::new();
        let h = ArrayHandle::from_shared(SharedArray::from_flat(&entries).unwrap(), &arena);
        let cached = h.value_at(warm).unwrap();

        h.append(Value::Null); // escalate
        let after = h.value_at(warm).unwrap();
        prop_assert!(Value::same_value(&cached, &after));
    }
}

//! Property-based tests for context store semantics.
//!
//! Drives the store with arbitrary operation sequences and checks it against
//! a trivial model: the active context is a plain map that `create` resets,
//! `destroy` clears, and writes mutate with last-write-wins keys.

use std::collections::HashMap;

use proptest::prelude::*;
use tether::{ContextStore, EventBus, EventKind, Interest};

#[derive(Debug, Clone)]
enum Op {
    Create,
    Destroy,
    Put(String, String),
    Remove(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let key = prop::sample::select(vec!["a", "b", "c", "d"]);
    prop_oneof![
        Just(Op::Create),
        Just(Op::Destroy),
        (key.clone(), "[a-z]{0,4}").prop_map(|(k, v)| Op::Put(k.to_string(), v)),
        key.prop_map(|k| Op::Remove(k.to_string())),
    ]
}

/// The store behaves exactly like a resettable map.
#[test]
fn store_matches_the_map_model() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::vec(op_strategy(), 0..40),
            |ops| {
                let store = ContextStore::new(EventBus::new());
                let mut model: Option<HashMap<String, String>> = None;

                for op in &ops {
                    match op {
                        Op::Create => {
                            store.create();
                            model = Some(HashMap::new());
                        }
                        Op::Destroy => {
                            store.destroy();
                            model = None;
                        }
                        Op::Put(k, v) => {
                            store.put(k.clone(), v.clone());
                            if let Some(map) = &mut model {
                                map.insert(k.clone(), v.clone());
                            }
                        }
                        Op::Remove(k) => {
                            store.remove(k);
                            if let Some(map) = &mut model {
                                map.remove(k);
                            }
                        }
                    }

                    assert_eq!(store.is_active(), model.is_some());
                    for key in ["a", "b", "c", "d"] {
                        let expected = model.as_ref().and_then(|map| map.get(key).cloned());
                        assert_eq!(store.get(key), expected, "key {key} diverged");
                    }
                }

                store.destroy();
                Ok(())
            },
        )
        .unwrap();
}

/// For any operation sequence, an end event is only ever published for a
/// context that began, and the trailing destroy leaves nothing active.
/// A replaced context is dropped without an end of its own, so begins may
/// outnumber ends, never the reverse.
#[test]
fn context_ends_never_outnumber_begins() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::vec(op_strategy(), 0..40),
            |ops| {
                let bus = EventBus::new();
                let kinds = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
                let sink = std::sync::Arc::clone(&kinds);
                bus.subscribe_fn(
                    Interest::Kinds(vec![EventKind::ContextBegin, EventKind::ContextEnd]),
                    move |event| sink.lock().push(event.kind()),
                );
                let store = ContextStore::new(bus);

                for op in &ops {
                    match op {
                        Op::Create => {
                            store.create();
                        }
                        Op::Destroy => store.destroy(),
                        Op::Put(k, v) => store.put(k.clone(), v.clone()),
                        Op::Remove(k) => store.remove(k),
                    }
                }
                store.destroy();

                let mut begins = 0i64;
                let mut ends = 0i64;
                for kind in kinds.lock().iter() {
                    match kind {
                        EventKind::ContextBegin => begins += 1,
                        EventKind::ContextEnd => {
                            ends += 1;
                            assert!(ends <= begins, "end without a begin");
                        }
                        _ => {}
                    }
                }
                assert!(!store.is_active());

                Ok(())
            },
        )
        .unwrap();
}

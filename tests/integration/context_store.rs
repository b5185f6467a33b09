//! Context store lifecycle semantics across the public API.

use tether::{ContextStore, EventBus, EventKind, Interest};

use super::test_utils::collect_kinds;

#[test]
fn get_returns_most_recent_put_since_last_create() {
    let store = ContextStore::new(EventBus::new());
    store.create();
    store.put("k", "one");
    store.put("k", "two");
    assert_eq!(store.get("k").as_deref(), Some("two"));

    store.create();
    assert_eq!(store.get("k"), None);
    store.put("k", "three");
    assert_eq!(store.get("k").as_deref(), Some("three"));

    store.destroy();
    assert_eq!(store.get("k"), None);
}

#[test]
fn destroy_on_inactive_unit_is_idempotent() {
    let store = ContextStore::new(EventBus::new());
    store.destroy();
    store.destroy();
    assert!(!store.is_active());

    store.create();
    store.destroy();
    store.destroy();
    assert!(!store.is_active());
}

#[test]
fn remove_deletes_a_single_key() {
    let store = ContextStore::new(EventBus::new());
    store.create();
    store.put("keep", "1");
    store.put("drop", "2");
    store.remove("drop");
    assert_eq!(store.get("keep").as_deref(), Some("1"));
    assert_eq!(store.get("drop"), None);
    store.destroy();
}

#[test]
fn lifecycle_events_are_paired() {
    let bus = EventBus::new();
    let kinds = collect_kinds(&bus);
    let store = ContextStore::new(bus);

    store.create();
    store.destroy();
    // A destroy with nothing active publishes nothing.
    store.destroy();

    assert_eq!(
        *kinds.lock(),
        vec![EventKind::ContextBegin, EventKind::ContextEnd]
    );
}

#[test]
fn context_identity_changes_on_each_create() {
    let bus = EventBus::new();
    let store = ContextStore::new(bus.clone());

    let ids = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&ids);
    bus.subscribe_fn(Interest::Kinds(vec![EventKind::ContextBegin]), move |event| {
        if let Some(context) = &event.context {
            sink.lock().push(context.id());
        }
    });

    let first = store.create();
    let second = store.create();
    store.destroy();

    assert_ne!(first, second);
    assert_eq!(*ids.lock(), vec![first, second]);
}

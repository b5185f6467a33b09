//! Listener failures must never propagate into instrumented application code.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tether::{EventBus, EventKind, Interest};

use super::test_utils::instrumentation;

#[test]
fn panicking_listener_does_not_starve_later_listeners() {
    let bus = EventBus::new();
    bus.subscribe_fn(Interest::All, |_| panic!("listener bug"));

    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    bus.subscribe_fn(Interest::All, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let store = tether::ContextStore::new(bus);
    store.create();
    store.destroy();

    assert_eq!(delivered.load(Ordering::SeqCst), 2);
}

#[test]
fn instrumented_caller_is_unaffected_by_listener_panics() {
    let instr = instrumentation();
    instr
        .bus()
        .subscribe_fn(Interest::Kinds(vec![EventKind::TaskSubmitted]), |_| {
            panic!("submitted handler bug")
        });

    instr.store().create();
    instr.store().put("tid", "42");
    let store = instr.store().clone();
    // Publishing TaskSubmitted hits the panicking listener; wrapping and the
    // task itself still run to completion.
    let task = instr.wrap_task(move || store.get("tid"));
    instr.store().destroy();

    let observed = std::thread::spawn(task).join().unwrap();
    assert_eq!(observed.as_deref(), Some("42"));
}

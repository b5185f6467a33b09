//! Shared helpers for integration tests.

use std::sync::Arc;

use parking_lot::Mutex;
use tether::{ContextStore, EventBus, EventKind, InstallationRegistry, Instrumentation, Interest};

/// Fresh instrumentation with everything enabled.
pub fn instrumentation() -> Instrumentation {
    let bus = EventBus::new();
    Instrumentation::new(
        ContextStore::new(bus.clone()),
        bus,
        InstallationRegistry::new(),
    )
}

/// Record the kinds of all events published on `bus`, in dispatch order.
pub fn collect_kinds(bus: &EventBus) -> Arc<Mutex<Vec<EventKind>>> {
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&kinds);
    bus.subscribe_fn(Interest::All, move |event| sink.lock().push(event.kind()));
    kinds
}

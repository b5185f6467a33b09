//! Synchronous in-process event bus.
//!
//! Dispatch is fan-out in registration order. A publish in flight works from
//! a snapshot of the listener list taken at publish start, and no lock is
//! held while a listener runs, so listeners may publish, subscribe or
//! unsubscribe reentrantly without deadlocking.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::event::events::{Event, EventKind};

/// A subscriber to interception events.
///
/// Implementations must tolerate being called from arbitrary application
/// threads. A panicking listener is isolated and logged; it never stops
/// dispatch to the remaining listeners and never reaches intercepted code.
pub trait Listener: Send + Sync {
    fn on_event(&self, event: &Event);
}

struct FnListener<F>(F);

impl<F> Listener for FnListener<F>
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        (self.0)(event)
    }
}

/// Which event kinds a listener wants to receive.
#[derive(Debug, Clone)]
pub enum Interest {
    All,
    Kinds(Vec<EventKind>),
}

impl Interest {
    fn matches(&self, kind: EventKind) -> bool {
        match self {
            Interest::All => true,
            Interest::Kinds(kinds) => kinds.contains(&kind),
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Registration {
    id: u64,
    interest: Interest,
    listener: Arc<dyn Listener>,
}

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    listeners: RwLock<Vec<Registration>>,
}

/// Ordered publish/subscribe fan-out for interception events.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for the given interest. Listeners receive events
    /// in registration order.
    pub fn subscribe(&self, interest: Interest, listener: Arc<dyn Listener>) -> SubscriptionId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().push(Registration {
            id,
            interest,
            listener,
        });
        SubscriptionId(id)
    }

    /// Closure convenience over [`subscribe`](Self::subscribe).
    pub fn subscribe_fn<F>(&self, interest: Interest, f: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe(interest, Arc::new(FnListener(f)))
    }

    /// Remove a subscription. Returns false if the handle was not registered,
    /// which is safe to ignore.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.inner.listeners.write();
        let before = listeners.len();
        listeners.retain(|registration| registration.id != id.0);
        listeners.len() != before
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.inner
            .listeners
            .read()
            .iter()
            .any(|registration| registration.id == id.0)
    }

    /// Remove all subscriptions, returning the bus to its initial state.
    pub fn clear(&self) {
        self.inner.listeners.write().clear();
    }

    /// Deliver `event` synchronously to every interested listener.
    pub fn publish(&self, event: Event) {
        let kind = event.kind();
        let snapshot: Vec<Arc<dyn Listener>> = {
            let listeners = self.inner.listeners.read();
            listeners
                .iter()
                .filter(|registration| registration.interest.matches(kind))
                .map(|registration| Arc::clone(&registration.listener))
                .collect()
        };

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener.on_event(&event))).is_err() {
                warn!(kind = ?kind, "listener panicked during dispatch, continuing");
            }
        }
    }
}

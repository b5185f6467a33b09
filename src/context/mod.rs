//! Context domain: the propagated metadata scope and its per-thread store.
//!
//! A [`Context`] represents one logical request. Exactly one context is active
//! per execution unit at a time; it crosses concurrency boundaries only by
//! value, through the capture/restore protocol in [`propagation`].

pub mod propagation;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;
use uuid::Uuid;

use crate::event::{Event, EventBus, EventPayload};

pub use propagation::{Handoff, HandoffScope};

/// Opaque unique token identifying one context. Used only for equality and
/// debugging, never semantically interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    fn generate() -> Self {
        ContextId(Uuid::new_v4())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-unique identifier for an execution unit (thread).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitId(u64);

impl UnitId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static UNIT_ID: Cell<u64> = const { Cell::new(0) };
}

/// The id of the calling execution unit, assigned on first use.
pub fn current_unit() -> UnitId {
    UNIT_ID.with(|cell| {
        let mut id = cell.get();
        if id == 0 {
            id = NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed);
            cell.set(id);
        }
        UnitId(id)
    })
}

/// The propagated metadata scope for one logical request.
///
/// Value-like: cloning yields an independent copy whose mutations are
/// invisible to the original. Metadata keys are unique, last write wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    id: ContextId,
    origin: UnitId,
    metadata: HashMap<String, String>,
}

impl Context {
    fn new() -> Self {
        Self {
            id: ContextId::generate(),
            origin: current_unit(),
            metadata: HashMap::new(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The execution unit the context was created on.
    pub fn origin(&self) -> UnitId {
        self.origin
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }
}

// Per-thread slot storage, keyed by store id so that distinct store
// instances in one process never observe each other's contexts.
thread_local! {
    static SLOTS: RefCell<HashMap<u64, Context>> = RefCell::new(HashMap::new());
}

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Owner of the active context for each execution unit.
///
/// All operations are confined to the calling thread's slot; no lock is taken
/// on the hot path. Clones share the same slots, so the store can be handed
/// to every interception site cheaply.
#[derive(Clone)]
pub struct ContextStore {
    id: u64,
    bus: EventBus,
}

impl ContextStore {
    pub fn new(bus: EventBus) -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            bus,
        }
    }

    pub(crate) fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Create a new context for this execution unit, replacing any context
    /// already active here. Nested create is last-write-wins.
    pub fn create(&self) -> ContextId {
        let context = Context::new();
        let id = context.id;
        let unit = current_unit();
        self.swap(Some(context.clone()));
        self.bus
            .publish(Event::with_now(Some(context), EventPayload::ContextBegin { unit }));
        id
    }

    /// Clear the active context for this execution unit. No-op when none is
    /// active.
    pub fn destroy(&self) {
        let unit = current_unit();
        if let Some(previous) = self.swap(None) {
            self.bus
                .publish(Event::with_now(Some(previous), EventPayload::ContextEnd { unit }));
        }
    }

    /// Write a metadata entry into the active context. A write outside any
    /// context scope is logged and dropped; caller code must never crash
    /// because instrumentation had nothing to attach to.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let written = SLOTS.with(|slots| {
            let mut slots = slots.borrow_mut();
            match slots.get_mut(&self.id) {
                Some(context) => {
                    context.metadata.insert(key.clone(), value.into());
                    true
                }
                None => false,
            }
        });
        if !written {
            warn!(key = %key, "metadata write with no active context, dropped");
        }
    }

    /// Remove a metadata entry from the active context. Same inactive policy
    /// as [`put`](Self::put).
    pub fn remove(&self, key: &str) {
        let removed = SLOTS.with(|slots| {
            let mut slots = slots.borrow_mut();
            match slots.get_mut(&self.id) {
                Some(context) => {
                    context.metadata.remove(key);
                    true
                }
                None => false,
            }
        });
        if !removed {
            warn!(key = %key, "metadata remove with no active context, dropped");
        }
    }

    /// Read a metadata value from the active context.
    pub fn get(&self, key: &str) -> Option<String> {
        SLOTS.with(|slots| {
            slots
                .borrow()
                .get(&self.id)
                .and_then(|context| context.metadata.get(key).cloned())
        })
    }

    pub fn context_id(&self) -> Option<ContextId> {
        SLOTS.with(|slots| slots.borrow().get(&self.id).map(|context| context.id))
    }

    pub fn is_active(&self) -> bool {
        SLOTS.with(|slots| slots.borrow().contains_key(&self.id))
    }

    /// Structural copy of the active context, for capture.
    pub(crate) fn snapshot(&self) -> Option<Context> {
        SLOTS.with(|slots| slots.borrow().get(&self.id).cloned())
    }

    /// Replace this unit's slot wholesale, returning the displaced context.
    /// The borrow ends before the caller can publish any event, so listeners
    /// may query the store reentrantly.
    pub(crate) fn swap(&self, next: Option<Context>) -> Option<Context> {
        SLOTS.with(|slots| {
            let mut slots = slots.borrow_mut();
            match next {
                Some(context) => slots.insert(self.id, context),
                None => slots.remove(&self.id),
            }
        })
    }
}

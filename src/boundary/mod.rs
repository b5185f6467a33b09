//! Interception-site glue, one submodule per concurrency primitive.
//!
//! [`Instrumentation`] bundles the context store, event bus and installation
//! registry that every site composes. Wrappers consult
//! [`InstallationRegistry::should_intercept`] first and degrade to
//! transparent pass-throughs when interception is disabled, so decorating a
//! closure or future is always safe.

pub mod executor;
pub mod future;
pub mod thread;

use crate::context::{ContextStore, Handoff};
use crate::event::EventBus;
use crate::install::{InstallationRegistry, Operation};

/// Shared state handed to every interception site. Cheap to clone.
#[derive(Clone)]
pub struct Instrumentation {
    store: ContextStore,
    bus: EventBus,
    registry: InstallationRegistry,
}

impl Instrumentation {
    pub fn new(store: ContextStore, bus: EventBus, registry: InstallationRegistry) -> Self {
        Self {
            store,
            bus,
            registry,
        }
    }

    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn registry(&self) -> &InstallationRegistry {
        &self.registry
    }

    /// Capture the active context for a boundary crossing. Returns an empty
    /// handoff when the operation's interception is disabled or no context
    /// is active; entering an empty handoff is a no-op.
    pub fn capture(&self, operation: Operation) -> Handoff {
        if self.registry.should_intercept(operation) {
            Handoff::capture(&self.store, operation)
        } else {
            Handoff::inert(operation, self.bus.clone())
        }
    }

    /// Run a closure under a previously captured context on the current
    /// unit, reinstating the displaced context afterwards. The scoped-block
    /// analog of `withContext`; nesting is last-write-wins and strictly
    /// paired.
    pub fn with_context<R>(&self, handoff: &Handoff, f: impl FnOnce() -> R) -> R {
        let _scope = handoff.enter(&self.store);
        f()
    }
}

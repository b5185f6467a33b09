//! Capture/restore/cleanup protocol for moving a context across a
//! concurrency boundary.
//!
//! A [`Handoff`] is the by-value capture taken on the origin unit before the
//! boundary is crossed. Entering it on the destination installs the captured
//! context and yields a [`HandoffScope`]; dropping the scope reinstates
//! whatever the destination had before, so pooled workers never leak one
//! task's context into the next. All state lives in the capture itself, so a
//! handoff that is never entered (task rejected, future dropped) simply
//! drops without leaving anything behind.

use crate::context::{current_unit, Context, ContextStore, UnitId};
use crate::event::{Event, EventBus, EventPayload};
use crate::install::Operation;

/// A by-value snapshot of the origin unit's active context, taken
/// immediately before a boundary crossing.
#[derive(Clone)]
pub struct Handoff {
    operation: Operation,
    origin: UnitId,
    capture: Option<Context>,
    bus: EventBus,
}

impl Handoff {
    /// Snapshot the store's active context. When no context is active the
    /// handoff is empty and propagation becomes a no-op downstream; no
    /// events are published for unparented work.
    pub(crate) fn capture(store: &ContextStore, operation: Operation) -> Self {
        let origin = current_unit();
        let capture = store.snapshot();
        let handoff = Self {
            operation,
            origin,
            capture,
            bus: store.bus().clone(),
        };
        if let Some(context) = &handoff.capture {
            handoff.bus.publish(Event::with_now(
                Some(context.clone()),
                EventPayload::HandoffCaptured { operation, origin },
            ));
        }
        handoff
    }

    /// An empty handoff that propagates nothing. Used when the operation's
    /// interception is disabled so wrappers stay transparent.
    pub(crate) fn inert(operation: Operation, bus: EventBus) -> Self {
        Self {
            operation,
            origin: current_unit(),
            capture: None,
            bus,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The unit the capture was taken on.
    pub fn origin(&self) -> UnitId {
        self.origin
    }

    pub fn context(&self) -> Option<&Context> {
        self.capture.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.capture.is_none()
    }

    pub(crate) fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Install the captured context on the calling unit, displacing whatever
    /// was active there. The returned scope must be dropped immediately
    /// after the destination's user code finishes; RAII keeps enter/cleanup
    /// strictly paired and nested. Entering an empty handoff is a no-op.
    ///
    /// The handoff itself is not consumed: cooperative schedulers re-enter
    /// the same creation-time capture at every resumption.
    pub fn enter(&self, store: &ContextStore) -> HandoffScope {
        let Some(context) = &self.capture else {
            return HandoffScope {
                store: None,
                previous: None,
                operation: self.operation,
                origin: self.origin,
                destination: current_unit(),
            };
        };

        let destination = current_unit();
        let previous = store.swap(Some(context.clone()));
        let store = store.clone();
        self.bus.publish(Event::with_now(
            Some(context.clone()),
            EventPayload::HandoffEnter {
                operation: self.operation,
                origin: self.origin,
                destination,
            },
        ));
        HandoffScope {
            store: Some(store),
            previous,
            operation: self.operation,
            origin: self.origin,
            destination,
        }
    }
}

/// Live restore scope on a destination unit. Dropping it runs cleanup:
/// the context active before the handoff is reinstated and a
/// `HandoffExit` event is published.
pub struct HandoffScope {
    store: Option<ContextStore>,
    previous: Option<Context>,
    operation: Operation,
    origin: UnitId,
    destination: UnitId,
}

impl Drop for HandoffScope {
    fn drop(&mut self) {
        let Some(store) = self.store.take() else {
            return;
        };
        let handed_off = store.swap(self.previous.take());
        store.bus().publish(Event::with_now(
            handed_off,
            EventPayload::HandoffExit {
                operation: self.operation,
                origin: self.origin,
                destination: self.destination,
            },
        ));
    }
}

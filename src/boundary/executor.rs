//! Executor / thread-pool submission interception site.

use crate::boundary::Instrumentation;
use crate::context::ContextStore;
use crate::event::{Event, EventBus, EventPayload, TaskRef};
use crate::install::Operation;

/// Publishes the task's terminal event. Firing from `Drop` keeps the
/// completed/failed pair airtight even when the task body unwinds.
struct TaskCompletionGuard {
    bus: EventBus,
    store: ContextStore,
    operation: Operation,
    task: TaskRef,
    armed: bool,
}

impl TaskCompletionGuard {
    fn complete(mut self) {
        if self.armed {
            self.armed = false;
            self.bus.publish(Event::with_now(
                self.store.snapshot(),
                EventPayload::TaskCompleted {
                    operation: self.operation,
                    task: self.task,
                },
            ));
        }
    }
}

impl Drop for TaskCompletionGuard {
    fn drop(&mut self) {
        if self.armed {
            self.bus.publish(Event::with_now(
                self.store.snapshot(),
                EventPayload::TaskFailed {
                    operation: self.operation,
                    task: self.task,
                    error: "task panicked before completing".to_string(),
                },
            ));
        }
    }
}

impl Instrumentation {
    /// Decorate a task closure bound for an executor or thread-pool submit.
    /// Captures the submitter's context now, publishes `TaskSubmitted`, and
    /// restores/cleans up around the body on whichever worker runs it.
    /// `TaskCompleted` (or `TaskFailed` on unwind) is published while the
    /// propagated context is still installed.
    pub fn wrap_task<F, R>(&self, f: F) -> impl FnOnce() -> R + Send + 'static
    where
        F: FnOnce() -> R + Send + 'static,
    {
        let handoff = self.capture(Operation::ExecutorSubmit);
        let task = TaskRef::next();
        let observed = !handoff.is_empty();
        if observed {
            self.bus().publish(Event::with_now(
                handoff.context().cloned(),
                EventPayload::TaskSubmitted {
                    operation: Operation::ExecutorSubmit,
                    origin: handoff.origin(),
                    task,
                },
            ));
        }

        let store = self.store().clone();
        let bus = self.bus().clone();
        move || {
            let _scope = handoff.enter(&store);
            let guard = TaskCompletionGuard {
                bus,
                store: store.clone(),
                operation: Operation::ExecutorSubmit,
                task,
                armed: observed,
            };
            let result = f();
            guard.complete();
            result
        }
    }
}

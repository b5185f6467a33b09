//! Event schema for interception observations.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};

use crate::context::{Context, UnitId};
use crate::install::Operation;

/// Reference to one submitted unit of work (task, future, coroutine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskRef(u64);

impl TaskRef {
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        TaskRef(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of event kinds, used to express subscription interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ContextBegin,
    ContextEnd,
    HandoffCaptured,
    HandoffEnter,
    HandoffExit,
    TaskSubmitted,
    TaskCompleted,
    TaskFailed,
}

/// Kind-specific payload of an event.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// A context was created on `unit`.
    ContextBegin { unit: UnitId },
    /// The active context on `unit` was destroyed.
    ContextEnd { unit: UnitId },
    /// A context was captured at a boundary, about to be handed off.
    HandoffCaptured { operation: Operation, origin: UnitId },
    /// A captured context was installed on the destination unit.
    HandoffEnter {
        operation: Operation,
        origin: UnitId,
        destination: UnitId,
    },
    /// The destination unit finished its work and its prior context was
    /// reinstated.
    HandoffExit {
        operation: Operation,
        origin: UnitId,
        destination: UnitId,
    },
    /// A unit of work was submitted across a boundary.
    TaskSubmitted {
        operation: Operation,
        origin: UnitId,
        task: TaskRef,
    },
    /// A submitted unit of work ran to completion.
    TaskCompleted { operation: Operation, task: TaskRef },
    /// A submitted unit of work failed before completing.
    TaskFailed {
        operation: Operation,
        task: TaskRef,
        error: String,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::ContextBegin { .. } => EventKind::ContextBegin,
            EventPayload::ContextEnd { .. } => EventKind::ContextEnd,
            EventPayload::HandoffCaptured { .. } => EventKind::HandoffCaptured,
            EventPayload::HandoffEnter { .. } => EventKind::HandoffEnter,
            EventPayload::HandoffExit { .. } => EventKind::HandoffExit,
            EventPayload::TaskSubmitted { .. } => EventKind::TaskSubmitted,
            EventPayload::TaskCompleted { .. } => EventKind::TaskCompleted,
            EventPayload::TaskFailed { .. } => EventKind::TaskFailed,
        }
    }
}

/// An immutable record of one observed interception. Created at the
/// interception site, fanned out to listeners, then discarded.
#[derive(Debug, Clone)]
pub struct Event {
    pub ts: String,
    /// Snapshot of the context active at emission time, if any.
    pub context: Option<Context>,
    pub payload: EventPayload,
}

impl Event {
    pub fn with_now(context: Option<Context>, payload: EventPayload) -> Self {
        Self {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            context,
            payload,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

//! Future composition interception site.
//!
//! A cooperative scheduler multiplexes many logical tasks over one physical
//! thread, so restoring the context once at launch is not enough: the
//! adapter re-enters the context captured at creation time at every poll and
//! cleans up after every poll. Whatever happened to be active on the polling
//! thread is never consulted and never leaks.

use std::future::Future;
use std::task::Poll;

use futures::future::poll_fn;

use crate::boundary::Instrumentation;
use crate::event::{Event, EventPayload, TaskRef};
use crate::install::Operation;

impl Instrumentation {
    /// Adapt a future so that the creation-site context is active during
    /// every poll. Publishes `TaskSubmitted` now and `TaskCompleted` when the
    /// future resolves. Dropping the adapted future before completion is
    /// tolerated: all propagation state lives inside the adapter.
    pub fn propagate<Fut>(&self, future: Fut) -> impl Future<Output = Fut::Output>
    where
        Fut: Future,
    {
        let handoff = self.capture(Operation::FutureComposition);
        let task = TaskRef::next();
        let observed = !handoff.is_empty();
        if observed {
            self.bus().publish(Event::with_now(
                handoff.context().cloned(),
                EventPayload::TaskSubmitted {
                    operation: Operation::FutureComposition,
                    origin: handoff.origin(),
                    task,
                },
            ));
        }

        let store = self.store().clone();
        let bus = self.bus().clone();
        let mut inner = Box::pin(future);
        let mut completed = false;
        poll_fn(move |cx| {
            let scope = handoff.enter(&store);
            let poll = inner.as_mut().poll(cx);
            drop(scope);
            if poll.is_ready() && observed && !completed {
                completed = true;
                bus.publish(Event::with_now(
                    handoff.context().cloned(),
                    EventPayload::TaskCompleted {
                        operation: Operation::FutureComposition,
                        task,
                    },
                ));
            }
            poll
        })
    }

    /// Like [`propagate`](Self::propagate) for fallible futures: an `Err`
    /// resolution publishes `TaskFailed` carrying the error's display form.
    pub fn propagate_try<Fut, T, E>(&self, future: Fut) -> impl Future<Output = Fut::Output>
    where
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let handoff = self.capture(Operation::FutureComposition);
        let task = TaskRef::next();
        let observed = !handoff.is_empty();
        if observed {
            self.bus().publish(Event::with_now(
                handoff.context().cloned(),
                EventPayload::TaskSubmitted {
                    operation: Operation::FutureComposition,
                    origin: handoff.origin(),
                    task,
                },
            ));
        }

        let store = self.store().clone();
        let bus = self.bus().clone();
        let mut inner = Box::pin(future);
        let mut completed = false;
        poll_fn(move |cx| {
            let scope = handoff.enter(&store);
            let poll = inner.as_mut().poll(cx);
            drop(scope);
            if let Poll::Ready(result) = &poll {
                if observed && !completed {
                    completed = true;
                    let payload = match result {
                        Ok(_) => EventPayload::TaskCompleted {
                            operation: Operation::FutureComposition,
                            task,
                        },
                        Err(error) => EventPayload::TaskFailed {
                            operation: Operation::FutureComposition,
                            task,
                            error: error.to_string(),
                        },
                    };
                    bus.publish(Event::with_now(handoff.context().cloned(), payload));
                }
            }
            poll
        })
    }

    /// Spawn a propagated future onto the ambient tokio runtime.
    pub fn spawn<Fut>(&self, future: Fut) -> tokio::task::JoinHandle<Fut::Output>
    where
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        tokio::spawn(self.propagate(future))
    }
}

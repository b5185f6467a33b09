//! Untyped hook surface for external instrumentation.
//!
//! The bytecode rewriter (or whatever locates hook points) calls
//! [`HookDispatch::on_enter`] and [`HookDispatch::on_exit`] synchronously at
//! method boundaries. The calls are best-effort: any internal failure is
//! swallowed and logged, because instrumentation must never change the
//! intercepted program's observable behavior.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;
use tracing::{debug, warn};

use crate::boundary::Instrumentation;
use crate::context::HandoffScope;
use crate::install::Operation;

thread_local! {
    static HOOK_SCOPES: RefCell<Vec<(Operation, HandoffScope)>> = RefCell::new(Vec::new());
}

/// Entry points invoked by instrumentation at well-known program points.
#[derive(Clone)]
pub struct HookDispatch {
    instrumentation: Instrumentation,
}

impl HookDispatch {
    pub fn new(instrumentation: Instrumentation) -> Self {
        Self { instrumentation }
    }

    /// Called at entry of an intercepted operation. Captures the active
    /// context and opens a restore scope that the matching
    /// [`on_exit`](Self::on_exit) closes. `detail` is opaque, best-effort
    /// call-site data used only for diagnostics.
    pub fn on_enter(&self, operation: Operation, detail: Value) {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            debug!(operation = %operation, detail = %detail, "hook enter");
            let handoff = self.instrumentation.capture(operation);
            let scope = handoff.enter(self.instrumentation.store());
            HOOK_SCOPES.with(|scopes| scopes.borrow_mut().push((operation, scope)));
        }));
        if outcome.is_err() {
            warn!(operation = %operation, "internal error in hook enter, swallowed");
        }
    }

    /// Called at exit of an intercepted operation. Closes the scope opened
    /// by the matching `on_enter`; unbalanced calls are logged and ignored.
    pub fn on_exit(&self, operation: Operation, error: Option<&str>) {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            if let Some(error) = error {
                debug!(operation = %operation, error = %error, "hook exit with error");
            } else {
                debug!(operation = %operation, "hook exit");
            }
            let popped = HOOK_SCOPES.with(|scopes| {
                let mut scopes = scopes.borrow_mut();
                match scopes.last() {
                    Some((top, _)) if *top == operation => scopes.pop(),
                    _ => None,
                }
            });
            if popped.is_none() {
                warn!(operation = %operation, "unbalanced hook exit, ignored");
            }
            // Dropping the popped scope runs cleanup and publishes the exit
            // event.
        }));
        if outcome.is_err() {
            warn!(operation = %operation, "internal error in hook exit, swallowed");
        }
    }
}

//! Thread-start interception site.

use crate::boundary::Instrumentation;
use crate::install::Operation;

impl Instrumentation {
    /// Decorate a closure bound for `thread::spawn` (or a thread subclass
    /// equivalent). The caller's context is captured now; the new thread
    /// inherits it for the duration of the body and is restored to its prior
    /// state afterwards.
    pub fn wrap_thread<F>(&self, f: F) -> impl FnOnce() + Send + 'static
    where
        F: FnOnce() + Send + 'static,
    {
        let handoff = self.capture(Operation::ThreadHandoff);
        let store = self.store().clone();
        move || {
            let _scope = handoff.enter(&store);
            f()
        }
    }
}

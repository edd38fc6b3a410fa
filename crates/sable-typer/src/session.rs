//! Shared state for the parallel unit-preparation phase.
//!
//! Parsing and macro expansion may run one worker per input unit. The
//! workers share exactly two things: a one-time builtins-initialized
//! flag and a diagnostic sink, both behind mutexes on a single
//! explicitly-passed session. Graph construction and resolution happen
//! after this phase, on one thread, and never touch the session locks.

use std::sync::Mutex;

use sable_common::Diagnostic;

/// One compilation's shared session, threaded through unit preparation.
#[derive(Debug, Default)]
pub struct Session {
    builtins_done: Mutex<bool>,
    sink: Mutex<Vec<Diagnostic>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `init` exactly once across all workers. Returns whether this
    /// call was the one that performed the initialization.
    pub fn init_builtins<F: FnOnce()>(&self, init: F) -> bool {
        let mut done = self
            .builtins_done
            .lock()
            .expect("builtins flag lock poisoned");
        if *done {
            return false;
        }
        init();
        *done = true;
        true
    }

    /// Report a diagnostic from a preparation worker.
    pub fn report(&self, diagnostic: Diagnostic) {
        self.sink
            .lock()
            .expect("diagnostic sink lock poisoned")
            .push(diagnostic);
    }

    /// Whether any worker has reported a problem.
    pub fn has_errors(&self) -> bool {
        !self
            .sink
            .lock()
            .expect("diagnostic sink lock poisoned")
            .is_empty()
    }

    /// Drain every collected diagnostic, in report order.
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(
            &mut *self
                .sink
                .lock()
                .expect("diagnostic sink lock poisoned"),
        )
    }
}

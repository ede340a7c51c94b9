//! Fan-in of asynchronous completions
//!
//! [`RefCountedCallback`] aggregates the outcomes of independent
//! operations into one completion. Every clone stands for one outstanding
//! operation; the completion fires when the last clone is dropped.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{DistError, Result};

/// Completion invoked once with the aggregated outcome
pub type CallbackFn = Box<dyn FnOnce(Result<()>) + Send + 'static>;

struct FanInState {
    first_error: Option<DistError>,
    suppressed: usize,
}

struct Inner {
    state: Mutex<FanInState>,
    done: Mutex<Option<CallbackFn>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.suppressed > 0 {
            warn!(
                "{} additional error(s) discarded, reporting the first",
                state.suppressed
            );
        }
        let outcome = match state.first_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        };
        if let Some(done) = self.done.get_mut().take() {
            done(outcome);
        }
    }
}

/// Reference-counted completion that keeps the first error reported
#[derive(Clone)]
pub struct RefCountedCallback {
    inner: Arc<Inner>,
}

impl RefCountedCallback {
    pub fn new<F>(done: F) -> Self
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let done: CallbackFn = Box::new(done);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(FanInState {
                    first_error: None,
                    suppressed: 0,
                }),
                done: Mutex::new(Some(done)),
            }),
        }
    }

    /// Record the outcome of one operation.
    ///
    /// Only the first error is kept; later ones are counted and logged.
    pub fn update_state(&self, outcome: Result<()>) {
        let Err(err) = outcome else {
            return;
        };
        let mut state = self.inner.state.lock();
        if state.first_error.is_none() {
            state.first_error = Some(err);
        } else {
            warn!("Discarding error after first failure: {}", err);
            state.suppressed += 1;
        }
    }

    /// Number of live references, including this one
    pub fn pending(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Reference for one operation that must report back.
    ///
    /// Dropping the guard without [`OutcomeGuard::complete`] records an
    /// internal error for `operation`.
    pub fn guard(&self, operation: impl Into<String>) -> OutcomeGuard {
        OutcomeGuard {
            rc: self.clone(),
            operation: operation.into(),
            recorded: false,
        }
    }
}

/// One outstanding operation of a [`RefCountedCallback`]
pub struct OutcomeGuard {
    rc: RefCountedCallback,
    operation: String,
    recorded: bool,
}

impl OutcomeGuard {
    pub fn complete(mut self, outcome: Result<()>) {
        self.recorded = true;
        self.rc.update_state(outcome);
    }
}

impl Drop for OutcomeGuard {
    fn drop(&mut self) {
        if !self.recorded {
            warn!("{} ended without completing", self.operation);
            self.rc.update_state(Err(DistError::internal(format!(
                "{} ended without completing",
                self.operation
            ))));
        }
    }
}

//! C5: deferred outcome objects.
//!
//! AMQP-CPP gives every asynchronous operation its own `DeferredXxx`
//! subclass of a common `Deferred` base (the `include/deferred*.h`
//! family), each overriding a virtual `reportSuccess`. This is the
//! idiomatic Rust version of that: one generic type parameterized over
//! the success payload, with an explicit `next` field standing in for
//! the base class's intrusive chain (`include/callbacks.h`'s per-type
//! deques of deferreds that fire in turn, successor before finalizer).
//! Firing is synchronous and immediate, not queued behind an executor:
//! a deferred has at most one outcome, and `finalize` always runs after
//! it regardless of which one.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::AMQPError;

enum Outcome<T> {
    Success(T),
    Error(AMQPError),
}

struct Inner<T> {
    outcome: Option<Outcome<T>>,
    on_success: Option<Box<dyn FnOnce(T) + Send>>,
    on_error: Option<Box<dyn FnOnce(AMQPError) + Send>>,
    on_finalize: Option<Box<dyn FnOnce() + Send>>,
    finalized: bool,
    /// Fired once this deferred finalizes, chaining a follow-up deferred
    /// the way AMQP-CPP's `Callbacks` queue advances to the next waiting
    /// entry once the current one is reported.
    next: Option<Box<dyn FnOnce() + Send>>,
}

impl<T> Default for Inner<T> {
    fn default() -> Self {
        Inner {
            outcome: None,
            on_success: None,
            on_error: None,
            on_finalize: None,
            finalized: false,
            next: None,
        }
    }
}

/// A single-fire, callback-driven outcome of one asynchronous broker
/// request.
///
/// Cloning shares the same underlying outcome slot, the way lapin's
/// `PromiseResolver` is a cheap handle over shared state; the difference
/// here is that reporting an outcome invokes callbacks inline rather than
/// waking a future.
pub struct Deferred<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Deferred {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static + Send> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static + Send> Deferred<T> {
    pub fn new() -> Self {
        Deferred {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Registers the success callback. If the outcome already landed,
    /// fires (and finalizes) immediately instead of being lost.
    pub fn on_success(self, f: impl FnOnce(T) + Send + 'static) -> Self {
        let pending = {
            let mut inner = self.inner.lock();
            match &inner.outcome {
                Some(Outcome::Success(_)) => match inner.outcome.take() {
                    Some(Outcome::Success(value)) => Some(value),
                    _ => unreachable!(),
                },
                _ => None,
            }
        };
        match pending {
            Some(value) => {
                f(value);
                self.finalize();
            }
            None => {
                let mut inner = self.inner.lock();
                inner.on_success = Some(Box::new(f));
            }
        }
        self
    }

    pub fn on_error(self, f: impl FnOnce(AMQPError) + Send + 'static) -> Self {
        let pending = {
            let mut inner = self.inner.lock();
            match &inner.outcome {
                Some(Outcome::Error(_)) => match inner.outcome.take() {
                    Some(Outcome::Error(e)) => Some(e),
                    _ => unreachable!(),
                },
                _ => None,
            }
        };
        match pending {
            Some(e) => {
                f(e);
                self.finalize();
            }
            None => {
                let mut inner = self.inner.lock();
                inner.on_error = Some(Box::new(f));
            }
        }
        self
    }

    /// Registers the finalizer, run after success or error either way.
    pub fn on_finalize(self, f: impl FnOnce() + Send + 'static) -> Self {
        let fire_now = {
            let inner = self.inner.lock();
            inner.finalized
        };
        if fire_now {
            f();
        } else {
            let mut inner = self.inner.lock();
            if inner.finalized {
                drop(inner);
                f();
            } else {
                inner.on_finalize = Some(Box::new(f));
            }
        }
        self
    }

    /// Chains a successor to run once this deferred finalizes.
    pub fn chain_next(&self, f: impl FnOnce() + Send + 'static) {
        let fire_now = {
            let inner = self.inner.lock();
            inner.finalized
        };
        if fire_now {
            f();
        } else {
            let mut inner = self.inner.lock();
            if inner.finalized {
                drop(inner);
                f();
            } else {
                inner.next = Some(Box::new(f));
            }
        }
    }

    /// Reports success. A no-op if this deferred already has an outcome.
    pub fn resolve(&self, value: T) {
        let cb = {
            let mut inner = self.inner.lock();
            if inner.outcome.is_some() {
                return;
            }
            inner.on_success.take()
        };
        match cb {
            Some(cb) => {
                cb(value);
                self.finalize();
            }
            None => {
                let mut inner = self.inner.lock();
                inner.outcome = Some(Outcome::Success(value));
            }
        }
    }

    /// Reports failure. A no-op if this deferred already has an outcome.
    pub fn reject(&self, error: AMQPError) {
        let cb = {
            let mut inner = self.inner.lock();
            if inner.outcome.is_some() {
                return;
            }
            inner.on_error.take()
        };
        match cb {
            Some(cb) => {
                cb(error);
                self.finalize();
            }
            None => {
                let mut inner = self.inner.lock();
                inner.outcome = Some(Outcome::Error(error));
            }
        }
    }

    fn finalize(&self) {
        let (finalize_cb, next_cb) = {
            let mut inner = self.inner.lock();
            if inner.finalized {
                return;
            }
            inner.finalized = true;
            (inner.on_finalize.take(), inner.next.take())
        };
        if let Some(cb) = next_cb {
            cb();
        }
        if let Some(cb) = finalize_cb {
            cb();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn success_then_finalize_fires_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let deferred: Deferred<u32> = Deferred::new();
        let o1 = order.clone();
        let o2 = order.clone();
        let deferred = deferred
            .on_success(move |v| o1.lock().push(format!("success:{}", v)))
            .on_finalize(move || o2.lock().push("finalize".to_string()));
        deferred.resolve(42);
        assert_eq!(*order.lock(), vec!["success:42", "finalize"]);
    }

    #[test]
    fn error_does_not_trigger_success_callback() {
        let fired = Arc::new(AtomicBool::new(false));
        let f = fired.clone();
        let deferred: Deferred<u32> = Deferred::new();
        let deferred = deferred.on_success(move |_| f.store(true, Ordering::SeqCst));
        deferred.reject(AMQPError::new(404, "not found"));
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn callback_registered_after_outcome_still_fires() {
        let deferred: Deferred<u32> = Deferred::new();
        deferred.resolve(7);
        let fired = Arc::new(AtomicBool::new(false));
        let f = fired.clone();
        deferred.on_success(move |v| {
            assert_eq!(v, 7);
            f.store(true, Ordering::SeqCst);
        });
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn chained_next_runs_before_finalize() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let deferred: Deferred<()> = Deferred::new();
        let o1 = order.clone();
        let deferred = deferred.on_finalize(move || o1.lock().push("finalize"));
        let o2 = order.clone();
        deferred.chain_next(move || o2.lock().push("next"));
        deferred.resolve(());
        assert_eq!(*order.lock(), vec!["next", "finalize"]);
    }

    #[test]
    fn double_resolve_is_a_no_op() {
        let count = Arc::new(Mutex::new(0));
        let deferred: Deferred<u32> = Deferred::new();
        let c = count.clone();
        let deferred = deferred.on_success(move |_| *c.lock() += 1);
        deferred.resolve(1);
        deferred.resolve(2);
        assert_eq!(*count.lock(), 1);
    }
}

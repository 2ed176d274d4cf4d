#![forbid(unsafe_code)]

//! Reactions: eagerly re-running computations with implicit dependencies.
//!
//! A [`Reaction`] runs a closure, records every [`Signal`] read during the
//! run (via the tracking scopes in `signal`), and subscribes to each of
//! them so the closure re-runs whenever any dependency fires. Dependencies
//! are re-captured on every run, so conditional reads track correctly.
//!
//! This is the eager counterpart to a lazily-memoized computed value: the
//! host change-propagation model here is "run now, run again on change",
//! which is what a binding needs — its side effect is writing into the
//! node tree.
//!
//! # Invariants
//!
//! 1. `Reaction::new` runs the closure exactly once before returning;
//!    `Reaction::deferred` does not run it until a dependency fires or
//!    [`run()`](Reaction::run) is called.
//! 2. After `dispose()` (or drop) the closure never runs again.
//! 3. A reaction never re-enters itself: a dependency fired from inside
//!    the closure's own run is ignored for that run.
//! 4. Each run's subscriptions replace the previous run's wholesale.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::signal::{Subscription, scope};

struct ReactionInner {
    body: RefCell<Box<dyn FnMut()>>,
    subscriptions: RefCell<Vec<Subscription>>,
    disposed: Cell<bool>,
    running: Cell<bool>,
}

/// An eagerly re-running reactive computation.
///
/// Dropping the handle disposes the reaction (subscriptions unwind via
/// RAII), so a `Reaction` is typically held by whatever owns the lifetime
/// of its side effects — in Weft, a node's binding guards.
pub struct Reaction {
    inner: Rc<ReactionInner>,
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaction")
            .field("disposed", &self.inner.disposed.get())
            .field("dependencies", &self.inner.subscriptions.borrow().len())
            .finish()
    }
}

impl Reaction {
    /// Create a reaction and run it immediately.
    pub fn new(body: impl FnMut() + 'static) -> Self {
        let reaction = Self::deferred(body);
        reaction.run();
        reaction
    }

    /// Create a reaction without an initial run. It stays inert until
    /// [`run()`](Reaction::run) is called (it has no dependencies yet).
    pub fn deferred(body: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(ReactionInner {
                body: RefCell::new(Box::new(body)),
                subscriptions: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
                running: Cell::new(false),
            }),
        }
    }

    /// Run the closure now, re-capturing dependencies.
    pub fn run(&self) {
        Self::execute(&self.inner);
    }

    fn execute(inner: &Rc<ReactionInner>) {
        if inner.disposed.get() || inner.running.get() {
            return;
        }
        inner.running.set(true);
        let ((), deps) = scope::capture(|| (inner.body.borrow_mut())());

        let weak = Rc::downgrade(inner);
        let mut subscriptions = Vec::with_capacity(deps.len());
        for signal in &deps {
            let weak = weak.clone();
            subscriptions.push(signal.subscribe(move || {
                if let Some(inner) = weak.upgrade() {
                    Self::execute(&inner);
                }
            }));
        }
        *inner.subscriptions.borrow_mut() = subscriptions;
        inner.running.set(false);
    }

    /// Permanently stop the reaction and drop its subscriptions.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        self.inner.subscriptions.borrow_mut().clear();
    }

    /// Whether `dispose()` has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of signals the last run subscribed to.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.inner.subscriptions.borrow().len()
    }
}

impl Drop for Reaction {
    fn drop(&mut self) {
        self.inner.disposed.set(true);
        // Subscriptions unwind when the inner Rc drops; clearing here keeps
        // behavior identical even if a callback still holds the inner alive.
        if let Ok(mut subs) = self.inner.subscriptions.try_borrow_mut() {
            subs.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Signal;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn runs_immediately() {
        let runs = Rc::new(Cell::new(0));
        let r = Rc::clone(&runs);
        let _reaction = Reaction::new(move || r.set(r.get() + 1));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn deferred_waits_for_run() {
        let runs = Rc::new(Cell::new(0));
        let r = Rc::clone(&runs);
        let reaction = Reaction::deferred(move || r.set(r.get() + 1));
        assert_eq!(runs.get(), 0);
        reaction.run();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn reruns_when_dependency_fires() {
        let signal = Signal::new();
        let runs = Rc::new(Cell::new(0));

        let sig = signal.clone();
        let r = Rc::clone(&runs);
        let _reaction = Reaction::new(move || {
            sig.track();
            r.set(r.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        signal.notify();
        signal.notify();
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn dependencies_recaptured_each_run() {
        let first = Signal::new();
        let second = Signal::new();
        let use_first = Rc::new(Cell::new(true));
        let runs = Rc::new(Cell::new(0));

        let (a, b) = (first.clone(), second.clone());
        let flag = Rc::clone(&use_first);
        let r = Rc::clone(&runs);
        let _reaction = Reaction::new(move || {
            if flag.get() {
                a.track();
            } else {
                b.track();
            }
            r.set(r.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        use_first.set(false);
        first.notify(); // re-run; now tracks `second` instead
        assert_eq!(runs.get(), 2);

        first.notify();
        assert_eq!(runs.get(), 2, "stale dependency must be dropped");
        second.notify();
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn dispose_stops_reruns() {
        let signal = Signal::new();
        let runs = Rc::new(Cell::new(0));

        let sig = signal.clone();
        let r = Rc::clone(&runs);
        let reaction = Reaction::new(move || {
            sig.track();
            r.set(r.get() + 1);
        });
        reaction.dispose();
        assert!(reaction.is_disposed());

        signal.notify();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn drop_stops_reruns() {
        let signal = Signal::new();
        let runs = Rc::new(Cell::new(0));

        let sig = signal.clone();
        let r = Rc::clone(&runs);
        let reaction = Reaction::new(move || {
            sig.track();
            r.set(r.get() + 1);
        });
        drop(reaction);

        signal.notify();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn no_reentrant_self_run() {
        let signal = Signal::new();
        let runs = Rc::new(Cell::new(0));

        let sig = signal.clone();
        let r = Rc::clone(&runs);
        let _reaction = Reaction::new(move || {
            sig.track();
            r.set(r.get() + 1);
            if r.get() < 5 {
                sig.notify(); // fired mid-run; must not recurse
            }
        });
        assert_eq!(runs.get(), 1);

        signal.notify();
        assert_eq!(runs.get(), 2, "one re-run per external notify");
    }

    #[test]
    fn dependency_count_reflects_last_run() {
        let a = Signal::new();
        let b = Signal::new();
        let (sa, sb) = (a.clone(), b.clone());
        let reaction = Reaction::new(move || {
            sa.track();
            sb.track();
        });
        assert_eq!(reaction.dependency_count(), 2);
    }
}

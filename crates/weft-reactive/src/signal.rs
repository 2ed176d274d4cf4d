#![forbid(unsafe_code)]

//! Unit change signals with dependency-tracking scopes.
//!
//! A [`Signal`] carries no value. It has exactly two capabilities:
//!
//! - [`track()`](Signal::track): register the signal as a dependency of the
//!   innermost ambient tracking scope (opened by `Reaction` in this crate).
//!   Outside any scope, `track()` is a no-op.
//! - [`notify()`](Signal::notify): invoke every live subscriber, in
//!   registration order.
//!
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification; the strong reference lives in the [`Subscription`]
//! RAII guard returned by [`subscribe()`](Signal::subscribe).
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 3. `notify()` snapshots the subscriber list before invoking callbacks, so
//!    callbacks may subscribe or unsubscribe (including themselves) without
//!    poisoning the iteration.
//! 4. `track()` records each signal at most once per scope.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Callback = Rc<dyn Fn()>;

struct SignalInner {
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<(u64, Weak<dyn Fn()>)>>,
}

/// A shared, clonable change-notification cell.
///
/// Cloning a `Signal` creates a new handle to the **same** subscriber list.
pub struct Signal {
    inner: Rc<SignalInner>,
}

impl Clone for Signal {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal {
    /// Create a signal with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SignalInner {
                next_id: Cell::new(1),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Register this signal with the innermost tracking scope, if any.
    pub fn track(&self) {
        scope::record(self);
    }

    /// Invoke all live subscribers in registration order.
    ///
    /// Dead (dropped) subscriptions are pruned here rather than at drop time.
    pub fn notify(&self) {
        let live: Vec<Callback> = {
            let mut subs = self.inner.subscribers.borrow_mut();
            subs.retain(|(_, weak)| weak.strong_count() > 0);
            subs.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
        };
        for callback in live {
            callback();
        }
    }

    /// Subscribe a callback, returning an RAII guard that unsubscribes on
    /// drop.
    #[must_use]
    pub fn subscribe(&self, f: impl Fn() + 'static) -> Subscription {
        let callback: Callback = Rc::new(f);
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::downgrade(&callback)));
        Subscription {
            _callback: callback,
            signal: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Number of currently-live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .borrow()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    /// Whether two handles refer to the same signal.
    #[must_use]
    pub fn ptr_eq(&self, other: &Signal) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Run `f` with dependency tracking suppressed: signal reads inside it are
/// not recorded by any enclosing reaction. Reactions created inside still
/// track their own reads normally (they open fresh frames).
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let (result, _discarded) = scope::capture(f);
    result
}

/// RAII guard for a [`Signal`] subscription.
///
/// Holds the only strong reference to the callback; dropping the guard makes
/// the signal's weak entry dead, so the callback can never fire again.
pub struct Subscription {
    _callback: Callback,
    signal: Weak<SignalInner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.signal.upgrade() {
            // The list may be borrowed if we are dropped from inside a
            // notification snapshot; the lazy prune in notify() covers that.
            if let Ok(mut subs) = inner.subscribers.try_borrow_mut() {
                subs.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// ---------------------------------------------------------------------------
// Tracking scopes
// ---------------------------------------------------------------------------

pub(crate) mod scope {
    use super::Signal;
    use std::cell::RefCell;

    thread_local! {
        static FRAMES: RefCell<Vec<Vec<Signal>>> = const { RefCell::new(Vec::new()) };
    }

    /// Record a signal read into the innermost open frame, deduplicated.
    pub(crate) fn record(signal: &Signal) {
        FRAMES.with(|frames| {
            if let Some(top) = frames.borrow_mut().last_mut() {
                if !top.iter().any(|s| s.ptr_eq(signal)) {
                    top.push(signal.clone());
                }
            }
        });
    }

    struct FrameGuard;

    impl Drop for FrameGuard {
        fn drop(&mut self) {
            FRAMES.with(|frames| {
                frames.borrow_mut().pop();
            });
        }
    }

    /// Run `f` inside a fresh tracking frame and return its recorded
    /// dependencies. Frames nest: reads inside an inner frame never leak
    /// into the outer one.
    pub(crate) fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<Signal>) {
        FRAMES.with(|frames| frames.borrow_mut().push(Vec::new()));
        let guard = FrameGuard;
        let result = f();
        let deps = FRAMES.with(|frames| {
            frames
                .borrow()
                .last()
                .cloned()
                .unwrap_or_default()
        });
        drop(guard);
        (result, deps)
    }
}

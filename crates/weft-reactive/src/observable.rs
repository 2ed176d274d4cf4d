#![forbid(unsafe_code)]

//! Shared, change-tracked value wrappers.
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. An embedded [`Signal`] provides dependency registration for
//! reactions; typed subscribers receive a snapshot of the new value.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version
//!    bump, no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::signal::{Signal, Subscription};

struct ObservableInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    changed: Signal,
}

/// A shared, version-tracked value wrapper with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** value.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an observable holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                changed: Signal::new(),
            }),
        }
    }

    /// Current value (cloned). Registers a dependency with the ambient
    /// tracking scope.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.changed.track();
        self.inner.value.borrow().clone()
    }

    /// Borrowed read through a closure. Registers a dependency.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.changed.track();
        f(&self.inner.value.borrow())
    }

    /// Current value without dependency registration.
    #[must_use]
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Replace the value. Equal values are a no-op; otherwise the version
    /// bumps and subscribers are notified with a snapshot of the new value.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.inner.version.set(self.inner.version.get() + 1);
        self.inner.changed.notify();
    }

    /// Subscribe to value changes. The callback receives a snapshot of the
    /// value at notification time.
    #[must_use]
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let inner = Rc::clone(&self.inner);
        self.inner.changed.subscribe(move || {
            let snapshot = inner.value.borrow().clone();
            f(&snapshot);
        })
    }

    /// Mutation counter; bumps by exactly one per value-changing `set`.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// The underlying change signal (used by the binding layer to forward
    /// cell subscriptions).
    #[must_use]
    pub fn changed(&self) -> Signal {
        self.inner.changed.clone()
    }

    /// Whether two handles refer to the same underlying value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Observable<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#![forbid(unsafe_code)]

//! Reactive primitives for Weft.
//!
//! This crate is the host-framework boundary the repeat reconciler builds
//! on: change-tracking primitives with single-threaded `Rc<RefCell>`
//! sharing and RAII subscription guards.
//!
//! - [`Signal`]: a unit change-notification cell — `track()` registers a
//!   dependency with the ambient tracking scope, `notify()` fires
//!   subscribers in registration order.
//! - [`Observable`]: a shared, version-tracked value wrapper built on
//!   `Signal`.
//! - [`Reaction`]: an eagerly re-running computation with implicitly
//!   captured dependencies (`runReactively`).
//! - [`ReactiveCell`]: the `{read, write, subscribe}` capability the
//!   binding layer dispatches on.
//! - [`Value`] / [`ValueList`]: dynamic binding values and shared
//!   sequences with a structural change signal.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 3. A [`Reaction`] re-captures its dependency set on every run.
//! 4. Structural sequence mutations notify; slot assignment is silent.

pub mod cell;
pub mod effect;
pub mod observable;
pub mod signal;
pub mod value;

pub use cell::{ReactiveCell, cell_value};
pub use effect::Reaction;
pub use observable::Observable;
pub use signal::{Signal, Subscription, untracked};
pub use value::{Value, ValueList, is_reactive_value, unwrap_value};

#![forbid(unsafe_code)]

//! The reactive-cell capability.
//!
//! [`ReactiveCell`] is the tagged `{read, write, subscribe}` interface the
//! binding layer dispatches on when deciding whether a value is "reactive":
//! two-way bindings read and write through the cell transparently, and
//! reads register dependencies with the ambient tracking scope. Anything
//! that satisfies the capability — a plain [`Observable<Value>`] or a
//! repeat item accessor — participates identically.

use std::rc::Rc;

use crate::observable::Observable;
use crate::signal::Subscription;
use crate::value::Value;

/// A readable, writable, subscribable value slot.
pub trait ReactiveCell {
    /// Current value. Implementations register a dependency with the
    /// ambient tracking scope.
    fn read(&self) -> Value;

    /// Replace the value (or forward the write to a more specific slot).
    fn write(&self, value: Value);

    /// Subscribe to change notifications for this cell.
    fn subscribe(&self, f: Box<dyn Fn()>) -> Subscription;
}

impl ReactiveCell for Observable<Value> {
    fn read(&self) -> Value {
        self.get()
    }

    fn write(&self, value: Value) {
        self.set(value);
    }

    fn subscribe(&self, f: Box<dyn Fn()>) -> Subscription {
        self.changed().subscribe(move || f())
    }
}

/// Wrap an observable as a [`Value::Cell`].
#[must_use]
pub fn cell_value(observable: &Observable<Value>) -> Value {
    Value::Cell(Rc::new(observable.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn observable_cell_round_trip() {
        let obs = Observable::new(Value::Int(1));
        let cell: Rc<dyn ReactiveCell> = Rc::new(obs.clone());

        assert_eq!(cell.read(), Value::Int(1));
        cell.write(Value::Int(2));
        assert_eq!(obs.get(), Value::Int(2));
    }

    #[test]
    fn observable_cell_subscribe_fires_on_write() {
        let obs = Observable::new(Value::Int(0));
        let cell: Rc<dyn ReactiveCell> = Rc::new(obs.clone());
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = cell.subscribe(Box::new(move || h.set(h.get() + 1)));

        cell.write(Value::Int(1));
        assert_eq!(hits.get(), 1);
        cell.write(Value::Int(1)); // equal value: no-op
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn cell_value_wraps_same_observable() {
        let obs = Observable::new(Value::str("x"));
        let value = cell_value(&obs);
        let Value::Cell(cell) = value else {
            panic!("expected a cell");
        };
        cell.write(Value::str("y"));
        assert_eq!(obs.get(), Value::str("y"));
    }
}

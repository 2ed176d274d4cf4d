#![forbid(unsafe_code)]

//! Item accessors.
//!
//! An [`ItemAccessor`] exposes one sequence slot as a [`ReactiveCell`] —
//! the capability marker that lets two-way bindings read and write through
//! it as if it were an ordinary reactive value.
//!
//! Reads go through the reconciler's *shared* sequence handle, not a
//! captured list: when a recomputation swaps the sequence out, surviving
//! accessors observe the new one. Every read tracks the reconciler's
//! shared change signal first, so firing that signal forces all live
//! readers to re-read their slot even when the sequence length did not
//! change.
//!
//! Writes never fire the shared signal: a reactive slot forwards the write
//! to its own cell, a plain slot is assigned silently. Broader propagation
//! is the sequence's own business.

use std::cell::RefCell;
use std::rc::Rc;

use weft_reactive::{ReactiveCell, Signal, Subscription, Value, ValueList, unwrap_value};

/// A bidirectional proxy for `sequence[index]`; lifetime tied to its
/// repetition.
pub struct ItemAccessor {
    sequence: Rc<RefCell<Option<ValueList>>>,
    index: usize,
    signal: Signal,
}

impl std::fmt::Debug for ItemAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemAccessor").field("index", &self.index).finish()
    }
}

impl ItemAccessor {
    pub(crate) fn new(
        sequence: Rc<RefCell<Option<ValueList>>>,
        index: usize,
        signal: Signal,
    ) -> Self {
        Self {
            sequence,
            index,
            signal,
        }
    }

    /// The logical index this accessor addresses.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    fn slot(&self) -> Value {
        self.sequence
            .borrow()
            .as_ref()
            .and_then(|list| list.get(self.index))
            .unwrap_or(Value::Undefined)
    }
}

impl ReactiveCell for ItemAccessor {
    fn read(&self) -> Value {
        self.signal.track();
        unwrap_value(&self.slot())
    }

    fn write(&self, value: Value) {
        let list = self.sequence.borrow().clone();
        let Some(list) = list else { return };
        match list.get_untracked(self.index) {
            Some(Value::Cell(cell)) => cell.write(value),
            _ => list.set(self.index, value),
        }
    }

    fn subscribe(&self, f: Box<dyn Fn()>) -> Subscription {
        self.signal.subscribe(move || f())
    }
}

#![forbid(unsafe_code)]

//! Dynamic binding values and shared sequences.
//!
//! [`Value`] is the currency of the binding layer: everything an expression
//! can produce or a sequence can hold. Reactive wrapping is explicit — a
//! [`Value::Cell`] holds something satisfying the [`ReactiveCell`]
//! capability, and [`unwrap_value`] dereferences exactly one level of it.
//!
//! [`ValueList`] is an ordered shared sequence with a structural change
//! signal: mutations that change the shape of the list (push/insert/remove/
//! replace) notify; assigning into an existing slot is silent, mirroring a
//! plain array slot write — callers that want notification use
//! [`ValueList::notify`]. Reads register a dependency, so a reaction that
//! measured the list's length re-runs when the list grows or shrinks.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cell::ReactiveCell;
use crate::signal::Signal;

/// A dynamic binding value.
#[derive(Clone)]
pub enum Value {
    /// Absent / out-of-range / unconfigured.
    Undefined,
    Bool(bool),
    Int(i64),
    Str(String),
    /// A shared sequence (compared by identity).
    List(ValueList),
    /// A reactive slot (compared by identity).
    Cell(Rc<dyn ReactiveCell>),
}

impl Value {
    /// Convenience constructor for string values.
    #[must_use]
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Wrap a reactive cell.
    #[must_use]
    pub fn cell(cell: Rc<dyn ReactiveCell>) -> Self {
        Value::Cell(cell)
    }

    /// Falsiness: `Undefined`, `false`, `0`, the empty string, and the
    /// empty list are falsy; cells are truthy without being read.
    #[must_use]
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Undefined => true,
            Value::Bool(b) => !b,
            Value::Int(n) => *n == 0,
            Value::Str(s) => s.is_empty(),
            Value::List(l) => l.is_empty(),
            Value::Cell(_) => false,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&ValueList> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Rendered text form, as a text binding displays it. `Undefined` is
    /// empty; lists join their items; cells render their current value
    /// (registering a dependency).
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Str(s) => s.clone(),
            Value::List(l) => {
                let items = l.to_vec();
                items
                    .iter()
                    .map(Value::to_display_string)
                    .collect::<Vec<_>>()
                    .join(",")
            }
            Value::Cell(c) => c.read().to_display_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Cell(a), Value::Cell(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::List(l) => f.debug_tuple("List").field(&l.len_untracked()).finish(),
            Value::Cell(_) => f.write_str("Cell(..)"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<ValueList> for Value {
    fn from(l: ValueList) -> Self {
        Value::List(l)
    }
}

/// Dereference one level of reactive wrapping; non-cells pass through.
/// Reading the cell registers a dependency with the tracking scope.
#[must_use]
pub fn unwrap_value(value: &Value) -> Value {
    match value {
        Value::Cell(cell) => cell.read(),
        other => other.clone(),
    }
}

/// Whether the value carries the reactive-cell capability.
#[must_use]
pub fn is_reactive_value(value: &Value) -> bool {
    matches!(value, Value::Cell(_))
}

// ---------------------------------------------------------------------------
// ValueList
// ---------------------------------------------------------------------------

/// An ordered shared sequence with a structural change signal.
///
/// Cloning shares the backing storage; equality is identity.
#[derive(Clone)]
pub struct ValueList {
    items: Rc<RefCell<Vec<Value>>>,
    changed: Signal,
}

impl Default for ValueList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValueList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueList")
            .field("len", &self.items.borrow().len())
            .finish()
    }
}

impl ValueList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::from_values(Vec::new())
    }

    /// Create a list from existing values.
    #[must_use]
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            items: Rc::new(RefCell::new(values)),
            changed: Signal::new(),
        }
    }

    /// Create a list of string values (test-friendly shorthand).
    #[must_use]
    pub fn of_strs(strs: &[&str]) -> Self {
        Self::from_values(strs.iter().map(|s| Value::str(*s)).collect())
    }

    /// Length. Registers a dependency.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changed.track();
        self.items.borrow().len()
    }

    /// Length without dependency registration.
    #[must_use]
    pub fn len_untracked(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len_untracked() == 0
    }

    /// Value at `index`, or `None` past the end. Registers a dependency.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.changed.track();
        self.items.borrow().get(index).cloned()
    }

    /// Value at `index` without dependency registration.
    #[must_use]
    pub fn get_untracked(&self, index: usize) -> Option<Value> {
        self.items.borrow().get(index).cloned()
    }

    /// Assign into a slot **silently** — a plain array slot write. Slots
    /// past the end are created (padded with `Undefined`).
    pub fn set(&self, index: usize, value: Value) {
        let mut items = self.items.borrow_mut();
        if index >= items.len() {
            items.resize(index + 1, Value::Undefined);
        }
        items[index] = value;
    }

    /// Append; notifies.
    pub fn push(&self, value: Value) {
        self.items.borrow_mut().push(value);
        self.changed.notify();
    }

    /// Remove and return the last value; notifies when something was
    /// removed.
    pub fn pop(&self) -> Option<Value> {
        let removed = self.items.borrow_mut().pop();
        if removed.is_some() {
            self.changed.notify();
        }
        removed
    }

    /// Insert at `index` (clamped to the end); notifies.
    pub fn insert(&self, index: usize, value: Value) {
        {
            let mut items = self.items.borrow_mut();
            let at = index.min(items.len());
            items.insert(at, value);
        }
        self.changed.notify();
    }

    /// Remove at `index`; notifies when something was removed.
    pub fn remove(&self, index: usize) -> Option<Value> {
        let removed = {
            let mut items = self.items.borrow_mut();
            if index < items.len() {
                Some(items.remove(index))
            } else {
                None
            }
        };
        if removed.is_some() {
            self.changed.notify();
        }
        removed
    }

    /// Replace the entire contents; notifies.
    pub fn replace_all(&self, values: Vec<Value>) {
        *self.items.borrow_mut() = values;
        self.changed.notify();
    }

    /// Force a structural notification (after a batch of silent `set`s).
    pub fn notify(&self) {
        self.changed.notify();
    }

    /// Snapshot of the contents (no dependency registration).
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }

    /// Identity comparison.
    #[must_use]
    pub fn ptr_eq(&self, other: &ValueList) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }
}

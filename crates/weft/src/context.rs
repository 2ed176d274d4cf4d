#![forbid(unsafe_code)]

//! Binding contexts.
//!
//! A [`BindingContext`] is the scope an expression evaluates in: a data
//! value (`$data`), the shared root (`$root`), named extras (`$index`,
//! `$item`, ...), and a parent link for chained lookup. Contexts are
//! immutable once built; "changing" a context means building a child.
//!
//! Two derivations exist, and the difference matters to the repeat
//! components:
//!
//! - [`extend`](BindingContext::extend) keeps the same `$data` and adds
//!   named values — how a repetition gains `$index`/`$item`.
//! - [`child`](BindingContext::child) enters a genuinely nested data scope:
//!   the new context's `$data` is the given value and the old context
//!   becomes the parent.

use std::rc::Rc;

use ahash::AHashMap;
use weft_reactive::Value;

use crate::options::RepeatDefaults;

struct ContextInner {
    data: Value,
    root: Value,
    parent: Option<BindingContext>,
    vars: AHashMap<String, Value>,
    defaults: Rc<RepeatDefaults>,
}

/// An immutable binding scope; cheap to clone.
pub struct BindingContext {
    inner: Rc<ContextInner>,
}

impl Clone for BindingContext {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingContext")
            .field("data", &self.inner.data)
            .field("vars", &self.inner.vars.len())
            .field("nested", &self.inner.parent.is_some())
            .finish()
    }
}

impl BindingContext {
    /// A root context: `$data` and `$root` are both `data`.
    #[must_use]
    pub fn root(data: Value) -> Self {
        Self::with_defaults(data, Rc::new(RepeatDefaults::default()))
    }

    /// A root context with explicit repeat defaults (the constructing
    /// factory's configuration, shared down the whole chain).
    #[must_use]
    pub fn with_defaults(data: Value, defaults: Rc<RepeatDefaults>) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                root: data.clone(),
                data,
                parent: None,
                vars: AHashMap::new(),
                defaults,
            }),
        }
    }

    /// The context's own data value (`$data`).
    #[must_use]
    pub fn data(&self) -> Value {
        self.inner.data.clone()
    }

    /// The shared root value (`$root`).
    #[must_use]
    pub fn root_value(&self) -> Value {
        self.inner.root.clone()
    }

    #[must_use]
    pub fn parent(&self) -> Option<BindingContext> {
        self.inner.parent.clone()
    }

    /// The repeat defaults this context chain was built with.
    #[must_use]
    pub fn defaults(&self) -> Rc<RepeatDefaults> {
        Rc::clone(&self.inner.defaults)
    }

    /// Same data scope, added named values. Shadowing is allowed: a name
    /// bound here wins over the same name up the chain.
    #[must_use]
    pub fn extend(&self, vars: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                data: self.inner.data.clone(),
                root: self.inner.root.clone(),
                parent: Some(self.clone()),
                vars: vars.into_iter().collect(),
                defaults: Rc::clone(&self.inner.defaults),
            }),
        }
    }

    /// A nested data scope: `$data` becomes `data`, `$root` is kept, and
    /// name lookup falls back to `self`.
    #[must_use]
    pub fn child(&self, data: Value) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                data,
                root: self.inner.root.clone(),
                parent: Some(self.clone()),
                vars: AHashMap::new(),
                defaults: Rc::clone(&self.inner.defaults),
            }),
        }
    }

    /// Resolve a name: `$data`, `$root`, own extras, then the parent chain.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        if name == "$data" {
            return Some(self.inner.data.clone());
        }
        if name == "$root" {
            return Some(self.inner.root.clone());
        }
        if let Some(value) = self.inner.vars.get(name) {
            return Some(value.clone());
        }
        self.inner.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Identity comparison (used by tests asserting context retention).
    #[must_use]
    pub fn ptr_eq(&self, other: &BindingContext) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

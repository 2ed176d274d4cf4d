#![forbid(unsafe_code)]

//! Declarative repeat configuration.
//!
//! [`RepeatOptions`] is the recognized-options surface of the repeat
//! binding; every value-carrying option is an expression evaluated in the
//! attaching context on each recomputation, so reactive sources work
//! without special cases. [`RepeatDefaults`] is the constructing factory's
//! configuration — overriding the process-wide item name happens here, not
//! through mutable global state.

use weft_reactive::Value;

use crate::binding::{BindFn, ExprFn, HookFn, const_expr};

/// Reserved item name: bind each repetition in a nested data scope whose
/// `$data` is the item accessor, instead of adding a named property.
pub const ITEM_AS_DATA: &str = "$data";

/// Factory-level defaults shared by every repeat built under one root
/// context chain.
#[derive(Debug, Clone)]
pub struct RepeatDefaults {
    /// Context name for the logical index.
    pub index_name: String,
    /// Context name for the item accessor.
    pub item_name: String,
    /// Attribute stamped on every repetition with its logical index.
    pub debug_attr: String,
}

impl Default for RepeatDefaults {
    fn default() -> Self {
        Self {
            index_name: "$index".to_string(),
            item_name: "$item".to_string(),
            debug_attr: "data-repeat-index".to_string(),
        }
    }
}

/// Options for one repeat binding.
///
/// `source` is the shorthand form (`repeat: someItems` / `repeat: 5`);
/// `foreach`/`count`/`limit` are the object form and take precedence over
/// the shorthand. All are optional; with nothing configured the repeat
/// resolves to count 0 and renders only its anchor.
#[derive(Clone)]
pub struct RepeatOptions {
    /// Shorthand count-or-sequence source.
    pub source: Option<ExprFn>,
    /// Sequence (or numeric pure-count) source.
    pub foreach: Option<ExprFn>,
    /// Explicit count override; `0` falls back to the sequence length.
    pub count: Option<ExprFn>,
    /// Cap on the final count; `0` means no limit.
    pub limit: Option<ExprFn>,
    /// Logical index stride (≥ 1).
    pub step: usize,
    /// Insert new repetitions before existing ones.
    pub reverse: bool,
    /// Override of the default index name.
    pub index_name: Option<String>,
    /// Override of the default item name ([`ITEM_AS_DATA`] nests instead).
    pub item_name: Option<String>,
    /// Per-item bind thunk (wins over the node's sibling item-bind slot).
    pub bind: Option<BindFn>,
    /// Invoked once at attach with the parent container.
    pub init: Option<HookFn>,
    /// Invoked after every recomputation with the parent container.
    pub update: Option<HookFn>,
}

impl Default for RepeatOptions {
    fn default() -> Self {
        Self {
            source: None,
            foreach: None,
            count: None,
            limit: None,
            step: 1,
            reverse: false,
            index_name: None,
            item_name: None,
            bind: None,
            init: None,
            update: None,
        }
    }
}

impl std::fmt::Debug for RepeatOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepeatOptions")
            .field("source", &self.source.is_some())
            .field("foreach", &self.foreach.is_some())
            .field("count", &self.count.is_some())
            .field("limit", &self.limit.is_some())
            .field("step", &self.step)
            .field("reverse", &self.reverse)
            .field("bind", &self.bind.is_some())
            .finish()
    }
}

impl RepeatOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn source(mut self, e: ExprFn) -> Self {
        self.source = Some(e);
        self
    }

    /// Shorthand source from a fixed value (a sequence or a count).
    #[must_use]
    pub fn source_value(self, value: Value) -> Self {
        self.source(const_expr(value))
    }

    #[must_use]
    pub fn foreach(mut self, e: ExprFn) -> Self {
        self.foreach = Some(e);
        self
    }

    #[must_use]
    pub fn foreach_value(self, value: Value) -> Self {
        self.foreach(const_expr(value))
    }

    #[must_use]
    pub fn count(mut self, e: ExprFn) -> Self {
        self.count = Some(e);
        self
    }

    #[must_use]
    pub fn count_value(self, count: i64) -> Self {
        self.count(const_expr(Value::Int(count)))
    }

    #[must_use]
    pub fn limit(mut self, e: ExprFn) -> Self {
        self.limit = Some(e);
        self
    }

    #[must_use]
    pub fn limit_value(self, limit: i64) -> Self {
        self.limit(const_expr(Value::Int(limit)))
    }

    #[must_use]
    pub fn step(mut self, step: usize) -> Self {
        self.step = step.max(1);
        self
    }

    #[must_use]
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    #[must_use]
    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn item_name(mut self, name: impl Into<String>) -> Self {
        self.item_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn bind(mut self, bind: BindFn) -> Self {
        self.bind = Some(bind);
        self
    }

    #[must_use]
    pub fn on_init(mut self, hook: HookFn) -> Self {
        self.init = Some(hook);
        self
    }

    #[must_use]
    pub fn on_update(mut self, hook: HookFn) -> Self {
        self.update = Some(hook);
        self
    }
}

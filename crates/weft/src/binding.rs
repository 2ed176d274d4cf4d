#![forbid(unsafe_code)]

//! Declarative bindings and their application.
//!
//! A [`Binding`] is data: a declared connection between a node and an
//! expression, stored on the node until the binding layer applies it.
//! Application turns declarations into live state — a [`Reaction`] per
//! value-producing binding, held by the node and dropped on disposal.
//!
//! Two application entry points mirror the host contract:
//!
//! - [`apply_bindings`]: bind a node and its descendants with one context.
//! - [`apply_node_only`]: bind a node with an explicit binding set (the
//!   per-item thunk form), reporting whether descendants should still be
//!   bound — control bindings (`With`, `Repeat`) suppress the descent
//!   because they bind (or replace) the content themselves.

use std::rc::Rc;

use weft_reactive::{Reaction, Value, unwrap_value};

use crate::accessor::ItemAccessor;
use crate::context::BindingContext;
use crate::options::RepeatOptions;
use crate::repeat;
use crate::tree::Node;

/// An evaluatable binding expression.
pub type ExprFn = Rc<dyn Fn(&BindingContext) -> Value>;

/// A per-item bind thunk: `(item accessor, logical index, context)` to a
/// set of bindings for the repetition node. The accessor is absent for
/// pure-count repeats.
pub type BindFn = Rc<dyn Fn(Option<&ItemAccessor>, i64, &BindingContext) -> Vec<Binding>>;

/// A container-level lifecycle hook (`init` / `update` repeat options).
pub type HookFn = Rc<dyn Fn(&Node)>;

/// A declared binding.
#[derive(Clone)]
pub enum Binding {
    /// Keep the node's text equal to the expression value (one level of
    /// reactive wrapping is dereferenced).
    Text(ExprFn),
    /// Keep the named attribute equal to the expression value.
    Attr(String, ExprFn),
    /// Two-way value binding: the expression must resolve to a reactive
    /// cell; the node's text mirrors the cell and user input writes back
    /// through it. A non-cell value degrades to a one-time text set.
    TwoWay(ExprFn),
    /// Bind descendants in a nested data scope. Controls descendants.
    With(ExprFn),
    /// Repeat this node per the options. Controls descendants.
    Repeat(RepeatOptions),
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Text(_) => f.write_str("Text"),
            Binding::Attr(name, _) => f.debug_tuple("Attr").field(name).finish(),
            Binding::TwoWay(_) => f.write_str("TwoWay"),
            Binding::With(_) => f.write_str("With"),
            Binding::Repeat(_) => f.write_str("Repeat"),
        }
    }
}

/// Whether binding application should continue into descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescendantPolicy {
    Continue,
    Controls,
}

impl DescendantPolicy {
    #[must_use]
    pub fn should_descend(self) -> bool {
        self == DescendantPolicy::Continue
    }
}

// ---------------------------------------------------------------------------
// Expression helpers
// ---------------------------------------------------------------------------

/// Wrap a closure as an [`ExprFn`].
pub fn expr(f: impl Fn(&BindingContext) -> Value + 'static) -> ExprFn {
    Rc::new(f)
}

/// An expression returning a fixed value.
#[must_use]
pub fn const_expr(value: Value) -> ExprFn {
    Rc::new(move |_| value.clone())
}

/// An expression reading a context name (`Undefined` when unbound).
#[must_use]
pub fn var_expr(name: &str) -> ExprFn {
    let name = name.to_string();
    Rc::new(move |ctx| ctx.get(&name).unwrap_or(Value::Undefined))
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Apply a node's declared bindings, then its descendants', sharing `ctx`.
///
/// A declared `Repeat` takes over the node entirely: it is handed to the
/// reconciler and no other declaration on the node is applied (they belong
/// to the repetitions, via the captured template).
pub fn apply_bindings(ctx: &BindingContext, node: &Node) {
    let policy = apply_declared(ctx, node);
    if policy.should_descend() {
        for child in node.children() {
            apply_bindings(ctx, &child);
        }
    }
}

fn apply_declared(ctx: &BindingContext, node: &Node) -> DescendantPolicy {
    let declarations = node.bindings();
    for declaration in &declarations {
        if let Binding::Repeat(options) = declaration {
            repeat::attach(node, options.clone(), ctx);
            return DescendantPolicy::Controls;
        }
    }
    apply_set(node, &declarations, ctx)
}

/// Apply an explicit binding set to `node` only, returning whether the
/// caller should still bind descendants.
pub fn apply_node_only(
    node: &Node,
    bindings: &[Binding],
    ctx: &BindingContext,
) -> DescendantPolicy {
    for binding in bindings {
        if let Binding::Repeat(options) = binding {
            repeat::attach(node, options.clone(), ctx);
            return DescendantPolicy::Controls;
        }
    }
    apply_set(node, bindings, ctx)
}

fn apply_set(node: &Node, bindings: &[Binding], ctx: &BindingContext) -> DescendantPolicy {
    let mut policy = DescendantPolicy::Continue;
    for binding in bindings {
        match binding {
            Binding::Text(e) => bind_text(node, e, ctx),
            Binding::Attr(name, e) => bind_attr(node, name, e, ctx),
            Binding::TwoWay(e) => bind_two_way(node, e, ctx),
            Binding::With(e) => {
                bind_with(node, e, ctx);
                policy = DescendantPolicy::Controls;
            }
            // Handled by the callers above.
            Binding::Repeat(_) => {}
        }
    }
    policy
}

fn bind_text(node: &Node, e: &ExprFn, ctx: &BindingContext) {
    let weak = node.downgrade();
    let e = Rc::clone(e);
    let ctx = ctx.clone();
    let reaction = Reaction::new(move || {
        if let Some(node) = weak.upgrade() {
            node.set_text(unwrap_value(&e(&ctx)).to_display_string());
        }
    });
    node.hold(Box::new(reaction));
}

fn bind_attr(node: &Node, name: &str, e: &ExprFn, ctx: &BindingContext) {
    let weak = node.downgrade();
    let name = name.to_string();
    let e = Rc::clone(e);
    let ctx = ctx.clone();
    let reaction = Reaction::new(move || {
        if let Some(node) = weak.upgrade() {
            node.set_attr(name.clone(), unwrap_value(&e(&ctx)).to_display_string());
        }
    });
    node.hold(Box::new(reaction));
}

fn bind_two_way(node: &Node, e: &ExprFn, ctx: &BindingContext) {
    // The cell is resolved once, outside any tracking scope: which slot a
    // two-way binding targets is fixed at bind time.
    match e(ctx) {
        Value::Cell(cell) => {
            node.set_two_way(Rc::clone(&cell));
            let weak = node.downgrade();
            let reaction = Reaction::new(move || {
                if let Some(node) = weak.upgrade() {
                    node.set_text(cell.read().to_display_string());
                }
            });
            node.hold(Box::new(reaction));
        }
        other => node.set_text(other.to_display_string()),
    }
}

fn bind_with(node: &Node, e: &ExprFn, ctx: &BindingContext) {
    let nested = ctx.child(e(ctx));
    for child in node.children() {
        apply_bindings(&nested, &child);
    }
}

#![forbid(unsafe_code)]

//! Weft: incremental repeat bindings for retained node trees.
//!
//! The centerpiece is an end-anchored list reconciler: a `repeat` binding
//! keeps a set of materialized subtrees synchronized with a reactive count
//! or sequence, growing and shrinking only at one end and refreshing
//! surviving repetitions value-by-value through their item accessors.
//! Everything else — the node tree, binding contexts, declarative binding
//! application — is the thin host plumbing the reconciler drives.
//!
//! ```
//! use std::rc::Rc;
//! use weft::{Binding, BindingContext, Node, RepeatOptions, apply_bindings, const_expr};
//! use weft_reactive::{Value, ValueList};
//!
//! let container = Node::element("ul");
//! let row = Node::element("li");
//! row.push_binding(Binding::Repeat(
//!     RepeatOptions::new()
//!         .foreach_value(Value::List(ValueList::of_strs(&["A", "B", "C"])))
//!         .bind(Rc::new(|accessor, _, _| {
//!             let item = accessor.map(weft_reactive::ReactiveCell::read).unwrap_or(Value::Undefined);
//!             vec![Binding::Text(const_expr(item))]
//!         })),
//! ));
//! container.append(&row);
//!
//! apply_bindings(&BindingContext::root(Value::Undefined), &container);
//! assert_eq!(container.rendered_text(), "ABC");
//! ```

pub mod accessor;
mod binder;
pub mod binding;
pub mod context;
pub mod options;
pub mod repeat;
pub mod template;
pub mod tree;

pub use accessor::ItemAccessor;
pub use binding::{
    BindFn, Binding, DescendantPolicy, ExprFn, HookFn, apply_bindings, apply_node_only,
    const_expr, expr, var_expr,
};
pub use context::BindingContext;
pub use options::{ITEM_AS_DATA, RepeatDefaults, RepeatOptions};
pub use template::Template;
pub use tree::{Node, NodeKind, WeakNode};

pub use weft_reactive as reactive;

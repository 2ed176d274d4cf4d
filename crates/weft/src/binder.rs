#![forbid(unsafe_code)]

//! Per-repetition sub-binding application.
//!
//! Each freshly grown repetition is bound one of two ways:
//!
//! - With a per-item bind thunk configured, the thunk is invoked as
//!   `bind(accessor?, logical index, context)` and its bindings are
//!   applied to the repetition node only; descendants are then bound with
//!   the default traversal unless a control binding suppressed them.
//! - Without one, the default traversal binds the node and its
//!   descendants directly with the repetition context.

use crate::accessor::ItemAccessor;
use crate::binding::{self, BindFn};
use crate::context::BindingContext;
use crate::tree::Node;

pub(crate) fn apply_item_binding(
    bind: Option<&BindFn>,
    node: &Node,
    ctx: &BindingContext,
    accessor: Option<&ItemAccessor>,
    index: i64,
) {
    match bind {
        Some(thunk) => {
            let bindings = thunk(accessor, index, ctx);
            let policy = binding::apply_node_only(node, &bindings, ctx);
            if policy.should_descend() {
                for child in node.children() {
                    binding::apply_bindings(ctx, &child);
                }
            }
        }
        None => binding::apply_bindings(ctx, node),
    }
}

#![forbid(unsafe_code)]

//! Template capture.
//!
//! A repeat snapshots its declared subtree exactly once, at attach. The
//! snapshot drops the repeat declaration itself (a repetition must not
//! recurse) and — since clones never copy live state — every
//! [`instantiate`](Template::instantiate) is a fresh, detached, unbound
//! copy. The per-item bind thunk is resolved here, from the `bind` option
//! or the node's sibling item-bind slot, and kept on the template rather
//! than merged into the prototype so it is evaluated fresh per repetition.

use crate::binding::{BindFn, Binding};
use crate::tree::Node;

/// The captured prototype subtree of one repeat binding.
pub struct Template {
    proto: Node,
    item_bind: Option<BindFn>,
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("proto", &self.proto)
            .field("item_bind", &self.item_bind.is_some())
            .finish()
    }
}

impl Template {
    /// Capture `node` as a template. `bind` (the option form) wins over
    /// the node's sibling item-bind slot.
    #[must_use]
    pub fn capture(node: &Node, bind: Option<BindFn>) -> Self {
        let proto = node.deep_clone();
        proto.retain_bindings(|b| !matches!(b, Binding::Repeat(_)));
        let item_bind = bind.or_else(|| node.item_bind());
        Self { proto, item_bind }
    }

    /// A fresh, detached, unbound copy of the prototype.
    #[must_use]
    pub fn instantiate(&self) -> Node {
        self.proto.deep_clone()
    }

    /// The resolved per-item bind thunk, if any.
    #[must_use]
    pub fn item_bind(&self) -> Option<&BindFn> {
        self.item_bind.as_ref()
    }
}

#![forbid(unsafe_code)]

//! Retained node-tree primitives.
//!
//! A [`Node`] is a cheap `Rc` handle to a tree node: an element, a text
//! node, or an anchor (the comment-placeholder equivalent a repeat binding
//! leaves behind). Nodes carry declared bindings (data, applied later by
//! the binding layer) and held guards (live state — reactions,
//! subscriptions, engines — dropped on disposal).
//!
//! # Invariants
//!
//! 1. Parent links are weak; child links are strong. A detached subtree
//!    stays alive through whoever holds its root handle.
//! 2. [`deep_clone`](Node::deep_clone) copies structure, attributes, text,
//!    and *declared* bindings — never guards or other live state. Clones
//!    are always unbound.
//! 3. [`remove`](Node::remove) disposes live bindings on the whole subtree
//!    (self first, then descendants) before detaching, and disposal is
//!    complete when it returns.
//! 4. A node has at most one parent; inserting an attached node detaches
//!    it first.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use weft_reactive::{ReactiveCell, Value};

use crate::binding::{BindFn, Binding};

/// What kind of tree node a [`Node`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A container with a tag, attributes, and children.
    Element,
    /// A leaf carrying text.
    Text,
    /// An insertion anchor; renders nothing.
    Anchor,
}

struct NodeInner {
    kind: NodeKind,
    tag: String,
    text: RefCell<String>,
    attrs: RefCell<AHashMap<String, String>>,
    decls: RefCell<Vec<Binding>>,
    item_bind: RefCell<Option<BindFn>>,
    children: RefCell<Vec<Node>>,
    parent: RefCell<Weak<NodeInner>>,
    guards: RefCell<Vec<Box<dyn Any>>>,
    two_way: RefCell<Option<Rc<dyn ReactiveCell>>>,
}

impl NodeInner {
    fn bare(kind: NodeKind, tag: &str) -> Self {
        Self {
            kind,
            tag: tag.to_string(),
            text: RefCell::new(String::new()),
            attrs: RefCell::new(AHashMap::new()),
            decls: RefCell::new(Vec::new()),
            item_bind: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            guards: RefCell::new(Vec::new()),
            two_way: RefCell::new(None),
        }
    }
}

/// A shared handle to a tree node.
pub struct Node {
    inner: Rc<NodeInner>,
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.inner.kind)
            .field("tag", &self.inner.tag)
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}

impl Node {
    /// Create an element node.
    #[must_use]
    pub fn element(tag: &str) -> Self {
        Self {
            inner: Rc::new(NodeInner::bare(NodeKind::Element, tag)),
        }
    }

    /// Create a text node with initial content.
    #[must_use]
    pub fn text_node(text: &str) -> Self {
        let node = Self {
            inner: Rc::new(NodeInner::bare(NodeKind::Text, "")),
        };
        node.set_text(text);
        node
    }

    /// Create an anchor node with a label (for debugging only).
    #[must_use]
    pub fn anchor(label: &str) -> Self {
        Self {
            inner: Rc::new(NodeInner::bare(NodeKind::Anchor, label)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.inner.kind
    }

    #[must_use]
    pub fn is_anchor(&self) -> bool {
        self.inner.kind == NodeKind::Anchor
    }

    /// Element tag or anchor label.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    /// Whether two handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Downgrade to a weak handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakNode {
        WeakNode {
            inner: Rc::downgrade(&self.inner),
        }
    }

    // -- structure ----------------------------------------------------------

    #[must_use]
    pub fn parent(&self) -> Option<Node> {
        self.inner.parent.borrow().upgrade().map(|inner| Node { inner })
    }

    /// Snapshot of the current children.
    #[must_use]
    pub fn children(&self) -> Vec<Node> {
        self.inner.children.borrow().clone()
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<Node> {
        self.inner.children.borrow().get(index).cloned()
    }

    fn position_of(&self, child: &Node) -> Option<usize> {
        self.inner
            .children
            .borrow()
            .iter()
            .position(|c| c.ptr_eq(child))
    }

    /// Append `child` as the last child of `self`.
    pub fn append(&self, child: &Node) {
        self.insert_before(child, None);
    }

    /// Insert `child` immediately before `reference` (or at the end when
    /// `reference` is `None` or not a child of `self`). An attached child
    /// is detached from its old parent first.
    pub fn insert_before(&self, child: &Node, reference: Option<&Node>) {
        child.detach();
        let at = reference
            .and_then(|r| self.position_of(r))
            .unwrap_or_else(|| self.inner.children.borrow().len());
        self.inner.children.borrow_mut().insert(at, child.clone());
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
    }

    /// Replace `self` with `replacement` in the parent's child list.
    /// `self` is detached without binding disposal (it may be re-used,
    /// e.g. as a template source).
    pub fn replace_with(&self, replacement: &Node) {
        if let Some(parent) = self.parent() {
            parent.insert_before(replacement, Some(self));
            self.detach();
        }
    }

    /// The next sibling under the current parent, if any.
    #[must_use]
    pub fn next_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let at = parent.position_of(self)?;
        parent.child(at + 1)
    }

    #[must_use]
    pub fn prev_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let at = parent.position_of(self)?;
        at.checked_sub(1).and_then(|i| parent.child(i))
    }

    /// Unlink from the parent without disposing bindings.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            if let Some(at) = parent.position_of(self) {
                parent.inner.children.borrow_mut().remove(at);
            }
        }
        *self.inner.parent.borrow_mut() = Weak::new();
    }

    /// Dispose live bindings on the whole subtree, then detach.
    ///
    /// Disposal is synchronous and complete on return: every held guard
    /// (reactions, subscriptions, nested repeat engines) on `self` and all
    /// descendants has been dropped.
    pub fn remove(&self) {
        self.dispose_bindings();
        self.detach();
    }

    fn dispose_bindings(&self) {
        self.inner.guards.borrow_mut().clear();
        *self.inner.two_way.borrow_mut() = None;
        for child in self.children() {
            child.dispose_bindings();
        }
    }

    // -- payload ------------------------------------------------------------

    #[must_use]
    pub fn text(&self) -> String {
        self.inner.text.borrow().clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.inner.text.borrow_mut() = text.into();
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        self.inner.attrs.borrow().get(name).cloned()
    }

    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.attrs.borrow_mut().insert(name.into(), value.into());
    }

    /// Concatenated text of the subtree in document order. Anchors render
    /// nothing.
    #[must_use]
    pub fn rendered_text(&self) -> String {
        let mut out = String::new();
        if self.inner.kind != NodeKind::Anchor {
            out.push_str(&self.inner.text.borrow());
        }
        for child in self.inner.children.borrow().iter() {
            out.push_str(&child.rendered_text());
        }
        out
    }

    // -- declared bindings --------------------------------------------------

    /// Declare a binding on this node (applied later by the binding layer).
    pub fn push_binding(&self, binding: Binding) {
        self.inner.decls.borrow_mut().push(binding);
    }

    /// Snapshot of the declared bindings.
    #[must_use]
    pub fn bindings(&self) -> Vec<Binding> {
        self.inner.decls.borrow().clone()
    }

    /// Keep only the declared bindings matching `keep`.
    pub fn retain_bindings(&self, keep: impl Fn(&Binding) -> bool) {
        self.inner.decls.borrow_mut().retain(|b| keep(b));
    }

    /// Set the sibling per-item bind slot: an alternate per-repetition
    /// binding a repeat on this node picks up when no `bind` option is
    /// configured.
    pub fn set_item_bind(&self, bind: BindFn) {
        *self.inner.item_bind.borrow_mut() = Some(bind);
    }

    #[must_use]
    pub fn item_bind(&self) -> Option<BindFn> {
        self.inner.item_bind.borrow().clone()
    }

    // -- live binding state -------------------------------------------------

    /// Attach a live guard; dropped when the node's bindings are disposed.
    pub fn hold(&self, guard: Box<dyn Any>) {
        self.inner.guards.borrow_mut().push(guard);
    }

    /// Number of live guards (observability for tests).
    #[must_use]
    pub fn guard_count(&self) -> usize {
        self.inner.guards.borrow().len()
    }

    pub(crate) fn set_two_way(&self, cell: Rc<dyn ReactiveCell>) {
        *self.inner.two_way.borrow_mut() = Some(cell);
    }

    /// The cell a two-way binding connected to this node, if any.
    #[must_use]
    pub fn two_way_cell(&self) -> Option<Rc<dyn ReactiveCell>> {
        self.inner.two_way.borrow().clone()
    }

    /// Simulate user input: write through the node's two-way cell.
    /// Returns false when no two-way binding is attached.
    pub fn write_input(&self, value: Value) -> bool {
        match self.two_way_cell() {
            Some(cell) => {
                cell.write(value);
                true
            }
            None => false,
        }
    }

    // -- cloning ------------------------------------------------------------

    /// Deep copy of structure, attributes, text, declared bindings, and the
    /// item-bind slot. Guards, two-way cells, and the parent link are never
    /// copied: the clone is detached and unbound.
    #[must_use]
    pub fn deep_clone(&self) -> Node {
        let clone = Node {
            inner: Rc::new(NodeInner::bare(self.inner.kind, &self.inner.tag)),
        };
        *clone.inner.text.borrow_mut() = self.inner.text.borrow().clone();
        *clone.inner.attrs.borrow_mut() = self.inner.attrs.borrow().clone();
        *clone.inner.decls.borrow_mut() = self.inner.decls.borrow().clone();
        *clone.inner.item_bind.borrow_mut() = self.inner.item_bind.borrow().clone();
        for child in self.inner.children.borrow().iter() {
            clone.append(&child.deep_clone());
        }
        clone
    }
}

/// Weak counterpart to [`Node`].
#[derive(Clone)]
pub struct WeakNode {
    inner: Weak<NodeInner>,
}

impl WeakNode {
    #[must_use]
    pub fn upgrade(&self) -> Option<Node> {
        self.inner.upgrade().map(|inner| Node { inner })
    }
}

impl std::fmt::Debug for WeakNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WeakNode")
    }
}

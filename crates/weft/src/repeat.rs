#![forbid(unsafe_code)]

//! The repeat reconciler.
//!
//! A repeat binding replaces its node with an anchor and keeps a list of
//! live repetitions synchronized with a count or sequence source. The
//! reconciliation policy is deliberately end-anchored: growth and shrink
//! only ever touch one end of the physical list (the side away from new
//! insertions), and every interior change is a value-level refresh through
//! the item accessors — never a structural move. This bounds structural
//! work to O(Δcount) per recomputation plus O(live) refresh work, and it
//! means a surviving repetition keeps its subtree identity and its binding
//! context for as long as it stays within the count.
//!
//! # Recomputation
//!
//! Runs inside a [`Reaction`], so every reactive read below re-arms it:
//!
//! 1. Resolve the target count and sequence (see below).
//! 2. Shrink: while over target, remove the repetition with the highest
//!    logical index (the physical tail in forward mode, the physical head
//!    in reverse mode); each removal detaches the subtree and disposes its
//!    bindings — including nested repeats — before the next one.
//! 3. Fire the shared change signal exactly once, even when the count is
//!    unchanged: slot contents can change without the length changing.
//! 4. Grow: clone the template, insert adjacent to the anchor (before it
//!    forward, after it reversed), stamp the logical-index debug
//!    attribute, build the repetition context, apply the sub-binding.
//! 5. Run the `update` hook with the parent container.
//!
//! # Count resolution
//!
//! One level of reactive wrapping is dereferenced at each step. The
//! shorthand source contributes a sequence (list value) or a count
//! (numeric value); `foreach` does the same and wins over the shorthand; a
//! numeric `count` overrides the displayed length (`0` falls back to the
//! sequence length), padding reads past the sequence end as `Undefined`; a
//! nonzero `limit` caps the final count. Anything falsy resolves to count
//! 0 — a missing source is not an error, it renders nothing.
//!
//! # Invariants
//!
//! 1. After `recompute` returns, live count == `ceil(resolved / step)`.
//! 2. Logical indices are `0, step, 2·step, ...` in logical order;
//!    physical order is reversed under `reverse`.
//! 3. Survivors are never re-cloned, re-inserted, or re-bound.
//! 4. Disposal of a removed repetition is complete before the shrink loop
//!    proceeds (no partial disposal).
//! 5. The template is captured exactly once, at attach.

use std::cell::RefCell;
use std::rc::Rc;

use weft_reactive::{
    Reaction, ReactiveCell, Signal, Value, ValueList, untracked, unwrap_value,
};

use crate::accessor::ItemAccessor;
use crate::binder;
use crate::context::BindingContext;
use crate::options::{ITEM_AS_DATA, RepeatOptions};
use crate::template::Template;
use crate::tree::{Node, WeakNode};

/// One materialized repetition. Owned exclusively by the engine's live
/// list; the node's held guards are its disposer.
struct LiveNode {
    node: Node,
    ctx: BindingContext,
    accessor: Option<Rc<ItemAccessor>>,
}

struct RepeatEngine {
    template: Template,
    parent: WeakNode,
    anchor: WeakNode,
    ctx: BindingContext,
    opts: RepeatOptions,
    index_name: String,
    item_name: String,
    debug_attr: String,
    live: RefCell<Vec<LiveNode>>,
    signal: Signal,
    sequence: Rc<RefCell<Option<ValueList>>>,
}

/// Attach a repeat binding to `node`.
///
/// The node is captured as the template and replaced with an anchor; a
/// reaction drives [`recompute`](RepeatEngine::recompute) now and on every
/// change of a tracked input. Engine and reaction are held by the anchor,
/// so removing the anchor (or any ancestor subtree) disposes the whole
/// repeat — which is also how a parent repeat disposes nested ones.
///
/// Attaching a detached node is a no-op: there is nothing to anchor into.
pub fn attach(node: &Node, opts: RepeatOptions, ctx: &BindingContext) {
    let Some(parent) = node.parent() else {
        tracing::warn!("repeat attached to a node without a parent; ignoring");
        return;
    };
    let defaults = ctx.defaults();
    let index_name = opts
        .index_name
        .clone()
        .unwrap_or_else(|| defaults.index_name.clone());
    let item_name = opts
        .item_name
        .clone()
        .unwrap_or_else(|| defaults.item_name.clone());
    let debug_attr = defaults.debug_attr.clone();

    let template = Template::capture(node, opts.bind.clone());
    let anchor = Node::anchor("repeat");
    node.replace_with(&anchor);

    if let Some(init) = &opts.init {
        init(&parent);
    }

    let engine = Rc::new(RepeatEngine {
        template,
        parent: parent.downgrade(),
        anchor: anchor.downgrade(),
        ctx: ctx.clone(),
        opts,
        index_name,
        item_name,
        debug_attr,
        live: RefCell::new(Vec::new()),
        signal: Signal::new(),
        sequence: Rc::new(RefCell::new(None)),
    });

    let weak = Rc::downgrade(&engine);
    let reaction = Reaction::new(move || {
        if let Some(engine) = weak.upgrade() {
            engine.recompute();
        }
    });

    anchor.hold(Box::new(reaction));
    anchor.hold(Box::new(engine));
}

impl RepeatEngine {
    fn recompute(&self) {
        let (Some(parent), Some(anchor)) = (self.parent.upgrade(), self.anchor.upgrade())
        else {
            return;
        };

        let (count, sequence) = self.resolve();
        *self.sequence.borrow_mut() = sequence.clone();

        let step = self.opts.step.max(1);
        let slots = count.div_ceil(step);

        // Shrink from the logical tail, one fully-disposed node at a time.
        let mut removed = Vec::new();
        {
            let mut live = self.live.borrow_mut();
            while live.len() > slots {
                if let Some(entry) = live.pop() {
                    removed.push(entry);
                }
            }
        }
        let shrunk = removed.len();
        for entry in removed {
            let LiveNode {
                node,
                ctx,
                accessor,
            } = entry;
            node.remove();
            drop(accessor);
            drop(ctx);
        }

        // Survivors re-read their slots even when the count is unchanged.
        self.signal.notify();

        let mut grown = 0usize;
        loop {
            let slot = self.live.borrow().len();
            if slot >= slots {
                break;
            }
            let logical = slot * step;
            let node = self.template.instantiate();
            node.set_attr(self.debug_attr.clone(), logical.to_string());
            if self.opts.reverse {
                parent.insert_before(&node, anchor.next_sibling().as_ref());
            } else {
                parent.insert_before(&node, Some(&anchor));
            }

            let accessor = sequence.as_ref().map(|_| {
                Rc::new(ItemAccessor::new(
                    Rc::clone(&self.sequence),
                    logical,
                    self.signal.clone(),
                ))
            });
            let ctx = self.build_context(logical as i64, accessor.clone());
            // Per-repetition bindings own their dependencies; reads during
            // their setup must not re-arm this engine's reaction.
            untracked(|| {
                binder::apply_item_binding(
                    self.template.item_bind(),
                    &node,
                    &ctx,
                    accessor.as_deref(),
                    logical as i64,
                );
            });

            self.live.borrow_mut().push(LiveNode {
                node,
                ctx,
                accessor,
            });
            grown += 1;
        }

        if shrunk > 0 || grown > 0 {
            tracing::trace!(slots, shrunk, grown, "repeat reconciled");
        }

        if let Some(update) = &self.opts.update {
            update(&parent);
        }
    }

    /// Resolve the displayed count and the sequence (if any) from the
    /// configured sources. Runs inside the recompute reaction, so every
    /// reactive read is tracked.
    fn resolve(&self) -> (usize, Option<ValueList>) {
        let mut count: i64 = 0;
        let mut sequence: Option<ValueList> = None;

        if let Some(source) = &self.opts.source {
            match unwrap_value(&source(&self.ctx)) {
                Value::List(list) => {
                    count = list.len() as i64;
                    sequence = Some(list);
                }
                Value::Int(n) => count = n,
                _ => count = 0,
            }
        }
        if let Some(foreach) = &self.opts.foreach {
            match unwrap_value(&foreach(&self.ctx)) {
                Value::List(list) => {
                    count = list.len() as i64;
                    sequence = Some(list);
                }
                Value::Int(n) => {
                    count = n;
                    sequence = None;
                }
                _ => {
                    count = 0;
                    sequence = None;
                }
            }
        }
        if let Some(count_expr) = &self.opts.count {
            if let Some(n) = unwrap_value(&count_expr(&self.ctx)).as_int() {
                // An explicit zero with a sequence means "use its length".
                if n != 0 || sequence.is_none() {
                    count = n;
                }
            }
        }
        if let Some(limit_expr) = &self.opts.limit {
            if let Some(limit) = unwrap_value(&limit_expr(&self.ctx)).as_int() {
                if limit > 0 {
                    count = count.min(limit);
                }
            }
        }

        (count.max(0) as usize, sequence)
    }

    fn build_context(
        &self,
        logical: i64,
        accessor: Option<Rc<ItemAccessor>>,
    ) -> BindingContext {
        let index_var = (self.index_name.clone(), Value::Int(logical));
        match accessor {
            Some(accessor) => {
                let cell: Rc<dyn ReactiveCell> = accessor;
                if self.item_name == ITEM_AS_DATA {
                    self.ctx.extend([index_var]).child(Value::Cell(cell))
                } else {
                    self.ctx
                        .extend([index_var, (self.item_name.clone(), Value::Cell(cell))])
                }
            }
            None => self.ctx.extend([index_var]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{Binding, apply_bindings, const_expr, expr, var_expr};
    use weft_reactive::{Observable, cell_value};

    fn mount_repeat(options: RepeatOptions) -> (Node, BindingContext) {
        let container = Node::element("div");
        let item = Node::element("span");
        item.push_binding(Binding::Text(var_expr("$item")));
        item.push_binding(Binding::Repeat(options));
        container.append(&item);

        let ctx = BindingContext::root(Value::Undefined);
        apply_bindings(&ctx, &container);
        (container, ctx)
    }

    fn repetition_nodes(container: &Node) -> Vec<Node> {
        container
            .children()
            .into_iter()
            .filter(|n| !n.is_anchor())
            .collect()
    }

    #[test]
    fn pure_count_materializes_n_nodes() {
        let options = RepeatOptions::new()
            .count_value(3)
            .bind(Rc::new(|_, index, _| {
                vec![Binding::Text(const_expr(Value::Int(index)))]
            }));
        let (container, _ctx) = mount_repeat(options);

        assert_eq!(repetition_nodes(&container).len(), 3);
        assert_eq!(container.rendered_text(), "012");
    }

    #[test]
    fn zero_and_missing_sources_leave_only_the_anchor() {
        let (container, _ctx) = mount_repeat(RepeatOptions::new());
        assert_eq!(repetition_nodes(&container).len(), 0);
        assert_eq!(container.child_count(), 1, "anchor remains");
        assert!(container.child(0).unwrap().is_anchor());

        let (container, _ctx) =
            mount_repeat(RepeatOptions::new().foreach_value(Value::Undefined));
        assert_eq!(repetition_nodes(&container).len(), 0);
    }

    #[test]
    fn falsy_source_never_panics() {
        for source in [Value::Undefined, Value::Bool(false), Value::Int(0)] {
            let (container, _ctx) = mount_repeat(RepeatOptions::new().source_value(source));
            assert_eq!(container.rendered_text(), "");
        }
    }

    #[test]
    fn sequence_source_renders_items() {
        let list = ValueList::of_strs(&["A", "B", "C"]);
        let (container, _ctx) =
            mount_repeat(RepeatOptions::new().foreach_value(Value::List(list)));
        assert_eq!(container.rendered_text(), "ABC");
    }

    #[test]
    fn shorthand_list_source_is_treated_as_sequence() {
        let list = ValueList::of_strs(&["A", "B"]);
        let (container, _ctx) =
            mount_repeat(RepeatOptions::new().source_value(Value::List(list)));
        assert_eq!(container.rendered_text(), "AB");
    }

    #[test]
    fn numeric_foreach_is_a_pure_count() {
        let options = RepeatOptions::new()
            .foreach_value(Value::Int(5))
            .bind(Rc::new(|accessor, index, _| {
                assert!(accessor.is_none(), "numeric foreach binds no items");
                vec![Binding::Text(const_expr(Value::Int(index)))]
            }));
        let (container, _ctx) = mount_repeat(options);
        assert_eq!(container.rendered_text(), "01234");
    }

    #[test]
    fn growth_is_tail_anchored_and_preserves_identity() {
        let list = ValueList::of_strs(&["A", "B", "C"]);
        let (container, _ctx) =
            mount_repeat(RepeatOptions::new().foreach_value(Value::List(list.clone())));
        let before = repetition_nodes(&container);

        list.push(Value::str("D"));
        let after = repetition_nodes(&container);
        assert_eq!(container.rendered_text(), "ABCD");
        assert_eq!(after.len(), 4);
        for (i, survivor) in before.iter().enumerate() {
            assert!(after[i].ptr_eq(survivor), "survivor {i} must keep identity");
        }
    }

    #[test]
    fn interior_removal_shrinks_the_tail_and_refreshes_survivors() {
        let list = ValueList::of_strs(&["A", "B", "C", "D"]);
        let (container, _ctx) =
            mount_repeat(RepeatOptions::new().foreach_value(Value::List(list.clone())));
        let before = repetition_nodes(&container);

        list.remove(1); // drop 'B'
        let after = repetition_nodes(&container);
        assert_eq!(container.rendered_text(), "ACD", "survivors refresh values");
        assert_eq!(after.len(), 3);
        for (i, node) in after.iter().enumerate() {
            assert!(node.ptr_eq(&before[i]), "structural removal is tail-only");
        }
    }

    #[test]
    fn count_overrides_sequence_length_with_undefined_padding() {
        let list = ValueList::of_strs(&["A", "B"]);
        let fixed = Observable::new(Value::Int(4));
        let options = RepeatOptions::new()
            .foreach_value(Value::List(list))
            .count(const_expr(cell_value(&fixed)))
            .bind(Rc::new(|accessor, _, _| {
                assert!(accessor.is_some(), "sequence present");
                vec![Binding::Text(expr(move |ctx| {
                    let item = unwrap_value(&ctx.get("$item").unwrap_or(Value::Undefined));
                    if item == Value::Undefined {
                        Value::str("X")
                    } else {
                        item
                    }
                }))]
            }));
        let (container, _ctx) = mount_repeat(options);
        assert_eq!(container.rendered_text(), "ABXX");

        fixed.set(Value::Int(1));
        assert_eq!(container.rendered_text(), "A");

        fixed.set(Value::Int(0));
        assert_eq!(container.rendered_text(), "AB", "count 0 uses sequence length");
    }

    #[test]
    fn limit_caps_and_zero_means_unlimited() {
        let list = ValueList::of_strs(&["A", "B", "C", "D"]);
        let limit = Observable::new(Value::Int(0));
        let options = RepeatOptions::new()
            .foreach_value(Value::List(list))
            .limit(const_expr(cell_value(&limit)));
        let (container, _ctx) = mount_repeat(options);
        assert_eq!(container.rendered_text(), "ABCD", "limit 0 is no limit");

        limit.set(Value::Int(10));
        assert_eq!(container.rendered_text(), "ABCD", "oversize limit is inert");

        limit.set(Value::Int(2));
        assert_eq!(container.rendered_text(), "AB");
    }

    #[test]
    fn step_materializes_every_nth_logical_index() {
        let list = ValueList::of_strs(&["A", "B", "C", "D"]);
        let (container, _ctx) = mount_repeat(
            RepeatOptions::new()
                .foreach_value(Value::List(list))
                .step(2),
        );
        assert_eq!(container.rendered_text(), "AC");

        let attrs: Vec<String> = repetition_nodes(&container)
            .iter()
            .map(|n| n.attr("data-repeat-index").unwrap_or_default())
            .collect();
        assert_eq!(attrs, vec!["0", "2"]);
    }

    #[test]
    fn reverse_inserts_new_nodes_first() {
        let list = ValueList::of_strs(&["A", "B", "C", "D"]);
        let options = RepeatOptions::new()
            .foreach_value(Value::List(list.clone()))
            .reverse(true)
            .bind(Rc::new(|accessor, index, _| {
                let accessor = accessor.expect("sequence present");
                let item = accessor.read().to_display_string();
                vec![Binding::Text(const_expr(Value::str(format!(
                    "{index}{item}"
                ))))]
            }));
        let (container, _ctx) = mount_repeat(options);
        assert_eq!(container.rendered_text(), "3D2C1B0A");

        list.push(Value::str("E"));
        assert_eq!(container.rendered_text(), "4E3D2C1B0A");
    }

    #[test]
    fn reactive_count_source_grows_and_shrinks() {
        let count = Observable::new(Value::Int(2));
        let options = RepeatOptions::new()
            .source(const_expr(cell_value(&count)))
            .bind(Rc::new(|_, index, _| {
                vec![Binding::Text(const_expr(Value::Int(index)))]
            }));
        let (container, _ctx) = mount_repeat(options);
        assert_eq!(container.rendered_text(), "01");

        count.set(Value::Int(5));
        assert_eq!(container.rendered_text(), "01234");

        count.set(Value::Int(1));
        assert_eq!(container.rendered_text(), "0");

        count.set(Value::Int(0));
        assert_eq!(container.rendered_text(), "");
        assert_eq!(container.child_count(), 1, "anchor survives empty state");
    }

    #[test]
    fn debug_attribute_records_logical_index() {
        let options = RepeatOptions::new().count_value(3);
        let (container, _ctx) = mount_repeat(options);
        let attrs: Vec<String> = repetition_nodes(&container)
            .iter()
            .map(|n| n.attr("data-repeat-index").unwrap_or_default())
            .collect();
        assert_eq!(attrs, vec!["0", "1", "2"]);
    }

    #[test]
    fn item_as_data_sentinel_nests_the_scope() {
        let list = ValueList::of_strs(&["first", "second"]);
        let options = RepeatOptions::new()
            .foreach_value(Value::List(list))
            .item_name(ITEM_AS_DATA)
            .bind(Rc::new(|_, _, _| {
                vec![Binding::Text(var_expr("$data"))]
            }));
        let (container, _ctx) = mount_repeat(options);
        assert_eq!(container.rendered_text(), "firstsecond");
    }

    #[test]
    fn init_runs_once_update_runs_per_recompute() {
        let inits = Rc::new(std::cell::Cell::new(0));
        let updates = Rc::new(std::cell::Cell::new(0));
        let count = Observable::new(Value::Int(1));

        let (i, u) = (Rc::clone(&inits), Rc::clone(&updates));
        let options = RepeatOptions::new()
            .source(const_expr(cell_value(&count)))
            .on_init(Rc::new(move |_| i.set(i.get() + 1)))
            .on_update(Rc::new(move |_| u.set(u.get() + 1)));
        let (_container, _ctx) = mount_repeat(options);
        assert_eq!(inits.get(), 1);
        assert_eq!(updates.get(), 1);

        count.set(Value::Int(3));
        assert_eq!(inits.get(), 1, "init fires only at attach");
        assert_eq!(updates.get(), 2);
    }

    #[test]
    fn attach_on_detached_node_is_ignored() {
        let node = Node::element("span");
        let ctx = BindingContext::root(Value::Undefined);
        attach(&node, RepeatOptions::new().count_value(3), &ctx);
        assert!(node.parent().is_none());
    }
}

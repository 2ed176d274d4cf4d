#![forbid(unsafe_code)]

//! Property tests for the repeat reconciler's structural invariants.

use std::rc::Rc;

use proptest::prelude::*;

use weft::{Binding, BindingContext, Node, RepeatOptions, apply_bindings, const_expr, var_expr};
use weft_reactive::{Observable, Value, ValueList, cell_value};

fn mount(options: RepeatOptions) -> Node {
    let container = Node::element("div");
    let row = Node::element("span");
    row.push_binding(Binding::Text(var_expr("$item")));
    row.push_binding(Binding::Repeat(options));
    container.append(&row);
    apply_bindings(&BindingContext::root(Value::Undefined), &container);
    container
}

fn repetitions(container: &Node) -> Vec<Node> {
    container
        .children()
        .into_iter()
        .filter(|n| !n.is_anchor())
        .collect()
}

fn logical_indices(container: &Node) -> Vec<i64> {
    repetitions(container)
        .iter()
        .map(|n| {
            n.attr("data-repeat-index")
                .and_then(|a| a.parse().ok())
                .expect("every repetition carries its logical index")
        })
        .collect()
}

proptest! {
    /// After every recomputation, exactly `count` nodes exist, with
    /// contiguous logical indices in order.
    #[test]
    fn live_count_tracks_any_count_schedule(schedule in proptest::collection::vec(0i64..40, 1..24)) {
        let count = Observable::new(Value::Int(0));
        let options = RepeatOptions::new()
            .source(const_expr(cell_value(&count)))
            .bind(Rc::new(|_, index, _| {
                vec![Binding::Text(const_expr(Value::Int(index)))]
            }));
        let container = mount(options);

        for n in schedule {
            count.set(Value::Int(n));
            let indices = logical_indices(&container);
            prop_assert_eq!(indices.len() as i64, n);
            let expected: Vec<i64> = (0..n).collect();
            prop_assert_eq!(indices, expected);
        }
    }

    /// Survivors keep their subtree identity across any grow/shrink
    /// schedule; only endpoint nodes ever change.
    #[test]
    fn survivors_keep_identity(schedule in proptest::collection::vec(0usize..30, 1..20)) {
        let count = Observable::new(Value::Int(0));
        let container = mount(RepeatOptions::new().source(const_expr(cell_value(&count))));

        let mut mirror: Vec<Node> = Vec::new();
        for n in schedule {
            count.set(Value::Int(n as i64));
            let nodes = repetitions(&container);
            prop_assert_eq!(nodes.len(), n);

            let surviving = mirror.len().min(n);
            for i in 0..surviving {
                prop_assert!(
                    nodes[i].ptr_eq(&mirror[i]),
                    "node {} must survive a transition to count {}", i, n
                );
            }
            mirror = nodes;
        }
    }

    /// `step` materializes `ceil(len / step)` nodes with stride-`step`
    /// logical indices.
    #[test]
    fn step_arithmetic(len in 0usize..30, step in 1usize..6) {
        let values: Vec<Value> = (0..len).map(|i| Value::Int(i as i64)).collect();
        let container = mount(
            RepeatOptions::new()
                .foreach_value(Value::List(ValueList::from_values(values)))
                .step(step),
        );

        let indices = logical_indices(&container);
        prop_assert_eq!(indices.len(), len.div_ceil(step));
        for (slot, logical) in indices.iter().enumerate() {
            prop_assert_eq!(*logical, (slot * step) as i64);
        }
    }

    /// Reverse mode: logical indices still increase in array order, so the
    /// physical order is strictly descending, through arbitrary growth and
    /// shrink.
    #[test]
    fn reverse_physical_order_is_descending(schedule in proptest::collection::vec(0i64..25, 1..16)) {
        let count = Observable::new(Value::Int(0));
        let container = mount(
            RepeatOptions::new()
                .source(const_expr(cell_value(&count)))
                .reverse(true),
        );

        for n in schedule {
            count.set(Value::Int(n));
            let indices = logical_indices(&container);
            let expected: Vec<i64> = (0..n).rev().collect();
            prop_assert_eq!(indices, expected);
        }
    }

    /// Displayed count follows the documented precedence: `foreach` sets
    /// the baseline, nonzero `count` overrides it, nonzero `limit` caps it.
    #[test]
    fn count_limit_precedence(len in 0usize..12, count in 0i64..12, limit in 0i64..12) {
        let values: Vec<Value> = (0..len).map(|i| Value::Int(i as i64)).collect();
        let container = mount(
            RepeatOptions::new()
                .foreach_value(Value::List(ValueList::from_values(values)))
                .count_value(count)
                .limit_value(limit),
        );

        let mut expected = len as i64;
        if count != 0 {
            expected = count;
        }
        if limit > 0 {
            expected = expected.min(limit);
        }
        prop_assert_eq!(repetitions(&container).len() as i64, expected);
    }

    /// Pure-count repeats never panic and never bind an item accessor,
    /// whatever the (possibly negative) source value.
    #[test]
    fn negative_counts_clamp_to_zero(n in -20i64..0) {
        let container = mount(RepeatOptions::new().source_value(Value::Int(n)));
        prop_assert_eq!(repetitions(&container).len(), 0);
    }
}

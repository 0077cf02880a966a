//! Property tests for the vertex-keyed mutable max-heap.
//!
//! A `MutableQueue` driven by an arbitrary op sequence must agree with a
//! naive map model at every step:
//! - stored priority is the max ever inserted since the last removal,
//! - pops come out highest-priority first,
//! - membership and length always match.

use std::collections::HashMap;

use proptest::prelude::*;

use splash_rs::scheduler::queue::MutableQueue;
use splash_rs::VertexId;

#[derive(Clone, Debug)]
enum Op {
    Insert(VertexId, f64),
    Remove(VertexId),
    Pop,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u32..48, -4.0f64..4.0).prop_map(|(v, p)| Op::Insert(v, p)),
        1 => (0u32..48).prop_map(Op::Remove),
        1 => Just(Op::Pop),
    ]
}

fn model_max(model: &HashMap<VertexId, f64>) -> Option<f64> {
    model
        .values()
        .copied()
        .max_by(|a, b| a.total_cmp(b))
}

proptest! {
    #[test]
    fn queue_matches_map_model(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let mut queue = MutableQueue::new();
        let mut model: HashMap<VertexId, f64> = HashMap::new();

        for op in ops {
            match op {
                Op::Insert(v, p) => {
                    queue.insert_or_raise(v, p);
                    model
                        .entry(v)
                        .and_modify(|stored| {
                            if p.total_cmp(stored).is_gt() {
                                *stored = p;
                            }
                        })
                        .or_insert(p);
                }
                Op::Remove(v) => {
                    let was_present = model.remove(&v).is_some();
                    prop_assert_eq!(queue.remove(v), was_present);
                }
                Op::Pop => match queue.pop() {
                    Some((v, p)) => {
                        let best = model_max(&model).expect("model empty but queue popped");
                        prop_assert_eq!(p.total_cmp(&best), std::cmp::Ordering::Equal);
                        let stored = model.remove(&v).expect("popped vertex absent from model");
                        prop_assert_eq!(stored.total_cmp(&p), std::cmp::Ordering::Equal);
                    }
                    None => prop_assert!(model.is_empty()),
                },
            }

            prop_assert_eq!(queue.len(), model.len());
            for (&v, &p) in &model {
                prop_assert!(queue.contains(v));
                prop_assert_eq!(queue.priority_of(v), Some(p));
            }
        }
    }

    #[test]
    fn insert_or_raise_is_monotone(
        v in 0u32..16,
        first in -2.0f64..2.0,
        second in -2.0f64..2.0,
    ) {
        let mut queue = MutableQueue::new();
        queue.insert_or_raise(v, first);
        queue.insert_or_raise(v, second);
        let expect = if second.total_cmp(&first).is_gt() { second } else { first };
        prop_assert_eq!(queue.priority_of(v), Some(expect));
        prop_assert_eq!(queue.len(), 1);
    }

    #[test]
    fn drain_is_sorted_descending(
        entries in prop::collection::hash_map(0u32..64, -8.0f64..8.0, 0..40),
    ) {
        let mut queue = MutableQueue::new();
        for (&v, &p) in &entries {
            queue.insert_or_raise(v, p);
        }
        let mut last = f64::INFINITY;
        let mut popped = 0;
        while let Some((_, p)) = queue.pop() {
            prop_assert!(p.total_cmp(&last).is_le());
            last = p;
            popped += 1;
        }
        prop_assert_eq!(popped, entries.len());
    }
}

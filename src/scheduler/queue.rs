//! Vertex-keyed mutable max-priority queue — the per-shard store.
//!
//! # Why not `BinaryHeap`
//!
//! The scheduler needs three operations a plain heap cannot do:
//! - `insert_or_raise`: promote an existing entry without duplicating it,
//! - `remove`: splash growth claims arbitrary vertices out of the middle,
//! - `contains`: the `add_task` bit/queue protocol tests membership.
//!
//! So this is the classic indexed binary heap: a `Vec`-backed max-heap plus
//! a vertex → slot map kept in lockstep by every swap. All operations are
//! `O(log n)` except `contains`/`len` (`O(1)`).
//!
//! # Priority semantics
//!
//! Residuals are monotone informational signals: `insert_or_raise` keeps
//! `max(existing, new)` and never lowers a stored priority. Ordering uses
//! `f64::total_cmp`, so NaN has a defined place instead of corrupting the
//! heap invariant.
//!
//! Not thread-safe on its own; each shard wraps one queue in its own mutex.

use ahash::AHashMap;
use std::cmp::Ordering;

use crate::graph::VertexId;

#[derive(Clone, Copy, Debug)]
struct Entry {
    vertex: VertexId,
    priority: f64,
}

/// Indexed max-heap keyed by vertex id.
#[derive(Clone, Debug, Default)]
pub struct MutableQueue {
    heap: Vec<Entry>,
    slots: AHashMap<VertexId, usize>,
}

impl MutableQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` when nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns `true` when `vertex` is queued.
    #[inline]
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.slots.contains_key(&vertex)
    }

    /// Stored priority of `vertex`, if queued.
    #[inline]
    pub fn priority_of(&self, vertex: VertexId) -> Option<f64> {
        self.slots.get(&vertex).map(|&idx| self.heap[idx].priority)
    }

    /// Highest-priority entry without removing it.
    #[inline]
    pub fn peek(&self) -> Option<(VertexId, f64)> {
        self.heap.first().map(|e| (e.vertex, e.priority))
    }

    /// Inserts `vertex` with `priority`, or promotes it to
    /// `max(existing, priority)` if already queued. Never lowers.
    pub fn insert_or_raise(&mut self, vertex: VertexId, priority: f64) {
        if let Some(&idx) = self.slots.get(&vertex) {
            if priority.total_cmp(&self.heap[idx].priority) == Ordering::Greater {
                self.heap[idx].priority = priority;
                self.sift_up(idx);
            }
            return;
        }
        let idx = self.heap.len();
        self.heap.push(Entry { vertex, priority });
        self.slots.insert(vertex, idx);
        self.sift_up(idx);
    }

    /// Removes and returns the maximum-priority entry.
    pub fn pop(&mut self) -> Option<(VertexId, f64)> {
        let top = *self.heap.first()?;
        self.slots.remove(&top.vertex);
        let last = self.heap.pop().expect("heap non-empty after peek");
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.slots.insert(last.vertex, 0);
            self.sift_down(0);
        }
        Some((top.vertex, top.priority))
    }

    /// Removes `vertex` if queued; reports whether it was present.
    pub fn remove(&mut self, vertex: VertexId) -> bool {
        let Some(idx) = self.slots.remove(&vertex) else {
            return false;
        };
        let last_idx = self.heap.len() - 1;
        if idx == last_idx {
            self.heap.pop();
            return true;
        }
        self.heap.swap(idx, last_idx);
        self.heap.pop();
        let moved = self.heap[idx];
        self.slots.insert(moved.vertex, idx);
        // The filler came from a leaf; it may be out of order in either
        // direction relative to its new neighbourhood.
        if idx > 0
            && moved
                .priority
                .total_cmp(&self.heap[(idx - 1) / 2].priority)
                == Ordering::Greater
        {
            self.sift_up(idx);
        } else {
            self.sift_down(idx);
        }
        true
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.heap[idx]
                .priority
                .total_cmp(&self.heap[parent].priority)
                != Ordering::Greater
            {
                break;
            }
            self.swap_entries(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut largest = idx;
            if left < len
                && self.heap[left]
                    .priority
                    .total_cmp(&self.heap[largest].priority)
                    == Ordering::Greater
            {
                largest = left;
            }
            if right < len
                && self.heap[right]
                    .priority
                    .total_cmp(&self.heap[largest].priority)
                    == Ordering::Greater
            {
                largest = right;
            }
            if largest == idx {
                break;
            }
            self.swap_entries(idx, largest);
            idx = largest;
        }
    }

    fn swap_entries(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slots.insert(self.heap[a].vertex, a);
        self.slots.insert(self.heap[b].vertex, b);
    }
}

//! Worker-indexed reprioritisation surface handed to running updates.
//!
//! Update functions do not see the scheduler; they see a [`DirectCallback`]
//! for their worker and use it to push residual changes back in. The
//! callback holds a `Weak` back-reference so the engine can own scheduler
//! and callbacks side by side without a reference cycle: once the engine
//! drops the scheduler, late callback calls become silent no-ops instead of
//! keeping a dead scheduler alive.

use std::sync::Weak;

use super::splash::SplashScheduler;
use super::{Task, UpdateFunction};
use crate::graph::Graph;

/// Per-worker handle through which running updates call `add_task`.
///
/// Cheap to clone; safe to call from the worker thread mid-update.
pub struct DirectCallback<G, F> {
    scheduler: Weak<SplashScheduler<G, F>>,
    worker_id: usize,
}

impl<G, F> Clone for DirectCallback<G, F> {
    fn clone(&self) -> Self {
        Self {
            scheduler: Weak::clone(&self.scheduler),
            worker_id: self.worker_id,
        }
    }
}

impl<G: Graph, F: UpdateFunction> DirectCallback<G, F> {
    pub(super) fn new(scheduler: Weak<SplashScheduler<G, F>>, worker_id: usize) -> Self {
        Self {
            scheduler,
            worker_id,
        }
    }

    /// The worker this callback was issued to.
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Enqueues or reprioritises `task`. No-op after the scheduler is gone.
    pub fn add_task(&self, task: Task<F>, priority: f64) {
        if let Some(scheduler) = self.scheduler.upgrade() {
            scheduler.add_task(task, priority);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AdjacencyGraph, VertexId};
    use crate::scheduler::options::SchedulerConfig;
    use std::sync::Arc;

    fn touch(_v: VertexId) {}

    #[test]
    fn callback_reaches_the_scheduler() {
        let graph = Arc::new(AdjacencyGraph::new(4));
        let scheduler = Arc::new(SplashScheduler::new(graph, SchedulerConfig::new(1)));
        let cb = scheduler.callback(0);

        cb.add_task(Task::new(2, touch as fn(VertexId)), 0.5);
        assert_eq!(scheduler.pending_in_queues(), 1);
        assert_eq!(cb.worker_id(), 0);
    }

    #[test]
    fn callback_outlives_scheduler_silently() {
        let graph = Arc::new(AdjacencyGraph::new(4));
        let scheduler = Arc::new(SplashScheduler::new(graph, SchedulerConfig::new(1)));
        let cb = scheduler.callback(0);
        drop(scheduler);

        // Must neither panic nor resurrect the scheduler.
        cb.add_task(Task::new(0, touch as fn(VertexId)), 1.0);
    }
}

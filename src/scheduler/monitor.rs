//! Observer hook for task ingress and egress.
//!
//! Engines attach a [`Monitor`] to watch tasks enter the scheduler
//! (`task_added`, fired under the same shard-level event as the insertion)
//! and leave it (`task_scheduled`, fired as a task is handed to a worker).
//! Both methods default to no-ops so implementations only override what
//! they observe; [`NoopMonitor`] is the injected default.

use super::Task;

/// Two-capability observer over scheduler task flow.
///
/// Implementations must be cheap and non-blocking: `task_added` runs while
/// the target shard is locked.
pub trait Monitor<F>: Send + Sync {
    /// A task entered (or was promoted in) the scheduler with `priority`.
    fn task_added(&self, _task: Task<F>, _priority: f64) {}

    /// A task was handed to a worker for execution.
    fn task_scheduled(&self, _task: Task<F>, _priority: f64) {}
}

/// Default monitor; observes nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMonitor;

impl<F> Monitor<F> for NoopMonitor {}

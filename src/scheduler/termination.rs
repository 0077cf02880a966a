//! Cooperative quiescence detection across worker threads.
//!
//! # Protocol
//!
//! A worker that finds no work announces it by entering a *sleep critical
//! section*, re-checks its sources once, then either cancels (work appeared)
//! or commits and blocks. Global termination is declared at the instant all
//! `W` workers are simultaneously inside the critical section with no
//! undelivered job notification:
//!
//! ```text
//!   worker w                        producer (any thread)
//!   ────────                        ────────────────────
//!   begin_sleep_critical_section    enqueue work into shard group g
//!   (re-check work sources)         new_job(g)  ── sets flag, wakes sleepers
//!   end_sleep_critical_section ──┐
//!     flag(w) set → return false ─┴─► retry the consumption loop
//!     all W asleep, no flags → declare done, return true everywhere
//! ```
//!
//! # Correctness Invariants
//!
//! - **No lost wakeups**: `new_job` sets the per-worker flag under the same
//!   mutex the sleeper re-checks before every wait, so a notification can
//!   never fall between the check and the block.
//! - **Decision invalidation**: any `new_job` delivered while workers sleep
//!   makes the flagged worker's `end_sleep_critical_section` return `false`
//!   instead of declaring completion.
//! - **`done` is latched**: once declared, every pending and future
//!   `end_sleep_critical_section` returns `true` until `reset`.
//!
//! A single mutex guards the whole detector. That is deliberate: the
//! detector is only touched when a producer hands over work or a worker has
//! already run dry, never on the per-task fast path.

use std::sync::{Condvar, Mutex};

#[derive(Debug)]
struct TerminationState {
    /// Workers currently inside the sleep critical section.
    sleeping: usize,
    /// Per-worker membership, for debug assertions on protocol misuse.
    in_critical: Vec<bool>,
    /// Per-worker undelivered job notification.
    new_jobs: Vec<bool>,
    /// Latched completion decision.
    done: bool,
}

/// Quiescence detector shared by `W` workers and their producers.
#[derive(Debug)]
pub struct SharedTermination {
    workers: usize,
    state: Mutex<TerminationState>,
    wakeup: Condvar,
}

impl SharedTermination {
    /// Creates a detector for `workers` worker threads.
    ///
    /// # Panics
    /// Panics if `workers` is zero.
    pub fn new(workers: usize) -> Self {
        assert!(workers > 0, "termination detector requires workers > 0");
        Self {
            workers,
            state: Mutex::new(TerminationState {
                sleeping: 0,
                in_critical: vec![false; workers],
                new_jobs: vec![false; workers],
                done: false,
            }),
            wakeup: Condvar::new(),
        }
    }

    /// Re-arms the detector for a fresh run.
    ///
    /// Must not race with sleeping workers; callers invoke it from the
    /// engine thread before workers start.
    pub fn reset(&self) {
        let mut state = self.lock();
        debug_assert_eq!(state.sleeping, 0, "reset while workers are asleep");
        state.done = false;
        state.sleeping = 0;
        state.in_critical.iter_mut().for_each(|f| *f = false);
        state.new_jobs.iter_mut().for_each(|f| *f = false);
    }

    /// Records that new work exists for `worker_id`'s sources and wakes any
    /// sleeping workers so the flagged one can pick it up.
    pub fn new_job(&self, worker_id: usize) {
        assert!(worker_id < self.workers, "worker id {worker_id} out of range");
        let mut state = self.lock();
        state.new_jobs[worker_id] = true;
        if state.sleeping > 0 {
            self.wakeup.notify_all();
        }
    }

    /// Announces "worker `worker_id` found no work".
    pub fn begin_sleep_critical_section(&self, worker_id: usize) {
        assert!(worker_id < self.workers, "worker id {worker_id} out of range");
        let mut state = self.lock();
        debug_assert!(
            !state.in_critical[worker_id],
            "worker {worker_id} re-entered the sleep critical section"
        );
        state.in_critical[worker_id] = true;
        state.sleeping += 1;
    }

    /// Withdraws the announcement without blocking (work reappeared during
    /// the re-check).
    pub fn cancel_sleep_critical_section(&self, worker_id: usize) {
        assert!(worker_id < self.workers, "worker id {worker_id} out of range");
        let mut state = self.lock();
        debug_assert!(state.in_critical[worker_id]);
        state.in_critical[worker_id] = false;
        state.sleeping -= 1;
    }

    /// Commits the announcement and blocks.
    ///
    /// Returns `true` when global termination was declared, `false` when a
    /// job notification for this worker arrived first; the caller must then
    /// retry its consumption loop.
    pub fn end_sleep_critical_section(&self, worker_id: usize) -> bool {
        assert!(worker_id < self.workers, "worker id {worker_id} out of range");
        let mut state = self.lock();
        debug_assert!(state.in_critical[worker_id]);
        loop {
            if state.new_jobs[worker_id] {
                state.new_jobs[worker_id] = false;
                state.in_critical[worker_id] = false;
                state.sleeping -= 1;
                return false;
            }
            if state.done {
                state.in_critical[worker_id] = false;
                state.sleeping -= 1;
                return true;
            }
            if state.sleeping == self.workers && !state.new_jobs.iter().any(|&f| f) {
                state.done = true;
                state.in_critical[worker_id] = false;
                state.sleeping -= 1;
                self.wakeup.notify_all();
                return true;
            }
            state = self
                .wakeup
                .wait(state)
                .expect("termination mutex poisoned");
        }
    }

    /// Returns whether termination has been declared.
    pub fn is_done(&self) -> bool {
        self.lock().done
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TerminationState> {
        self.state.lock().expect("termination mutex poisoned")
    }
}

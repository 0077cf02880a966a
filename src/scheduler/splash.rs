//! The splash scheduler proper.
//!
//! # Structure
//!
//! - **Sharded store**: `W·M` vertex-keyed max-heaps (`M = 5`), each behind
//!   its own mutex. Worker `w` pops roots only from shards
//!   `[w·M, w·M + M)`, rotating a cursor through them; over-sharding keeps
//!   producer-side `add_task` fan-in and the worker's own consumption off
//!   the same lock.
//! - **Vertex→shard map**: immutable after construction; `v mod W·M` unless
//!   the config asks for a seeded permutation.
//! - **Active set**: one atomic bit per vertex, set while the scheduler
//!   owes an emission of that vertex.
//! - **Per-worker splash**: the current update sequence and a cursor,
//!   rebuilt from a fresh root whenever it runs dry.
//! - **Termination**: a [`SharedTermination`] detector that workers fall
//!   into when both splash and shards are empty.
//!
//! # The bit/queue protocol
//!
//! Invariant: a vertex's active bit is set iff the vertex sits in its shard
//! or in some worker's unconsumed splash suffix. `add_task` sets the bit
//! and inserts/promotes *unless* the vertex has already been absorbed into
//! a splash (bit set, not queued) — then the bit alone records the request
//! and the emission pass converts it into a task. Emission clears the bit
//! and only emits when it observed the set→clear transition, so a vertex is
//! never handed out twice without an intervening `add_task`.
//!
//! # Lock order
//!
//! worker-splash mutex → shard mutex; the detector mutex is never held
//! while taking either. `add_task` takes only a shard mutex, then the
//! detector.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use ahash::AHashSet;
use crossbeam_utils::CachePadded;

use super::active_set::ActiveSet;
use super::callback::DirectCallback;
use super::monitor::{Monitor, NoopMonitor};
use super::options::{SchedulerConfig, SchedulerOption};
use super::queue::MutableQueue;
use super::rng::XorShift64;
use super::termination::SharedTermination;
use super::{SchedulerStatus, Task, UpdateFunction};
use crate::graph::{EdgeId, Graph, VertexId};

/// Shards per worker. Over-sharding by 5 spreads `add_task` fan-in from
/// other workers across independent locks.
const QUEUE_MULTIPLE: usize = 5;

/// Per-worker consumption state: the current splash plus growth scratch.
///
/// Owned by one worker at a time; the mutex around it is uncontended in
/// steady state and exists so `start`/`restart` can reach in from the
/// engine thread.
struct WorkerSplash {
    /// Current update sequence, consumed left to right.
    order: Vec<VertexId>,
    /// Next index to emit; `order.len()` means depleted.
    cursor: usize,
    /// Rotating cursor over this worker's `M` shards for root acquisition.
    next_shard: usize,
    /// Neighbour-shuffle RNG, forked from the scheduler seed.
    rng: XorShift64,
    /// BFS growth scratch, reused across rebuilds.
    visited: AHashSet<VertexId>,
    frontier: VecDeque<VertexId>,
    neighbours: Vec<VertexId>,
}

impl WorkerSplash {
    fn new(seed: u64) -> Self {
        Self {
            order: Vec::new(),
            cursor: 0,
            next_shard: 0,
            rng: XorShift64::new(seed),
            visited: AHashSet::new(),
            frontier: VecDeque::new(),
            neighbours: Vec::new(),
        }
    }
}

/// Parallel priority scheduler growing bounded splashes from high-residual
/// roots.
///
/// Shared by reference across the engine's `W` worker threads plus any
/// producer threads; all public methods take `&self`.
pub struct SplashScheduler<G, F> {
    graph: Arc<G>,
    workers: usize,
    num_vertices: usize,

    /// Work budget per splash (cumulative edge count).
    splash_size: AtomicUsize,
    /// Canonical update function; fixed by the first task or an explicit
    /// setter, identical forever after.
    update_fn: OnceLock<F>,

    /// `W·M` shard queues, each independently locked.
    shards: Vec<CachePadded<Mutex<MutableQueue>>>,
    /// Static vertex → shard assignment.
    vmap: Vec<u32>,

    worker_state: Vec<CachePadded<Mutex<WorkerSplash>>>,
    active: ActiveSet,
    terminator: SharedTermination,
    monitor: Box<dyn Monitor<F>>,
    aborted: AtomicBool,
}

impl<G: Graph, F: UpdateFunction> SplashScheduler<G, F> {
    /// Creates a scheduler over `graph` for `config.workers` worker threads.
    ///
    /// # Panics
    /// Panics if the configuration is invalid.
    pub fn new(graph: Arc<G>, config: SchedulerConfig) -> Self {
        config.validate();
        let num_vertices = graph.num_vertices();
        let num_shards = config.workers * QUEUE_MULTIPLE;

        let mut vmap: Vec<u32> = (0..num_vertices)
            .map(|v| (v % num_shards) as u32)
            .collect();
        if config.shuffle_shard_map {
            XorShift64::new(config.seed).shuffle(&mut vmap);
        }

        let shards = (0..num_shards)
            .map(|_| CachePadded::new(Mutex::new(MutableQueue::new())))
            .collect();
        let worker_state = (0..config.workers)
            .map(|worker_id| {
                let seed = config.seed ^ (worker_id as u64).wrapping_mul(0x9E3779B97F4A7C15);
                CachePadded::new(Mutex::new(WorkerSplash::new(seed)))
            })
            .collect();

        Self {
            graph,
            workers: config.workers,
            num_vertices,
            splash_size: AtomicUsize::new(config.splash_size),
            update_fn: OnceLock::new(),
            shards,
            vmap,
            worker_state,
            active: ActiveSet::new(num_vertices),
            terminator: SharedTermination::new(config.workers),
            monitor: Box::new(NoopMonitor),
            aborted: AtomicBool::new(false),
        }
    }

    /// Number of worker threads this scheduler was sized for.
    pub fn num_workers(&self) -> usize {
        self.workers
    }

    /// Current per-splash work budget.
    pub fn splash_size(&self) -> usize {
        self.splash_size.load(Ordering::Relaxed)
    }

    /// Replaces the monitor (call before sharing the scheduler).
    pub fn set_monitor(&mut self, monitor: Box<dyn Monitor<F>>) {
        self.monitor = monitor;
    }

    /// Issues the reprioritisation callback for `worker_id`.
    ///
    /// # Panics
    /// Panics if `worker_id` is out of range.
    pub fn callback(self: &Arc<Self>, worker_id: usize) -> DirectCallback<G, F> {
        assert!(
            worker_id < self.workers,
            "worker id {worker_id} out of range"
        );
        DirectCallback::new(Arc::downgrade(self), worker_id)
    }

    // ------------------------------------------------------------------
    // Engine-facing lifecycle
    // ------------------------------------------------------------------

    /// Called once, immediately before workers begin: grows an initial
    /// splash per worker (possibly empty) and re-arms the termination
    /// detector.
    pub fn start(&self) {
        for worker_id in 0..self.workers {
            let mut state = self.lock_worker(worker_id);
            self.rebuild_splash(worker_id, &mut state);
        }
        self.terminator.reset();
    }

    /// Makes future emissions report `Waiting`; workers then drain into the
    /// termination detector and `get_next_task` resolves to `Complete` once
    /// all of them are asleep. In-flight tasks are not recalled.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    /// Clears the abort flag and every worker's splash. Queue contents are
    /// preserved, so a subsequent run resumes the pending work.
    pub fn restart(&self) {
        for worker_id in 0..self.workers {
            let mut state = self.lock_worker(worker_id);
            state.order.clear();
            state.cursor = 0;
        }
        self.aborted.store(false, Ordering::Release);
    }

    // ------------------------------------------------------------------
    // Task submission
    // ------------------------------------------------------------------

    /// Enqueues or reprioritises `task`.
    ///
    /// Safe to call from any thread, including update functions running on
    /// workers (via [`DirectCallback`]).
    ///
    /// # Panics
    /// Panics if the vertex is out of range or the task carries a different
    /// update function than the scheduler is bound to.
    pub fn add_task(&self, task: Task<F>, priority: f64) {
        let vertex = task.vertex;
        assert!(
            (vertex as usize) < self.num_vertices,
            "task vertex {vertex} out of range"
        );
        let bound = *self.update_fn.get_or_init(|| task.function);
        assert!(
            bound == task.function,
            "tasks must all carry the scheduler's update function"
        );

        let shard_index = self.vmap[vertex as usize] as usize;
        {
            let mut shard = self.shards[shard_index]
                .lock()
                .expect("shard mutex poisoned");
            let already_active = self.active.set(vertex as usize);
            // Insert or promote unless the vertex has already been absorbed
            // into some worker's splash; then the bit alone records the
            // request and the emission pass produces the task.
            if !already_active || shard.contains(vertex) {
                shard.insert_or_raise(vertex, priority);
                self.monitor.task_added(task, priority);
            }
        }
        self.terminator.new_job(shard_index / QUEUE_MULTIPLE);
    }

    /// Binds `function` as the canonical update function and enqueues every
    /// vertex at `priority`.
    pub fn add_task_to_all(&self, function: F, priority: f64) {
        self.set_update_function(function);
        for vertex in 0..self.num_vertices {
            self.add_task(Task::new(vertex as VertexId, function), priority);
        }
    }

    /// Enqueues each listed vertex at `priority`.
    pub fn add_tasks(&self, vertices: &[VertexId], function: F, priority: f64) {
        for &vertex in vertices {
            self.add_task(Task::new(vertex, function), priority);
        }
    }

    // ------------------------------------------------------------------
    // Consumption
    // ------------------------------------------------------------------

    /// Main consumption entry point for worker `worker_id`.
    ///
    /// Fast path: emit from the worker's splash, rebuilding it as needed.
    /// Quiescence path: announce no-work to the detector, re-check once,
    /// then block until either new work lands in this worker's shard group
    /// or global termination is declared.
    ///
    /// # Panics
    /// Panics if `worker_id` is out of range.
    pub fn get_next_task(&self, worker_id: usize) -> SchedulerStatus<F> {
        assert!(
            worker_id < self.workers,
            "worker id {worker_id} out of range"
        );
        loop {
            let status = self.next_from_splash(worker_id);
            if !matches!(status, SchedulerStatus::Waiting) {
                return status;
            }
            self.terminator.begin_sleep_critical_section(worker_id);
            let status = self.next_from_splash(worker_id);
            if !matches!(status, SchedulerStatus::Waiting) {
                self.terminator.cancel_sleep_critical_section(worker_id);
                return status;
            }
            if self.terminator.end_sleep_critical_section(worker_id) {
                return SchedulerStatus::Complete;
            }
        }
    }

    /// Engine notification: a task finished. No scheduler-side effect.
    pub fn completed_task(&self, _worker_id: usize, _task: Task<F>) {}

    /// Engine notification: vertex/edge state changed. No scheduler-side
    /// effect.
    pub fn update_state(&self, _worker_id: usize, _vertices: &[VertexId], _edges: &[EdgeId]) {}

    /// Engine notification: scoped modification finished. No scheduler-side
    /// effect.
    pub fn scoped_modifications(&self, _worker_id: usize, _root: VertexId, _edges: &[EdgeId]) {}

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Binds the canonical update function.
    ///
    /// # Panics
    /// Panics if a different function was already bound.
    pub fn set_update_function(&self, function: F) {
        let bound = *self.update_fn.get_or_init(|| function);
        assert!(
            bound == function,
            "scheduler already bound to a different update function"
        );
    }

    /// Sets the per-splash work budget.
    ///
    /// # Panics
    /// Panics if `splash_size` is zero.
    pub fn set_splash_size(&self, splash_size: usize) {
        assert!(splash_size > 0, "splash_size must be > 0");
        self.splash_size.store(splash_size, Ordering::Relaxed);
    }

    /// Applies a runtime option; unsupported options are logged and
    /// ignored.
    pub fn set_option(&self, option: SchedulerOption<F>) {
        match option {
            SchedulerOption::SplashSize(size) => self.set_splash_size(size),
            SchedulerOption::UpdateFunction(function) => self.set_update_function(function),
            other => {
                eprintln!(
                    "WARN: splash scheduler ignoring unsupported option {}",
                    other.name()
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Introspection (tests, debugging)
    // ------------------------------------------------------------------

    /// Total vertices currently sitting in shard queues. Snapshot only.
    pub fn pending_in_queues(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().expect("shard mutex poisoned").len())
            .sum()
    }

    /// Number of set active bits. Snapshot only.
    pub fn active_vertices(&self) -> usize {
        self.active.count_set()
    }

    /// Whether `vertex` currently sits in its shard queue.
    pub fn is_queued(&self, vertex: VertexId) -> bool {
        self.lock_shard_of(vertex).contains(vertex)
    }

    /// Whether `vertex`'s active bit is set.
    pub fn is_active(&self, vertex: VertexId) -> bool {
        self.active.is_set(vertex as usize)
    }

    /// Copy of `worker_id`'s splash sequence and its cursor.
    pub fn splash_snapshot(&self, worker_id: usize) -> (Vec<VertexId>, usize) {
        let state = self.lock_worker(worker_id);
        (state.order.clone(), state.cursor)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn lock_worker(&self, worker_id: usize) -> MutexGuard<'_, WorkerSplash> {
        self.worker_state[worker_id]
            .lock()
            .expect("worker splash mutex poisoned")
    }

    fn lock_shard_of(&self, vertex: VertexId) -> MutexGuard<'_, MutableQueue> {
        self.shards[self.vmap[vertex as usize] as usize]
            .lock()
            .expect("shard mutex poisoned")
    }

    /// Cost of updating `vertex`: its total degree.
    fn vertex_work(&self, vertex: VertexId) -> usize {
        self.graph.in_edge_ids(vertex).len() + self.graph.out_edge_ids(vertex).len()
    }

    /// Pops the best root from this worker's shard group, rotating the
    /// starting shard so every shard is eventually consulted.
    fn pop_root(&self, worker_id: usize, next_shard: &mut usize) -> Option<(VertexId, f64)> {
        for step in 0..QUEUE_MULTIPLE {
            let slot = (step + *next_shard) % QUEUE_MULTIPLE;
            let index = worker_id * QUEUE_MULTIPLE + slot;
            let popped = self.shards[index]
                .lock()
                .expect("shard mutex poisoned")
                .pop();
            if let Some((vertex, priority)) = popped {
                *next_shard = (slot + 1) % QUEUE_MULTIPLE;
                return Some((vertex, priority));
            }
        }
        *next_shard = 0;
        None
    }

    /// Grows a fresh splash for `worker_id`.
    ///
    /// Root acquisition, bounded BFS through in-neighbours (claiming each
    /// absorbed vertex out of its shard), then the reverse-forward
    /// extension: a tree of `k > 1` vertices becomes a `2k − 1` sequence
    /// visiting leaves, climbing to the root, and walking back down.
    fn rebuild_splash(&self, worker_id: usize, state: &mut WorkerSplash) {
        debug_assert!(
            state.cursor >= state.order.len(),
            "rebuilding an unconsumed splash"
        );
        state.order.clear();
        state.cursor = 0;

        let splash_size = self.splash_size.load(Ordering::Relaxed);
        let Some((root, root_priority)) = self.pop_root(worker_id, &mut state.next_shard) else {
            return;
        };

        let mut splash_work = self.vertex_work(root);
        // An already-urgent root is updated alone; dragging its
        // neighbourhood along would only delay the residual it carries.
        if root_priority > 1.0 {
            splash_work = splash_size;
        }

        let WorkerSplash {
            order,
            rng,
            visited,
            frontier,
            neighbours,
            ..
        } = state;

        order.push(root);
        visited.clear();
        frontier.clear();
        visited.insert(root);

        neighbours.clear();
        for &edge in self.graph.in_edge_ids(root) {
            neighbours.push(self.graph.source(edge));
        }
        rng.shuffle(neighbours);
        for &neighbour in neighbours.iter() {
            frontier.push_back(neighbour);
            visited.insert(neighbour);
        }

        while splash_work < splash_size {
            let Some(vertex) = frontier.pop_front() else {
                break;
            };
            let vertex_work = self.vertex_work(vertex);
            if splash_work + vertex_work > splash_size {
                continue;
            }
            // Claim the vertex out of its shard; a miss means another
            // worker's splash (or an emission) already took it.
            let removed = self.lock_shard_of(vertex).remove(vertex);
            if !removed {
                continue;
            }
            order.push(vertex);
            splash_work += vertex_work;

            neighbours.clear();
            for &edge in self.graph.in_edge_ids(vertex) {
                neighbours.push(self.graph.source(edge));
            }
            rng.shuffle(neighbours);
            for &neighbour in neighbours.iter() {
                if visited.insert(neighbour) {
                    frontier.push_back(neighbour);
                }
            }
        }

        let k = order.len();
        if k > 1 {
            order.reverse();
            for i in (0..k - 1).rev() {
                let vertex = order[i];
                order.push(vertex);
            }
        }
    }

    /// Emits the next task from the worker's splash, rebuilding on
    /// depletion; `Waiting` when aborted or out of work.
    fn next_from_splash(&self, worker_id: usize) -> SchedulerStatus<F> {
        let mut state = self.lock_worker(worker_id);
        loop {
            if self.aborted.load(Ordering::Acquire) {
                return SchedulerStatus::Waiting;
            }
            if state.cursor >= state.order.len() {
                self.rebuild_splash(worker_id, &mut state);
                if state.cursor >= state.order.len() {
                    return SchedulerStatus::Waiting;
                }
            }
            while state.cursor < state.order.len() {
                let vertex = state.order[state.cursor];
                state.cursor += 1;
                // Defensive cleanup: a concurrent add_task may have
                // re-inserted the vertex after the splash absorbed it.
                self.lock_shard_of(vertex).remove(vertex);
                if self.active.clear(vertex as usize) {
                    let function = *self
                        .update_fn
                        .get()
                        .expect("active vertex implies a bound update function");
                    let task = Task::new(vertex, function);
                    self.monitor.task_scheduled(task, 1.0);
                    return SchedulerStatus::NewTask(task);
                }
            }
            // Splash depleted without an emittable vertex; grow another.
        }
    }
}

//! Parallel splash scheduler for iterative graph computations.
//!
//! Priority-driven scheduling in the residual-splash family: high-priority
//! *root* vertices expand into bounded breadth-first trees, flattened into
//! reverse-forward update sequences ("splashes") and consumed by worker
//! threads, while running updates push new priorities back in through
//! per-worker callbacks.
//!
//! The crate is the scheduling engine only. Collaborators stay outside:
//! - the **graph** is a read-only [`Graph`] implementation,
//! - the **engine** owns the worker threads and loops on
//!   [`SplashScheduler::get_next_task`] until it reports completion,
//! - the **update function** is an opaque handle stamped onto tasks,
//! - **callbacks** ([`DirectCallback`]) let running updates reprioritise,
//! - a **monitor** ([`Monitor`]) may observe task ingress/egress.
//!
//! Typical wiring:
//!
//! ```
//! use std::sync::Arc;
//! use splash_rs::{AdjacencyGraph, SchedulerConfig, SchedulerStatus, SplashScheduler, VertexId};
//!
//! fn update(_vertex: VertexId) { /* one residual update */ }
//!
//! let mut graph = AdjacencyGraph::new(3);
//! graph.add_edge(1, 0);
//! graph.add_edge(2, 1);
//!
//! let scheduler = Arc::new(SplashScheduler::new(
//!     Arc::new(graph),
//!     SchedulerConfig::new(1),
//! ));
//! scheduler.add_task_to_all(update as fn(VertexId), 1.0);
//! scheduler.start();
//!
//! let mut updates = 0;
//! loop {
//!     match scheduler.get_next_task(0) {
//!         SchedulerStatus::NewTask(task) => {
//!             (task.function)(task.vertex);
//!             updates += 1;
//!         }
//!         SchedulerStatus::Complete => break,
//!         SchedulerStatus::Waiting => continue,
//!     }
//! }
//! assert_eq!(updates, 3);
//! ```

pub mod graph;
pub mod scheduler;

pub use graph::{AdjacencyGraph, EdgeId, Graph, VertexId};
pub use scheduler::{
    DirectCallback, Monitor, NoopMonitor, SchedulerConfig, SchedulerOption, SchedulerStatus,
    SharedTermination, SplashScheduler, Task, UpdateFunction, DEFAULT_SPLASH_SIZE,
};

//! Read-only graph seam consumed by the scheduler.
//!
//! The scheduler never owns topology. It needs exactly four capabilities:
//! vertex count, per-vertex in-edges and out-edges, and edge → source
//! resolution (to walk in-neighbourhoods while growing a splash). Engines
//! bring whatever representation they like and implement [`Graph`];
//! [`AdjacencyGraph`] is the in-crate reference implementation used by the
//! test suites and benches.

/// Opaque vertex identifier in `[0, num_vertices)`.
///
/// Stable for the scheduler's lifetime; also used to index the active set
/// and the vertex→shard map, so it must stay dense.
pub type VertexId = u32;

/// Opaque edge identifier in `[0, num_edges)`.
pub type EdgeId = u32;

/// Read-only topology provider.
///
/// Implementations must be cheap to query: `in_edge_ids`/`out_edge_ids` are
/// called once per vertex touched by splash growth, and `source` once per
/// in-edge. Borrowed slices keep that path allocation-free.
///
/// `Send + Sync` is required because the scheduler shares one graph
/// reference across all worker threads.
pub trait Graph: Send + Sync {
    /// Number of vertices; all vertex ids are below this.
    fn num_vertices(&self) -> usize;

    /// Edge ids of edges pointing *into* `vertex`.
    fn in_edge_ids(&self, vertex: VertexId) -> &[EdgeId];

    /// Edge ids of edges pointing *out of* `vertex`.
    fn out_edge_ids(&self, vertex: VertexId) -> &[EdgeId];

    /// Source vertex of `edge`.
    fn source(&self, edge: EdgeId) -> VertexId;
}

/// Compact adjacency-list graph.
///
/// Stores each edge once plus per-vertex in/out edge-id lists. Construction
/// is append-only; the scheduler treats the finished graph as immutable.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyGraph {
    edges: Vec<(VertexId, VertexId)>,
    in_edges: Vec<Vec<EdgeId>>,
    out_edges: Vec<Vec<EdgeId>>,
}

impl AdjacencyGraph {
    /// Creates a graph with `num_vertices` vertices and no edges.
    pub fn new(num_vertices: usize) -> Self {
        Self {
            edges: Vec::new(),
            in_edges: vec![Vec::new(); num_vertices],
            out_edges: vec![Vec::new(); num_vertices],
        }
    }

    /// Adds a directed edge `source → target` and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint is out of range.
    pub fn add_edge(&mut self, source: VertexId, target: VertexId) -> EdgeId {
        assert!(
            (source as usize) < self.in_edges.len(),
            "edge source {source} out of range"
        );
        assert!(
            (target as usize) < self.in_edges.len(),
            "edge target {target} out of range"
        );
        assert!(self.edges.len() < EdgeId::MAX as usize);
        let id = self.edges.len() as EdgeId;
        self.edges.push((source, target));
        self.out_edges[source as usize].push(id);
        self.in_edges[target as usize].push(id);
        id
    }

    /// Number of edges added so far.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Target vertex of `edge`.
    pub fn target(&self, edge: EdgeId) -> VertexId {
        self.edges[edge as usize].1
    }
}

impl Graph for AdjacencyGraph {
    fn num_vertices(&self) -> usize {
        self.in_edges.len()
    }

    fn in_edge_ids(&self, vertex: VertexId) -> &[EdgeId] {
        &self.in_edges[vertex as usize]
    }

    fn out_edge_ids(&self, vertex: VertexId) -> &[EdgeId] {
        &self.out_edges[vertex as usize]
    }

    fn source(&self, edge: EdgeId) -> VertexId {
        self.edges[edge as usize].0
    }
}

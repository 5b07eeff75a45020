use indexmap::IndexMap;
use thiserror::Error;

/// Errors raised by graph lookups
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// No node is registered under the given id
    #[error("node {0:?} is not found")]
    NodeNotFound(String),
}

/// A positioned vertex
///
/// Coordinates default to (0, 0) and are only ever changed by a layout
/// engine. They stay integral in practice (engines truncate their steps)
/// but are kept as `f64` so the layout arithmetic runs in floating point.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl Node {
    fn new(id: String) -> Self {
        Self { id, x: 0.0, y: 0.0 }
    }
}

/// Identifier of an edge, generated by its owning [`Graph`]
///
/// A plain monotonic counter so tests can assert exact ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u64);

/// A directed connection between two node ids
///
/// Edges reference their endpoints by id only; resolving an endpoint goes
/// through the owning [`Graph`]. Multiple edges with the same endpoints are
/// allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: String,
    pub target: String,
}

/// Arena owner of all nodes and edges for one layout run
///
/// Both maps iterate in insertion order, which keeps tie-breaks in the
/// layout engines deterministic within a run.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: IndexMap<String, Node>,
    edges: IndexMap<EdgeId, Edge>,
    next_edge_id: u64,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a node
    ///
    /// Re-adding an id that is already present replaces the stored node
    /// (coordinates reset to (0, 0)); the entry keeps its original position
    /// in iteration order.
    pub fn add_node(&mut self, id: impl Into<String>) -> &mut Node {
        let id = id.into();
        self.nodes.insert(id.clone(), Node::new(id.clone()));
        &mut self.nodes[&id]
    }

    /// Look up a node by id
    pub fn get_node(&self, id: &str) -> Result<&Node, GraphError> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    /// Look up a node by id for mutation
    pub fn get_node_mut(&mut self, id: &str) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    /// Number of registered nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate nodes in insertion order, mutably
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Create a new edge from `source` to `target`
    ///
    /// Always creates a fresh edge, never deduplicates. Endpoints are not
    /// validated here; a dangling id surfaces as [`GraphError::NodeNotFound`]
    /// once a consumer resolves it.
    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) -> &Edge {
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        let edge = Edge {
            id,
            source: source.into(),
            target: target.into(),
        };
        self.edges.insert(id, edge);
        &self.edges[&id]
    }

    /// Iterate edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Edges whose target is the given node id
    ///
    /// Linear scan over all edges, O(E) per call. Fine for the small graphs
    /// this crate is meant for.
    pub fn incoming_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.values().filter(move |edge| edge.target == id)
    }

    /// Edges whose source is the given node id
    ///
    /// Linear scan over all edges, O(E) per call.
    pub fn outgoing_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.values().filter(move |edge| edge.source == id)
    }

    /// Whether some edge runs from `source` to `target`
    ///
    /// Strictly directional: an edge in the opposite direction does not
    /// count.
    pub fn connected(&self, source: &str, target: &str) -> bool {
        self.edges
            .values()
            .any(|edge| edge.source == source && edge.target == target)
    }
}

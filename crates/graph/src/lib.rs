//! Directed multigraph model for diagram layout
//!
//! This crate owns the data that layout engines operate on: a [`Graph`]
//! arena holding [`Node`]s and [`Edge`]s, plus the [`Size`] of the canvas
//! a layout targets. Nodes carry mutable coordinates; everything else is
//! built once before layout and never deleted.
//!
//! # Example
//!
//! ```
//! use erd_graph::Graph;
//!
//! let mut graph = Graph::new();
//! graph.add_node("users");
//! graph.add_node("orders");
//! graph.add_edge("orders", "users");
//!
//! assert!(graph.connected("orders", "users"));
//! assert!(!graph.connected("users", "orders"));
//! ```

mod graph;
mod size;

pub use graph::{Edge, EdgeId, Graph, GraphError, Node};
pub use size::Size;

//! Layout engines for entity-relationship diagrams
//!
//! Two interchangeable engines position the nodes of an [`erd_graph::Graph`]
//! through the [`LayoutEngine`] trait:
//!
//! - [`KamadaKawaiLayout`]: force-directed spring-energy minimization for
//!   arbitrary graphs (randomized; seedable for reproducible runs)
//! - [`OrthogonalLayout`]: deterministic level compaction for graphs whose
//!   nodes already carry a level in their y coordinate
//!
//! A caller builds the graph, picks one engine, runs it once, and then reads
//! the final coordinates off the nodes together with the returned canvas
//! [`Size`].
//!
//! # Example
//!
//! ```
//! use erd_layout::{Graph, KamadaKawaiLayout, LayoutEngine};
//!
//! let mut graph = Graph::new();
//! graph.add_node("users");
//! graph.add_node("orders");
//! graph.add_edge("orders", "users");
//!
//! let mut engine = KamadaKawaiLayout::seeded(7);
//! let size = engine.layout(&mut graph)?;
//!
//! let users = graph.get_node("users")?;
//! assert!(users.x.is_finite() && users.y.is_finite());
//! assert_eq!((size.width, size.height), (2172, 2172));
//! # Ok::<(), erd_layout::LayoutError>(())
//! ```

mod engine;
mod kamada_kawai;
mod orthogonal;

pub use engine::{LayoutEngine, LayoutError};
pub use kamada_kawai::KamadaKawaiLayout;
pub use orthogonal::OrthogonalLayout;

// Re-export the graph model so callers only need one dependency
pub use erd_graph::{Edge, EdgeId, Graph, GraphError, Node, Size};

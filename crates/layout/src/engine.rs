use erd_graph::{Graph, GraphError, Size};
use thiserror::Error;

/// Errors raised while computing a layout
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// An edge endpoint does not resolve to a node in the graph
    #[error("edge endpoint cannot be resolved: {0}")]
    DanglingEdge(#[from] GraphError),
}

/// A layout engine that positions the nodes of a graph
///
/// The single operation mutates every node's coordinates in place and
/// returns the canvas extent the coordinates are meant to fit within.
/// Engines may be randomized ([`KamadaKawaiLayout`]) or deterministic
/// ([`OrthogonalLayout`]); callers must not assume reproducibility unless
/// the engine documents it.
///
/// The trait is object-safe, so the engine can be selected at runtime.
///
/// [`KamadaKawaiLayout`]: crate::KamadaKawaiLayout
/// [`OrthogonalLayout`]: crate::OrthogonalLayout
pub trait LayoutEngine {
    /// Compute and apply node positions for the given graph
    ///
    /// # Errors
    /// Fails when an edge references a node id that is not in the graph.
    fn layout(&mut self, graph: &mut Graph) -> Result<Size, LayoutError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KamadaKawaiLayout, OrthogonalLayout};
    use test_log::test;

    #[test]
    fn engines_are_interchangeable_behind_the_trait() {
        let mut engines: Vec<Box<dyn LayoutEngine>> = vec![
            Box::new(KamadaKawaiLayout::seeded(11)),
            Box::new(OrthogonalLayout::new()),
        ];
        for engine in engines.iter_mut() {
            let mut graph = Graph::new();
            graph.add_node("a");
            graph.add_node("b");
            graph.add_edge("a", "b");

            let size = engine.layout(&mut graph).unwrap();

            assert!(size.width > 0 && size.height > 0);
            for node in graph.nodes() {
                assert!(node.x.is_finite() && node.y.is_finite());
            }
        }
    }
}

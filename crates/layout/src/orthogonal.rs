use erd_graph::{Graph, Size};
use tracing::debug;

use crate::{LayoutEngine, LayoutError};

/// Compact orthogonal layout over pre-assigned levels
///
/// Treats each node's incoming y coordinate as a discrete level: nodes are
/// sorted by level, spread horizontally, compacted within each level, and
/// finally pushed apart vertically along their edges. No level assignment
/// of its own is performed. Fully deterministic.
#[derive(Debug, Clone)]
pub struct OrthogonalLayout {
    /// Horizontal distance between neighboring nodes
    pub node_spacing: f64,
    /// Vertical distance between adjacent levels
    pub level_spacing: f64,
}

impl Default for OrthogonalLayout {
    fn default() -> Self {
        Self {
            node_spacing: 400.0,
            level_spacing: 500.0,
        }
    }
}

impl OrthogonalLayout {
    /// Create an engine with the default spacing
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayoutEngine for OrthogonalLayout {
    fn layout(&mut self, graph: &mut Graph) -> Result<Size, LayoutError> {
        // Sort ids by level; the stable sort keeps insertion order within a
        // level.
        let mut order: Vec<(String, f64)> =
            graph.nodes().map(|node| (node.id.clone(), node.y)).collect();
        order.sort_by(|a, b| a.1.total_cmp(&b.1));

        // Provisional x positions, one spacing apart in sorted order
        let mut xs: Vec<f64> = (0..order.len())
            .map(|i| i as f64 * self.node_spacing)
            .collect();

        // Compact each level around its left edge. A level with a single
        // node keeps its provisional x; the spread formula is undefined for
        // it (count - 1 would be zero).
        let mut start = 0;
        while start < order.len() {
            let level = order[start].1;
            let mut end = start + 1;
            while end < order.len() && order[end].1 == level {
                end += 1;
            }
            let count = end - start;
            if count > 1 {
                let min_x = xs[start];
                let level_width = xs[end - 1] - min_x;
                let extra_space = (level_width - (count - 1) as f64 * self.node_spacing).max(0.0)
                    / (count - 1) as f64;
                for (k, x) in xs[start..end].iter_mut().enumerate() {
                    *x = min_x + k as f64 * (self.node_spacing + extra_space);
                }
            }
            start = end;
        }

        for ((id, _), &x) in order.iter().zip(xs.iter()) {
            graph.get_node_mut(id)?.x = x;
        }

        // Vertical adjustment along edges: incoming edges push a node below
        // its sources, outgoing edges then pull it above its targets. The
        // outgoing pass may override the incoming one, and endpoint levels
        // are read live, so earlier adjustments in this pass are visible.
        for (id, _) in &order {
            let sources: Vec<String> = graph.incoming_edges(id).map(|e| e.source.clone()).collect();
            let targets: Vec<String> = graph.outgoing_edges(id).map(|e| e.target.clone()).collect();

            if !sources.is_empty() {
                let mut max_y = f64::NEG_INFINITY;
                for source in &sources {
                    max_y = max_y.max(graph.get_node(source)?.y);
                }
                let node = graph.get_node_mut(id)?;
                node.y = node.y.max(max_y + self.level_spacing);
            }
            if !targets.is_empty() {
                let mut min_y = f64::INFINITY;
                for target in &targets {
                    min_y = min_y.min(graph.get_node(target)?.y);
                }
                let node = graph.get_node_mut(id)?;
                node.y = node.y.min(min_y - self.level_spacing);
            }
        }

        debug!(nodes = order.len(), "orthogonal layout done");
        // Fixed canvas, not derived from the actual node extents
        Ok(Size::new(1000, 1000))
    }
}

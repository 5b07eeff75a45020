use erd_graph::{Graph, Size};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::{LayoutEngine, LayoutError};

/// Floor applied to pairwise Euclidean distances.
///
/// The gradient and Hessian terms divide by the distance, so two nodes
/// landing on the same spot would turn the whole layout into NaNs. This is
/// a robustness addition over the classic formulation, which leaves the
/// case unguarded; for separated nodes it changes nothing.
const MIN_SEPARATION: f64 = 1e-6;

/// Working canvas side grows with the square root of the node count.
const SIDE_PER_NODE: f64 = 900.0;

/// Padding added to the reported canvas after layout.
const PADDING: i64 = 900;

/// Kamada-Kawai style force-directed layout
///
/// Minimizes a spring-energy function over all node pairs: each pair is
/// pulled toward an ideal separation derived from an approximated graph
/// distance (1 when joined by an edge in either direction, a fixed
/// fallback otherwise — deliberately not a shortest-path search).
///
/// Randomized: start positions come from the owned generator. Construct
/// with [`seeded`](Self::seeded) for reproducible runs, or inject any
/// [`Rng`] with [`with_rng`](Self::with_rng).
#[derive(Debug, Clone)]
pub struct KamadaKawaiLayout<R = StdRng> {
    /// Gradient magnitude below which a node counts as locally converged
    pub epsilon: f64,
    /// Outer iterations, always run to completion
    pub max_iterations: usize,
    /// Cap on Newton steps when optimizing a single node
    pub local_iterations: usize,
    /// Assumed graph-theoretic diameter of the visible graph
    pub diameter: f64,
    /// Multiplier on the preferred edge length
    pub length_factor: f64,
    /// Fraction of the diameter used as the distance between disconnected nodes
    pub disconnected_multiplier: f64,
    /// Numerator of the per-pair stiffness
    pub spring_constant: f64,
    /// Translate the centroid to the canvas center every iteration
    pub adjust_for_gravity: bool,
    /// Near convergence, swap node pairs when that lowers the energy
    pub exchange_vertices: bool,
    rng: R,
}

impl KamadaKawaiLayout<StdRng> {
    /// Create an engine seeded from system entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create an engine with a fixed seed, for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for KamadaKawaiLayout<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> KamadaKawaiLayout<R> {
    /// Create an engine around a caller-supplied random generator
    pub fn with_rng(rng: R) -> Self {
        Self {
            epsilon: 0.2,
            max_iterations: 500,
            local_iterations: 100,
            diameter: 5.0,
            length_factor: 1.2,
            disconnected_multiplier: 0.7,
            spring_constant: 1.0,
            adjust_for_gravity: true,
            exchange_vertices: true,
            rng,
        }
    }

    /// Precompute per-pair spring parameters from the approximated graph
    /// distances
    fn init_springs(&self, graph: &Graph, side: f64) -> Springs {
        let disconnected_distance = self.diameter * self.disconnected_multiplier;
        let l0 = side / self.diameter * self.length_factor;

        let ids: Vec<&str> = graph.nodes().map(|node| node.id.as_str()).collect();
        let n = ids.len();
        let mut lengths = vec![0.0; n * n];
        let mut stiffnesses = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let distance = if graph.connected(ids[i], ids[j]) || graph.connected(ids[j], ids[i])
                {
                    1.0
                } else {
                    disconnected_distance
                };
                let length = l0 * distance;
                let stiffness = self.spring_constant / (distance * distance);
                for idx in [i * n + j, j * n + i] {
                    lengths[idx] = length;
                    stiffnesses[idx] = stiffness;
                }
            }
        }
        Springs {
            n,
            lengths,
            stiffnesses,
        }
    }

    /// One outer iteration: optimize the steepest node, recenter, and near
    /// convergence try a vertex exchange
    fn step(&self, pos: &mut [(f64, f64)], springs: &Springs, side: f64) {
        // Energy is translation invariant, so the value computed here is
        // still valid after the gravity adjustment below.
        let energy = total_energy(pos, springs);

        // The node with the steepest gradient gets optimized this round;
        // the first node wins ties.
        let mut selected = 0;
        let mut max_gradient = gradient_magnitude(0, pos, springs);
        for m in 1..pos.len() {
            let gradient = gradient_magnitude(m, pos, springs);
            if gradient > max_gradient {
                max_gradient = gradient;
                selected = m;
            }
        }
        trace!(selected, max_gradient, energy, "step");

        // Local optimization: truncated-integer Newton steps until the
        // node's gradient drops below epsilon
        for _ in 0..self.local_iterations {
            let Some((dx, dy)) = newton_step(selected, pos, springs) else {
                break;
            };
            pos[selected].0 += dx.trunc();
            pos[selected].1 += dy.trunc();
            if gradient_magnitude(selected, pos, springs) < self.epsilon {
                break;
            }
        }

        if self.adjust_for_gravity {
            adjust_for_gravity(pos, side);
        }

        // Escape local minima: once every node is close to converged, swap
        // the first pair whose exchange strictly lowers the energy. At most
        // one swap per iteration.
        if self.exchange_vertices && max_gradient < self.epsilon {
            'pairs: for i in 0..pos.len() {
                for j in (i + 1)..pos.len() {
                    if energy_if_exchanged(i, j, pos, springs) < energy {
                        pos.swap(i, j);
                        trace!(i, j, "exchanged vertices");
                        break 'pairs;
                    }
                }
            }
        }
    }
}

impl<R: Rng> LayoutEngine for KamadaKawaiLayout<R> {
    fn layout(&mut self, graph: &mut Graph) -> Result<Size, LayoutError> {
        let n = graph.node_count();
        let side = ((n as f64).sqrt() * SIDE_PER_NODE).floor() as i64;
        let reported = Size::new((side + PADDING) as u32, (side + PADDING) as u32);
        if n == 0 {
            return Ok(reported);
        }

        // Random integer start positions inside the working canvas
        let mut pos: Vec<(f64, f64)> = (0..n)
            .map(|_| {
                let x = self.rng.gen_range(10..side) as f64;
                let y = self.rng.gen_range(10..side) as f64;
                (x, y)
            })
            .collect();

        let springs = self.init_springs(graph, side as f64);
        debug!(nodes = n, side, "kamada-kawai layout start");

        for _ in 0..self.max_iterations {
            self.step(&mut pos, &springs, side as f64);
        }
        debug!(energy = total_energy(&pos, &springs), "kamada-kawai layout done");

        // Positions are left where the iterations put them, possibly outside
        // the nominal canvas; the reported size just adds fixed padding.
        for (node, &(x, y)) in graph.nodes_mut().zip(pos.iter()) {
            node.x = x;
            node.y = y;
        }
        Ok(reported)
    }
}

/// Per-pair spring parameters, flat n x n
struct Springs {
    n: usize,
    lengths: Vec<f64>,
    stiffnesses: Vec<f64>,
}

impl Springs {
    /// Ideal separation for the pair (i, j)
    fn ideal_length(&self, i: usize, j: usize) -> f64 {
        self.lengths[i * self.n + j]
    }

    /// Pull strength for the pair (i, j)
    fn stiffness(&self, i: usize, j: usize) -> f64 {
        self.stiffnesses[i * self.n + j]
    }
}

/// Coordinate deltas and floored Euclidean distance from `a` to `b`
fn delta(a: (f64, f64), b: (f64, f64)) -> (f64, f64, f64) {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    let d = (dx * dx + dy * dy).sqrt().max(MIN_SEPARATION);
    (dx, dy, d)
}

/// Spring energy of a single pair
fn pair_energy(a: (f64, f64), b: (f64, f64), length: f64, stiffness: f64) -> f64 {
    let (dx, dy, d) = delta(a, b);
    stiffness / 2.0 * (dx * dx + dy * dy + length * length - 2.0 * length * d)
}

/// Spring energy summed over all unordered pairs
fn total_energy(pos: &[(f64, f64)], springs: &Springs) -> f64 {
    let mut energy = 0.0;
    for i in 0..pos.len() {
        for j in (i + 1)..pos.len() {
            energy += pair_energy(
                pos[i],
                pos[j],
                springs.ideal_length(i, j),
                springs.stiffness(i, j),
            );
        }
    }
    energy
}

/// Magnitude of the energy gradient with respect to node `m`
fn gradient_magnitude(m: usize, pos: &[(f64, f64)], springs: &Springs) -> f64 {
    let mut gx = 0.0;
    let mut gy = 0.0;
    for i in 0..pos.len() {
        if i == m {
            continue;
        }
        let length = springs.ideal_length(m, i);
        let stiffness = springs.stiffness(m, i);
        let (dx, dy, d) = delta(pos[m], pos[i]);
        let common = stiffness * (1.0 - length / d);
        gx += common * dx;
        gy += common * dy;
    }
    (gx * gx + gy * gy).sqrt()
}

/// One 2D Newton step for node `m`, from its local gradient and Hessian
///
/// Returns `None` when the 2x2 system is singular or has gone non-finite,
/// which a lone node always hits (its gradient and Hessian are empty sums).
fn newton_step(m: usize, pos: &[(f64, f64)], springs: &Springs) -> Option<(f64, f64)> {
    let mut gx = 0.0;
    let mut gy = 0.0;
    let mut hxx = 0.0;
    let mut hxy = 0.0;
    let mut hyy = 0.0;
    for i in 0..pos.len() {
        if i == m {
            continue;
        }
        let length = springs.ideal_length(m, i);
        let stiffness = springs.stiffness(m, i);
        let (dx, dy, d) = delta(pos[m], pos[i]);
        let ddd = d * d * d;
        let common = stiffness * (1.0 - length / d);

        gx += common * dx;
        gy += common * dy;
        hxx += stiffness * (1.0 - length * dy * dy / ddd);
        hxy += stiffness * length * dx * dy / ddd;
        hyy += stiffness * (1.0 - length * dx * dx / ddd);
    }

    let denominator = hxx * hyy - hxy * hxy;
    let step_x = (hxy * gy - hyy * gx) / denominator;
    let step_y = (hxy * gx - hxx * gy) / denominator;
    (step_x.is_finite() && step_y.is_finite()).then_some((step_x, step_y))
}

/// Translate all nodes so their centroid sits at the canvas center
fn adjust_for_gravity(pos: &mut [(f64, f64)], side: f64) {
    let n = pos.len() as f64;
    let (sum_x, sum_y) = pos
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    let shift_x = (side / 2.0 - sum_x / n).trunc();
    let shift_y = (side / 2.0 - sum_y / n).trunc();
    for (x, y) in pos.iter_mut() {
        *x += shift_x;
        *y += shift_y;
    }
}

/// Total energy as if nodes `p` and `q` had their positions exchanged
fn energy_if_exchanged(p: usize, q: usize, pos: &[(f64, f64)], springs: &Springs) -> f64 {
    let swapped = |i: usize| {
        if i == p {
            q
        } else if i == q {
            p
        } else {
            i
        }
    };
    let mut energy = 0.0;
    for i in 0..pos.len() {
        for j in (i + 1)..pos.len() {
            energy += pair_energy(
                pos[swapped(i)],
                pos[swapped(j)],
                springs.ideal_length(i, j),
                springs.stiffness(i, j),
            );
        }
    }
    energy
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use test_log::test;

    #[test]
    fn empty_graph_reports_padding_only() {
        let mut graph = Graph::new();
        let size = KamadaKawaiLayout::seeded(0).layout(&mut graph).unwrap();
        assert_eq!(size, Size::new(900, 900));
    }

    #[test]
    fn initial_positions_land_inside_the_working_canvas() {
        // With the outer loop disabled the nodes stay at their random
        // integer start positions.
        let mut graph = Graph::new();
        for i in 0..4 {
            graph.add_node(format!("n{i}"));
        }
        let mut engine = KamadaKawaiLayout::seeded(7);
        engine.max_iterations = 0;

        let size = engine.layout(&mut graph).unwrap();

        let side = (4.0_f64.sqrt() * 900.0).floor();
        assert_eq!(size, Size::new(2700, 2700));
        for node in graph.nodes() {
            assert!(node.x >= 10.0 && node.x <= side - 1.0, "x = {}", node.x);
            assert!(node.y >= 10.0 && node.y <= side - 1.0, "y = {}", node.y);
            assert_eq!(node.x.fract(), 0.0);
            assert_eq!(node.y.fract(), 0.0);
        }
    }

    #[test]
    fn single_node_ends_at_the_canvas_center() {
        let mut graph = Graph::new();
        graph.add_node("only");

        let size = KamadaKawaiLayout::seeded(1).layout(&mut graph).unwrap();

        assert_eq!(size, Size::new(1800, 1800));
        let node = graph.get_node("only").unwrap();
        assert_eq!((node.x, node.y), (450.0, 450.0));
    }

    #[test]
    fn connected_pair_settles_near_the_ideal_length() {
        let mut graph = Graph::new();
        graph.add_node("a");
        graph.add_node("b");
        graph.add_edge("a", "b");

        KamadaKawaiLayout::seeded(42).layout(&mut graph).unwrap();

        let a = graph.get_node("a").unwrap();
        let b = graph.get_node("b").unwrap();
        let separation = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
        let side = (2.0_f64.sqrt() * 900.0).floor();
        let ideal = side / 5.0 * 1.2;
        assert!(
            (separation - ideal).abs() < 0.05 * ideal,
            "separation {separation} vs ideal {ideal}"
        );
    }

    #[test]
    fn edgeless_graph_stays_finite() {
        let mut graph = Graph::new();
        for i in 0..6 {
            graph.add_node(format!("n{i}"));
        }

        KamadaKawaiLayout::seeded(5).layout(&mut graph).unwrap();

        for node in graph.nodes() {
            assert!(node.x.is_finite() && node.y.is_finite());
        }
    }

    #[test]
    fn coincident_start_positions_stay_finite() {
        // StepRng yields a constant, so every node starts on the same spot;
        // the distance floor must keep the math finite.
        let mut graph = Graph::new();
        for id in ["a", "b", "c"] {
            graph.add_node(id);
        }
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");

        let mut engine = KamadaKawaiLayout::with_rng(StepRng::new(0, 0));
        engine.layout(&mut graph).unwrap();

        for node in graph.nodes() {
            assert!(node.x.is_finite() && node.y.is_finite());
        }
    }

    #[test]
    fn energy_is_enumeration_order_independent() {
        let mut graph = Graph::new();
        for id in ["a", "b", "c", "d"] {
            graph.add_node(id);
        }
        graph.add_edge("a", "b");
        graph.add_edge("c", "d");
        let engine = KamadaKawaiLayout::seeded(3);
        let springs = engine.init_springs(&graph, 1800.0);
        let pos = [(10.0, 20.0), (300.0, 40.0), (70.0, 500.0), (900.0, 900.0)];

        let forward = total_energy(&pos, &springs);
        let mut reversed = 0.0;
        for i in (0..pos.len()).rev() {
            for j in (0..i).rev() {
                reversed += pair_energy(
                    pos[j],
                    pos[i],
                    springs.ideal_length(j, i),
                    springs.stiffness(j, i),
                );
            }
        }

        assert!((forward - reversed).abs() <= 1e-9 * forward.abs().max(1.0));
    }

    #[test]
    fn disconnected_pairs_use_the_fallback_distance() {
        let mut graph = Graph::new();
        for id in ["a", "b", "c"] {
            graph.add_node(id);
        }
        // Edge direction must not matter for the distance approximation
        graph.add_edge("b", "a");
        let engine = KamadaKawaiLayout::seeded(0);

        let springs = engine.init_springs(&graph, 900.0);

        let l0 = 900.0 / 5.0 * 1.2;
        assert_eq!(springs.ideal_length(0, 1), l0);
        assert_eq!(springs.stiffness(0, 1), 1.0);
        assert_eq!(springs.ideal_length(0, 2), l0 * 3.5);
        assert_eq!(springs.stiffness(0, 2), 1.0 / (3.5 * 3.5));
        assert_eq!(springs.ideal_length(2, 0), springs.ideal_length(0, 2));
    }
}

//! Leiden algorithm for community detection.
//!
//! Two alternating phases over an [`AdjacencyIndex`]:
//!
//! 1. **Local moving**: in randomized node order, greedily move each node to
//!    the neighboring community with the best strictly-positive modularity
//!    gain. A full sweep is a pass; passes repeat until a pass makes no move
//!    or the pass cap is hit.
//!
//! 2. **Refinement**: within each community from phase 1, find connected
//!    components over intra-community edges. The largest component keeps the
//!    community id; every other component gets a fresh id. This is what
//!    guarantees internally connected output.
//!
//! The outer loop repeats while the last local-moving pass moved at least one
//! node, bounded by an iteration cap. Clustering never fails: a run that hits
//! the cap returns the assignment it has, and a graph with zero total edge
//! weight comes back as all singletons with modularity 0.

use std::collections::{HashMap, HashSet, VecDeque};

use rand::prelude::*;

use super::traits::CommunityDetection;
use crate::error::{Error, Result};
use crate::graph::AdjacencyIndex;
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

/// Gains below this are treated as zero, so "strictly positive" is robust
/// against float noise.
const GAIN_EPS: f64 = 1e-12;

/// Final community assignment for one clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Node index -> community id, renumbered to `0..K` in first-seen order.
    pub assignment: Vec<usize>,
    /// Modularity of the final assignment.
    pub modularity: f64,
}

impl Partition {
    /// Number of communities.
    pub fn community_count(&self) -> usize {
        self.assignment.iter().max().map_or(0, |&c| c + 1)
    }

    /// Member node indices grouped by community id.
    pub fn members_by_community(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.community_count()];
        for (node, &comm) in self.assignment.iter().enumerate() {
            members[comm].push(node);
        }
        members
    }
}

/// Leiden community detector.
///
/// Builder-style configuration; all parameters have sensible defaults.
#[derive(Debug, Clone)]
pub struct Leiden {
    /// Resolution parameter (gamma). Higher = smaller communities.
    resolution: f64,
    /// Outer iteration cap (local moving + refinement rounds).
    max_iterations: usize,
    /// Local-moving pass cap per iteration.
    max_passes: usize,
    /// Random seed; `None` draws the sweep order from OS entropy.
    seed: Option<u64>,
}

impl Leiden {
    /// Create a new Leiden detector with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_iterations: 100,
            max_passes: 10,
            seed: None,
        }
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the outer iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the local-moving pass cap per iteration.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Set random seed for reproducible sweep order.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Cluster an adjacency index.
    ///
    /// Never fails: degenerate inputs (no nodes, zero total edge weight)
    /// return singleton assignments with modularity 0.
    pub fn cluster(&self, index: &AdjacencyIndex) -> Partition {
        let n = index.len();
        if n == 0 {
            return Partition {
                assignment: Vec::new(),
                modularity: 0.0,
            };
        }
        if index.total_weight() == 0.0 {
            return Partition {
                assignment: (0..n).collect(),
                modularity: 0.0,
            };
        }

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut state = CommunityState::singletons(n, index.degrees());

        for _iteration in 0..self.max_iterations {
            let moved = self.local_moving(index, &mut state, &mut *rng);
            self.refinement(index, &mut state);
            if !moved {
                break;
            }
        }

        let assignment = renumber_first_seen(&state.assignment);
        let modularity = modularity(index, &assignment, self.resolution);
        Partition {
            assignment,
            modularity,
        }
    }

    /// Phase 1: local moving (greedy modularity ascent).
    ///
    /// Returns whether the last executed pass moved at least one node; the
    /// outer loop keys its termination off that.
    fn local_moving(
        &self,
        index: &AdjacencyIndex,
        state: &mut CommunityState,
        rng: &mut dyn RngCore,
    ) -> bool {
        let two_m = 2.0 * index.total_weight();
        let mut order: Vec<usize> = (0..index.len()).collect();
        let mut moved_last_pass = false;

        for _pass in 0..self.max_passes {
            order.shuffle(rng);
            let mut moves = 0usize;

            for &node in &order {
                let current = state.assignment[node];
                let ki = index.degree(node);

                // Edge weight from node into each neighboring community.
                let mut weight_to: HashMap<usize, f64> = HashMap::new();
                for &(neighbor, w) in index.neighbors(node) {
                    *weight_to.entry(state.assignment[neighbor]).or_insert(0.0) += w;
                }

                // Candidates sorted ascending, so on an exact tie the
                // smaller community id wins.
                let mut candidates: Vec<usize> = weight_to
                    .keys()
                    .copied()
                    .filter(|&comm| comm != current)
                    .collect();
                candidates.sort_unstable();

                let mut best_comm = current;
                let mut best_gain = 0.0;

                for comm in candidates {
                    let ki_in = weight_to[&comm];
                    let sigma_tot = state.comm_weight[comm];
                    let gain =
                        ki_in / two_m - self.resolution * sigma_tot * ki / (two_m * two_m);
                    if gain > best_gain + GAIN_EPS {
                        best_gain = gain;
                        best_comm = comm;
                    }
                }

                if best_comm != current {
                    state.move_node(node, current, best_comm, ki);
                    moves += 1;
                }
            }

            moved_last_pass = moves > 0;
            if moves == 0 {
                break;
            }
        }

        moved_last_pass
    }

    /// Phase 2: refinement.
    ///
    /// BFS over intra-community edges splits every community that is not
    /// internally connected. The largest component keeps the community id
    /// (first found on a size tie); each remaining component moves to a
    /// fresh id.
    fn refinement(&self, index: &AdjacencyIndex, state: &mut CommunityState) {
        let mut members: HashMap<usize, Vec<usize>> = HashMap::new();
        for (node, &comm) in state.assignment.iter().enumerate() {
            members.entry(comm).or_default().push(node);
        }

        let mut comms: Vec<usize> = members.keys().copied().collect();
        comms.sort_unstable();

        for comm in comms {
            let nodes = &members[&comm];
            if nodes.len() <= 1 {
                continue;
            }

            let components = intra_components(index, nodes);
            if components.len() <= 1 {
                continue;
            }

            let mut keep = 0;
            for (i, component) in components.iter().enumerate() {
                if component.len() > components[keep].len() {
                    keep = i;
                }
            }

            for (i, component) in components.iter().enumerate() {
                if i == keep {
                    continue;
                }
                let fresh = state.fresh_community();
                for &node in component {
                    let old = state.assignment[node];
                    state.move_node(node, old, fresh, index.degree(node));
                }
            }
        }
    }
}

impl Default for Leiden {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for Leiden {
    fn detect<N>(&self, graph: &UnGraph<N, f64>) -> Result<Partition> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let edges: Vec<(usize, usize, f64)> = graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
            .collect();

        let index = AdjacencyIndex::from_weighted_edges(n, &edges);
        Ok(self.cluster(&index))
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}

/// Community assignment with cached per-community weighted degree.
struct CommunityState {
    /// Community assignment for each node.
    assignment: Vec<usize>,
    /// Total weighted degree in each community (indexed by community id;
    /// emptied communities stay at 0 until renumbering).
    comm_weight: Vec<f64>,
}

impl CommunityState {
    fn singletons(n: usize, degrees: &[f64]) -> Self {
        Self {
            assignment: (0..n).collect(),
            comm_weight: degrees.to_vec(),
        }
    }

    fn move_node(&mut self, node: usize, from: usize, to: usize, degree: f64) {
        self.assignment[node] = to;
        self.comm_weight[from] -= degree;
        self.comm_weight[to] += degree;
    }

    fn fresh_community(&mut self) -> usize {
        self.comm_weight.push(0.0);
        self.comm_weight.len() - 1
    }
}

/// Connected components of the subgraph induced by `nodes`, using only edges
/// whose both endpoints are in `nodes`.
fn intra_components(index: &AdjacencyIndex, nodes: &[usize]) -> Vec<Vec<usize>> {
    let node_set: HashSet<usize> = nodes.iter().copied().collect();
    let mut visited = HashSet::new();
    let mut components = Vec::new();

    for &start in nodes {
        if visited.contains(&start) {
            continue;
        }

        let mut component = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            component.push(node);

            for &(neighbor, _) in index.neighbors(node) {
                if node_set.contains(&neighbor) && !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        components.push(component);
    }

    components
}

/// Renumber community ids to `0..K` in first-seen node order.
fn renumber_first_seen(assignment: &[usize]) -> Vec<usize> {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    assignment
        .iter()
        .map(|&comm| {
            let next = mapping.len();
            *mapping.entry(comm).or_insert(next)
        })
        .collect()
}

/// Modularity of an assignment over an adjacency index.
///
/// ```text
/// Q = (1/2m) × Σ_{i,j same community} (w_ij - γ·k_i·k_j/2m)
/// ```
///
/// summed over actual adjacency entries (both directions of every edge), not
/// all node pairs. Returns 0 for a graph with zero total edge weight.
pub fn modularity(index: &AdjacencyIndex, assignment: &[usize], resolution: f64) -> f64 {
    let m = index.total_weight();
    if m == 0.0 {
        return 0.0;
    }
    let two_m = 2.0 * m;

    let mut q = 0.0;
    for i in 0..index.len() {
        for &(j, w) in index.neighbors(i) {
            if assignment[i] == assignment[j] {
                q += w - resolution * index.degree(i) * index.degree(j) / two_m;
            }
        }
    }

    q / two_m
}

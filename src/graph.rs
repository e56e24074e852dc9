//! Entity graph inputs and the dense adjacency index.
//!
//! A detection run starts from a node/edge list produced by an upstream
//! extraction pipeline. Node and edge ids are arbitrary strings; everything
//! downstream (local moving, refinement, centrality) wants dense integer
//! indices and neighbor lists instead. [`AdjacencyIndex`] is that bridge:
//! a bijection between external ids and `0..n`, per-index `(neighbor, weight)`
//! lists with both directions inserted, and weighted degrees.
//!
//! Input hygiene is handled here, not downstream:
//! - Edges referencing unknown node ids are dropped and counted, never an error.
//! - Self-loops contribute to weighted degree only; they never appear in a
//!   neighbor list, so the total edge weight `m` excludes them.
//! - `m == 0` (no usable edges) is a valid degenerate graph. Clustering on it
//!   returns every node as a singleton with modularity 0.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Closed set of entity types produced by the extraction pipeline.
///
/// `Other` carries tags this crate does not know about; `Unknown` is the
/// default for nodes extracted without a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Person,
    Organization,
    Location,
    Concept,
    Technology,
    Event,
    Unknown,
    Other(String),
}

impl EntityKind {
    /// Lower-case label used in feature histograms.
    pub fn label(&self) -> &str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Organization => "organization",
            EntityKind::Location => "location",
            EntityKind::Concept => "concept",
            EntityKind::Technology => "technology",
            EntityKind::Event => "event",
            EntityKind::Unknown => "unknown",
            EntityKind::Other(tag) => tag,
        }
    }
}

impl Default for EntityKind {
    fn default() -> Self {
        EntityKind::Unknown
    }
}

/// One entity node. Produced upstream; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable external id.
    pub id: String,
    /// Display label (entity name).
    pub label: String,
    /// Entity type tag.
    #[serde(default)]
    pub kind: EntityKind,
    /// How many times the entity was mentioned in the corpus.
    #[serde(default)]
    pub mention_count: usize,
}

/// Undirected weighted relationship between two nodes. Read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Id of one endpoint.
    pub source: String,
    /// Id of the other endpoint.
    pub target: String,
    /// Relationship type tag.
    #[serde(default)]
    pub relation: String,
    /// Non-negative edge weight.
    pub weight: f64,
}

/// The raw graph for one collection, as handed over by a graph source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl EntityGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Dense integer-indexed neighbor-list representation, built once per
/// detection run and discarded after.
#[derive(Debug, Clone)]
pub struct AdjacencyIndex {
    /// Dense index -> external node id.
    ids: Vec<String>,
    /// External node id -> dense index.
    index_of: HashMap<String, usize>,
    /// Adjacency: node -> [(neighbor, weight)], both directions present.
    adj: Vec<Vec<(usize, f64)>>,
    /// Weighted degree of each node (self-loops counted twice).
    degree: Vec<f64>,
    /// Total edge weight m, excluding self-loops.
    total_weight: f64,
    /// Edges dropped for referencing an unknown node id.
    dropped_edges: usize,
}

impl AdjacencyIndex {
    /// Build the index from a raw entity graph.
    ///
    /// Node indices follow node-list order. A duplicate node id keeps the
    /// first occurrence. Edges with an unknown endpoint are dropped and
    /// counted in [`AdjacencyIndex::dropped_edges`].
    pub fn build(graph: &EntityGraph) -> Self {
        let mut ids = Vec::with_capacity(graph.nodes.len());
        let mut index_of = HashMap::with_capacity(graph.nodes.len());

        for node in &graph.nodes {
            if index_of.contains_key(&node.id) {
                continue;
            }
            index_of.insert(node.id.clone(), ids.len());
            ids.push(node.id.clone());
        }

        let n = ids.len();
        let mut index = Self {
            ids,
            index_of,
            adj: vec![Vec::new(); n],
            degree: vec![0.0; n],
            total_weight: 0.0,
            dropped_edges: 0,
        };

        for edge in &graph.edges {
            let (i, j) = match (
                index.index_of.get(&edge.source),
                index.index_of.get(&edge.target),
            ) {
                (Some(&i), Some(&j)) => (i, j),
                _ => {
                    index.dropped_edges += 1;
                    continue;
                }
            };
            index.insert_edge(i, j, edge.weight);
        }

        index
    }

    /// Build from an already-indexed weighted edge list over `n` nodes.
    ///
    /// Used by the petgraph trait surface and by tests; external ids are the
    /// index rendered as a string.
    pub fn from_weighted_edges(n: usize, edges: &[(usize, usize, f64)]) -> Self {
        let ids: Vec<String> = (0..n).map(|i| i.to_string()).collect();
        let index_of = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut index = Self {
            ids,
            index_of,
            adj: vec![Vec::new(); n],
            degree: vec![0.0; n],
            total_weight: 0.0,
            dropped_edges: 0,
        };

        for &(i, j, w) in edges {
            if i >= n || j >= n {
                index.dropped_edges += 1;
                continue;
            }
            index.insert_edge(i, j, w);
        }

        index
    }

    fn insert_edge(&mut self, i: usize, j: usize, w: f64) {
        if i == j {
            // Self-loop: degree only, no adjacency entry, not part of m.
            self.degree[i] += 2.0 * w;
            return;
        }
        self.adj[i].push((j, w));
        self.adj[j].push((i, w));
        self.degree[i] += w;
        self.degree[j] += w;
        self.total_weight += w;
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Neighbor list of a node: `(neighbor_index, weight)` pairs.
    pub fn neighbors(&self, node: usize) -> &[(usize, f64)] {
        &self.adj[node]
    }

    /// Weighted degree of a node.
    pub fn degree(&self, node: usize) -> f64 {
        self.degree[node]
    }

    /// Weighted degrees of all nodes, indexed densely.
    pub fn degrees(&self) -> &[f64] {
        &self.degree
    }

    /// Total edge weight m (each undirected edge counted once, self-loops
    /// excluded).
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// External id for a dense index.
    pub fn node_id(&self, node: usize) -> &str {
        &self.ids[node]
    }

    /// Dense index for an external id, if the node exists.
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index_of.get(id).copied()
    }

    /// How many input edges referenced an unknown node id.
    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            label: id.to_string(),
            kind: EntityKind::Unknown,
            mention_count: 1,
        }
    }

    fn edge(source: &str, target: &str, weight: f64) -> GraphEdge {
        GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            relation: "related".to_string(),
            weight,
        }
    }

    #[test]
    fn test_build_basic() {
        let graph = EntityGraph {
            nodes: vec![node("a"), node("b"), node("c")],
            edges: vec![edge("a", "b", 2.0), edge("b", "c", 3.0)],
        };

        let index = AdjacencyIndex::build(&graph);
        assert_eq!(index.len(), 3);
        assert_eq!(index.total_weight(), 5.0);
        assert_eq!(index.dropped_edges(), 0);

        // Both directions present
        assert_eq!(index.neighbors(0), &[(1, 2.0)]);
        assert_eq!(index.neighbors(1), &[(0, 2.0), (2, 3.0)]);

        // Weighted degrees
        assert_eq!(index.degree(0), 2.0);
        assert_eq!(index.degree(1), 5.0);
        assert_eq!(index.degree(2), 3.0);
    }

    #[test]
    fn test_id_bijection_follows_node_order() {
        let graph = EntityGraph {
            nodes: vec![node("x"), node("y")],
            edges: vec![],
        };
        let index = AdjacencyIndex::build(&graph);
        assert_eq!(index.node_id(0), "x");
        assert_eq!(index.node_index("y"), Some(1));
        assert_eq!(index.node_index("z"), None);
    }

    #[test]
    fn test_unknown_endpoint_dropped_not_errored() {
        let graph = EntityGraph {
            nodes: vec![node("a"), node("b")],
            edges: vec![
                edge("a", "b", 1.0),
                edge("a", "ghost", 1.0),
                edge("ghost", "b", 1.0),
            ],
        };

        let index = AdjacencyIndex::build(&graph);
        assert_eq!(index.dropped_edges(), 2);
        assert_eq!(index.total_weight(), 1.0);
    }

    #[test]
    fn test_self_loop_degree_only() {
        let graph = EntityGraph {
            nodes: vec![node("a"), node("b")],
            edges: vec![edge("a", "a", 2.0), edge("a", "b", 1.0)],
        };

        let index = AdjacencyIndex::build(&graph);
        // Self-loop counted twice in degree, absent from adjacency and m.
        assert_eq!(index.degree(0), 5.0);
        assert_eq!(index.neighbors(0), &[(1, 1.0)]);
        assert_eq!(index.total_weight(), 1.0);
    }

    #[test]
    fn test_zero_weight_graph_is_valid() {
        let graph = EntityGraph {
            nodes: vec![node("a"), node("b")],
            edges: vec![],
        };
        let index = AdjacencyIndex::build(&graph);
        assert_eq!(index.total_weight(), 0.0);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_duplicate_node_keeps_first() {
        let mut dup = node("a");
        dup.label = "second".to_string();
        let graph = EntityGraph {
            nodes: vec![node("a"), dup, node("b")],
            edges: vec![edge("a", "b", 1.0)],
        };
        let index = AdjacencyIndex::build(&graph);
        assert_eq!(index.len(), 2);
        assert_eq!(index.node_index("a"), Some(0));
    }

    #[test]
    fn test_entity_kind_labels() {
        assert_eq!(EntityKind::Unknown.label(), "unknown");
        assert_eq!(EntityKind::Other("protein".to_string()).label(), "protein");
        assert_eq!(EntityKind::default(), EntityKind::Unknown);
    }
}

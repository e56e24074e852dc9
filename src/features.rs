//! Per-community centrality and descriptive features.
//!
//! Everything here is pure: functions take the adjacency index, the raw node
//! list, and a community's member indices, and return plain values. The
//! feature bundle is handed to callers as structured data; serializing it for
//! a store or prompt is a collaborator concern.
//!
//! Centrality is community-local degree: the fraction of *other* members a
//! node directly connects to, so a member adjacent to every other member
//! scores exactly 1.0. Communities are connected by construction (Leiden
//! refinement), so size-1 denominators only arise for degenerate inputs and
//! score 0.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::{AdjacencyIndex, GraphNode};

/// How many key terms a feature bundle keeps.
const MAX_KEY_TERMS: usize = 10;
/// How many representative names a feature bundle keeps.
const MAX_REPRESENTATIVES: usize = 5;

/// Derived summary of one community, for downstream retrieval and naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityFeatures {
    /// Member counts by entity-kind label; nodes without a kind count as
    /// "unknown".
    pub kind_histogram: BTreeMap<String, usize>,
    /// Top frequent name tokens across the community, most frequent first.
    pub key_terms: Vec<String>,
    /// Up to five representative member names, longest first.
    pub representatives: Vec<String>,
    /// Sum of intra-community edge weights.
    pub internal_edge_weight: f64,
    /// Intra-community edge count over max possible edges, clamped to [0, 1].
    pub internal_similarity: f64,
}

/// Community-local degree centrality for each member, aligned with `members`.
///
/// `centrality(i) = distinct intra-community neighbors of i / (size - 1)`,
/// or 0 for a size-1 community.
pub fn member_centralities(index: &AdjacencyIndex, members: &[usize]) -> Vec<f64> {
    if members.len() <= 1 {
        return vec![0.0; members.len()];
    }

    let member_set: HashSet<usize> = members.iter().copied().collect();
    let denom = (members.len() - 1) as f64;

    members
        .iter()
        .map(|&node| {
            let internal: HashSet<usize> = index
                .neighbors(node)
                .iter()
                .map(|&(neighbor, _)| neighbor)
                .filter(|neighbor| member_set.contains(neighbor))
                .collect();
            internal.len() as f64 / denom
        })
        .collect()
}

/// Extract the descriptive feature bundle for one community.
///
/// `nodes` is the raw node list the adjacency index was built from; members
/// whose id no longer resolves to a node are skipped in name-derived fields.
pub fn extract_features(
    index: &AdjacencyIndex,
    nodes: &[GraphNode],
    members: &[usize],
) -> CommunityFeatures {
    let by_id: HashMap<&str, &GraphNode> =
        nodes.iter().map(|node| (node.id.as_str(), node)).collect();
    let member_nodes: Vec<&GraphNode> = members
        .iter()
        .filter_map(|&i| by_id.get(index.node_id(i)).copied())
        .collect();

    let mut kind_histogram: BTreeMap<String, usize> = BTreeMap::new();
    for node in &member_nodes {
        *kind_histogram.entry(node.kind.label().to_string()).or_insert(0) += 1;
    }

    let (internal_edge_weight, internal_edges) = internal_edge_stats(index, members);
    CommunityFeatures {
        kind_histogram,
        key_terms: key_terms(&member_nodes),
        representatives: representatives(&member_nodes),
        internal_edge_weight,
        internal_similarity: internal_similarity(members.len(), internal_edges),
    }
}

/// Sum of intra-community edge weights and the intra-community edge count.
fn internal_edge_stats(index: &AdjacencyIndex, members: &[usize]) -> (f64, usize) {
    let member_set: HashSet<usize> = members.iter().copied().collect();
    let mut weight = 0.0;
    let mut count = 0;

    for &node in members {
        for &(neighbor, w) in index.neighbors(node) {
            // Each undirected edge appears in both lists; count it once.
            if neighbor > node && member_set.contains(&neighbor) {
                weight += w;
                count += 1;
            }
        }
    }

    (weight, count)
}

/// Edge density of the induced subgraph: edges / (n·(n-1)/2), clamped.
fn internal_similarity(n: usize, internal_edges: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let max_possible = (n * (n - 1) / 2) as f64;
    (internal_edges as f64 / max_possible).clamp(0.0, 1.0)
}

/// Top-10 name tokens by frequency: names split on whitespace, hyphen, and
/// underscore, lower-cased, tokens of two characters or fewer dropped.
/// Frequency ties break alphabetically.
fn key_terms(members: &[&GraphNode]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for node in members {
        for token in node
            .label
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        {
            let token = token.to_lowercase();
            if token.chars().count() > 2 {
                *counts.entry(token).or_insert(0) += 1;
            }
        }
    }

    let mut terms: Vec<(String, usize)> = counts.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    terms.truncate(MAX_KEY_TERMS);
    terms.into_iter().map(|(token, _)| token).collect()
}

/// Up to five member names, ordered by (name length desc, name asc).
fn representatives(members: &[&GraphNode]) -> Vec<String> {
    let mut names: Vec<&str> = members.iter().map(|node| node.label.as_str()).collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    names.truncate(MAX_REPRESENTATIVES);
    names.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EntityGraph, EntityKind, GraphEdge};

    fn node(id: &str, label: &str, kind: EntityKind) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            label: label.to_string(),
            kind,
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

    fn star_graph() -> (EntityGraph, AdjacencyIndex) {
        // Hub "a" connected to b, c, d; b-c edge as well.
        let graph = EntityGraph {
            nodes: vec![
                node("a", "Graph Theory", EntityKind::Concept),
                node("b", "Spectral Graph Methods", EntityKind::Concept),
                node("c", "Random Graphs", EntityKind::Concept),
                node("d", "Petersen Graph", EntityKind::Unknown),
            ],
            edges: vec![
                edge("a", "b", 1.0),
                edge("a", "c", 1.0),
                edge("a", "d", 1.0),
                edge("b", "c", 1.0),
            ],
        };
        let index = AdjacencyIndex::build(&graph);
        (graph, index)
    }

    #[test]
    fn test_centrality_hub_is_one() {
        let (_, index) = star_graph();
        let members = vec![0, 1, 2, 3];
        let centralities = member_centralities(&index, &members);

        // Hub connects to all three others.
        assert_eq!(centralities[0], 1.0);
        // b connects to a and c.
        assert!((centralities[1] - 2.0 / 3.0).abs() < 1e-12);
        // d connects only to a.
        assert!((centralities[3] - 1.0 / 3.0).abs() < 1e-12);
        for c in centralities {
            assert!((0.0..=1.0).contains(&c));
        }
    }

    #[test]
    fn test_centrality_singleton_is_zero() {
        let (_, index) = star_graph();
        assert_eq!(member_centralities(&index, &[2]), vec![0.0]);
    }

    #[test]
    fn test_centrality_restricted_to_community() {
        let (_, index) = star_graph();
        // Community {b, c, d}: the a-edges must not count.
        let centralities = member_centralities(&index, &[1, 2, 3]);
        assert_eq!(centralities[0], 0.5); // b-c
        assert_eq!(centralities[2], 0.0); // d has no intra edge
    }

    #[test]
    fn test_kind_histogram_defaults_unknown() {
        let (graph, index) = star_graph();
        let features = extract_features(&index, &graph.nodes, &[0, 1, 2, 3]);

        assert_eq!(features.kind_histogram.get("concept"), Some(&3));
        assert_eq!(features.kind_histogram.get("unknown"), Some(&1));
    }

    #[test]
    fn test_key_terms_tokenization() {
        let (graph, index) = star_graph();
        let features = extract_features(&index, &graph.nodes, &[0, 1, 2, 3]);

        // "graph"/"graphs" appear most; short tokens would be dropped.
        assert_eq!(features.key_terms.first().map(String::as_str), Some("graph"));
        assert!(features.key_terms.iter().all(|t| t.chars().count() > 2));
        assert!(features.key_terms.len() <= 10);
    }

    #[test]
    fn test_key_terms_split_on_hyphen_and_underscore() {
        let nodes = vec![
            node("a", "gradient-descent", EntityKind::Concept),
            node("b", "gradient_descent", EntityKind::Concept),
        ];
        let graph = EntityGraph {
            nodes: nodes.clone(),
            edges: vec![edge("a", "b", 1.0)],
        };
        let index = AdjacencyIndex::build(&graph);
        let features = extract_features(&index, &graph.nodes, &[0, 1]);

        assert_eq!(features.key_terms, vec!["descent", "gradient"]);
    }

    #[test]
    fn test_representatives_ordering() {
        let (graph, index) = star_graph();
        let features = extract_features(&index, &graph.nodes, &[0, 1, 2, 3]);

        assert_eq!(
            features.representatives,
            vec![
                "Spectral Graph Methods",
                "Petersen Graph",
                "Random Graphs",
                "Graph Theory",
            ]
        );
    }

    #[test]
    fn test_internal_similarity_and_weight() {
        let (graph, index) = star_graph();
        let features = extract_features(&index, &graph.nodes, &[0, 1, 2, 3]);

        // 4 intra edges out of 6 possible.
        assert!((features.internal_similarity - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(features.internal_edge_weight, 4.0);

        // Fully connected community.
        let triangle = extract_features(&index, &graph.nodes, &[0, 1, 2]);
        assert_eq!(triangle.internal_similarity, 1.0);
    }

    #[test]
    fn test_singleton_similarity_is_zero() {
        let (graph, index) = star_graph();
        let features = extract_features(&index, &graph.nodes, &[3]);
        assert_eq!(features.internal_similarity, 0.0);
        assert_eq!(features.internal_edge_weight, 0.0);
    }

    #[test]
    fn test_features_serialize_round_trip() {
        let (graph, index) = star_graph();
        let features = extract_features(&index, &graph.nodes, &[0, 1, 2, 3]);

        let json = serde_json::to_string(&features).unwrap();
        let decoded: CommunityFeatures = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, features);
    }
}

//! Community detection traits.

use super::Partition;
use crate::error::Result;
use petgraph::graph::UnGraph;

/// Trait for community detection algorithms over weighted undirected graphs.
pub trait CommunityDetection {
    /// Detect communities in a weighted graph.
    ///
    /// Returns a partition whose assignment maps each node index to a
    /// community id in `0..K`.
    fn detect<N>(&self, graph: &UnGraph<N, f64>) -> Result<Partition>;

    /// Get the resolution parameter (if applicable).
    fn resolution(&self) -> f64 {
        1.0
    }
}

//! # commune
//!
//! Community detection for knowledge graphs extracted from document corpora.
//!
//! Given a weighted graph of entities, partition them into densely-connected,
//! well-separated communities (Leiden algorithm with a connectivity-guarantee
//! refinement phase), attach per-member centrality and per-community
//! descriptive features, and hand the result to injected persistence
//! collaborators. The clustering core is pure and synchronous; only the
//! orchestrator at the edge is async.
//!
//! Pipeline: raw graph → [`AdjacencyIndex`] → [`Leiden`] partition →
//! [`features`] → persisted community/membership rows (external).

pub mod community;
pub mod detect;
/// Error types used across `commune`.
pub mod error;
pub mod features;
pub mod graph;

pub use community::{modularity, CommunityDetection, Leiden, Partition};
pub use detect::{
    CommunityDetector, CommunityMember, CommunityRecord, CommunityStore, DetectionSummary,
    DetectorConfig, EntityResolver, GraphSource,
};
pub use error::{Error, Result};
pub use features::{extract_features, member_centralities, CommunityFeatures};
pub use graph::{AdjacencyIndex, EntityGraph, EntityKind, GraphEdge, GraphNode};

//! Detection orchestrator: graph in, persisted communities out.
//!
//! The orchestrator wires the pure pipeline (adjacency index → Leiden →
//! features) to three injected collaborators: a [`GraphSource`] that produces
//! the raw graph for a collection, an [`EntityResolver`] that maps member
//! labels to stored entity ids, and a [`CommunityStore`] that persists the
//! result with replace-all semantics — a run fully supersedes the previous
//! community set for the collection, never merges into it.
//!
//! Collaborator failures propagate as typed [`Error`] values; an empty or
//! zero-weight graph is not a failure and reports a zero summary (after
//! clearing any previous result, per replace-all). The caller is responsible
//! for keeping at most one run in flight per collection and for any
//! wall-clock deadline: the clustering loop itself is bounded only by its
//! iteration caps.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::community::Leiden;
use crate::error::{Error, Result};
use crate::features::{extract_features, member_centralities, CommunityFeatures};
use crate::graph::{AdjacencyIndex, EntityGraph};

/// Algorithm tag stamped on every persisted community.
const ALGORITHM: &str = "leiden";

/// Produces the raw entity graph for a collection.
#[async_trait]
pub trait GraphSource: Send + Sync {
    async fn load_graph(&self, collection: &str) -> Result<EntityGraph>;
}

/// Maps a lower-cased canonical entity name to a stored entity id.
///
/// `Ok(None)` is a clean miss (the member is dropped); `Err` is a resolver
/// failure and aborts the run.
#[async_trait]
pub trait EntityResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<Option<String>>;
}

/// Persists a detection result, replacing whatever the collection had before.
#[async_trait]
pub trait CommunityStore: Send + Sync {
    async fn replace_all(
        &self,
        collection: &str,
        communities: &[CommunityRecord],
        members: &[CommunityMember],
    ) -> Result<()>;
}

/// One persisted community row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityRecord {
    /// Contiguous community id from the final partition.
    pub id: usize,
    /// Placeholder name; an LLM-naming collaborator replaces it later.
    pub name: String,
    /// Algorithm tag, always `"leiden"`.
    pub algorithm: String,
    /// Number of members that resolved to stored entities.
    pub member_count: usize,
    /// Cohesion score (internal similarity).
    pub cohesion: f64,
    /// Descriptive feature bundle.
    pub features: CommunityFeatures,
    /// When this run produced the community.
    pub created_at: DateTime<Utc>,
}

/// One persisted membership row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityMember {
    pub community_id: usize,
    pub entity_id: String,
    pub centrality: f64,
    pub is_representative: bool,
}

/// What a detection run reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSummary {
    pub communities_detected: usize,
    pub entities_assigned: usize,
    pub modularity: f64,
    pub processing_time: Duration,
}

/// Orchestrator configuration. Thresholds are defaults, not constants.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Communities smaller than this are discarded.
    pub min_community_size: usize,
    /// Members with centrality above this are flagged representative.
    pub representative_threshold: f64,
    /// Clustering engine configuration.
    pub leiden: Leiden,
}

impl DetectorConfig {
    pub fn new() -> Self {
        Self {
            min_community_size: 2,
            representative_threshold: 0.5,
            leiden: Leiden::new(),
        }
    }

    /// Set the minimum retained community size.
    pub fn with_min_community_size(mut self, size: usize) -> Self {
        self.min_community_size = size;
        self
    }

    /// Set the representative-centrality threshold.
    pub fn with_representative_threshold(mut self, threshold: f64) -> Self {
        self.representative_threshold = threshold;
        self
    }

    /// Set the clustering engine configuration.
    pub fn with_leiden(mut self, leiden: Leiden) -> Self {
        self.leiden = leiden;
        self
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs community detection for one collection at a time.
pub struct CommunityDetector<G, R, S> {
    source: G,
    resolver: R,
    store: S,
    config: DetectorConfig,
}

impl<G, R, S> CommunityDetector<G, R, S>
where
    G: GraphSource,
    R: EntityResolver,
    S: CommunityStore,
{
    pub fn new(source: G, resolver: R, store: S, config: DetectorConfig) -> Self {
        Self {
            source,
            resolver,
            store,
            config,
        }
    }

    /// Run detection for a collection: fetch the graph, cluster it, extract
    /// features, join members to stored entities, persist, and summarize.
    pub async fn run(&self, collection: &str) -> Result<DetectionSummary> {
        let started = Instant::now();
        info!(collection, "community detection started");

        let graph = self.source.load_graph(collection).await?;
        if graph.is_empty() {
            info!(collection, "graph is empty, clearing previous communities");
            self.store.replace_all(collection, &[], &[]).await?;
            return Ok(self.zero_summary(started));
        }

        let index = AdjacencyIndex::build(&graph);
        if index.dropped_edges() > 0 {
            warn!(
                collection,
                dropped = index.dropped_edges(),
                "dropped edges referencing unknown node ids"
            );
        }

        let partition = self.config.leiden.cluster(&index);
        debug!(
            collection,
            communities = partition.community_count(),
            modularity = partition.modularity,
            "clustering finished"
        );

        let labels: HashMap<&str, &str> = graph
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node.label.as_str()))
            .collect();

        let mut records = Vec::new();
        let mut rows = Vec::new();

        for (community_id, members) in partition.members_by_community().into_iter().enumerate() {
            if members.len() < self.config.min_community_size {
                continue;
            }

            let centralities = member_centralities(&index, &members);
            let resolved = self
                .resolve_members(&index, &labels, &members, &centralities)
                .await?;

            // Join misses can shrink a community below the threshold.
            if resolved.len() < self.config.min_community_size {
                debug!(
                    collection,
                    community_id,
                    resolved = resolved.len(),
                    "community discarded after entity join"
                );
                continue;
            }

            let features = extract_features(&index, &graph.nodes, &members);
            let record = CommunityRecord {
                id: community_id,
                name: placeholder_name(community_id, &features),
                algorithm: ALGORITHM.to_string(),
                member_count: resolved.len(),
                cohesion: features.internal_similarity,
                features,
                created_at: Utc::now(),
            };

            for (entity_id, centrality) in resolved {
                rows.push(CommunityMember {
                    community_id,
                    entity_id,
                    centrality,
                    is_representative: centrality > self.config.representative_threshold,
                });
            }
            records.push(record);
        }

        self.store.replace_all(collection, &records, &rows).await?;

        let summary = DetectionSummary {
            communities_detected: records.len(),
            entities_assigned: rows.len(),
            modularity: partition.modularity,
            processing_time: started.elapsed(),
        };
        info!(
            collection,
            communities = summary.communities_detected,
            entities = summary.entities_assigned,
            modularity = summary.modularity,
            elapsed_ms = summary.processing_time.as_millis() as u64,
            "community detection finished"
        );
        Ok(summary)
    }

    /// Resolve member labels to stored entity ids, dropping misses.
    async fn resolve_members(
        &self,
        index: &AdjacencyIndex,
        labels: &HashMap<&str, &str>,
        members: &[usize],
        centralities: &[f64],
    ) -> Result<Vec<(String, f64)>> {
        let mut resolved = Vec::with_capacity(members.len());
        for (&node, &centrality) in members.iter().zip(centralities) {
            let id = index.node_id(node);
            let Some(&label) = labels.get(id) else {
                continue;
            };
            match self.resolver.resolve(&label.to_lowercase()).await? {
                Some(entity_id) => resolved.push((entity_id, centrality)),
                None => {
                    debug!(label, "member label did not resolve to a stored entity");
                }
            }
        }
        Ok(resolved)
    }

    fn zero_summary(&self, started: Instant) -> DetectionSummary {
        DetectionSummary {
            communities_detected: 0,
            entities_assigned: 0,
            modularity: 0.0,
            processing_time: started.elapsed(),
        }
    }
}

/// Placeholder display name until an LLM-naming pass replaces it.
fn placeholder_name(community_id: usize, features: &CommunityFeatures) -> String {
    let top: Vec<&str> = features
        .representatives
        .iter()
        .take(3)
        .map(String::as_str)
        .collect();
    format!("Community {}: {}", community_id, top.join(", "))
}

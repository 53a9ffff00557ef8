//! Snapshot comparison.
//!
//! # Overview
//!
//! [`compare`] diffs two graphs in three layers:
//!
//! 1. **Structure**: set algebra over node ids and undirected edge pairs.
//! 2. **Metrics**: [`MetricSet`] for each side plus before/after deltas.
//!    Growth percentages are 0 whenever the base value is 0. Diameter and
//!    average path length are diffed only when both sides measure them the
//!    same way (both connected, or both on their largest component).
//! 3. **Communities**: both graphs are partitioned with the same algorithm,
//!    then every community of the newer graph is matched to the older
//!    community it shares the most nodes with. Ties go to the older
//!    community seen first. Matching is greedy and one-sided: two new
//!    communities may match the same old one, and a community with no
//!    overlap counts as unmatched. Only growing communities are reported,
//!    largest growth first, at most [`TOP_GROWTH`].
//!
//! The two single-graph analyses run on scoped threads.

use std::collections::BTreeSet;
use std::thread;

use graphlens_core::CanonicalGraph;
use graphlens_core::config::AnalysisConfig;
use serde::Serialize;
use tracing::{info, instrument};

use crate::community::{CommunityAlgorithm, CommunityAssignment, CommunityEngine};
use crate::error::AnalysisError;
use crate::metrics::{MetricSet, PathMetrics, as_f64, graph_metrics};

/// Number of growing communities reported.
pub const TOP_GROWTH: usize = 3;

/// One scalar metric before and after.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDelta {
    pub before: f64,
    pub after: f64,
    pub delta: f64,
    /// `delta / before * 100`, or 0 when `before` is 0.
    pub growth_pct: f64,
}

impl MetricDelta {
    #[must_use]
    pub fn new(before: f64, after: f64) -> Self {
        let delta = after - before;
        let growth_pct = if before == 0.0 { 0.0 } else { delta / before * 100.0 };
        Self {
            before,
            after,
            delta,
            growth_pct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDeltas {
    pub node_count: MetricDelta,
    pub edge_count: MetricDelta,
    pub density: MetricDelta,
    pub average_degree: MetricDelta,
    pub average_clustering: MetricDelta,
    pub connected_components: MetricDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diameter: Option<MetricDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_path_length: Option<MetricDelta>,
}

impl MetricDeltas {
    fn between(before: &MetricSet, after: &MetricSet) -> Self {
        let delta = |a: f64, b: f64| MetricDelta::new(a, b);
        let (diameter, average_path_length) = match path_pair(before.paths, after.paths) {
            Some(((d0, l0), (d1, l1))) => (
                Some(delta(as_f64(d0), as_f64(d1))),
                Some(delta(l0, l1)),
            ),
            None => (None, None),
        };
        Self {
            node_count: delta(as_f64(before.node_count), as_f64(after.node_count)),
            edge_count: delta(as_f64(before.edge_count), as_f64(after.edge_count)),
            density: delta(before.density, after.density),
            average_degree: delta(before.average_degree, after.average_degree),
            average_clustering: delta(before.average_clustering, after.average_clustering),
            connected_components: delta(
                as_f64(before.connected_components),
                as_f64(after.connected_components),
            ),
            diameter,
            average_path_length,
        }
    }

    /// Whether every delta is exactly zero. Absent path deltas count as
    /// unchanged.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        [
            self.node_count,
            self.edge_count,
            self.density,
            self.average_degree,
            self.average_clustering,
            self.connected_components,
        ]
        .iter()
        .chain(self.diameter.iter())
        .chain(self.average_path_length.iter())
        .all(|d| d.delta == 0.0)
    }
}

/// `(diameter, average path length)` of both sides, when they share a scope.
fn path_pair(
    before: Option<PathMetrics>,
    after: Option<PathMetrics>,
) -> Option<((usize, f64), (usize, f64))> {
    match (before?, after?) {
        (
            PathMetrics::Connected {
                diameter: d0,
                average_shortest_path_length: l0,
            },
            PathMetrics::Connected {
                diameter: d1,
                average_shortest_path_length: l1,
            },
        )
        | (
            PathMetrics::LargestComponent {
                largest_component_diameter: d0,
                largest_component_avg_path: l0,
                ..
            },
            PathMetrics::LargestComponent {
                largest_component_diameter: d1,
                largest_component_avg_path: l1,
                ..
            },
        ) => Some(((d0, l0), (d1, l1))),
        _ => None,
    }
}

/// A newer community that grew relative to its best-overlap older one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityGrowth {
    /// Label in the newer graph's partition.
    pub community: usize,
    /// Label of the matched community in the older graph's partition.
    pub matched: usize,
    pub size_before: usize,
    pub size_after: usize,
    pub growth_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub added_nodes: Vec<String>,
    pub removed_nodes: Vec<String>,
    pub common_nodes: Vec<String>,
    pub added_edges: Vec<(String, String)>,
    pub removed_edges: Vec<(String, String)>,
    pub common_edges: Vec<(String, String)>,
    pub before: MetricSet,
    pub after: MetricSet,
    pub deltas: MetricDeltas,
    /// Algorithm that produced both partitions.
    pub community_algorithm: CommunityAlgorithm,
    pub communities_before: usize,
    pub communities_after: usize,
    /// `max(0, communities_after - communities_before)`
    pub new_communities: usize,
    /// Newer communities sharing no node with any older community.
    pub unmatched_communities: usize,
    pub community_growth: Vec<CommunityGrowth>,
}

impl ComparisonResult {
    /// No structural change at all.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
    }
}

struct Side {
    metrics: MetricSet,
    communities: CommunityAssignment,
}

/// Configured comparison engine.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    engine: CommunityEngine,
    algorithm: Option<CommunityAlgorithm>,
}

impl Comparator {
    #[must_use]
    pub const fn new(config: AnalysisConfig) -> Self {
        Self {
            engine: CommunityEngine::new(config),
            algorithm: None,
        }
    }

    /// Partition both sides with `algorithm` instead of the configured
    /// default.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: CommunityAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    fn analyze(&self, g: &CanonicalGraph, algorithm: CommunityAlgorithm) -> Result<Side, AnalysisError> {
        Ok(Side {
            metrics: graph_metrics(g),
            communities: self.engine.detect(g, algorithm)?,
        })
    }

    /// Diff `before` against `after`.
    ///
    /// # Errors
    ///
    /// Propagates community detection failures from either side, e.g.
    /// [`AnalysisError::CapacityExceeded`] for Girvan–Newman on a large
    /// graph.
    #[instrument(skip_all, fields(before = before.node_count(), after = after.node_count()))]
    pub fn compare(
        &self,
        before: &CanonicalGraph,
        after: &CanonicalGraph,
    ) -> Result<ComparisonResult, AnalysisError> {
        let algorithm = self
            .algorithm
            .unwrap_or_else(|| self.engine.default_algorithm());

        let (old, new) = thread::scope(|s| {
            let newer = s.spawn(|| self.analyze(after, algorithm));
            let older = self.analyze(before, algorithm);
            let newer = newer
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (older, newer)
        });
        let (old, new) = (old?, new?);

        let before_ids: BTreeSet<&str> = before.nodes().iter().map(|n| n.id.as_str()).collect();
        let after_ids: BTreeSet<&str> = after.nodes().iter().map(|n| n.id.as_str()).collect();
        let before_edges: BTreeSet<(String, String)> = before.edge_pairs().into_iter().collect();
        let after_edges: BTreeSet<(String, String)> = after.edge_pairs().into_iter().collect();

        let (community_growth, unmatched) =
            realign(old.communities.communities(), new.communities.communities());

        let result = ComparisonResult {
            added_nodes: owned(after_ids.difference(&before_ids)),
            removed_nodes: owned(before_ids.difference(&after_ids)),
            common_nodes: owned(before_ids.intersection(&after_ids)),
            added_edges: after_edges.difference(&before_edges).cloned().collect(),
            removed_edges: before_edges.difference(&after_edges).cloned().collect(),
            common_edges: before_edges.intersection(&after_edges).cloned().collect(),
            deltas: MetricDeltas::between(&old.metrics, &new.metrics),
            before: old.metrics,
            after: new.metrics,
            community_algorithm: new.communities.algorithm,
            communities_before: old.communities.community_count,
            communities_after: new.communities.community_count,
            new_communities: new
                .communities
                .community_count
                .saturating_sub(old.communities.community_count),
            unmatched_communities: unmatched,
            community_growth,
        };
        info!(
            added_nodes = result.added_nodes.len(),
            removed_nodes = result.removed_nodes.len(),
            added_edges = result.added_edges.len(),
            removed_edges = result.removed_edges.len(),
            "compared graphs"
        );
        Ok(result)
    }
}

fn owned<'a, 'b: 'a>(ids: impl Iterator<Item = &'a &'b str>) -> Vec<String> {
    ids.map(|s| (*s).to_string()).collect()
}

/// Greedy best-overlap matching of newer communities onto older ones.
///
/// Returns the top growing communities and the count of newer communities
/// with no overlapping older one.
fn realign(older: &[Vec<String>], newer: &[Vec<String>]) -> (Vec<CommunityGrowth>, usize) {
    let older: Vec<BTreeSet<&str>> = older
        .iter()
        .map(|c| c.iter().map(String::as_str).collect())
        .collect();

    let mut growth = Vec::new();
    let mut unmatched = 0;
    for (label, members) in newer.iter().enumerate() {
        let members: BTreeSet<&str> = members.iter().map(String::as_str).collect();
        let mut best: Option<(usize, usize)> = None;
        for (old_label, old_members) in older.iter().enumerate() {
            let overlap = members.intersection(old_members).count();
            if overlap > best.map_or(0, |(_, o)| o) {
                best = Some((old_label, overlap));
            }
        }
        let Some((matched, _)) = best else {
            unmatched += 1;
            continue;
        };
        let size_before = older[matched].len();
        let size_after = members.len();
        if size_after > size_before {
            growth.push(CommunityGrowth {
                community: label,
                matched,
                size_before,
                size_after,
                growth_pct: as_f64(size_after - size_before) / as_f64(size_before) * 100.0,
            });
        }
    }
    // Stable, so equal growth keeps newer-label order.
    growth.sort_by(|a, b| b.growth_pct.total_cmp(&a.growth_pct));
    growth.truncate(TOP_GROWTH);
    (growth, unmatched)
}

/// Compare with default configuration.
///
/// # Errors
///
/// See [`Comparator::compare`].
pub fn compare(
    before: &CanonicalGraph,
    after: &CanonicalGraph,
) -> Result<ComparisonResult, AnalysisError> {
    Comparator::default().compare(before, after)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

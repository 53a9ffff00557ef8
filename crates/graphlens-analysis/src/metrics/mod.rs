//! Graph-level statistics and centrality.
//!
//! # Overview
//!
//! [`graph_metrics`] summarizes a whole graph. [`centrality`] scores every
//! node with one of four algorithms:
//!
//! - **Degree** (`degree`): normalized degree, `deg(v) / (N - 1)`.
//! - **Betweenness** (`betweenness`): Brandes' exact algorithm, normalized.
//! - **Closeness** (`closeness`): inverse mean distance inside each node's
//!   own connected component; isolated nodes score 0.
//! - **Eigenvector** (`eigenvector`): power iteration, optional. It fails
//!   with [`AnalysisError::ConvergenceFailure`] on disconnected or edgeless
//!   graphs and when the iteration cap is hit.
//!
//! [`centrality_batch`] runs several algorithms and keeps going past
//! failures, collecting them as [`Unavailable`] entries.
//!
//! All algorithms treat the graph as undirected and unweighted.

pub mod basic;
pub mod betweenness;
pub mod closeness;
pub mod degree;
pub mod eigenvector;

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use graphlens_core::CanonicalGraph;
use graphlens_core::config::AnalysisConfig;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::deadline::Deadline;
use crate::error::AnalysisError;

pub use basic::{MetricSet, PathMetrics, graph_metrics};

/// Closed set of centrality algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentralityAlgorithm {
    Degree,
    Betweenness,
    Closeness,
    Eigenvector,
}

impl CentralityAlgorithm {
    pub const ALL: [Self; 4] = [
        Self::Degree,
        Self::Betweenness,
        Self::Closeness,
        Self::Eigenvector,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Degree => "degree",
            Self::Betweenness => "betweenness",
            Self::Closeness => "closeness",
            Self::Eigenvector => "eigenvector",
        }
    }

    /// Exact name lookup.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Name lookup where unknown names resolve to [`Self::Degree`].
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            warn!(requested = name, "unknown centrality algorithm, using degree");
            Self::Degree
        })
    }
}

impl fmt::Display for CentralityAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores for one algorithm, keyed by node id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralityResult {
    pub algorithm: CentralityAlgorithm,
    pub scores: BTreeMap<String, f64>,
}

impl CentralityResult {
    fn from_positions(g: &CanonicalGraph, algorithm: CentralityAlgorithm, scores: &[f64]) -> Self {
        Self {
            algorithm,
            scores: g
                .nodes()
                .iter()
                .zip(scores)
                .map(|(n, &s)| (n.id.clone(), s))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<f64> {
        self.scores.get(id).copied()
    }

    /// The `k` highest-scoring nodes, ties broken by id.
    #[must_use]
    pub fn top(&self, k: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> =
            self.scores.iter().map(|(id, &s)| (id.as_str(), s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }
}

/// An algorithm that produced no result in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unavailable {
    pub algorithm: CentralityAlgorithm,
    pub code: &'static str,
    pub reason: String,
}

/// Partial results of [`centrality_batch`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CentralityBatch {
    pub results: Vec<CentralityResult>,
    pub unavailable: Vec<Unavailable>,
}

impl CentralityBatch {
    #[must_use]
    pub fn get(&self, algorithm: CentralityAlgorithm) -> Option<&CentralityResult> {
        self.results.iter().find(|r| r.algorithm == algorithm)
    }
}

/// Compute one centrality with default limits.
///
/// # Errors
///
/// Only eigenvector centrality fails; see [`eigenvector`].
pub fn centrality(
    g: &CanonicalGraph,
    algorithm: CentralityAlgorithm,
) -> Result<CentralityResult, AnalysisError> {
    centrality_with(g, algorithm, &AnalysisConfig::default())
}

/// Compute one centrality under `config`'s iteration cap, tolerance and
/// timeout.
///
/// # Errors
///
/// Only eigenvector centrality fails; see [`eigenvector`].
#[instrument(skip(g, config), fields(nodes = g.node_count()))]
pub fn centrality_with(
    g: &CanonicalGraph,
    algorithm: CentralityAlgorithm,
    config: &AnalysisConfig,
) -> Result<CentralityResult, AnalysisError> {
    let scores = match algorithm {
        CentralityAlgorithm::Degree => degree::degree_centrality(g),
        CentralityAlgorithm::Betweenness => betweenness::betweenness_centrality(g),
        CentralityAlgorithm::Closeness => closeness::closeness_centrality(g),
        CentralityAlgorithm::Eigenvector => eigenvector::eigenvector_centrality(
            g,
            config.eigenvector_max_iter,
            config.eigenvector_tolerance,
            &Deadline::new(config.timeout_ms),
        )?,
    };
    Ok(CentralityResult::from_positions(g, algorithm, &scores))
}

/// Compute several centralities; a failing algorithm never blocks the rest.
#[must_use]
#[instrument(skip(g, config), fields(nodes = g.node_count()))]
pub fn centrality_batch(
    g: &CanonicalGraph,
    algorithms: &[CentralityAlgorithm],
    config: &AnalysisConfig,
) -> CentralityBatch {
    let mut batch = CentralityBatch::default();
    for &algorithm in algorithms {
        match centrality_with(g, algorithm, config) {
            Ok(result) => batch.results.push(result),
            Err(err) => {
                warn!(%algorithm, code = %err.code(), "centrality unavailable: {err}");
                batch.unavailable.push(Unavailable {
                    algorithm,
                    code: err.code().code(),
                    reason: err.to_string(),
                });
            }
        }
    }
    batch
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Hop distances from `source` over `neighbors`; `None` when unreachable.
pub(crate) fn bfs_distances<'a, F>(n: usize, source: usize, neighbors: F) -> Vec<Option<usize>>
where
    F: Fn(usize) -> &'a [usize],
{
    let mut dist = vec![None; n];
    dist[source] = Some(0);
    let mut queue = VecDeque::from([source]);
    while let Some(v) = queue.pop_front() {
        let next = dist[v].map_or(0, |d| d + 1);
        for &w in neighbors(v) {
            if dist[w].is_none() {
                dist[w] = Some(next);
                queue.push_back(w);
            }
        }
    }
    dist
}

/// Index of the largest component; the first one wins ties.
pub(crate) fn largest_component(components: &[Vec<usize>]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, c) in components.iter().enumerate() {
        if best.is_none_or(|b| c.len() > components[b].len()) {
            best = Some(i);
        }
    }
    best
}

#[allow(clippy::cast_precision_loss)]
pub(crate) const fn as_f64(v: usize) -> f64 {
    v as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphlens_core::{Edge, Node};

    fn path(n: usize) -> CanonicalGraph {
        let mut g = CanonicalGraph::new();
        for i in 0..n {
            g.add_node(Node::new(i.to_string()));
        }
        for i in 1..n {
            g.add_edge(Edge::new((i - 1).to_string(), i.to_string())).unwrap();
        }
        g
    }

    #[test]
    fn resolve_unknown_falls_back_to_degree() {
        assert_eq!(CentralityAlgorithm::resolve("pagerank"), CentralityAlgorithm::Degree);
        assert_eq!(CentralityAlgorithm::resolve("Closeness"), CentralityAlgorithm::Closeness);
    }

    #[test]
    fn batch_isolates_eigenvector_failure() {
        let mut g = path(3);
        g.add_node(Node::new("island"));

        let batch = centrality_batch(&g, &CentralityAlgorithm::ALL, &AnalysisConfig::default());
        assert_eq!(batch.results.len(), 3);
        assert_eq!(batch.unavailable.len(), 1);
        assert_eq!(batch.unavailable[0].algorithm, CentralityAlgorithm::Eigenvector);
        assert_eq!(batch.unavailable[0].code, "E2003");
        assert!(batch.get(CentralityAlgorithm::Betweenness).is_some());
    }

    #[test]
    fn top_orders_by_score() {
        let r = centrality(&path(5), CentralityAlgorithm::Betweenness).unwrap();
        let top = r.top(1);
        assert_eq!(top[0].0, "2");
    }

    #[test]
    fn bfs_marks_unreachable() {
        let nbrs: Vec<Vec<usize>> = vec![vec![1], vec![0], vec![]];
        let d = bfs_distances(3, 0, |i| nbrs[i].as_slice());
        assert_eq!(d, [Some(0), Some(1), None]);
    }

    #[test]
    fn largest_component_prefers_first_on_tie() {
        let comps = vec![vec![0, 1], vec![2, 3], vec![4]];
        assert_eq!(largest_component(&comps), Some(0));
        assert_eq!(largest_component(&[]), None);
    }
}

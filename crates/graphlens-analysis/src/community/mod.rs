//! Community detection with a degrade-gracefully fallback chain.
//!
//! # Overview
//!
//! Three interchangeable partitioners:
//!
//! - **Louvain** (`louvain`): greedy modularity optimization with community
//!   aggregation. Behind the `louvain` cargo feature and the
//!   `analysis.louvain_enabled` config switch.
//! - **Label propagation** (`label_propagation`): semi-synchronous, always
//!   succeeds on a non-empty graph.
//! - **Girvan–Newman** (`girvan_newman`): first split of the divisive
//!   edge-betweenness hierarchy only. Refused above
//!   `analysis.girvan_newman_max_nodes`.
//!
//! When the requested algorithm reports [`AnalysisError::AlgorithmUnavailable`]
//! the engine walks the chain `louvain -> label_propagation` and records the
//! substitution in [`CommunityAssignment::algorithm`]. Capacity and timeout
//! errors are surfaced, never papered over.
//!
//! Labels are dense (`0..k`) in order of each community's first node, and are
//! meaningless across algorithms or graphs.

mod girvan_newman;
mod label_propagation;
#[cfg(feature = "louvain")]
mod louvain;
pub mod modularity;

use std::collections::BTreeMap;
use std::fmt;

use graphlens_core::config::AnalysisConfig;
use graphlens_core::{Adjacency, CanonicalGraph};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::deadline::Deadline;
use crate::error::AnalysisError;

pub use modularity::modularity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityAlgorithm {
    Louvain,
    LabelPropagation,
    GirvanNewman,
}

impl CommunityAlgorithm {
    pub const ALL: [Self; 3] = [Self::Louvain, Self::LabelPropagation, Self::GirvanNewman];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Louvain => "louvain",
            Self::LabelPropagation => "label_propagation",
            Self::GirvanNewman => "girvan_newman",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// Name lookup where unknown names resolve to label propagation.
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            warn!(requested = name, "unknown community algorithm, using label_propagation");
            Self::LabelPropagation
        })
    }

    /// Next algorithm to try when this one is unavailable.
    #[must_use]
    pub const fn fallback(self) -> Option<Self> {
        match self {
            Self::Louvain => Some(Self::LabelPropagation),
            Self::LabelPropagation | Self::GirvanNewman => None,
        }
    }
}

impl fmt::Display for CommunityAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partition of a graph's nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityAssignment {
    pub requested: CommunityAlgorithm,
    /// The algorithm that actually produced the partition.
    pub algorithm: CommunityAlgorithm,
    pub community_count: usize,
    pub modularity: f64,
    /// node id -> community label
    pub assignment: BTreeMap<String, usize>,
    #[serde(skip)]
    members: Vec<Vec<String>>,
}

impl CommunityAssignment {
    fn from_labels(
        g: &CanonicalGraph,
        requested: CommunityAlgorithm,
        algorithm: CommunityAlgorithm,
        labels: &[usize],
    ) -> Self {
        let count = labels.iter().max().map_or(0, |m| m + 1);
        let mut members = vec![Vec::new(); count];
        let mut assignment = BTreeMap::new();
        for (node, &label) in g.nodes().iter().zip(labels) {
            members[label].push(node.id.clone());
            assignment.insert(node.id.clone(), label);
        }
        Self {
            requested,
            algorithm,
            community_count: count,
            modularity: modularity(g.adjacency(), labels),
            assignment,
            members,
        }
    }

    /// Members of each community, indexed by label, in node insertion order.
    #[must_use]
    pub fn communities(&self) -> &[Vec<String>] {
        &self.members
    }

    #[must_use]
    pub fn label_of(&self, id: &str) -> Option<usize> {
        self.assignment.get(id).copied()
    }

    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        self.members.iter().map(Vec::len).collect()
    }

    /// Whether the fallback chain replaced the requested algorithm.
    #[must_use]
    pub fn fell_back(&self) -> bool {
        self.requested != self.algorithm
    }
}

/// Renumber labels densely in order of first appearance.
pub(crate) fn densify(labels: &[usize]) -> Vec<usize> {
    let mut map: BTreeMap<usize, usize> = BTreeMap::new();
    labels
        .iter()
        .map(|&l| {
            let next = map.len();
            *map.entry(l).or_insert(next)
        })
        .collect()
}

/// Configured community detector.
#[derive(Debug, Clone, Default)]
pub struct CommunityEngine {
    config: AnalysisConfig,
}

impl CommunityEngine {
    #[must_use]
    pub const fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Algorithm named by `analysis.community_algorithm`.
    #[must_use]
    pub fn default_algorithm(&self) -> CommunityAlgorithm {
        CommunityAlgorithm::resolve(&self.config.community_algorithm)
    }

    /// Partition `g`, walking the fallback chain on unavailability.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::CapacityExceeded`] for Girvan–Newman on graphs
    ///   above the node limit.
    /// - [`AnalysisError::Timeout`] when Girvan–Newman exceeds the budget.
    /// - [`AnalysisError::AlgorithmUnavailable`] only if the chain runs out,
    ///   which label propagation prevents.
    #[instrument(skip(self, g), fields(nodes = g.node_count()))]
    pub fn detect(
        &self,
        g: &CanonicalGraph,
        algorithm: CommunityAlgorithm,
    ) -> Result<CommunityAssignment, AnalysisError> {
        let deadline = Deadline::new(self.config.timeout_ms);
        let mut current = algorithm;
        loop {
            match self.run(g.adjacency(), current, &deadline) {
                Ok(labels) => {
                    let result = CommunityAssignment::from_labels(g, algorithm, current, &labels);
                    info!(
                        algorithm = %current,
                        communities = result.community_count,
                        modularity = result.modularity,
                        "detected communities"
                    );
                    return Ok(result);
                }
                Err(err @ AnalysisError::AlgorithmUnavailable { .. }) => {
                    let Some(next) = current.fallback() else {
                        return Err(err);
                    };
                    warn!(from = %current, to = %next, "community algorithm unavailable, falling back");
                    current = next;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn run(
        &self,
        adj: &Adjacency,
        algorithm: CommunityAlgorithm,
        deadline: &Deadline,
    ) -> Result<Vec<usize>, AnalysisError> {
        match algorithm {
            CommunityAlgorithm::Louvain => {
                #[cfg(feature = "louvain")]
                if self.config.louvain_enabled {
                    return Ok(louvain::louvain(adj, self.config.louvain_max_passes));
                }
                Err(AnalysisError::AlgorithmUnavailable {
                    algorithm: CommunityAlgorithm::Louvain.as_str(),
                })
            }
            CommunityAlgorithm::LabelPropagation => Ok(label_propagation::label_propagation(
                adj,
                self.config.label_propagation_max_rounds,
            )),
            CommunityAlgorithm::GirvanNewman => girvan_newman::first_split(
                adj,
                self.config.girvan_newman_max_nodes,
                deadline,
            ),
        }
    }
}

/// Partition `g` with default configuration.
///
/// # Errors
///
/// See [`CommunityEngine::detect`].
pub fn detect(
    g: &CanonicalGraph,
    algorithm: CommunityAlgorithm,
) -> Result<CommunityAssignment, AnalysisError> {
    CommunityEngine::default().detect(g, algorithm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphlens_core::{Edge, Node};

    pub(super) fn graph(n: usize, edges: &[(usize, usize)]) -> CanonicalGraph {
        let mut g = CanonicalGraph::new();
        for i in 0..n {
            g.add_node(Node::new(i.to_string()));
        }
        for &(a, b) in edges {
            g.add_edge(Edge::new(a.to_string(), b.to_string())).unwrap();
        }
        g
    }

    fn barbell() -> CanonicalGraph {
        graph(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3)])
    }

    #[test]
    fn densify_uses_first_seen_order() {
        assert_eq!(densify(&[7, 7, 3, 9, 3]), [0, 0, 1, 2, 1]);
    }

    #[test]
    fn disabled_louvain_falls_back_to_label_propagation() {
        let engine = CommunityEngine::new(AnalysisConfig {
            louvain_enabled: false,
            ..AnalysisConfig::default()
        });
        let result = engine.detect(&barbell(), CommunityAlgorithm::Louvain).unwrap();
        assert_eq!(result.requested, CommunityAlgorithm::Louvain);
        assert_eq!(result.algorithm, CommunityAlgorithm::LabelPropagation);
        assert!(result.fell_back());
        assert_eq!(result.community_count, 2);
    }

    #[test]
    fn girvan_newman_capacity_is_enforced() {
        let engine = CommunityEngine::new(AnalysisConfig {
            girvan_newman_max_nodes: 5,
            ..AnalysisConfig::default()
        });
        let err = engine.detect(&barbell(), CommunityAlgorithm::GirvanNewman).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::CapacityExceeded {
                algorithm: "girvan_newman",
                node_count: 6,
                limit: 5
            }
        );
    }

    #[test]
    fn every_algorithm_splits_the_barbell() {
        for algorithm in CommunityAlgorithm::ALL {
            let result = detect(&barbell(), algorithm).unwrap();
            assert_eq!(result.community_count, 2, "{algorithm}");
            assert_eq!(result.sizes(), [3, 3], "{algorithm}");
            assert_eq!(result.label_of("0"), Some(0));
            assert_eq!(result.label_of("5"), Some(1));
            // 2 communities x (3/7 - (7/14)^2)
            assert!((result.modularity - 2.0 * (3.0 / 7.0 - 0.25)).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_graph_has_no_communities() {
        let result = detect(&CanonicalGraph::new(), CommunityAlgorithm::LabelPropagation).unwrap();
        assert_eq!(result.community_count, 0);
        assert!(result.assignment.is_empty());
        assert!(result.modularity.abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_name_resolves_to_label_propagation() {
        assert_eq!(
            CommunityAlgorithm::resolve("infomap"),
            CommunityAlgorithm::LabelPropagation
        );
        assert_eq!(
            CommunityAlgorithm::resolve("Girvan-Newman"),
            CommunityAlgorithm::GirvanNewman
        );
    }
}

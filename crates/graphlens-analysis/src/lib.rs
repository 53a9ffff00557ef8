#![forbid(unsafe_code)]
//! graphlens-analysis library.
//!
//! Structural analysis over a [`graphlens_core::CanonicalGraph`]: whole-graph
//! metrics, node centrality, heuristic link scoring, community detection and
//! snapshot comparison. Every entry point is a read-only function of its
//! input graph, so analyses over the same graph may run concurrently.
//!
//! # Conventions
//!
//! - **Errors**: [`AnalysisError`] names the algorithm and graph size.
//!   Algorithms that cannot fail return plain values.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).
//! - **Determinism**: node positions follow insertion order and every tie
//!   break is by position, so identical input gives identical output.

pub mod community;
pub mod compare;
pub mod deadline;
pub mod error;
pub mod link;
pub mod metrics;

pub use community::{CommunityAlgorithm, CommunityAssignment, CommunityEngine, detect, modularity};
pub use compare::{Comparator, ComparisonResult, compare};
pub use error::AnalysisError;
pub use link::{LinkAlgorithm, LinkScore, Predictor, predict_links};
pub use metrics::{
    CentralityAlgorithm, CentralityBatch, CentralityResult, MetricSet, centrality,
    centrality_batch, graph_metrics,
};

//! Eigenvector centrality via power iteration.
//!
//! # Algorithm
//!
//! Iterate `x <- x + A x` (the shift by the identity avoids oscillation on
//! bipartite graphs) and rescale to unit L2 norm. Stop when the L1 change
//! falls below `n * tolerance`.
//!
//! The dominant eigenvector is only unique on a connected graph, so
//! disconnected and edgeless graphs fail up front. So does hitting
//! `max_iter`. The empty graph yields an empty result.

use graphlens_core::CanonicalGraph;
use tracing::{debug, instrument};

use super::as_f64;
use crate::deadline::Deadline;
use crate::error::AnalysisError;

const ALGORITHM: &str = "eigenvector";

/// # Errors
///
/// - [`AnalysisError::ConvergenceFailure`] for disconnected or edgeless
///   graphs, or when `max_iter` iterations do not converge.
/// - [`AnalysisError::Timeout`] when `deadline` passes mid-iteration.
#[instrument(skip(g, deadline), fields(nodes = g.node_count()))]
pub fn eigenvector_centrality(
    g: &CanonicalGraph,
    max_iter: usize,
    tolerance: f64,
    deadline: &Deadline,
) -> Result<Vec<f64>, AnalysisError> {
    let adj = g.adjacency();
    let n = adj.node_count();
    if n == 0 {
        return Ok(Vec::new());
    }
    if adj.edge_count() == 0 || adj.components().len() > 1 {
        return Err(AnalysisError::ConvergenceFailure {
            algorithm: ALGORITHM,
            iterations: 0,
            node_count: n,
        });
    }

    let mut x = vec![1.0 / as_f64(n); n];
    for iter in 1..=max_iter {
        deadline.check(ALGORITHM, n)?;

        let last = x.clone();
        for v in 0..n {
            for &u in adj.neighbors(v) {
                x[u] += last[v];
            }
            if adj.has_self_loop(v) {
                x[v] += last[v];
            }
        }

        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut x {
                *v /= norm;
            }
        }

        let diff: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if diff < as_f64(n) * tolerance {
            debug!(iterations = iter, "eigenvector converged");
            return Ok(x);
        }
    }

    Err(AnalysisError::ConvergenceFailure {
        algorithm: ALGORITHM,
        iterations: max_iter,
        node_count: n,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

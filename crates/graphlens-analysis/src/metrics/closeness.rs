//! Closeness centrality, per connected component.
//!
//! `closeness(v) = (r - 1) / Σ d(v, u)` over the `r` nodes of `v`'s own
//! component. Nodes of a single-node component score 0 rather than being
//! omitted.

use graphlens_core::CanonicalGraph;
use tracing::instrument;

use super::{as_f64, bfs_distances};

#[must_use]
#[instrument(skip(g), fields(nodes = g.node_count()))]
pub fn closeness_centrality(g: &CanonicalGraph) -> Vec<f64> {
    let adj = g.adjacency();
    let n = adj.node_count();
    let mut scores = vec![0.0; n];

    for members in adj.components() {
        let r = members.len();
        if r < 2 {
            continue;
        }
        for &v in &members {
            let total: usize = bfs_distances(n, v, |u| adj.neighbors(u))
                .into_iter()
                .flatten()
                .sum();
            if total > 0 {
                scores[v] = as_f64(r - 1) / as_f64(total);
            }
        }
    }
    scores
}

//! Newman modularity of a partition.

use graphlens_core::Adjacency;

use crate::metrics::as_f64;

/// `Σ_c (e_c / E - (d_c / 2E)^2)` where `e_c` counts edges inside community
/// `c` and `d_c` sums its members' degrees. A self-loop counts as one
/// internal edge and two degree units. Edgeless graphs score 0.
///
/// `labels[i]` is the community of node position `i`; labels need not be
/// dense.
#[must_use]
pub fn modularity(adj: &Adjacency, labels: &[usize]) -> f64 {
    let e = adj.edge_count();
    if e == 0 {
        return 0.0;
    }
    let k = labels.iter().max().map_or(0, |m| m + 1);
    let mut internal = vec![0usize; k];
    let mut degree = vec![0usize; k];

    for (v, &c) in labels.iter().enumerate() {
        degree[c] += adj.degree(v);
        if adj.has_self_loop(v) {
            internal[c] += 1;
        }
        for &w in adj.neighbors(v) {
            if v < w && labels[w] == c {
                internal[c] += 1;
            }
        }
    }

    let e = as_f64(e);
    internal
        .iter()
        .zip(&degree)
        .map(|(&ec, &dc)| as_f64(ec) / e - (as_f64(dc) / (2.0 * e)).powi(2))
        .sum()
}

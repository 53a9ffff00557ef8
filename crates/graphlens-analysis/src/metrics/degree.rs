//! Degree centrality.

use graphlens_core::CanonicalGraph;

use super::as_f64;

/// `deg(v) / (N - 1)` per node position; all zeros when `N <= 1`.
///
/// A self-loop adds 2 to the degree, so scores can exceed 1.
#[must_use]
pub fn degree_centrality(g: &CanonicalGraph) -> Vec<f64> {
    let adj = g.adjacency();
    let n = adj.node_count();
    if n <= 1 {
        return vec![0.0; n];
    }
    let scale = 1.0 / as_f64(n - 1);
    (0..n).map(|i| as_f64(adj.degree(i)) * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphlens_core::{Edge, Node};

    #[test]
    fn star_center_is_one() {
        let mut g = CanonicalGraph::new();
        for id in ["c", "a", "b", "d"] {
            g.add_node(Node::new(id));
        }
        for leaf in ["a", "b", "d"] {
            g.add_edge(Edge::new("c", leaf)).unwrap();
        }
        let d = degree_centrality(&g);
        assert!((d[0] - 1.0).abs() < 1e-12);
        assert!((d[1] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn single_node_scores_zero() {
        let mut g = CanonicalGraph::new();
        g.add_node(Node::new("solo"));
        assert_eq!(degree_centrality(&g), [0.0]);
    }
}

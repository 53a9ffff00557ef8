//! Betweenness centrality via Brandes' algorithm.
//!
//! # Algorithm
//!
//! For unweighted undirected graphs:
//!
//! 1. For each source node `s`, run BFS to compute shortest-path counts
//!    and distances.
//! 2. Accumulate dependency scores in reverse BFS order (farthest nodes first).
//! 3. Sum the dependency scores across all source nodes.
//!
//! Complexity: O(V * E).
//!
//! Every unordered pair is visited from both ends, so the raw sums count each
//! pair twice. Node scores are normalized by `(n-1)(n-2)`, which yields the
//! fraction of pairs whose shortest paths pass through the node. The same
//! pass can accumulate edge betweenness, which divisive community detection
//! uses.

use std::collections::{BTreeMap, VecDeque};

use graphlens_core::CanonicalGraph;
use tracing::instrument;

use super::as_f64;

/// Normalized betweenness per node position. Graphs with two or fewer nodes
/// score all zeros.
#[must_use]
#[instrument(skip(g), fields(nodes = g.node_count()))]
pub fn betweenness_centrality(g: &CanonicalGraph) -> Vec<f64> {
    let adj = g.adjacency();
    let n = adj.node_count();
    let mut cb = brandes(n, |v| adj.neighbors(v), None);
    if n <= 2 {
        return vec![0.0; n];
    }
    let scale = 1.0 / (as_f64(n - 1) * as_f64(n - 2));
    for x in &mut cb {
        *x *= scale;
    }
    cb
}

/// Raw edge betweenness keyed by `(smaller, larger)` position pair.
///
/// Values are un-normalized and count each pair from both ends; only their
/// order matters to callers.
pub(crate) fn edge_betweenness<'a, F>(n: usize, neighbors: F) -> BTreeMap<(usize, usize), f64>
where
    F: Fn(usize) -> &'a [usize],
{
    let mut edges = BTreeMap::new();
    for v in 0..n {
        for &w in neighbors(v) {
            if v < w {
                edges.insert((v, w), 0.0);
            }
        }
    }
    brandes(n, neighbors, Some(&mut edges));
    edges
}

/// Raw node betweenness (each pair counted from both ends), optionally
/// accumulating edge scores into `edge_scores`.
fn brandes<'a, F>(
    n: usize,
    neighbors: F,
    mut edge_scores: Option<&mut BTreeMap<(usize, usize), f64>>,
) -> Vec<f64>
where
    F: Fn(usize) -> &'a [usize],
{
    let mut cb = vec![0.0; n];

    for s in 0..n {
        // Nodes in order of discovery (farthest popped first).
        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];

        // sigma[t]: number of shortest paths from s to t.
        let mut sigma = vec![0.0_f64; n];
        sigma[s] = 1.0;

        let mut dist: Vec<Option<usize>> = vec![None; n];
        dist[s] = Some(0);

        let mut queue = VecDeque::from([s]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let dv = dist[v].unwrap_or(0);
            for &w in neighbors(v) {
                if dist[w].is_none() {
                    dist[w] = Some(dv + 1);
                    queue.push_back(w);
                }
                if dist[w] == Some(dv + 1) {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0_f64; n];
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                let c = (sigma[v] / sigma[w]) * (1.0 + delta[w]);
                delta[v] += c;
                if let Some(edges) = edge_scores.as_deref_mut() {
                    if let Some(score) = edges.get_mut(&(v.min(w), v.max(w))) {
                        *score += c;
                    }
                }
            }
            if w != s {
                cb[w] += delta[w];
            }
        }
    }

    cb
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use graphlens_core::{Edge, Node};

    fn graph(n: usize, edges: &[(usize, usize)]) -> CanonicalGraph {
        let mut g = CanonicalGraph::new();
        for i in 0..n {
            g.add_node(Node::new(i.to_string()));
        }
        for &(a, b) in edges {
            g.add_edge(Edge::new(a.to_string(), b.to_string())).unwrap();
        }
        g
    }

    #[test]
    fn path_middle_is_one() {
        let bc = betweenness_centrality(&graph(3, &[(0, 1), (1, 2)]));
        assert!(bc[0].abs() < 1e-12);
        assert!((bc[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn star_center_is_one_leaves_zero() {
        let bc = betweenness_centrality(&graph(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]));
        assert!((bc[0] - 1.0).abs() < 1e-12);
        for leaf in &bc[1..] {
            assert!(leaf.abs() < 1e-12);
        }
    }

    #[test]
    fn cycle_is_uniform() {
        let bc = betweenness_centrality(&graph(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]));
        // Each node is on half of the two shortest paths between its
        // neighbors: 0.5 pairs out of 3.
        for x in bc {
            assert!((x - 1.0 / 6.0).abs() < 1e-12);
        }
    }

    #[test]
    fn two_nodes_score_zero() {
        assert_eq!(betweenness_centrality(&graph(2, &[(0, 1)])), [0.0, 0.0]);
    }

    #[test]
    fn bridge_has_highest_edge_betweenness() {
        let g = graph(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3)]);
        let adj = g.adjacency();
        let eb = edge_betweenness(adj.node_count(), |v| adj.neighbors(v));
        let best = eb
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| *k)
            .unwrap();
        assert_eq!(best, (2, 3));
        // 3 x 3 pairs cross the bridge, counted from both ends.
        assert!((eb[&(2, 3)] - 18.0).abs() < 1e-12);
    }
}

//! Whole-graph statistics.
//!
//! Path metrics (diameter, mean shortest path) only make sense on a
//! connected graph. On a disconnected graph they are computed on the largest
//! connected component instead and reported under distinct field names
//! together with that component's size.

use std::collections::BTreeMap;

use graphlens_core::{Adjacency, CanonicalGraph};
use serde::Serialize;
use tracing::instrument;

use super::{as_f64, bfs_distances, largest_component};

/// Shortest-path statistics, either for the whole graph or its largest
/// component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathMetrics {
    Connected {
        diameter: usize,
        average_shortest_path_length: f64,
    },
    LargestComponent {
        largest_component_size: usize,
        largest_component_diameter: usize,
        largest_component_avg_path: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSet {
    pub node_count: usize,
    /// Distinct undirected node pairs.
    pub edge_count: usize,
    pub density: f64,
    pub average_degree: f64,
    pub average_clustering: f64,
    pub connected_components: usize,
    pub is_connected: bool,
    pub isolated_nodes: usize,
    /// degree -> number of nodes with that degree
    pub degree_distribution: BTreeMap<usize, usize>,
    /// `None` only for the empty graph.
    #[serde(flatten)]
    pub paths: Option<PathMetrics>,
}

/// Compute graph-level statistics. The empty graph yields all zeros.
#[must_use]
#[instrument(skip(g), fields(nodes = g.node_count()))]
pub fn graph_metrics(g: &CanonicalGraph) -> MetricSet {
    let adj = g.adjacency();
    let n = adj.node_count();
    let e = adj.edge_count();

    let density = if n > 1 {
        2.0 * as_f64(e) / (as_f64(n) * as_f64(n - 1))
    } else {
        0.0
    };
    let average_degree = if n > 0 { 2.0 * as_f64(e) / as_f64(n) } else { 0.0 };

    let mut degree_distribution = BTreeMap::new();
    for i in 0..n {
        *degree_distribution.entry(adj.degree(i)).or_insert(0) += 1;
    }

    let components = adj.components();
    let is_connected = components.len() == 1;
    let paths = largest_component(&components).map(|idx| {
        let (diameter, avg) = path_stats(adj, &components[idx]);
        if is_connected {
            PathMetrics::Connected {
                diameter,
                average_shortest_path_length: avg,
            }
        } else {
            PathMetrics::LargestComponent {
                largest_component_size: components[idx].len(),
                largest_component_diameter: diameter,
                largest_component_avg_path: avg,
            }
        }
    });

    MetricSet {
        node_count: n,
        edge_count: e,
        density,
        average_degree,
        average_clustering: average_clustering(adj),
        connected_components: components.len(),
        is_connected,
        isolated_nodes: (0..n).filter(|&i| adj.neighbors(i).is_empty()).count(),
        degree_distribution,
        paths,
    }
}

/// Diameter and mean shortest-path length within one connected component.
fn path_stats(adj: &Adjacency, members: &[usize]) -> (usize, f64) {
    let r = members.len();
    if r < 2 {
        return (0, 0.0);
    }
    let mut diameter = 0;
    let mut total = 0usize;
    for &s in members {
        let dist = bfs_distances(adj.node_count(), s, |v| adj.neighbors(v));
        for d in dist.into_iter().flatten() {
            diameter = diameter.max(d);
            total += d;
        }
    }
    (diameter, as_f64(total) / (as_f64(r) * as_f64(r - 1)))
}

/// Local clustering of node `i`: closed triangles over possible ones.
/// Self-loops are ignored; nodes with fewer than two neighbors score 0.
pub(crate) fn local_clustering(adj: &Adjacency, i: usize) -> f64 {
    let nbrs = adj.neighbors(i);
    let k = nbrs.len();
    if k < 2 {
        return 0.0;
    }
    let mut links = 0usize;
    for (x, &a) in nbrs.iter().enumerate() {
        for &b in &nbrs[x + 1..] {
            if adj.is_adjacent(a, b) {
                links += 1;
            }
        }
    }
    2.0 * as_f64(links) / (as_f64(k) * as_f64(k - 1))
}

fn average_clustering(adj: &Adjacency) -> f64 {
    let n = adj.node_count();
    if n == 0 {
        return 0.0;
    }
    (0..n).map(|i| local_clustering(adj, i)).sum::<f64>() / as_f64(n)
}

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
    fn empty_graph_is_all_zero() {
        let m = graph_metrics(&CanonicalGraph::new());
        assert_eq!(m.node_count, 0);
        assert!(m.density.abs() < f64::EPSILON);
        assert!(m.average_degree.abs() < f64::EPSILON);
        assert_eq!(m.connected_components, 0);
        assert!(!m.is_connected);
        assert!(m.paths.is_none());
    }

    #[test]
    fn single_node() {
        let m = graph_metrics(&graph(1, &[]));
        assert!(m.density.abs() < f64::EPSILON);
        assert!(m.is_connected);
        assert_eq!(m.isolated_nodes, 1);
        assert_eq!(
            m.paths,
            Some(PathMetrics::Connected {
                diameter: 0,
                average_shortest_path_length: 0.0
            })
        );
    }

    #[test]
    fn path_of_four() {
        let m = graph_metrics(&graph(4, &[(0, 1), (1, 2), (2, 3)]));
        assert!((m.density - 0.5).abs() < 1e-12);
        assert!((m.average_degree - 1.5).abs() < 1e-12);
        // distances: 1,2,3,1,2,1 -> 10 over 6 pairs
        assert_eq!(
            m.paths,
            Some(PathMetrics::Connected {
                diameter: 3,
                average_shortest_path_length: 10.0 / 6.0
            })
        );
        assert_eq!(m.degree_distribution, BTreeMap::from([(1, 2), (2, 2)]));
    }

    #[test]
    fn disconnected_reports_largest_component() {
        let m = graph_metrics(&graph(6, &[(0, 1), (1, 2), (3, 4)]));
        assert_eq!(m.connected_components, 3);
        assert_eq!(m.isolated_nodes, 1);
        assert_eq!(
            m.paths,
            Some(PathMetrics::LargestComponent {
                largest_component_size: 3,
                largest_component_diameter: 2,
                largest_component_avg_path: 8.0 / 6.0
            })
        );

        let json = serde_json::to_value(&m).unwrap();
        assert!(json.get("diameter").is_none());
        assert_eq!(json["largest_component_size"], 3);
    }

    #[test]
    fn triangle_with_tail_clustering() {
        let g = graph(4, &[(0, 1), (1, 2), (2, 0), (2, 3)]);
        let adj = g.adjacency();
        assert!((local_clustering(adj, 0) - 1.0).abs() < 1e-12);
        assert!((local_clustering(adj, 2) - 1.0 / 3.0).abs() < 1e-12);
        assert!(local_clustering(adj, 3).abs() < 1e-12);
        let m = graph_metrics(&g);
        assert!((m.average_clustering - (1.0 + 1.0 + 1.0 / 3.0) / 4.0).abs() < 1e-12);
    }
}

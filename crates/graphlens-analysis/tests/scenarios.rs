//! End-to-end scenarios: raw input through ingestion into analysis.

use graphlens_analysis::{
    CentralityAlgorithm, CommunityAlgorithm, centrality, compare, detect, graph_metrics,
};
use graphlens_core::generate::{RandomGraphParams, RandomModel, generate};
use graphlens_core::{CanonicalGraph, Edge, FieldMapping, InputFormat, Node, normalize};

fn barbell() -> CanonicalGraph {
    let mut g = CanonicalGraph::new();
    for i in 0..6 {
        g.add_node(Node::new(format!("n{i}")));
    }
    for (a, b) in [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3)] {
        g.add_edge(Edge::new(format!("n{a}"), format!("n{b}"))).unwrap();
    }
    g
}

#[test]
fn csv_triangle_is_complete() {
    let raw = "source,target,weight\nA,B,1\nA,C,2\nB,C,1";
    let g = normalize(raw, InputFormat::Tabular, &FieldMapping::default(), false, true).unwrap();
    assert_eq!(g.node_count(), 3);
    assert_eq!(g.edge_count(), 3);

    let m = graph_metrics(&g);
    assert!((m.density - 1.0).abs() < 1e-12);

    let degree = centrality(&g, CentralityAlgorithm::Degree).unwrap();
    for id in ["A", "B", "C"] {
        assert!((degree.get(id).unwrap() - 1.0).abs() < 1e-12, "{id}");
    }
}

#[test]
fn bridged_triangles_form_two_communities() {
    let result = detect(&barbell(), CommunityAlgorithm::LabelPropagation).unwrap();
    assert_eq!(result.community_count, 2);
    assert_eq!(result.label_of("n0"), result.label_of("n2"));
    assert_ne!(result.label_of("n2"), result.label_of("n3"));
}

#[test]
fn self_comparison_is_empty() {
    let g = generate(&RandomGraphParams::new(RandomModel::ErdosRenyi, 10, 0.3).with_seed(7)).unwrap();
    assert_eq!(g.node_count(), 10);

    let r = compare(&g, &g).unwrap();
    assert!(r.added_nodes.is_empty());
    assert!(r.removed_nodes.is_empty());
    assert!(r.added_edges.is_empty());
    assert!(r.removed_edges.is_empty());
    assert_eq!(r.common_nodes.len(), 10);
    assert!(r.deltas.is_unchanged());
    assert_eq!(r.new_communities, 0);
    assert!(r.community_growth.is_empty());
}

#[test]
fn growing_community_is_reported() {
    let before = barbell();
    let mut after = barbell();
    // Grow the first triangle into a K4.
    after.add_node(Node::new("n6"));
    for peer in ["n0", "n1", "n2"] {
        after.add_edge(Edge::new("n6", peer)).unwrap();
    }

    let r = compare(&before, &after).unwrap();
    assert_eq!(r.added_nodes, ["n6"]);
    assert_eq!(r.added_edges.len(), 3);
    assert!((r.deltas.node_count.growth_pct - 100.0 / 6.0).abs() < 1e-9);
    assert_eq!(r.community_growth.len(), 1);
    let growth = &r.community_growth[0];
    assert_eq!((growth.size_before, growth.size_after), (3, 4));
    assert!((growth.growth_pct - 100.0 / 3.0).abs() < 1e-9);
}

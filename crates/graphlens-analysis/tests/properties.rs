use graphlens_analysis::{CommunityAlgorithm, compare, detect, graph_metrics, modularity};
use graphlens_core::{CanonicalGraph, Edge, Node};
use proptest::prelude::*;

/// Up to 12 nodes, random edges among them (self-loops and repeats
/// included; the graph collapses them).
fn arb_graph() -> impl Strategy<Value = CanonicalGraph> {
    (1usize..12).prop_flat_map(|n| {
        prop::collection::vec((0..n, 0..n), 0..30).prop_map(move |pairs| {
            let mut g = CanonicalGraph::new();
            for i in 0..n {
                g.add_node(Node::new(format!("v{i}")));
            }
            for (a, b) in pairs {
                g.add_edge(Edge::new(format!("v{a}"), format!("v{b}"))).unwrap();
            }
            g
        })
    })
}

fn positions(g: &CanonicalGraph, assignment: &std::collections::BTreeMap<String, usize>) -> Vec<usize> {
    g.nodes().iter().map(|n| assignment[&n.id]).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn density_is_bounded(g in arb_graph()) {
        let m = graph_metrics(&g);
        if g.node_count() <= 1 {
            prop_assert!(m.density.abs() < f64::EPSILON);
        } else {
            prop_assert!((0.0..=1.0).contains(&m.density));
        }
    }

    #[test]
    fn largest_component_fits_in_graph(g in arb_graph()) {
        let m = graph_metrics(&g);
        let json = serde_json::to_value(&m).unwrap();
        if m.is_connected {
            prop_assert!(json.get("largest_component_size").is_none());
        } else {
            prop_assert!(json.get("diameter").is_none());
            let size = json["largest_component_size"].as_u64().unwrap();
            prop_assert!(usize::try_from(size).unwrap() <= m.node_count);
        }
    }

    #[test]
    fn reported_modularity_matches_recomputation(g in arb_graph()) {
        for algorithm in CommunityAlgorithm::ALL {
            let result = detect(&g, algorithm).unwrap();
            let labels = positions(&g, &result.assignment);
            let q = modularity(g.adjacency(), &labels);
            prop_assert!((q - result.modularity).abs() < 1e-6, "{algorithm}");
            prop_assert_eq!(result.sizes().iter().sum::<usize>(), g.node_count());
        }
    }

    #[test]
    fn comparison_is_anti_symmetric(a in arb_graph(), b in arb_graph()) {
        let forward = compare(&a, &b).unwrap();
        let backward = compare(&b, &a).unwrap();
        prop_assert_eq!(&forward.added_nodes, &backward.removed_nodes);
        prop_assert_eq!(&forward.removed_nodes, &backward.added_nodes);
        prop_assert_eq!(&forward.added_edges, &backward.removed_edges);
        prop_assert_eq!(&forward.common_edges, &backward.common_edges);
    }
}

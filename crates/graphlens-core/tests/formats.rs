//! The same small network expressed in each supported format must normalize
//! to the same structure.

use graphlens_core::config::IngestConfig;
use graphlens_core::{InputFormat, Normalizer};

const CSV: &str = "\
source,target,weight,label
alice,bob,2,Alice
bob,carol,1,Bob
carol,alice,1,Carol
carol,dave,3,Carol
";

const JSON: &str = r#"{
  "nodes": [
    {"id": "alice", "label": "Alice"},
    {"id": "bob", "label": "Bob"},
    {"id": "carol", "label": "Carol"},
    {"id": "dave"}
  ],
  "links": [
    {"source": "alice", "target": "bob", "value": 2},
    {"source": "bob", "target": "carol"},
    {"source": "carol", "target": "alice"},
    {"source": "carol", "target": "dave", "weight": 3}
  ]
}"#;

const GRAPHML: &str = r#"<?xml version="1.0"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="l" for="node" attr.name="label" attr.type="string"/>
  <key id="w" for="edge" attr.name="weight" attr.type="double"><default>1</default></key>
  <graph edgedefault="undirected">
    <node id="alice"><data key="l">Alice</data></node>
    <node id="bob"><data key="l">Bob</data></node>
    <node id="carol"><data key="l">Carol</data></node>
    <node id="dave"/>
    <edge source="alice" target="bob"><data key="w">2</data></edge>
    <edge source="bob" target="carol"/>
    <edge source="carol" target="alice"/>
    <edge source="carol" target="dave"><data key="w">3</data></edge>
  </graph>
</graphml>"#;

fn normalizer(anonymize: bool) -> Normalizer {
    Normalizer::new(IngestConfig {
        anonymize,
        ..IngestConfig::default()
    })
}

#[test]
fn all_formats_agree_on_structure() {
    let n = normalizer(false);
    let graphs = [
        n.normalize("net.csv", CSV, InputFormat::Tabular).unwrap().graph,
        n.normalize("net.json", JSON, InputFormat::Json).unwrap().graph,
        n.normalize("net.graphml", GRAPHML, InputFormat::GraphMl).unwrap().graph,
    ];

    let hash = graphs[0].content_hash();
    for g in &graphs {
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.content_hash(), hash);
        assert_eq!(g.node("alice").unwrap().label, "Alice");
        assert_eq!(g.node("dave").unwrap().label, "dave");

        let heavy = g
            .edges()
            .iter()
            .find(|e| e.source == "carol" && e.target == "dave")
            .unwrap();
        assert!((heavy.weight - 3.0).abs() < f64::EPSILON);
    }
}

#[test]
fn anonymized_formats_agree_and_hide_ids() {
    let n = normalizer(true);
    let csv = n.normalize("net.csv", CSV, InputFormat::Tabular).unwrap().graph;
    let json = n.normalize("net.json", JSON, InputFormat::Json).unwrap().graph;

    assert_eq!(csv.content_hash(), json.content_hash());
    for node in csv.nodes() {
        assert!(!node.id.contains("alice"));
        assert_eq!(node.id.len(), 64);
    }
}

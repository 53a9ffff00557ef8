//! E2E tests for the analysis commands:
//! `graphlens metrics`, `centrality`, `communities`, `predict`, `compare`.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test harness helpers
// ---------------------------------------------------------------------------

fn graphlens(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("graphlens"));
    cmd.current_dir(dir);
    cmd.env("GRAPHLENS_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join(".xdg"));
    cmd.env_remove("FORMAT");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn json_of(cmd: &mut Command) -> Value {
    let output = cmd.arg("--json").output().expect("command should not crash");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
}

const TRIANGLE: &str = "source,target,weight\nA,B,1\nA,C,2\nB,C,1\n";

const BARBELL: &str = "source,target\na,b\nb,c\nc,a\nd,e\ne,f\nf,d\nc,d\n";

// ---------------------------------------------------------------------------
// metrics / centrality
// ---------------------------------------------------------------------------

#[test]
fn metrics_on_a_triangle() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "tri.csv", TRIANGLE);

    let m = json_of(graphlens(dir.path()).args(["metrics", "tri.csv"]));
    assert_eq!(m["node_count"], 3);
    assert_eq!(m["edge_count"], 3);
    assert_eq!(m["density"], 1.0);
    assert_eq!(m["is_connected"], true);
    assert_eq!(m["diameter"], 1);
    assert!(m.get("largest_component_size").is_none());
}

#[test]
fn centrality_reports_every_algorithm() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "tri.csv", TRIANGLE);

    let batch = json_of(graphlens(dir.path()).args(["centrality", "tri.csv"]));
    let results = batch["results"].as_array().unwrap();
    assert_eq!(results.len(), 4);
    let degree = results.iter().find(|r| r["algorithm"] == "degree").unwrap();
    for id in ["A", "B", "C"] {
        assert_eq!(degree["scores"][id], 1.0);
    }
    assert!(batch["unavailable"].as_array().unwrap().is_empty());
}

#[test]
fn eigenvector_failure_does_not_block_other_centralities() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "split.csv", "source,target\na,b\nc,d\n");

    let batch = json_of(graphlens(dir.path()).args([
        "centrality",
        "split.csv",
        "-a",
        "eigenvector",
        "-a",
        "degree",
    ]));
    assert_eq!(batch["results"].as_array().unwrap().len(), 1);
    assert_eq!(batch["unavailable"][0]["algorithm"], "eigenvector");
    assert_eq!(batch["unavailable"][0]["code"], "E2003");
}

#[test]
fn text_output_is_tab_separated() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "tri.csv", TRIANGLE);

    graphlens(dir.path())
        .args(["metrics", "tri.csv", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("density\t1.0000"));
}

// ---------------------------------------------------------------------------
// communities / predict
// ---------------------------------------------------------------------------

#[test]
fn label_propagation_splits_the_barbell() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "barbell.csv", BARBELL);

    let r = json_of(graphlens(dir.path()).args([
        "communities",
        "barbell.csv",
        "-a",
        "label_propagation",
    ]));
    assert_eq!(r["community_count"], 2);
    assert_eq!(r["algorithm"], "label_propagation");
    assert_eq!(r["assignment"]["a"], r["assignment"]["c"]);
    assert_ne!(r["assignment"]["c"], r["assignment"]["d"]);
}

#[test]
fn unknown_community_algorithm_resolves_to_label_propagation() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "barbell.csv", BARBELL);

    let r = json_of(graphlens(dir.path()).args(["communities", "barbell.csv", "-a", "infomap"]));
    assert_eq!(r["algorithm"], "label_propagation");
}

#[test]
fn girvan_newman_capacity_error_is_structured() {
    let dir = TempDir::new().unwrap();
    let mut csv = String::from("source,target\n");
    for i in 0..120 {
        csv.push_str(&format!("n{i},n{}\n", i + 1));
    }
    write(dir.path(), "long.csv", &csv);

    let output = graphlens(dir.path())
        .args(["communities", "long.csv", "-a", "girvan_newman", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("JSON error on stderr");
    assert_eq!(err["code"], "E2002");
    assert!(err["error"].as_str().unwrap().contains("121"));
    assert!(err["hint"].is_string());
}

#[test]
fn predict_links_uses_the_heuristic() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "path.csv", "source,target\na,b\nb,c\n");

    let p = json_of(graphlens(dir.path()).args(["predict", "links", "path.csv", "-k", "3"]));
    assert_eq!(p["source"]["kind"], "heuristic");
    assert_eq!(p["source"]["algorithm"], "jaccard");
    assert_eq!(p["items"][0]["source"], "a");
    assert_eq!(p["items"][0]["target"], "c");
    assert_eq!(p["items"][0]["score"], 1.0);
}

#[test]
fn predict_activity_ranks_by_degree() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "path.csv", "source,target\na,b\nb,c\n");

    let p = json_of(graphlens(dir.path()).args(["predict", "activity", "path.csv"]));
    assert_eq!(p["source"]["algorithm"], "degree");
    assert_eq!(p["items"][0]["id"], "b");
    assert_eq!(p["items"][0]["degree"], 2);
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

#[test]
fn compare_is_anti_symmetric() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "old.csv", "source,target\na,b\nb,c\n");
    write(dir.path(), "new.csv", "source,target\na,b\nb,d\n");

    let forward = json_of(graphlens(dir.path()).args(["compare", "old.csv", "new.csv"]));
    let backward = json_of(graphlens(dir.path()).args(["compare", "new.csv", "old.csv"]));
    assert_eq!(forward["added_nodes"], backward["removed_nodes"]);
    assert_eq!(forward["added_nodes"], serde_json::json!(["d"]));
    assert_eq!(forward["removed_edges"], serde_json::json!([["b", "c"]]));
}

#[test]
fn self_comparison_has_zero_deltas() {
    let dir = TempDir::new().unwrap();
    graphlens(dir.path())
        .args(["generate", "-n", "10", "-d", "0.4", "--seed", "3", "-o", "g.json"])
        .assert()
        .success();

    let r = json_of(graphlens(dir.path()).args(["compare", "g.json", "g.json"]));
    assert!(r["added_nodes"].as_array().unwrap().is_empty());
    assert!(r["removed_edges"].as_array().unwrap().is_empty());
    assert_eq!(r["common_nodes"].as_array().unwrap().len(), 10);
    for key in ["node_count", "edge_count", "density", "average_degree"] {
        assert_eq!(r["deltas"][key]["delta"], 0.0, "{key}");
    }
}

#[test]
fn compare_reports_diameter_change() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "short.csv", "source,target\na,b\nb,c\n");
    write(dir.path(), "long.csv", "source,target\na,b\nb,c\nc,d\n");

    let r = json_of(graphlens(dir.path()).args(["compare", "short.csv", "long.csv"]));
    assert_eq!(r["deltas"]["diameter"]["before"], 2.0);
    assert_eq!(r["deltas"]["diameter"]["after"], 3.0);

    graphlens(dir.path())
        .args(["compare", "short.csv", "long.csv", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("diameter\t"));
}

#[test]
fn missing_graph_is_a_clean_error() {
    let dir = TempDir::new().unwrap();
    graphlens(dir.path())
        .args(["metrics", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E3001"));
}

//! Semi-synchronous label propagation.
//!
//! Nodes are greedily colored so that no two neighbors share a color, then
//! updated one color class at a time. A node adopts the most frequent label
//! among its neighbors; on a tie it keeps its own label if that is among
//! the most frequent, else it takes the largest. Propagation stops once every
//! node already holds a most-frequent label, or after `max_rounds`.
//!
//! Labels start as node positions and colors are assigned in position order,
//! so results are deterministic.

use std::collections::BTreeMap;

use graphlens_core::Adjacency;
use tracing::debug;

use super::densify;

fn greedy_coloring(adj: &Adjacency) -> Vec<Vec<usize>> {
    let n = adj.node_count();
    let mut color: Vec<Option<usize>> = vec![None; n];
    let mut classes: Vec<Vec<usize>> = Vec::new();
    for v in 0..n {
        let used: Vec<usize> = adj.neighbors(v).iter().filter_map(|&w| color[w]).collect();
        let mut c = 0;
        while used.contains(&c) {
            c += 1;
        }
        color[v] = Some(c);
        if c == classes.len() {
            classes.push(Vec::new());
        }
        classes[c].push(v);
    }
    classes
}

fn most_frequent(adj: &Adjacency, labels: &[usize], v: usize) -> Vec<usize> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for &w in adj.neighbors(v) {
        *counts.entry(labels[w]).or_insert(0) += 1;
    }
    let Some(&best) = counts.values().max() else {
        return Vec::new();
    };
    counts
        .into_iter()
        .filter(|&(_, c)| c == best)
        .map(|(l, _)| l)
        .collect()
}

fn is_stable(adj: &Adjacency, labels: &[usize]) -> bool {
    (0..labels.len()).all(|v| {
        let high = most_frequent(adj, labels, v);
        high.is_empty() || high.contains(&labels[v])
    })
}

pub(super) fn label_propagation(adj: &Adjacency, max_rounds: usize) -> Vec<usize> {
    let mut labels: Vec<usize> = (0..adj.node_count()).collect();
    let classes = greedy_coloring(adj);

    let mut rounds = 0;
    while rounds < max_rounds && !is_stable(adj, &labels) {
        rounds += 1;
        for class in &classes {
            for &v in class {
                let high = most_frequent(adj, &labels, v);
                match high.as_slice() {
                    [] => {}
                    [only] => labels[v] = *only,
                    many => {
                        if !many.contains(&labels[v]) {
                            // Sorted ascending, so the last is the largest.
                            if let Some(&max) = many.last() {
                                labels[v] = max;
                            }
                        }
                    }
                }
            }
        }
    }
    debug!(rounds, "label propagation finished");

    densify(&labels)
}

//! First split of the Girvan–Newman hierarchy.
//!
//! The edge with the highest betweenness is removed, betweenness is
//! recomputed, and so on until the graph has more connected components than
//! it started with. Those components are the communities. On ties the edge
//! with the smallest `(source, target)` position pair goes first.

use std::collections::VecDeque;

use graphlens_core::Adjacency;
use tracing::debug;

use crate::deadline::Deadline;
use crate::error::AnalysisError;
use crate::metrics::betweenness::edge_betweenness;

const ALGORITHM: &str = "girvan_newman";

fn component_labels(lists: &[Vec<usize>]) -> (usize, Vec<usize>) {
    let n = lists.len();
    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut count = 0;
    for start in 0..n {
        if labels[start].is_some() {
            continue;
        }
        labels[start] = Some(count);
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            for &w in &lists[v] {
                if labels[w].is_none() {
                    labels[w] = Some(count);
                    queue.push_back(w);
                }
            }
        }
        count += 1;
    }
    (count, labels.into_iter().map(|l| l.unwrap_or(0)).collect())
}

/// # Errors
///
/// - [`AnalysisError::CapacityExceeded`] when the graph has more than `limit`
///   nodes.
/// - [`AnalysisError::Timeout`] when `deadline` expires between removals.
pub(super) fn first_split(
    adj: &Adjacency,
    limit: usize,
    deadline: &Deadline,
) -> Result<Vec<usize>, AnalysisError> {
    let n = adj.node_count();
    if n > limit {
        return Err(AnalysisError::CapacityExceeded {
            algorithm: ALGORITHM,
            node_count: n,
            limit,
        });
    }

    let mut lists: Vec<Vec<usize>> = (0..n).map(|v| adj.neighbors(v).to_vec()).collect();
    let (initial, mut labels) = component_labels(&lists);
    let mut removed = 0usize;

    loop {
        deadline.check(ALGORITHM, n)?;
        let scores = edge_betweenness(n, |v| lists[v].as_slice());
        let mut best: Option<((usize, usize), f64)> = None;
        for (&edge, &score) in &scores {
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((edge, score));
            }
        }
        let Some(((a, b), _)) = best else {
            break;
        };
        lists[a].retain(|&x| x != b);
        lists[b].retain(|&x| x != a);
        removed += 1;

        let (count, split) = component_labels(&lists);
        if count > initial {
            labels = split;
            break;
        }
    }
    debug!(removed, "girvan-newman split");

    Ok(labels)
}

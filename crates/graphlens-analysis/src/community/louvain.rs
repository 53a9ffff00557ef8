//! Louvain modularity optimization.
//!
//! Each level runs local moving (every node joins the neighboring community
//! with the best positive modularity gain, repeated until no node moves),
//! then collapses communities into super-nodes. Levels stop when local
//! moving changes nothing or `max_levels` is reached.
//!
//! Nodes are visited in position order and ties keep the current
//! community, so results are deterministic.

use std::collections::BTreeMap;

use graphlens_core::Adjacency;
use tracing::debug;

use super::densify;

/// Cap on local-moving sweeps per level.
const MAX_SWEEPS: usize = 1000;

/// Minimum gain treated as an improvement.
const MIN_GAIN: f64 = 1e-12;

/// Weighted graph for one aggregation level.
struct Level {
    links: Vec<Vec<(usize, f64)>>,
    /// Weight of edges collapsed inside each super-node.
    loops: Vec<f64>,
    strength: Vec<f64>,
    two_m: f64,
}

impl Level {
    fn from_adjacency(adj: &Adjacency) -> Self {
        let n = adj.node_count();
        let links = (0..n)
            .map(|i| adj.neighbors(i).iter().map(|&j| (j, 1.0)).collect())
            .collect();
        let loops = (0..n)
            .map(|i| if adj.has_self_loop(i) { 1.0 } else { 0.0 })
            .collect();
        Self::with_strength(links, loops)
    }

    fn with_strength(links: Vec<Vec<(usize, f64)>>, loops: Vec<f64>) -> Self {
        let strength: Vec<f64> = links
            .iter()
            .zip(&loops)
            .map(|(l, s)| l.iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * s)
            .collect();
        let two_m = strength.iter().sum();
        Self {
            links,
            loops,
            strength,
            two_m,
        }
    }

    /// Returns whether any node moved, and each node's community.
    fn local_moving(&self) -> (bool, Vec<usize>) {
        let n = self.links.len();
        let mut comm: Vec<usize> = (0..n).collect();
        if self.two_m <= 0.0 {
            return (false, comm);
        }
        let mut tot = self.strength.clone();
        let mut weight_to = vec![0.0_f64; n];
        let mut touched: Vec<usize> = Vec::new();
        let mut moved_any = false;

        for _ in 0..MAX_SWEEPS {
            let mut moved = false;
            for i in 0..n {
                let ci = comm[i];
                let ki = self.strength[i];

                for &(j, w) in &self.links[i] {
                    let cj = comm[j];
                    if weight_to[cj] == 0.0 {
                        touched.push(cj);
                    }
                    weight_to[cj] += w;
                }

                tot[ci] -= ki;
                let gain = |c: usize| weight_to[c] - tot[c] * ki / self.two_m;
                let mut best = ci;
                let mut best_gain = gain(ci);
                for &c in &touched {
                    let g = gain(c);
                    if g > best_gain + MIN_GAIN {
                        best = c;
                        best_gain = g;
                    }
                }
                tot[best] += ki;
                comm[i] = best;
                if best != ci {
                    moved = true;
                    moved_any = true;
                }

                for c in touched.drain(..) {
                    weight_to[c] = 0.0;
                }
            }
            if !moved {
                break;
            }
        }
        (moved_any, comm)
    }

    /// Collapse dense community labels into a new level.
    fn aggregate(&self, comm: &[usize]) -> Self {
        let k = comm.iter().max().map_or(0, |m| m + 1);
        let mut maps: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); k];
        let mut loops = vec![0.0; k];
        for (i, &ci) in comm.iter().enumerate() {
            loops[ci] += self.loops[i];
            for &(j, w) in &self.links[i] {
                let cj = comm[j];
                if ci == cj {
                    if i < j {
                        loops[ci] += w;
                    }
                } else {
                    *maps[ci].entry(cj).or_insert(0.0) += w;
                }
            }
        }
        let links = maps.into_iter().map(|m| m.into_iter().collect()).collect();
        Self::with_strength(links, loops)
    }
}

/// Partition node positions; labels are dense in first-seen order.
pub(super) fn louvain(adj: &Adjacency, max_levels: usize) -> Vec<usize> {
    let mut membership: Vec<usize> = (0..adj.node_count()).collect();
    let mut level = Level::from_adjacency(adj);

    for depth in 0..max_levels.max(1) {
        let (moved, comm) = level.local_moving();
        if !moved {
            break;
        }
        let comm = densify(&comm);
        for m in &mut membership {
            *m = comm[*m];
        }
        level = level.aggregate(&comm);
        debug!(depth, communities = level.links.len(), "louvain level");
    }

    densify(&membership)
}

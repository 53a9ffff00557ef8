//! Random graph generation for demos, benchmarks and tests.
//!
//! Three classic models are supported. The density parameter means the edge
//! probability for Erdős–Rényi and scales the attachment count or lattice
//! degree for the other two:
//!
//! | Model | Parameter |
//! |-------|-----------|
//! | `erdos_renyi` | `p = density` |
//! | `barabasi_albert` | `m = clamp(floor(density * n), 1, n - 1)` |
//! | `watts_strogatz` | `k = max(2, floor(density * n))`, even, `<= n - 1`; rewiring `beta` |
//!
//! Output never contains self-loops or duplicate edges.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::GenerateError;
use crate::graph::{CanonicalGraph, Edge, Node};

/// Default Watts–Strogatz rewiring probability.
pub const DEFAULT_REWIRING: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomModel {
    ErdosRenyi,
    BarabasiAlbert,
    WattsStrogatz,
}

impl FromStr for RandomModel {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "erdos_renyi" | "random" => Ok(Self::ErdosRenyi),
            "barabasi_albert" | "scale_free" => Ok(Self::BarabasiAlbert),
            "watts_strogatz" | "small_world" => Ok(Self::WattsStrogatz),
            _ => Err(GenerateError::UnknownModel(s.to_string())),
        }
    }
}

impl fmt::Display for RandomModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ErdosRenyi => "erdos_renyi",
            Self::BarabasiAlbert => "barabasi_albert",
            Self::WattsStrogatz => "watts_strogatz",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomGraphParams {
    pub model: RandomModel,
    pub node_count: usize,
    pub density: f64,
    /// Watts–Strogatz only.
    pub rewiring: f64,
    /// Fixed seed for reproducible output; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl RandomGraphParams {
    #[must_use]
    pub const fn new(model: RandomModel, node_count: usize, density: f64) -> Self {
        Self {
            model,
            node_count,
            density,
            rewiring: DEFAULT_REWIRING,
            seed: None,
        }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn with_rewiring(mut self, rewiring: f64) -> Self {
        self.rewiring = rewiring;
        self
    }

    fn validate(&self) -> Result<(), GenerateError> {
        for (name, value) in [("density", self.density), ("rewiring", self.rewiring)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GenerateError::InvalidParameters { name, value });
            }
        }
        Ok(())
    }
}

/// Generate a random graph.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidParameters`] when density or rewiring
/// lies outside `[0, 1]` (NaN included).
#[instrument]
pub fn generate(params: &RandomGraphParams) -> Result<CanonicalGraph, GenerateError> {
    params.validate()?;
    let mut rng = params
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

    let n = params.node_count;
    let pairs = match params.model {
        RandomModel::ErdosRenyi => erdos_renyi(n, params.density, &mut rng),
        RandomModel::BarabasiAlbert => barabasi_albert(n, params.density, &mut rng),
        RandomModel::WattsStrogatz => {
            watts_strogatz(n, params.density, params.rewiring, &mut rng)
        }
    };
    debug!(edges = pairs.len(), "generated edge set");

    let mut g = CanonicalGraph::new();
    for i in 0..n {
        g.add_node(Node::new(i.to_string()).with_label(format!("Node {i}")));
    }
    for (a, b) in pairs {
        g.add_edge(Edge::new(a.to_string(), b.to_string()))?;
    }
    Ok(g)
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled(density: f64, n: usize) -> usize {
    (density * n as f64).floor() as usize
}

fn erdos_renyi(n: usize, p: f64, rng: &mut StdRng) -> BTreeSet<(usize, usize)> {
    let mut pairs = BTreeSet::new();
    for a in 0..n {
        for b in (a + 1)..n {
            if rng.gen_bool(p) {
                pairs.insert((a, b));
            }
        }
    }
    pairs
}

/// Preferential attachment: each new node attaches to `m` distinct existing
/// nodes sampled proportionally to degree.
fn barabasi_albert(n: usize, density: f64, rng: &mut StdRng) -> BTreeSet<(usize, usize)> {
    let mut pairs = BTreeSet::new();
    if n < 2 {
        return pairs;
    }
    let m = scaled(density, n).clamp(1, n - 1);

    let mut targets: Vec<usize> = (0..m).collect();
    let mut repeated: Vec<usize> = Vec::with_capacity(2 * n * m);
    for source in m..n {
        for &t in &targets {
            pairs.insert((t.min(source), t.max(source)));
        }
        repeated.extend(targets.iter().copied());
        repeated.extend(std::iter::repeat_n(source, m));

        let mut next = BTreeSet::new();
        while next.len() < m {
            if let Some(&pick) = repeated.choose(rng) {
                next.insert(pick);
            }
        }
        targets = next.into_iter().collect();
    }
    pairs
}

/// Ring lattice of degree `k`, then each lattice edge is rewired with
/// probability `beta` to a uniformly chosen non-neighbor.
fn watts_strogatz(
    n: usize,
    density: f64,
    beta: f64,
    rng: &mut StdRng,
) -> BTreeSet<(usize, usize)> {
    let mut k = scaled(density, n).max(2).min(n.saturating_sub(1));
    k -= k % 2;
    let half = k / 2;

    let mut adj: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for u in 0..n {
        for j in 1..=half {
            let v = (u + j) % n;
            adj[u].insert(v);
            adj[v].insert(u);
        }
    }

    for j in 1..=half {
        for u in 0..n {
            let v = (u + j) % n;
            if !adj[u].contains(&v) || !rng.gen_bool(beta) {
                continue;
            }
            if adj[u].len() >= n - 1 {
                continue;
            }
            let w = loop {
                let w = rng.gen_range(0..n);
                if w != u && !adj[u].contains(&w) {
                    break w;
                }
            };
            adj[u].remove(&v);
            adj[v].remove(&u);
            adj[u].insert(w);
            adj[w].insert(u);
        }
    }

    adj.iter()
        .enumerate()
        .flat_map(|(u, nbrs)| nbrs.iter().filter(move |&&v| u < v).map(move |&v| (u, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_self_loops(g: &CanonicalGraph) -> bool {
        g.edges().iter().all(|e| e.source != e.target)
    }

    #[test]
    fn erdos_renyi_extremes() {
        let empty = generate(&RandomGraphParams::new(RandomModel::ErdosRenyi, 10, 0.0)).unwrap();
        assert_eq!(empty.node_count(), 10);
        assert_eq!(empty.edge_count(), 0);

        let full = generate(&RandomGraphParams::new(RandomModel::ErdosRenyi, 10, 1.0)).unwrap();
        assert_eq!(full.edge_count(), 45);
    }

    #[test]
    fn nodes_are_numbered_and_labelled() {
        let g = generate(&RandomGraphParams::new(RandomModel::ErdosRenyi, 3, 0.5).with_seed(1))
            .unwrap();
        let ids: Vec<&str> = g.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["0", "1", "2"]);
        assert_eq!(g.nodes()[2].label, "Node 2");
        assert_eq!(g.nodes()[2].group, 1);
    }

    #[test]
    fn barabasi_albert_edge_count() {
        // m = floor(0.2 * 20) = 4; each of the 16 later nodes adds 4 edges.
        let g = generate(&RandomGraphParams::new(RandomModel::BarabasiAlbert, 20, 0.2).with_seed(7))
            .unwrap();
        assert_eq!(g.edge_count(), 16 * 4);
        assert!(no_self_loops(&g));
    }

    #[test]
    fn watts_strogatz_preserves_edge_count() {
        // k = floor(0.3 * 20) = 6; ring lattice has n * k / 2 edges.
        let params = RandomGraphParams::new(RandomModel::WattsStrogatz, 20, 0.3)
            .with_rewiring(0.5)
            .with_seed(3);
        let g = generate(&params).unwrap();
        assert_eq!(g.edge_count(), 60);
        assert!(no_self_loops(&g));
    }

    #[test]
    fn watts_strogatz_without_rewiring_is_a_lattice() {
        let params = RandomGraphParams::new(RandomModel::WattsStrogatz, 8, 0.25)
            .with_rewiring(0.0)
            .with_seed(0);
        let g = generate(&params).unwrap();
        assert_eq!(g.edge_count(), 8);
        assert!(g.contains_edge("7", "0"));
    }

    #[test]
    fn seed_makes_output_reproducible() {
        let p = RandomGraphParams::new(RandomModel::ErdosRenyi, 30, 0.3).with_seed(42);
        assert_eq!(
            generate(&p).unwrap().content_hash(),
            generate(&p).unwrap().content_hash()
        );
    }

    #[test]
    fn out_of_range_density_is_rejected() {
        let err = generate(&RandomGraphParams::new(RandomModel::ErdosRenyi, 5, 1.5)).unwrap_err();
        assert_eq!(
            err,
            GenerateError::InvalidParameters {
                name: "density",
                value: 1.5
            }
        );
        assert!(generate(&RandomGraphParams::new(RandomModel::ErdosRenyi, 5, f64::NAN)).is_err());
    }

    #[test]
    fn model_names_parse() {
        assert_eq!("barabasi-albert".parse::<RandomModel>().unwrap(), RandomModel::BarabasiAlbert);
        assert_eq!("small_world".parse::<RandomModel>().unwrap(), RandomModel::WattsStrogatz);
        assert!("lattice".parse::<RandomModel>().is_err());
    }

    #[test]
    fn tiny_graphs_do_not_panic() {
        for model in [
            RandomModel::ErdosRenyi,
            RandomModel::BarabasiAlbert,
            RandomModel::WattsStrogatz,
        ] {
            for n in 0..3 {
                let g = generate(&RandomGraphParams::new(model, n, 1.0).with_seed(0)).unwrap();
                assert_eq!(g.node_count(), n);
            }
        }
    }
}

//! Heuristic (untrained) link scoring.
//!
//! # Overview
//!
//! Every non-adjacent pair `(u, v)` with `u` before `v` in node insertion
//! order is scored with one of four neighborhood heuristics:
//!
//! | Algorithm | Score |
//! |-----------|-------|
//! | `common_neighbors` | `|N(u) ∩ N(v)|` |
//! | `jaccard` | `|N(u) ∩ N(v)| / |N(u) ∪ N(v)|` (0 when the union is empty) |
//! | `adamic_adar` | `Σ 1 / ln(deg(z))` over shared neighbors with `deg(z) >= 2` |
//! | `preferential_attachment` | `deg(u) * deg(v)` |
//!
//! Pairs are sorted by descending score with a stable sort, so equal scores
//! keep enumeration order. Output is always truncated: a missing `top_k`
//! means the configured default, and any `top_k` is clamped to the
//! configured maximum.

pub mod predictor;

use std::fmt;

use graphlens_core::config::AnalysisConfig;
use graphlens_core::{Adjacency, CanonicalGraph};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::metrics::as_f64;

pub use predictor::{
    ActivityScore, NodeRank, PredictiveScorer, Prediction, Predictor, ScoreSource, ScorerError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkAlgorithm {
    CommonNeighbors,
    Jaccard,
    AdamicAdar,
    PreferentialAttachment,
}

impl LinkAlgorithm {
    pub const ALL: [Self; 4] = [
        Self::CommonNeighbors,
        Self::Jaccard,
        Self::AdamicAdar,
        Self::PreferentialAttachment,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CommonNeighbors => "common_neighbors",
            Self::Jaccard => "jaccard",
            Self::AdamicAdar => "adamic_adar",
            Self::PreferentialAttachment => "preferential_attachment",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// Name lookup where unknown names resolve to [`Self::CommonNeighbors`].
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            warn!(requested = name, "unknown link algorithm, using common_neighbors");
            Self::CommonNeighbors
        })
    }

    fn score(self, adj: &Adjacency, u: usize, v: usize) -> f64 {
        match self {
            Self::CommonNeighbors => as_f64(shared(adj, u, v).count()),
            Self::Jaccard => {
                let common = shared(adj, u, v).count();
                let union = adj.neighbors(u).len() + adj.neighbors(v).len() - common;
                if union == 0 {
                    0.0
                } else {
                    as_f64(common) / as_f64(union)
                }
            }
            Self::AdamicAdar => shared(adj, u, v)
                .map(|z| adj.degree(z))
                .filter(|&d| d >= 2)
                .map(|d| 1.0 / as_f64(d).ln())
                .sum(),
            Self::PreferentialAttachment => as_f64(adj.degree(u)) * as_f64(adj.degree(v)),
        }
    }
}

impl fmt::Display for LinkAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate link between two currently unconnected nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkScore {
    pub source: String,
    pub target: String,
    pub score: f64,
}

/// Shared neighbors of `u` and `v` via a merge over the sorted lists.
fn shared<'a>(adj: &'a Adjacency, u: usize, v: usize) -> impl Iterator<Item = usize> + 'a {
    let (a, b) = (adj.neighbors(u), adj.neighbors(v));
    let (mut i, mut j) = (0, 0);
    std::iter::from_fn(move || {
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    let z = a[i];
                    i += 1;
                    j += 1;
                    return Some(z);
                }
            }
        }
        None
    })
}

/// Clamp a requested result length against the configured policy.
#[must_use]
pub fn effective_top_k(top_k: Option<usize>, config: &AnalysisConfig) -> usize {
    top_k
        .unwrap_or(config.link_top_k)
        .min(config.max_link_top_k)
}

/// Score non-adjacent pairs with default truncation policy.
#[must_use]
pub fn predict_links(
    g: &CanonicalGraph,
    algorithm: LinkAlgorithm,
    top_k: Option<usize>,
) -> Vec<LinkScore> {
    predict_links_with(g, algorithm, top_k, &AnalysisConfig::default())
}

/// Score non-adjacent pairs, best first, truncated per `config`.
#[must_use]
#[instrument(skip(g, config), fields(nodes = g.node_count()))]
pub fn predict_links_with(
    g: &CanonicalGraph,
    algorithm: LinkAlgorithm,
    top_k: Option<usize>,
    config: &AnalysisConfig,
) -> Vec<LinkScore> {
    let limit = effective_top_k(top_k, config);
    if limit == 0 {
        return Vec::new();
    }
    let adj = g.adjacency();
    let n = adj.node_count();

    let mut scored: Vec<(usize, usize, f64)> = Vec::new();
    for u in 0..n {
        for v in (u + 1)..n {
            if !adj.is_adjacent(u, v) {
                scored.push((u, v, algorithm.score(adj, u, v)));
            }
        }
    }
    scored.sort_by(|a, b| b.2.total_cmp(&a.2));
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|(u, v, score)| LinkScore {
            source: g.id_at(u).to_string(),
            target: g.id_at(v).to_string(),
            score,
        })
        .collect()
}

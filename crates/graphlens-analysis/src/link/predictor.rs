//! Pluggable predictive scorer with heuristic fallback.
//!
//! A trained model lives outside this crate and plugs in through
//! [`PredictiveScorer`]. [`Predictor`] calls it when present and degrades to
//! the structural heuristics when it is absent or fails. Callers always get
//! a ranking; [`Prediction::source`] records which provider produced it.

use graphlens_core::CanonicalGraph;
use graphlens_core::config::AnalysisConfig;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::{LinkAlgorithm, LinkScore, effective_top_k, predict_links_with};
use crate::metrics::degree::degree_centrality;

/// Failure reported by an external scorer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScorerError {
    /// The scorer has no model for this graph yet.
    #[error("scorer '{name}' is not trained")]
    NotTrained { name: String },

    #[error("scorer '{name}' failed: {reason}")]
    Failed { name: String, reason: String },
}

/// A node ranked by an external scorer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRank {
    pub id: String,
    pub score: f64,
}

/// External ranking provider, e.g. a trained link or activity model.
pub trait PredictiveScorer: Send + Sync {
    fn name(&self) -> &str;

    /// Rank candidate links, best first.
    ///
    /// # Errors
    ///
    /// Any error makes the caller fall back to heuristics.
    fn rank_links(&self, g: &CanonicalGraph, top_k: usize) -> Result<Vec<LinkScore>, ScorerError>;

    /// Rank nodes by predicted activity, best first.
    ///
    /// # Errors
    ///
    /// Any error makes the caller fall back to heuristics.
    fn rank_nodes(&self, g: &CanonicalGraph, top_k: usize) -> Result<Vec<NodeRank>, ScorerError>;
}

/// Which provider produced a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreSource {
    Trained { name: String },
    Heuristic { algorithm: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction<T> {
    pub source: ScoreSource,
    pub items: Vec<T>,
}

/// A node's predicted activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityScore {
    pub id: String,
    pub label: String,
    pub score: f64,
    pub degree: usize,
}

/// Ranking front-end: trained scorer first, heuristics otherwise.
pub struct Predictor {
    scorer: Option<Box<dyn PredictiveScorer>>,
    fallback_link: LinkAlgorithm,
    config: AnalysisConfig,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("scorer", &self.scorer.as_ref().map(|s| s.name().to_string()))
            .field("fallback_link", &self.fallback_link)
            .finish_non_exhaustive()
    }
}

impl Predictor {
    /// Heuristics only; link fallback is Jaccard.
    #[must_use]
    pub const fn new(config: AnalysisConfig) -> Self {
        Self {
            scorer: None,
            fallback_link: LinkAlgorithm::Jaccard,
            config,
        }
    }

    #[must_use]
    pub fn with_scorer(mut self, scorer: Box<dyn PredictiveScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    #[must_use]
    pub const fn with_fallback_link(mut self, algorithm: LinkAlgorithm) -> Self {
        self.fallback_link = algorithm;
        self
    }

    /// Rank likely new links.
    #[must_use]
    #[instrument(skip(self, g), fields(nodes = g.node_count()))]
    pub fn predict_links(&self, g: &CanonicalGraph, top_k: Option<usize>) -> Prediction<LinkScore> {
        let limit = effective_top_k(top_k, &self.config);
        if let Some(scorer) = &self.scorer {
            match scorer.rank_links(g, limit) {
                Ok(mut items) => {
                    items.retain(|l| {
                        l.source != l.target
                            && g.node(&l.source).is_some()
                            && g.node(&l.target).is_some()
                            && !g.contains_edge(&l.source, &l.target)
                    });
                    items.truncate(limit);
                    info!(scorer = scorer.name(), count = items.len(), "trained link ranking");
                    return Prediction {
                        source: ScoreSource::Trained {
                            name: scorer.name().to_string(),
                        },
                        items,
                    };
                }
                Err(err) => warn!("link scorer unavailable, using heuristics: {err}"),
            }
        }

        Prediction {
            source: ScoreSource::Heuristic {
                algorithm: self.fallback_link.to_string(),
            },
            items: predict_links_with(g, self.fallback_link, Some(limit), &self.config),
        }
    }

    /// Rank nodes by predicted activity. The heuristic ranking is degree
    /// centrality.
    #[must_use]
    #[instrument(skip(self, g), fields(nodes = g.node_count()))]
    pub fn predict_activity(
        &self,
        g: &CanonicalGraph,
        top_k: Option<usize>,
    ) -> Prediction<ActivityScore> {
        let limit = effective_top_k(top_k, &self.config);
        let adj = g.adjacency();
        let describe = |pos: usize, score: f64| ActivityScore {
            id: g.id_at(pos).to_string(),
            label: g.nodes()[pos].label.clone(),
            score,
            degree: adj.degree(pos),
        };

        if let Some(scorer) = &self.scorer {
            match scorer.rank_nodes(g, limit) {
                Ok(ranks) => {
                    let items: Vec<ActivityScore> = ranks
                        .into_iter()
                        .filter_map(|r| g.position(&r.id).map(|pos| describe(pos, r.score)))
                        .take(limit)
                        .collect();
                    return Prediction {
                        source: ScoreSource::Trained {
                            name: scorer.name().to_string(),
                        },
                        items,
                    };
                }
                Err(err) => warn!("activity scorer unavailable, using degree: {err}"),
            }
        }

        let scores = degree_centrality(g);
        let mut ranked: Vec<usize> = (0..scores.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        Prediction {
            source: ScoreSource::Heuristic {
                algorithm: "degree".to_string(),
            },
            items: ranked
                .into_iter()
                .take(limit)
                .map(|pos| describe(pos, scores[pos]))
                .collect(),
        }
    }
}

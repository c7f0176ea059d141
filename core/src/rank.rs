use crate::error::{RankError, Result};
use crate::scorer::Bm25Scorer;
use crate::store::{ScoreEntry, ScoreList};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which view of a query's scores to rank by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMetric {
    /// BM25 scores as computed.
    #[default]
    Raw,
    /// Scores rescaled onto bands 0..=5.
    Banded,
    /// Banded scores weighted by category prevalence.
    #[serde(alias = "rarity")]
    RarityWeighted,
}

impl ScoreMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreMetric::Raw => "raw",
            ScoreMetric::Banded => "banded",
            ScoreMetric::RarityWeighted => "rarity_weighted",
        }
    }
}

impl fmt::Display for ScoreMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ScoreMetric {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" | "bm25" | "tfidf" => Ok(ScoreMetric::Raw),
            "banded" | "zero_to_five" => Ok(ScoreMetric::Banded),
            "rarity" | "rarity_weighted" | "zero_to_five_weighted" => Ok(ScoreMetric::RarityWeighted),
            other => Err(RankError::config(format!("unknown score metric {other:?}"))),
        }
    }
}

/// Stable descending sort, truncated to `k`. Ties keep their input order.
pub fn top_k(mut scores: ScoreList, k: usize) -> ScoreList {
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores.truncate(k);
    scores
}

impl Bm25Scorer {
    /// Unsorted scores for `query` under `metric`, one per document.
    pub fn scores(&self, query: &str, metric: ScoreMetric) -> Result<ScoreList> {
        match metric {
            ScoreMetric::Raw => Ok(self.calculate_scores(query).as_ref().clone()),
            ScoreMetric::Banded => Ok(self.rescale(query)),
            ScoreMetric::RarityWeighted => self.rarity_weight(query),
        }
    }

    pub fn top_k(&self, query: &str, k: usize, metric: ScoreMetric) -> Result<ScoreList> {
        if k == 0 {
            return Ok(Vec::new());
        }
        Ok(top_k(self.scores(query, metric)?, k))
    }
}

/// Position (1-indexed) of `doc_id` in a ranked list.
pub fn rank_of(ranked: &[ScoreEntry], doc_id: &str) -> Option<usize> {
    ranked.iter().position(|e| e.doc_id == doc_id).map(|i| i + 1)
}

//! Banded (0-5) and rarity-weighted views of a query's raw BM25 scores.
//!
//! Band values are `round_half_even(5 * (score - min) / (max - min))`, with
//! the range taken over the query's own score list. A list whose scores are
//! all equal has no spread to normalize over; every document then gets
//! [`DEGENERATE_BAND`].

use crate::config::RarityTables;
use crate::error::{RankError, Result};
use crate::scorer::Bm25Scorer;
use crate::store::{ScoreEntry, ScoreList};

pub const MAX_BAND: f64 = 5.0;

/// Band assigned to every document when a score list has zero spread.
pub const DEGENERATE_BAND: f64 = 0.0;

/// Normalized prevalence used when every category in the prior is equally common.
pub const DEGENERATE_PREVALENCE_WEIGHT: f64 = 1.0;

/// Map `value` into [0, 1] relative to `(min, max)`.
pub fn min_max(value: f64, (min, max): (f64, f64)) -> Result<f64> {
    let width = max - min;
    if width == 0.0 {
        return Err(RankError::DegenerateInput(min));
    }
    Ok((value - min) / width)
}

pub fn score_range(scores: &[ScoreEntry]) -> Option<(f64, f64)> {
    let mut iter = scores.iter().map(|e| e.score);
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s))))
}

/// Rescale a score list onto whole bands 0..=5, preserving order.
pub fn band(scores: &[ScoreEntry]) -> ScoreList {
    let Some(range) = score_range(scores) else { return Vec::new() };
    scores
        .iter()
        .map(|e| {
            let banded = match min_max(e.score, range) {
                Ok(unit) => (unit * MAX_BAND).round_ties_even(),
                Err(_) => DEGENERATE_BAND,
            };
            ScoreEntry::new(e.doc_id.clone(), banded)
        })
        .collect()
}

/// Multiply each banded score by the normalized prevalence of its document's
/// category, so rarer conditions sink below common ones.
pub fn rarity_weight(banded: &[ScoreEntry], tables: &RarityTables) -> Result<ScoreList> {
    let range = tables.prevalence.range();
    let degenerate = range.0 == range.1;
    if degenerate {
        tracing::warn!(value = range.0, "prevalence prior has no spread; rarity weighting is a no-op");
    }
    banded
        .iter()
        .map(|e| {
            let prevalence = tables.prevalence_of(&e.doc_id)?;
            let weight = if degenerate { DEGENERATE_PREVALENCE_WEIGHT } else { min_max(prevalence, range)? };
            Ok(ScoreEntry::new(e.doc_id.clone(), e.score * weight))
        })
        .collect()
}

impl Bm25Scorer {
    /// Banded scores for `query`, in corpus order.
    pub fn rescale(&self, query: &str) -> ScoreList {
        let raw = self.calculate_scores(query);
        if matches!(score_range(&raw), Some((lo, hi)) if lo == hi) {
            tracing::warn!(query, score = raw[0].score, band = DEGENERATE_BAND, "all scores equal; using fallback band");
        }
        band(&raw)
    }

    /// Rarity-weighted banded scores for `query`, in corpus order.
    pub fn rarity_weight(&self, query: &str) -> Result<ScoreList> {
        rarity_weight(&self.rescale(query), self.tables())
    }
}

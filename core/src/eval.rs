//! Ranking quality against binary relevance judgments.
//!
//! - Average precision walks a top-k list and averages `hits / rank` over the
//!   relevant positions only; a query with no relevant hit scores 0.
//! - MAP is the plain mean over all evaluated queries.
//! - `dcg = Σ (2^g_i - 1) / log2(i + 1)`, `ndcg = dcg / dcg(sorted desc)`,
//!   and 0 when the ideal ordering has no gain at all.

use crate::error::{RankError, Result};
use crate::rank::ScoreMetric;
use crate::scorer::Bm25Scorer;
use crate::store::ScoreEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type JudgmentTable = HashMap<String, HashMap<String, u8>>;

/// Query text -> (document id -> 0 | 1). Absent documents count as 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "JudgmentTable", into = "JudgmentTable")]
pub struct RelevanceJudgments {
    judgments: JudgmentTable,
}

impl RelevanceJudgments {
    /// Fails unless every judgment is 0 or 1.
    pub fn new(judgments: JudgmentTable) -> Result<Self> {
        for (query, judged) in &judgments {
            if let Some((doc_id, value)) = judged.iter().find(|(_, v)| **v > 1) {
                return Err(RankError::config(format!(
                    "judgment for {doc_id:?} under query {query:?} must be 0 or 1, got {value}"
                )));
            }
        }
        Ok(Self { judgments })
    }

    pub fn for_query(&self, query: &str) -> Result<&HashMap<String, u8>> {
        self.judgments.get(query).ok_or_else(|| RankError::MissingJudgments(query.to_string()))
    }

    /// Judged queries in sorted order.
    pub fn queries(&self) -> Vec<&str> {
        let mut queries: Vec<&str> = self.judgments.keys().map(String::as_str).collect();
        queries.sort_unstable();
        queries
    }

    pub fn len(&self) -> usize { self.judgments.len() }

    pub fn is_empty(&self) -> bool { self.judgments.is_empty() }
}

impl TryFrom<JudgmentTable> for RelevanceJudgments {
    type Error = RankError;
    fn try_from(judgments: JudgmentTable) -> Result<Self> { Self::new(judgments) }
}

impl From<RelevanceJudgments> for JudgmentTable {
    fn from(judgments: RelevanceJudgments) -> Self { judgments.judgments }
}

fn is_relevant(judged: &HashMap<String, u8>, doc_id: &str) -> bool {
    judged.get(doc_id) == Some(&1)
}

/// Average precision of an already ranked list. 0 when nothing relevant was retrieved.
pub fn average_precision(ranked: &[ScoreEntry], judged: &HashMap<String, u8>) -> f64 {
    let mut rel = 0usize;
    let mut precision_sum = 0.0;
    for (i, entry) in ranked.iter().enumerate() {
        if is_relevant(judged, &entry.doc_id) {
            rel += 1;
            precision_sum += rel as f64 / (i + 1) as f64;
        }
    }
    if rel > 0 { precision_sum / rel as f64 } else { 0.0 }
}

/// Discounted cumulative gain of scores in the given order.
pub fn dcg(scores: &[f64]) -> f64 {
    scores
        .iter()
        .enumerate()
        .map(|(i, &g)| (g.exp2() - 1.0) / ((i + 2) as f64).log2())
        .sum()
}

pub fn ndcg(scores: &[f64]) -> f64 {
    let mut ideal = scores.to_vec();
    ideal.sort_by(|a, b| b.total_cmp(a));
    let idcg = dcg(&ideal);
    if idcg == 0.0 {
        return 0.0;
    }
    dcg(scores) / idcg
}

/// `ndcg` over the `score` field of a ranked list.
pub fn ndcg_entries(ranked: &[ScoreEntry]) -> f64 {
    let scores: Vec<f64> = ranked.iter().map(|e| e.score).collect();
    ndcg(&scores)
}

/// Judged gains of a ranked list, in rank order.
pub fn judged_gains(ranked: &[ScoreEntry], judged: &HashMap<String, u8>) -> Vec<f64> {
    ranked.iter().map(|e| judged.get(&e.doc_id).copied().unwrap_or(0) as f64).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryEvaluation {
    pub query: String,
    pub average_precision: f64,
    pub ndcg: f64,
    pub relevant_retrieved: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub metric: ScoreMetric,
    pub map: f64,
    pub mean_ndcg: f64,
    pub queries: Vec<QueryEvaluation>,
}

impl Bm25Scorer {
    /// Mean of per-query average precision over the raw-score top `k`.
    pub fn mean_average_precision<S: AsRef<str>>(&self, queries: &[S], judgments: &RelevanceJudgments, k: usize) -> Result<f64> {
        if queries.is_empty() {
            return Err(RankError::config("cannot average precision over an empty query set"));
        }
        let mut total = 0.0;
        for query in queries {
            let query = query.as_ref();
            let judged = judgments.for_query(query)?;
            let hits = self.top_k(query, k, ScoreMetric::Raw)?;
            total += average_precision(&hits, judged);
        }
        Ok(total / queries.len() as f64)
    }

    /// MAP over raw scores plus per-query NDCG of judged gains ranked by `metric`.
    pub fn evaluate<S: AsRef<str>>(&self, queries: &[S], judgments: &RelevanceJudgments, k: usize, metric: ScoreMetric) -> Result<EvaluationReport> {
        if queries.is_empty() {
            return Err(RankError::config("cannot evaluate an empty query set"));
        }
        let mut evaluated = Vec::with_capacity(queries.len());
        for query in queries {
            let query = query.as_ref();
            let judged = judgments.for_query(query)?;
            let raw_hits = self.top_k(query, k, ScoreMetric::Raw)?;
            let query_ndcg = match metric {
                ScoreMetric::Raw => ndcg(&judged_gains(&raw_hits, judged)),
                _ => ndcg(&judged_gains(&self.top_k(query, k, metric)?, judged)),
            };
            evaluated.push(QueryEvaluation {
                query: query.to_string(),
                average_precision: average_precision(&raw_hits, judged),
                ndcg: query_ndcg,
                relevant_retrieved: raw_hits.iter().filter(|e| is_relevant(judged, &e.doc_id)).count(),
            });
        }
        let count = evaluated.len() as f64;
        let map = evaluated.iter().map(|q| q.average_precision).sum::<f64>() / count;
        let mean_ndcg = evaluated.iter().map(|q| q.ndcg).sum::<f64>() / count;
        tracing::info!(queries = evaluated.len(), k, %metric, map, mean_ndcg, "evaluation complete");
        Ok(EvaluationReport { k, metric, map, mean_ndcg, queries: evaluated })
    }
}

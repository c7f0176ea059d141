//! Okapi BM25 over a [`Corpus`], memoized per query.
//!
//! ```text
//! score(d, Q) = Σ_{t in Q} IDF(t) * tf(t,d) * (k1 + 1) / (tf(t,d) + k1 * (1 - b + b * |d| / avgdl))
//! IDF(t)      = ln((N - df(t) + 0.5) / (df(t) + 0.5) + 1)
//! ```
//!
//! The sum runs over the query's token sequence, so a term written twice in
//! the query contributes twice.

use crate::config::{Bm25Params, RarityTables};
use crate::error::Result;
use crate::index::Corpus;
use crate::store::{ScoreEntry, ScoreList, ScoreStore};
use crate::tokenizer::{tokenize, DocumentVector};
use std::sync::Arc;

#[derive(Debug)]
pub struct Bm25Scorer {
    corpus: Corpus,
    params: Bm25Params,
    tables: RarityTables,
    store: ScoreStore,
}

impl Bm25Scorer {
    pub fn new(corpus: Corpus, params: Bm25Params) -> Result<Self> {
        params.validate()?;
        Ok(Self { corpus, params, tables: RarityTables::default(), store: ScoreStore::new() })
    }

    /// Replace the built-in prevalence and category tables.
    pub fn with_rarity_tables(mut self, tables: RarityTables) -> Self {
        self.tables = tables;
        self
    }

    pub fn corpus(&self) -> &Corpus { &self.corpus }

    pub fn params(&self) -> Bm25Params { self.params }

    pub fn tables(&self) -> &RarityTables { &self.tables }

    pub fn store(&self) -> &ScoreStore { &self.store }

    /// Never negative: the `+ 1` inside the log keeps the argument above 1.
    pub fn idf(&self, term: &str) -> f64 {
        let n = self.corpus.num_docs() as f64;
        let df = self.corpus.doc_freq(term) as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Raw scores for every document in corpus order. Computed on the first
    /// call for a given query text and served from the store afterwards.
    pub fn calculate_scores(&self, query: &str) -> Arc<ScoreList> {
        self.store.get_or_compute(query, || self.compute(query))
    }

    fn compute(&self, query: &str) -> ScoreList {
        let terms = tokenize(query);
        let weights: Vec<(&str, f64)> = terms.iter().map(|&t| (t, self.idf(t))).collect();
        let scores: ScoreList = self
            .corpus
            .iter()
            .map(|(doc, vector, len)| ScoreEntry::new(doc.id.clone(), self.score_vector(&weights, vector, len)))
            .collect();
        tracing::debug!(query, num_terms = terms.len(), num_docs = scores.len(), "computed bm25 scores");
        scores
    }

    fn score_vector(&self, weights: &[(&str, f64)], vector: &DocumentVector, len: u64) -> f64 {
        let Bm25Params { k1, b } = self.params;
        let avgdl = self.corpus.avg_doc_len();
        let mut score = 0.0;
        for &(term, idf) in weights {
            let tf = vector.get(term).copied().unwrap_or(0);
            // tf = 0 adds nothing; skipping it also avoids 0/0 when k1 = 0 or avgdl = 0
            if tf == 0 {
                continue;
            }
            let tf = tf as f64;
            let norm = 1.0 - b + b * len as f64 / avgdl;
            score += idf * (tf * (k1 + 1.0)) / (tf + k1 * norm);
        }
        score
    }
}

use crate::error::{RankError, Result};
use crate::tokenizer::{vector_len, vectorize, DocumentVector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type DocId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(alias = "doc_id")]
    pub id: DocId,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// A fixed, non-empty document collection plus the term statistics BM25 needs.
/// Built once; nothing here is mutated afterwards.
#[derive(Debug, Clone)]
pub struct Corpus {
    docs: Vec<Document>,
    vectors: Vec<DocumentVector>,
    lengths: Vec<u64>,
    /// term -> number of documents containing it at least once
    df: HashMap<String, u32>,
    avg_doc_len: f64,
    positions: HashMap<DocId, usize>,
}

impl Corpus {
    pub fn new(docs: Vec<Document>) -> Result<Self> {
        if docs.is_empty() {
            return Err(RankError::config("corpus must contain at least one document"));
        }
        let mut positions = HashMap::with_capacity(docs.len());
        for (pos, doc) in docs.iter().enumerate() {
            if positions.insert(doc.id.clone(), pos).is_some() {
                return Err(RankError::config(format!("duplicate document id {:?}", doc.id)));
            }
        }

        let vectors: Vec<DocumentVector> = docs.iter().map(|d| vectorize(&d.text)).collect();
        let lengths: Vec<u64> = vectors.iter().map(vector_len).collect();
        let mut df: HashMap<String, u32> = HashMap::new();
        for vector in &vectors {
            for term in vector.keys() {
                *df.entry(term.clone()).or_insert(0) += 1;
            }
        }
        let total: u64 = lengths.iter().sum();
        let avg_doc_len = total as f64 / docs.len() as f64;

        tracing::info!(num_docs = docs.len(), num_terms = df.len(), avg_doc_len, "corpus built");
        Ok(Self { docs, vectors, lengths, df, avg_doc_len, positions })
    }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn avg_doc_len(&self) -> f64 { self.avg_doc_len }

    pub fn doc_freq(&self, term: &str) -> u32 { self.df.get(term).copied().unwrap_or(0) }

    pub fn num_terms(&self) -> usize { self.df.len() }

    pub fn documents(&self) -> &[Document] { &self.docs }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.positions.get(id).map(|&pos| &self.docs[pos])
    }

    /// Documents with their vectors and lengths, in corpus order.
    pub fn iter(&self) -> impl Iterator<Item = (&Document, &DocumentVector, u64)> + '_ {
        self.docs
            .iter()
            .zip(self.vectors.iter())
            .zip(self.lengths.iter())
            .map(|((doc, vector), &len)| (doc, vector, len))
    }
}

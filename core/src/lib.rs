pub mod config;
pub mod error;
pub mod eval;
pub mod index;
pub mod persist;
pub mod rank;
pub mod rescale;
pub mod scorer;
pub mod store;
pub mod tokenizer;

pub use config::{Bm25Params, CategoryLookup, PrevalencePrior, RarityTables};
pub use error::{RankError, Result};
pub use eval::{EvaluationReport, QueryEvaluation, RelevanceJudgments};
pub use index::{Corpus, DocId, Document};
pub use rank::ScoreMetric;
pub use scorer::Bm25Scorer;
pub use store::{ScoreEntry, ScoreList, ScoreStore};

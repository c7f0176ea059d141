use thiserror::Error;

pub type Result<T> = std::result::Result<T, RankError>;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no judgments for query {0:?}")]
    MissingJudgments(String),

    #[error("no category registered for id prefix {prefix:?} (document {doc_id:?})")]
    UnknownPrefix { doc_id: String, prefix: String },

    #[error("no prevalence registered for category {0:?}")]
    UnknownCategory(String),

    /// Min-max normalization over a range of zero width.
    #[error("degenerate normalization range: min == max == {0}")]
    DegenerateInput(f64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RankError {
    pub fn config(msg: impl Into<String>) -> Self { RankError::Configuration(msg.into()) }

    /// True for the lookup family: missing judgments, prefixes or categories.
    pub fn is_lookup(&self) -> bool {
        matches!(self, RankError::MissingJudgments(_) | RankError::UnknownPrefix { .. } | RankError::UnknownCategory(_))
    }
}

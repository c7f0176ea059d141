use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use medrank_core::persist::{load_corpus, load_judgments, load_rarity_tables};
use medrank_core::{Bm25Params, Bm25Scorer, Corpus, EvaluationReport, RankError, RelevanceJudgments, ScoreMetric};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;
const SNIPPET_BEFORE: usize = 100;
const SNIPPET_AFTER: usize = 200;

/// Inputs the app is built from. Paths point at JSON files in the
/// formats understood by `medrank_core::persist`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub corpus: String,
    pub judgments: Option<String>,
    pub tables: Option<String>,
    pub params: Bm25Params,
}

impl AppConfig {
    pub fn new(corpus: impl Into<String>) -> Self {
        Self { corpus: corpus.into(), judgments: None, tables: None, params: Bm25Params::default() }
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub metric: Option<String>,
}
fn default_k() -> usize { 10 }

#[derive(Deserialize)]
pub struct EvaluateParams {
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub metric: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub metric: ScoreMetric,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f64,
    pub snippet: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<Bm25Scorer>,
    pub judgments: Option<Arc<RelevanceJudgments>>,
}

type ApiError = (StatusCode, String);

pub fn build_app(config: AppConfig) -> Result<Router> {
    let corpus = Corpus::new(load_corpus(&config.corpus)?)?;
    let mut scorer = Bm25Scorer::new(corpus, config.params)?;
    if let Some(path) = &config.tables {
        scorer = scorer.with_rarity_tables(load_rarity_tables(path)?);
    }
    let judgments = match &config.judgments {
        Some(path) => Some(Arc::new(load_judgments(path)?)),
        None => None,
    };
    let app_state = AppState { scorer: Arc::new(scorer), judgments };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/evaluate", get(evaluate_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

fn parse_metric(metric: Option<&str>) -> Result<ScoreMetric, ApiError> {
    match metric {
        None => Ok(ScoreMetric::Raw),
        Some(m) => m.parse().map_err(|e: RankError| (StatusCode::BAD_REQUEST, e.to_string())),
    }
}

fn rank_error(err: RankError) -> ApiError {
    let status = if err.is_lookup() { StatusCode::UNPROCESSABLE_ENTITY } else { StatusCode::BAD_REQUEST };
    (status, err.to_string())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let metric = parse_metric(params.metric.as_deref())?;
    let k = params.k.min(MAX_K);
    let ranked = state.scorer.top_k(&params.q, k, metric).map_err(rank_error)?;
    let total_hits = state
        .scorer
        .calculate_scores(&params.q)
        .iter()
        .filter(|e| e.score > 0.0)
        .count();

    let raw_terms: Vec<String> = params.q.split_whitespace().map(|s| s.to_string()).collect();
    let results = ranked
        .into_iter()
        .map(|entry| {
            let snippet = state.scorer.corpus().get(&entry.doc_id).and_then(|d| snippet(&d.text, &raw_terms));
            SearchHit { doc_id: entry.doc_id, score: entry.score, snippet }
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, metric, took_ms: elapsed.as_millis(), took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    match state.scorer.corpus().get(&doc_id) {
        Some(doc) => Ok(Json(serde_json::json!({ "doc_id": doc.id, "text": doc.text }))),
        None => Err((StatusCode::NOT_FOUND, format!("no document {doc_id:?}"))),
    }
}

pub async fn evaluate_handler(State(state): State<AppState>, Query(params): Query<EvaluateParams>) -> Result<Json<EvaluationReport>, ApiError> {
    let judgments = state
        .judgments
        .as_ref()
        .ok_or_else(|| (StatusCode::NOT_FOUND, "no relevance judgments loaded".to_string()))?;
    let metric = parse_metric(params.metric.as_deref())?;
    let queries = judgments.queries();
    let report = state.scorer.evaluate(&queries, judgments, params.k, metric).map_err(rank_error)?;
    Ok(Json(report))
}

fn snippet(text: &str, raw_terms: &[String]) -> Option<String> {
    if text.is_empty() { return None; }
    // first match (case-insensitive) of any raw term
    let first_idx = raw_terms
        .iter()
        .filter(|t| !t.trim().is_empty())
        .find_map(|t| find_case_insensitive(text, t));
    let snippet = match first_idx {
        Some(idx) => {
            let start = floor_char_boundary(text, idx.saturating_sub(SNIPPET_BEFORE));
            let end = floor_char_boundary(text, (idx + SNIPPET_AFTER).min(text.len()));
            text[start..end].to_string()
        }
        None => text.chars().take(SNIPPET_AFTER).collect(),
    };
    Some(highlight_terms(&snippet, raw_terms))
}

fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let pat = regex::RegexBuilder::new(&regex::escape(needle)).case_insensitive(true).build().ok()?;
    pat.find(haystack).map(|m| m.start())
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn highlight_terms(snippet: &str, terms: &[String]) -> String {
    let mut s = snippet.to_string();
    for t in terms {
        if t.trim().is_empty() { continue; }
        let Ok(pat) = regex::RegexBuilder::new(&regex::escape(t)).case_insensitive(true).build() else { continue };
        s = pat.replace_all(&s, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).to_string();
    }
    s
}

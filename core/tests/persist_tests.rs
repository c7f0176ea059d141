use medrank_core::persist::{load_corpus, load_judgments, load_rarity_tables, save_json, RankedResults};
use medrank_core::{Bm25Params, Bm25Scorer, Corpus, RankError, ScoreMetric};
use std::fs;
use tempfile::tempdir;

#[test]
fn loads_inputs_and_writes_ranked_results() {
    let dir = tempdir().unwrap();
    let corpus_path = dir.path().join("documents.json");
    fs::write(
        &corpus_path,
        r#"{"documents": [{"doc_id": "Flu1", "text": "fever cough"}, {"doc_id": "Dia1", "text": "thirst"}]}"#,
    )
    .unwrap();
    let judgments_path = dir.path().join("relevance.json");
    fs::write(&judgments_path, r#"{"fever": {"Flu1": 1, "Dia1": 0}}"#).unwrap();

    let corpus = Corpus::new(load_corpus(&corpus_path).unwrap()).unwrap();
    let judgments = load_judgments(&judgments_path).unwrap();
    let scorer = Bm25Scorer::new(corpus, Bm25Params::default()).unwrap();
    assert_eq!(scorer.mean_average_precision(&["fever"], &judgments, 2).unwrap(), 1.0);

    let out = dir.path().join("out/ranked.json");
    let ranked = RankedResults {
        query: "fever".into(),
        metric: ScoreMetric::Raw,
        k: 2,
        results: scorer.top_k("fever", 2, ScoreMetric::Raw).unwrap(),
    };
    save_json(&out, &ranked).unwrap();
    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["results"][0]["doc_id"], "Flu1");
    assert_eq!(written["metric"], "raw");
}

#[test]
fn loads_jsonl_corpus() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("docs.jsonl");
    fs::write(&path, "{\"id\": \"Cov1\", \"text\": \"loss of smell\"}\n{\"id\": \"Ast1\", \"text\": \"wheeze\"}\n").unwrap();
    let docs = load_corpus(&path).unwrap();
    assert_eq!(docs.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["Cov1", "Ast1"]);
}

#[test]
fn invalid_rarity_tables_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tables.json");
    fs::write(&path, r#"{"prevalence": {"flu": 2.0}, "categories": {"Flu": "flu"}}"#).unwrap();
    assert!(matches!(load_rarity_tables(&path), Err(RankError::Json(_))));
    assert!(matches!(load_corpus(dir.path().join("missing.json")), Err(RankError::Io(_))));
}

#[test]
fn graded_judgments_are_rejected_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("relevance.json");
    fs::write(&path, r#"{"fever cough": {"Flu1": 2, "Cov1": 0, "Dia1": 0}}"#).unwrap();
    let err = load_judgments(&path).unwrap_err();
    assert!(matches!(err, RankError::Json(_)));
    assert!(err.to_string().contains("must be 0 or 1"));
}

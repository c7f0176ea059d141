use medrank_core::eval::{ndcg, ndcg_entries};
use medrank_core::rank::rank_of;
use medrank_core::rescale::{band, DEGENERATE_BAND};
use medrank_core::{Bm25Params, Bm25Scorer, Corpus, Document, RelevanceJudgments, ScoreEntry, ScoreMetric};
use std::collections::HashMap;

fn symptom_scorer() -> Bm25Scorer {
    let corpus = Corpus::new(vec![
        Document::new("Flu1", "fever cough"),
        Document::new("Cov1", "cough fever loss of smell"),
        Document::new("Dia1", "thirst weight loss"),
    ])
    .unwrap();
    Bm25Scorer::new(corpus, Bm25Params::new(1.5, 0.75).unwrap()).unwrap()
}

fn judgments(query: &str, pairs: &[(&str, u8)]) -> RelevanceJudgments {
    let judged = pairs.iter().map(|(id, r)| (id.to_string(), *r)).collect();
    RelevanceJudgments::new(HashMap::from([(query.to_string(), judged)])).unwrap()
}

#[test]
fn matching_documents_outrank_unrelated_one() {
    let scorer = symptom_scorer();
    let ranked = scorer.top_k("fever cough", 3, ScoreMetric::Raw).unwrap();
    let dia = rank_of(&ranked, "Dia1").unwrap();
    assert!(rank_of(&ranked, "Flu1").unwrap() < dia);
    assert!(rank_of(&ranked, "Cov1").unwrap() < dia);
}

#[test]
fn map_for_single_query_is_reciprocal_rank_of_only_relevant_doc() {
    let scorer = symptom_scorer();
    let judged = judgments("fever cough", &[("Flu1", 1), ("Cov1", 0), ("Dia1", 0)]);
    let ranked = scorer.top_k("fever cough", 3, ScoreMetric::Raw).unwrap();
    let expected = 1.0 / rank_of(&ranked, "Flu1").unwrap() as f64;
    let map = scorer.mean_average_precision(&["fever cough"], &judged, 3).unwrap();
    assert!((map - expected).abs() < 1e-12);
}

#[test]
fn map_counts_queries_without_hits_as_zero() {
    let scorer = symptom_scorer();
    let mut all = HashMap::new();
    all.insert("fever cough".to_string(), HashMap::from([("Flu1".to_string(), 1u8)]));
    all.insert("thirst".to_string(), HashMap::from([("Flu1".to_string(), 1u8)]));
    let judged = RelevanceJudgments::new(all).unwrap();
    // "thirst" only retrieves Dia1 at k = 1, which is not relevant
    let single = scorer.mean_average_precision(&["thirst"], &judged, 1).unwrap();
    assert_eq!(single, 0.0);
    let both = scorer.mean_average_precision(&["fever cough", "thirst"], &judged, 1).unwrap();
    let first = scorer.mean_average_precision(&["fever cough"], &judged, 1).unwrap();
    assert!((both - first / 2.0).abs() < 1e-12);
}

#[test]
fn map_errors() {
    let scorer = symptom_scorer();
    let judged = judgments("fever cough", &[("Flu1", 1)]);
    let empty: [&str; 0] = [];
    assert!(scorer.mean_average_precision(&empty, &judged, 3).is_err());
    assert!(scorer.mean_average_precision(&["unjudged"], &judged, 3).unwrap_err().is_lookup());
}

#[test]
fn scores_are_never_negative() {
    // "the" appears everywhere; plain Robertson IDF would go negative here
    let corpus = Corpus::new(vec![
        Document::new("A1", "the fever the"),
        Document::new("B1", "the cough"),
        Document::new("C1", "the rash"),
        Document::new("D1", ""),
    ])
    .unwrap();
    let scorer = Bm25Scorer::new(corpus, Bm25Params::default()).unwrap();
    for query in ["the", "the the fever", "rash cough", "", "unknown"] {
        assert!(scorer.calculate_scores(query).iter().all(|e| e.score >= 0.0), "{query}");
    }
}

#[test]
fn repeated_calls_reuse_stored_scores() {
    let scorer = symptom_scorer();
    let first = scorer.calculate_scores("cough");
    let _ = scorer.top_k("cough", 2, ScoreMetric::Raw).unwrap();
    let _ = scorer.top_k("cough", 2, ScoreMetric::Banded).unwrap();
    let second = scorer.calculate_scores("cough");
    assert_eq!(first, second);
    assert_eq!(scorer.store().computations(), 1);
}

#[test]
fn top_k_is_prefix_of_sorted_list() {
    let scorer = symptom_scorer();
    let mut full = scorer.scores("fever loss", ScoreMetric::Raw).unwrap();
    full.sort_by(|a, b| b.score.total_cmp(&a.score));
    for k in 0..5 {
        let top = scorer.top_k("fever loss", k, ScoreMetric::Raw).unwrap();
        assert_eq!(top.len(), k.min(3));
        assert_eq!(top[..], full[..top.len()]);
    }
}

#[test]
fn banded_scores_span_zero_to_five() {
    let scorer = symptom_scorer();
    let raw = scorer.scores("fever cough", ScoreMetric::Raw).unwrap();
    let banded = scorer.scores("fever cough", ScoreMetric::Banded).unwrap();
    let max_id = &raw.iter().max_by(|a, b| a.score.total_cmp(&b.score)).unwrap().doc_id;
    let min_id = &raw.iter().min_by(|a, b| a.score.total_cmp(&b.score)).unwrap().doc_id;
    assert_eq!(banded.iter().find(|e| &e.doc_id == max_id).unwrap().score, 5.0);
    assert_eq!(banded.iter().find(|e| &e.doc_id == min_id).unwrap().score, 0.0);
}

#[test]
fn constant_scores_band_to_fallback() {
    let banded = band(&[ScoreEntry::new("A", 10.0), ScoreEntry::new("B", 10.0)]);
    assert_eq!(banded, vec![ScoreEntry::new("A", DEGENERATE_BAND), ScoreEntry::new("B", DEGENERATE_BAND)]);

    let scorer = symptom_scorer();
    let banded = scorer.rescale("no such words");
    assert!(banded.iter().all(|e| e.score == DEGENERATE_BAND));
}

#[test]
fn rarity_weighting_uses_builtin_prior() {
    let scorer = symptom_scorer();
    let banded = scorer.scores("fever cough", ScoreMetric::Banded).unwrap();
    let weighted = scorer.top_k("fever cough", 3, ScoreMetric::RarityWeighted).unwrap();
    assert_eq!(rank_of(&weighted, "Flu1"), Some(1));
    assert!(weighted.iter().all(|e| (0.0..=5.0).contains(&e.score)));
    // covid is near the bottom of the built-in prior, so its band shrinks almost to nothing
    let cov_band = banded.iter().find(|e| e.doc_id == "Cov1").unwrap().score;
    let cov_weighted = weighted.iter().find(|e| e.doc_id == "Cov1").unwrap().score;
    assert!(cov_band > 0.0);
    assert!(cov_weighted < cov_band * 0.01);
}

#[test]
fn rarity_weighting_fails_on_unmapped_ids() {
    let corpus = Corpus::new(vec![Document::new("Zzz1", "fever"), Document::new("Flu1", "cough")]).unwrap();
    let scorer = Bm25Scorer::new(corpus, Bm25Params::default()).unwrap();
    assert!(scorer.top_k("fever", 2, ScoreMetric::RarityWeighted).unwrap_err().is_lookup());
    assert!(scorer.top_k("fever", 2, ScoreMetric::Banded).is_ok());
}

#[test]
fn ndcg_of_ranked_banded_scores_is_one() {
    let scorer = symptom_scorer();
    let ranked = scorer.top_k("fever cough", 3, ScoreMetric::Banded).unwrap();
    assert!((ndcg_entries(&ranked) - 1.0).abs() < 1e-12);
    assert!(ndcg(&[0.0, 2.0, 5.0]) < 1.0);
}

#[test]
fn evaluation_report_collects_per_query_metrics() {
    let scorer = symptom_scorer();
    let judged = judgments("fever cough", &[("Flu1", 1), ("Cov1", 1), ("Dia1", 0)]);
    let report = scorer.evaluate(&judged.queries(), &judged, 3, ScoreMetric::Banded).unwrap();
    assert_eq!(report.queries.len(), 1);
    assert_eq!(report.queries[0].relevant_retrieved, 2);
    assert!((report.map - 1.0).abs() < 1e-12);
    assert!((report.mean_ndcg - 1.0).abs() < 1e-12);
}

#[test]
fn report_map_matches_mean_average_precision() {
    let scorer = symptom_scorer();
    let mut all = HashMap::new();
    all.insert("fever cough".to_string(), HashMap::from([("Cov1".to_string(), 1u8), ("Dia1".to_string(), 1u8)]));
    all.insert("loss".to_string(), HashMap::from([("Flu1".to_string(), 1u8)]));
    all.insert("thirst".to_string(), HashMap::from([("Dia1".to_string(), 1u8)]));
    let judged = RelevanceJudgments::new(all).unwrap();
    let queries = judged.queries();
    for metric in [ScoreMetric::Raw, ScoreMetric::Banded, ScoreMetric::RarityWeighted] {
        let report = scorer.evaluate(&queries, &judged, 2, metric).unwrap();
        let map = scorer.mean_average_precision(&queries, &judged, 2).unwrap();
        assert!((report.map - map).abs() < 1e-12, "{metric}");
        let mean_ap = report.queries.iter().map(|q| q.average_precision).sum::<f64>() / 3.0;
        assert!((report.map - mean_ap).abs() < 1e-12, "{metric}");
    }
    let empty: [&str; 0] = [];
    assert!(scorer.evaluate(&empty, &judged, 2, ScoreMetric::Raw).is_err());
}

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use medrank_core::persist::{load_corpus, load_judgments, load_rarity_tables, save_json, RankedResults};
use medrank_core::{Bm25Params, Bm25Scorer, Corpus, Document, EvaluationReport, ScoreMetric};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "medrank")]
#[command(about = "Rank documents with BM25 and evaluate rankings against relevance judgments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScorerArgs {
    /// Corpus file (.json or .jsonl) or a directory of them
    #[arg(long)]
    corpus: String,
    /// Prevalence/category tables (JSON); built-in tables when omitted
    #[arg(long)]
    tables: Option<String>,
    /// BM25 term-frequency saturation
    #[arg(long, default_value_t = medrank_core::config::DEFAULT_K1)]
    k1: f64,
    /// BM25 length normalization
    #[arg(long, default_value_t = medrank_core::config::DEFAULT_B)]
    b: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Print or save the top-k documents for a query
    Rank {
        #[command(flatten)]
        scorer: ScorerArgs,
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// raw | banded | rarity
        #[arg(long, default_value = "raw")]
        metric: String,
        /// Write JSON here instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
    /// Compute MAP and NDCG for every judged query
    Evaluate {
        #[command(flatten)]
        scorer: ScorerArgs,
        #[arg(long)]
        judgments: String,
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Metric whose ranking NDCG is computed for; MAP always uses raw scores
        #[arg(long, default_value = "banded")]
        metric: String,
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Serialize)]
struct ReportFile {
    created_at: String,
    corpus: String,
    num_docs: usize,
    #[serde(flatten)]
    report: EvaluationReport,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Rank { scorer, query, k, metric, output } => {
            let metric: ScoreMetric = metric.parse()?;
            let bm25 = build_scorer(&scorer)?;
            let results = bm25.top_k(&query, k, metric)?;
            let ranked = RankedResults { query, metric, k, results };
            emit(output.as_deref(), &ranked)
        }
        Commands::Evaluate { scorer, judgments, k, metric, output } => {
            let metric: ScoreMetric = metric.parse()?;
            let bm25 = build_scorer(&scorer)?;
            let judgments = load_judgments(&judgments).with_context(|| format!("loading judgments from {judgments}"))?;
            let queries = judgments.queries();
            if queries.is_empty() {
                bail!("judgment file contains no queries");
            }
            let report = bm25.evaluate(&queries, &judgments, k, metric)?;
            println!("MAP@{k}: {:.4}  mean NDCG@{k} ({metric}): {:.4}", report.map, report.mean_ndcg);
            let file = ReportFile {
                created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
                corpus: scorer.corpus.clone(),
                num_docs: bm25.corpus().num_docs(),
                report,
            };
            match output {
                Some(path) => emit(Some(&path), &file),
                None => Ok(()),
            }
        }
    }
}

fn build_scorer(args: &ScorerArgs) -> Result<Bm25Scorer> {
    let params = Bm25Params::new(args.k1, args.b)?;
    let docs = read_documents(Path::new(&args.corpus))?;
    let corpus = Corpus::new(docs)?;
    let mut scorer = Bm25Scorer::new(corpus, params)?;
    if let Some(path) = &args.tables {
        let tables = load_rarity_tables(path).with_context(|| format!("loading rarity tables from {path}"))?;
        scorer = scorer.with_rarity_tables(tables);
    }
    Ok(scorer)
}

fn read_documents(input_path: &Path) -> Result<Vec<Document>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("corpus path {} does not exist", input_path.display());
    }

    let mut docs = Vec::new();
    for file in &files {
        docs.extend(load_corpus(file).with_context(|| format!("reading {}", file.display()))?);
    }
    tracing::info!(files = files.len(), num_docs = docs.len(), "read corpus");
    Ok(docs)
}

fn emit<T: Serialize>(output: Option<&str>, value: &T) -> Result<()> {
    match output {
        Some(path) => {
            save_json(path, value)?;
            tracing::info!(output = path, "wrote results");
        }
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

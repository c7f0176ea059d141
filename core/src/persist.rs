use crate::config::RarityTables;
use crate::error::Result;
use crate::eval::RelevanceJudgments;
use crate::index::Document;
use crate::rank::ScoreMetric;
use crate::store::ScoreList;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

/// Corpus file layouts accepted by [`load_corpus`].
#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Wrapped { documents: Vec<Document> },
    Bare(Vec<Document>),
}

/// Ranked output for one query, as written by the CLI and server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResults {
    pub query: String,
    pub metric: ScoreMetric,
    pub k: usize,
    pub results: ScoreList,
}

pub fn parse_corpus_json(json: &str) -> Result<Vec<Document>> {
    let docs = match serde_json::from_str(json)? {
        CorpusFile::Wrapped { documents } => documents,
        CorpusFile::Bare(documents) => documents,
    };
    Ok(docs)
}

pub fn parse_corpus_jsonl<R: BufRead>(reader: R) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        docs.push(serde_json::from_str(&line)?);
    }
    Ok(docs)
}

/// Read documents from a `.jsonl` file (one record per line) or a JSON file
/// holding either a bare array or `{"documents": [...]}`.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let docs = if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        parse_corpus_jsonl(BufReader::new(File::open(path)?))?
    } else {
        parse_corpus_json(&read_string(path)?)?
    };
    tracing::debug!(path = %path.display(), num_docs = docs.len(), "loaded corpus file");
    Ok(docs)
}

pub fn load_judgments<P: AsRef<Path>>(path: P) -> Result<RelevanceJudgments> {
    let judgments = serde_json::from_str(&read_string(path.as_ref())?)?;
    Ok(judgments)
}

pub fn load_rarity_tables<P: AsRef<Path>>(path: P) -> Result<RarityTables> {
    let tables = serde_json::from_str(&read_string(path.as_ref())?)?;
    Ok(tables)
}

/// Write `value` as pretty JSON, creating parent directories as needed.
pub fn save_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)?;
    }
    let mut f = File::create(path)?;
    let json = serde_json::to_string_pretty(value)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

fn read_string(path: &Path) -> Result<String> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(buf)
}

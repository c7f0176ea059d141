use crate::error::{RankError, Result};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_K1: f64 = 1.5;
pub const DEFAULT_B: f64 = 0.75;

/// Number of leading id characters that name a document's category.
pub const CATEGORY_PREFIX_LEN: usize = 3;

lazy_static! {
    static ref DEFAULT_PREVALENCE: Vec<(&'static str, f64)> = vec![
        ("flu", 0.00783368484),
        ("covid", 0.00002044893),
        ("diabetes", 0.089),
        ("addisons disease", 0.00001),
        ("depression", 0.184),
        ("cardiac arrest", 0.00107261223),
        ("asthma", 0.08333333333),
        ("glaucoma", 0.00903886712),
        ("leukemia", 0.00147898463),
        ("crohns disease", 0.01),
    ];
    static ref DEFAULT_CATEGORIES: Vec<(&'static str, &'static str)> = vec![
        ("Flu", "flu"),
        ("Cov", "covid"),
        ("Dia", "diabetes"),
        ("Add", "addisons disease"),
        ("Dep", "depression"),
        ("Car", "cardiac arrest"),
        ("Ast", "asthma"),
        ("Gla", "glaucoma"),
        ("Leu", "leukemia"),
        ("Cro", "crohns disease"),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length-normalization strength.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self { Self { k1: DEFAULT_K1, b: DEFAULT_B } }
}

impl Bm25Params {
    pub fn new(k1: f64, b: f64) -> Result<Self> {
        let params = Self { k1, b };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(RankError::config(format!("k1 must be a finite value >= 0, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(RankError::config(format!("b must lie in [0, 1], got {}", self.b)));
        }
        Ok(())
    }
}

/// Category key -> prevalence probability, with the domain-wide range cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, f64>", into = "HashMap<String, f64>")]
pub struct PrevalencePrior {
    values: HashMap<String, f64>,
    min: f64,
    max: f64,
}

impl PrevalencePrior {
    pub fn new(values: HashMap<String, f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(RankError::config("prevalence prior is empty"));
        }
        if let Some((category, p)) = values.iter().find(|(_, p)| !(**p > 0.0 && **p <= 1.0)) {
            return Err(RankError::config(format!("prevalence for {category:?} must lie in (0, 1], got {p}")));
        }
        let min = values.values().copied().fold(f64::INFINITY, f64::min);
        let max = values.values().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Self { values, min, max })
    }

    pub fn get(&self, category: &str) -> Result<f64> {
        self.values
            .get(category)
            .copied()
            .ok_or_else(|| RankError::UnknownCategory(category.to_string()))
    }

    /// (min, max) over every prevalence value in the prior.
    pub fn range(&self) -> (f64, f64) { (self.min, self.max) }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}

impl TryFrom<HashMap<String, f64>> for PrevalencePrior {
    type Error = RankError;
    fn try_from(values: HashMap<String, f64>) -> Result<Self> { Self::new(values) }
}

impl From<PrevalencePrior> for HashMap<String, f64> {
    fn from(prior: PrevalencePrior) -> Self { prior.values }
}

/// Id prefix -> category key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryLookup {
    prefixes: HashMap<String, String>,
}

impl CategoryLookup {
    pub fn new(prefixes: HashMap<String, String>) -> Self { Self { prefixes } }

    /// Resolve a document id to its category key. Only this function knows
    /// that a category is encoded in the first three characters of an id.
    pub fn resolve(&self, doc_id: &str) -> Result<&str> {
        let prefix = category_prefix(doc_id);
        self.prefixes
            .get(prefix)
            .map(String::as_str)
            .ok_or_else(|| RankError::UnknownPrefix { doc_id: doc_id.to_string(), prefix: prefix.to_string() })
    }
}

fn category_prefix(doc_id: &str) -> &str {
    match doc_id.char_indices().nth(CATEGORY_PREFIX_LEN) {
        Some((end, _)) => &doc_id[..end],
        None => doc_id,
    }
}

/// Both lookup tables consulted by rarity weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RarityTables {
    pub prevalence: PrevalencePrior,
    pub categories: CategoryLookup,
}

impl RarityTables {
    pub fn new(prevalence: PrevalencePrior, categories: CategoryLookup) -> Self { Self { prevalence, categories } }

    /// Prevalence of the category `doc_id` belongs to.
    pub fn prevalence_of(&self, doc_id: &str) -> Result<f64> {
        let category = self.categories.resolve(doc_id)?;
        self.prevalence.get(category)
    }
}

impl Default for RarityTables {
    fn default() -> Self {
        let prevalence = DEFAULT_PREVALENCE.iter().map(|(c, p)| (c.to_string(), *p)).collect();
        let categories = DEFAULT_CATEGORIES.iter().map(|(k, c)| (k.to_string(), c.to_string())).collect();
        Self {
            prevalence: PrevalencePrior::new(prevalence).expect("built-in prevalence table is valid"),
            categories: CategoryLookup::new(categories),
        }
    }
}

use std::collections::HashMap;

/// Term -> occurrence count for one document.
pub type DocumentVector = HashMap<String, u32>;

/// Split text on runs of whitespace. Case and punctuation are kept as-is;
/// any cleanup is expected to have happened when the text was acquired.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

pub fn vectorize(text: &str) -> DocumentVector {
    let mut counts = DocumentVector::new();
    for token in text.split_whitespace() {
        *counts.entry(token.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Sum of counts in a vector.
pub fn vector_len(vector: &DocumentVector) -> u64 {
    vector.values().map(|&c| c as u64).sum()
}

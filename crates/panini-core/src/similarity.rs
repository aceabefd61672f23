//! Bag-of-words concept similarity.

use std::collections::HashSet;

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard index over lowercase words split on whitespace and underscores.
/// Returns 0.0 when either side has no words.
pub fn concept_similarity(a: &str, b: &str) -> f64 {
    let left = tokens(a);
    let right = tokens(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let union = left.union(&right).count();
    shared as f64 / union as f64
}

//! Keyword convergence detection over the unified store.
//!
//! Matching is a literal lowercase substring test on concept and definition.

use crate::integrator::UnifiedStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Fixed keyword set, in tie-break order.
pub const CONVERGENCE_KEYWORDS: [&str; 6] = [
    "entropy",
    "information",
    "quantum",
    "fractal",
    "emergence",
    "complexity",
];

/// Matches needed before a keyword becomes a convergence.
pub const MIN_MATCHES: usize = 2;

pub fn theoretical_significance(keyword: &str) -> &'static str {
    match keyword {
        "entropy" => "fundamental_physics",
        "information" => "foundational_theory",
        "quantum" => "quantum_foundations",
        "fractal" => "mathematical_structure",
        "emergence" => "complexity_science",
        "complexity" => "systems_theory",
        _ => "moderate",
    }
}

/// 0.5 for a concept hit plus 0.3 for a definition hit, capped at 1.0.
pub fn keyword_relevance(keyword: &str, concept: &str, definition: &str) -> f64 {
    let mut relevance: f64 = 0.0;
    if concept.to_lowercase().contains(keyword) {
        relevance += 0.5;
    }
    if definition.to_lowercase().contains(keyword) {
        relevance += 0.3;
    }
    relevance.min(1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingAtom {
    /// Unified-store key of the matching atom.
    pub atom_id: String,
    pub component: String,
    pub concept: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Convergence {
    pub convergence_keyword: String,
    pub matching_atoms: Vec<MatchingAtom>,
    /// Distinct components among `matching_atoms`.
    pub cross_domain_strength: usize,
    pub theoretical_significance: String,
}

/// Scan for one keyword; `None` below [`MIN_MATCHES`].
pub fn detect_keyword(store: &UnifiedStore, keyword: &str) -> Option<Convergence> {
    let matching_atoms: Vec<MatchingAtom> = store
        .iter()
        .filter_map(|(key, unified)| {
            let relevance =
                keyword_relevance(keyword, &unified.atom.concept, &unified.atom.definition);
            (relevance > 0.0).then(|| MatchingAtom {
                atom_id: key.to_string(),
                component: unified.component_source.clone(),
                concept: unified.atom.concept.clone(),
                relevance,
            })
        })
        .collect();

    if matching_atoms.len() < MIN_MATCHES {
        return None;
    }

    let cross_domain_strength = matching_atoms
        .iter()
        .map(|m| m.component.as_str())
        .collect::<HashSet<_>>()
        .len();

    Some(Convergence {
        convergence_keyword: keyword.to_string(),
        matching_atoms,
        cross_domain_strength,
        theoretical_significance: theoretical_significance(keyword).to_string(),
    })
}

/// Convergences for every keyword, in keyword order.
pub fn detect_convergences(store: &UnifiedStore) -> Vec<Convergence> {
    CONVERGENCE_KEYWORDS
        .iter()
        .filter_map(|k| detect_keyword(store, k))
        .collect()
}

/// The `n` strongest convergences; ties keep keyword order.
pub fn top_convergences(convergences: &[Convergence], n: usize) -> Vec<&Convergence> {
    let mut ranked: Vec<&Convergence> = convergences.iter().collect();
    // stable sort: equal strengths stay in detection order
    ranked.sort_by(|a, b| b.cross_domain_strength.cmp(&a.cross_domain_strength));
    ranked.truncate(n);
    ranked
}

//! Mathematics/physics convergence analyzer.
//!
//! Five fixed cross-domain patterns are matched against the theoretical
//! collector stores. A pattern survives when at least two atoms mention one
//! of its keywords.

use super::{load_sources, SourcedAtom};
use chrono::Local;
use panini_collectors::write_atomically;
use panini_core::{iso_timestamp, Error, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

pub const OUTPUT_FILE: &str = "mathematics_physics_convergence_analysis.json";

/// Stores read, in order.
pub const SOURCES: [&str; 3] = ["information_theory", "physics_mathematics", "news"];

/// Denominator for source diversity.
const MAX_SOURCES: f64 = 5.0;

const STRONG_CONVERGENCE: f64 = 0.7;

pub struct PatternSpec {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub domains: &'static [&'static str],
    pub unifying_principle: &'static str,
}

pub const PATTERNS: [PatternSpec; 5] = [
    PatternSpec {
        name: "information_entropy_convergence",
        keywords: &["entropy", "entropie", "information"],
        domains: &["shannon_theory", "statistical_mechanics", "thermodynamics"],
        unifying_principle: "entropy as universal information measure",
    },
    PatternSpec {
        name: "compression_fractal_convergence",
        keywords: &["compression", "fractal", "self-similarity", "auto-similaire"],
        domains: &["compression_algorithms", "fractal_geometry"],
        unifying_principle: "exploitation of self-similarity for compression",
    },
    PatternSpec {
        name: "quantum_classical_emergence",
        keywords: &["quantum", "classical", "emergence", "décohérence"],
        domains: &["quantum_information", "emergence_theory"],
        unifying_principle: "quantum-to-classical transition as emergence",
    },
    PatternSpec {
        name: "phase_transitions_universality",
        keywords: &["transition", "critical", "universality", "critique"],
        domains: &["phase_transitions", "percolation_theory", "statistical_mechanics"],
        unifying_principle: "universal behavior at critical points",
    },
    PatternSpec {
        name: "holographic_information_principle",
        keywords: &["holographic", "boundary", "dimension", "information"],
        domains: &["holographic_principle", "compression_algorithms"],
        unifying_principle: "dimensional reduction preserves information",
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct MathematicalConnection {
    pub concept: String,
    pub mathematical_form: Value,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrossReference {
    pub concept1: String,
    pub concept2: String,
    pub common_terms: Vec<String>,
    pub connection_strength: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvergencePattern {
    pub convergence_type: String,
    pub description: String,
    pub domains: Vec<String>,
    pub matching_concepts: Vec<String>,
    pub source_diversity: usize,
    pub sources_involved: BTreeMap<String, usize>,
    pub category_diversity: usize,
    pub categories_involved: BTreeMap<String, usize>,
    pub convergence_strength: f64,
    pub mathematical_evidence: Vec<MathematicalConnection>,
    pub cross_references: Vec<CrossReference>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    pub total_atoms_analyzed: usize,
    pub convergence_patterns_detected: usize,
    pub strong_convergences: usize,
    pub sources_integrated: usize,
    pub analysis_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvergenceAnalysis {
    pub analysis_metadata: AnalysisMetadata,
    pub convergence_patterns: Vec<ConvergencePattern>,
    pub unifying_principles: Vec<String>,
}

fn matches_pattern(spec: &PatternSpec, atom: &SourcedAtom) -> bool {
    let text = format!("{} {}", atom.atom.concept, atom.atom.definition).to_lowercase();
    spec.keywords.iter().any(|k| text.contains(&k.to_lowercase()))
}

/// `(sources / 5 + mean confidence + share with a mathematical form) / 3`
pub fn convergence_strength(atoms: &[&SourcedAtom]) -> f64 {
    if atoms.is_empty() {
        return 0.0;
    }
    let sources: HashSet<&str> = atoms.iter().map(|a| a.source.as_str()).collect();
    let diversity = sources.len() as f64 / MAX_SOURCES;
    let confidence = atoms
        .iter()
        .map(|a| a.atom.provenance.extraction_confidence)
        .sum::<f64>()
        / atoms.len() as f64;
    let math = atoms
        .iter()
        .filter(|a| a.atom.metadata.contains_key("mathematical_form"))
        .count() as f64
        / atoms.len() as f64;
    (diversity + confidence + math) / 3.0
}

fn word_pattern() -> Option<&'static Regex> {
    static WORDS: OnceLock<Option<Regex>> = OnceLock::new();
    WORDS.get_or_init(|| Regex::new(r"\b\w{4,}\b").ok()).as_ref()
}

/// Lowercase words of four or more word characters.
fn definition_words(definition: &str) -> BTreeSet<String> {
    let Some(words) = word_pattern() else {
        return BTreeSet::new();
    };
    words
        .find_iter(&definition.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Pairs whose definitions share at least two words longer than five chars.
pub fn cross_references(atoms: &[&SourcedAtom]) -> Vec<CrossReference> {
    let words: Vec<BTreeSet<String>> = atoms
        .iter()
        .map(|a| definition_words(&a.atom.definition))
        .collect();
    let mut refs = Vec::new();
    for i in 0..atoms.len() {
        for j in (i + 1)..atoms.len() {
            let common: Vec<String> = words[i]
                .intersection(&words[j])
                .filter(|w| w.chars().count() > 5)
                .cloned()
                .collect();
            if common.len() >= 2 {
                let denominator = words[i].len().max(words[j].len()) as f64;
                refs.push(CrossReference {
                    concept1: atoms[i].atom.concept.clone(),
                    concept2: atoms[j].atom.concept.clone(),
                    connection_strength: common.len() as f64 / denominator,
                    common_terms: common,
                });
            }
        }
    }
    refs
}

fn count_by<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for v in values {
        *counts.entry(v.to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn analyze_pattern(spec: &PatternSpec, atoms: &[SourcedAtom]) -> Option<ConvergencePattern> {
    let matching: Vec<&SourcedAtom> = atoms.iter().filter(|a| matches_pattern(spec, a)).collect();
    if matching.len() < 2 {
        return None;
    }
    let sources_involved = count_by(matching.iter().map(|a| a.source.as_str()));
    let categories_involved = count_by(matching.iter().map(|a| a.atom.category.as_str()));
    let mathematical_evidence = matching
        .iter()
        .filter_map(|a| {
            a.atom.metadata.get("mathematical_form").map(|form| MathematicalConnection {
                concept: a.atom.concept.clone(),
                mathematical_form: form.clone(),
                category: a.atom.category.clone(),
            })
        })
        .collect();

    Some(ConvergencePattern {
        convergence_type: spec.name.to_string(),
        description: spec.unifying_principle.to_string(),
        domains: spec.domains.iter().map(|d| d.to_string()).collect(),
        matching_concepts: matching.iter().map(|a| a.atom.concept.clone()).collect(),
        source_diversity: sources_involved.len(),
        sources_involved,
        category_diversity: categories_involved.len(),
        categories_involved,
        convergence_strength: convergence_strength(&matching),
        mathematical_evidence,
        cross_references: cross_references(&matching),
    })
}

pub fn analyze(atoms: &[SourcedAtom], sources_integrated: usize) -> ConvergenceAnalysis {
    let patterns: Vec<ConvergencePattern> = PATTERNS
        .iter()
        .filter_map(|spec| analyze_pattern(spec, atoms))
        .collect();
    let strong = patterns
        .iter()
        .filter(|p| p.convergence_strength > STRONG_CONVERGENCE)
        .count();
    ConvergenceAnalysis {
        analysis_metadata: AnalysisMetadata {
            total_atoms_analyzed: atoms.len(),
            convergence_patterns_detected: patterns.len(),
            strong_convergences: strong,
            sources_integrated,
            analysis_date: iso_timestamp(Local::now()),
        },
        unifying_principles: patterns.iter().map(|p| p.description.clone()).collect(),
        convergence_patterns: patterns,
    }
}

/// Load the theoretical stores from `dir` and write the analysis there.
pub fn run(dir: &Path) -> Result<(PathBuf, ConvergenceAnalysis)> {
    let (atoms, sources) = load_sources(dir, &SOURCES)?;
    if atoms.is_empty() {
        return Err(Error::MissingFile(dir.join("information_theory_semantic_store.json")));
    }
    let analysis = analyze(&atoms, sources);
    let path = dir.join(OUTPUT_FILE);
    write_atomically(&path, &serde_json::to_string_pretty(&analysis)?)?;
    info!(
        path = %path.display(),
        atoms = atoms.len(),
        patterns = analysis.convergence_patterns.len(),
        "convergence analysis written"
    );
    Ok((path, analysis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use panini_core::{Atom, Provenance};
    use serde_json::json;

    fn sourced(source: &str, concept: &str, definition: &str, conf: f64, math: bool) -> SourcedAtom {
        let mut atom = Atom::new(concept, definition, "k", Provenance::new("t", conf, "m", concept));
        if math {
            atom.metadata.insert("mathematical_form".into(), json!("S = k ln W"));
        }
        SourcedAtom { source: source.into(), atom }
    }

    #[test]
    fn strength_formula() {
        let a = sourced("information_theory", "A", "x", 0.9, true);
        let b = sourced("physics_mathematics", "B", "y", 0.7, false);
        let s = convergence_strength(&[&a, &b]);
        // (2/5 + 0.8 + 0.5) / 3
        assert!((s - (0.4 + 0.8 + 0.5) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn single_match_is_dropped() {
        let atoms = vec![
            sourced("information_theory", "Holographic Screen", "x", 0.9, false),
            sourced("physics_mathematics", "Other", "y", 0.9, false),
        ];
        assert!(analyze_pattern(&PATTERNS[4], &atoms).is_none());
    }

    #[test]
    fn cross_reference_needs_two_long_shared_words() {
        let a = sourced("s", "A", "thermodynamic entropy measures disorder", 0.9, false);
        let b = sourced("s", "B", "statistical entropy measures microstates", 0.9, false);
        let c = sourced("s", "C", "thermodynamic entropy measures disorder again", 0.9, false);
        let refs = cross_references(&[&a, &b, &c]);
        // a/b share "entropy" and "measures"
        assert!(refs.iter().any(|r| r.concept1 == "A" && r.concept2 == "B"));
        let ac = refs.iter().find(|r| r.concept1 == "A" && r.concept2 == "C").unwrap();
        assert_eq!(ac.common_terms.len(), 4);
        // |words(a)| = 4, |words(c)| = 5
        assert!((ac.connection_strength - 4.0 / 5.0).abs() < 1e-9);
    }
}

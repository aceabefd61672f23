//! Pattern discovery over every collector store.

use super::{load_sources, SourcedAtom};
use chrono::Local;
use panini_collectors::write_atomically;
use panini_core::{iso_timestamp, Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

pub const OUTPUT_FILE: &str = "pattern_discovery_report.json";

pub const VERSION: &str = "1.0";

/// Keyword groups, tried in order; the first hit wins.
pub const KEYWORD_GROUPS: [(&str, &[&str]); 3] = [
    ("artificial_intelligence", &["learning", "neural", "ai", "algorithm"]),
    ("computing_systems", &["quantum", "computing", "processor"]),
    ("information_systems", &["data", "information", "knowledge"]),
];

pub const FALLBACK_GROUP: &str = "general_concepts";

const SHORT_FACTOR: f64 = 0.7;
const LONG_FACTOR: f64 = 1.3;

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredPattern {
    pub pattern_name: String,
    pub description: String,
    pub frequency: usize,
    pub domains: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub concepts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DefinitionLengths {
    pub average_length: f64,
    pub short_definitions: usize,
    pub long_definitions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceStats {
    pub count: usize,
    pub avg_confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternMetadata {
    pub total_atoms_analyzed: usize,
    pub sources_analyzed: usize,
    pub analysis_date: String,
    pub pattern_discovery_version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternReport {
    pub analysis_metadata: PatternMetadata,
    pub discovered_patterns: Vec<DiscoveredPattern>,
    pub definition_lengths: DefinitionLengths,
    pub source_specializations: BTreeMap<String, SourceStats>,
    pub collection_by_day: BTreeMap<String, usize>,
}

/// Group for one concept/definition pair.
pub fn keyword_group(concept: &str, definition: &str) -> &'static str {
    let text = format!("{}{}", concept.to_lowercase(), definition.to_lowercase());
    KEYWORD_GROUPS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(name, _)| *name)
        .unwrap_or(FALLBACK_GROUP)
}

/// Average definition length in chars, and how many fall below 0.7× / above 1.3× it.
pub fn definition_lengths(atoms: &[SourcedAtom]) -> DefinitionLengths {
    let lengths: Vec<usize> = atoms
        .iter()
        .map(|a| a.atom.definition.chars().count())
        .collect();
    if lengths.is_empty() {
        return DefinitionLengths {
            average_length: 0.0,
            short_definitions: 0,
            long_definitions: 0,
        };
    }
    let average = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
    DefinitionLengths {
        average_length: average,
        short_definitions: lengths
            .iter()
            .filter(|&&l| (l as f64) < average * SHORT_FACTOR)
            .count(),
        long_definitions: lengths
            .iter()
            .filter(|&&l| (l as f64) > average * LONG_FACTOR)
            .count(),
    }
}

fn cluster(atoms: &[SourcedAtom]) -> Vec<DiscoveredPattern> {
    let group_names = KEYWORD_GROUPS
        .iter()
        .map(|(name, _)| *name)
        .chain(std::iter::once(FALLBACK_GROUP));

    let mut patterns = Vec::new();
    for group in group_names {
        let members: Vec<&SourcedAtom> = atoms
            .iter()
            .filter(|a| keyword_group(&a.atom.concept, &a.atom.definition) == group)
            .collect();
        if members.is_empty() {
            continue;
        }
        let mut domains: Vec<String> = members.iter().map(|a| a.source.clone()).collect();
        domains.dedup();
        patterns.push(DiscoveredPattern {
            pattern_name: group.to_string(),
            description: format!("{} concepts clustered by {} keywords", members.len(), group),
            frequency: members.len(),
            domains,
            concepts: members.iter().map(|a| a.atom.concept.clone()).collect(),
        });
    }
    patterns
}

fn source_specializations(atoms: &[SourcedAtom]) -> BTreeMap<String, SourceStats> {
    let mut stats: BTreeMap<String, SourceStats> = BTreeMap::new();
    for a in atoms {
        let entry = stats.entry(a.source.clone()).or_insert(SourceStats {
            count: 0,
            avg_confidence: 0.0,
        });
        entry.count += 1;
        entry.avg_confidence += a.atom.provenance.extraction_confidence;
    }
    for s in stats.values_mut() {
        s.avg_confidence /= s.count as f64;
    }
    stats
}

fn collection_by_day(atoms: &[SourcedAtom]) -> BTreeMap<String, usize> {
    let mut days = BTreeMap::new();
    for a in atoms {
        let day: String = a.atom.provenance.timestamp.chars().take(10).collect();
        *days.entry(day).or_insert(0) += 1;
    }
    days
}

pub fn analyze(atoms: &[SourcedAtom], sources_analyzed: usize) -> PatternReport {
    let lengths = definition_lengths(atoms);
    let mut discovered_patterns = cluster(atoms);
    let mut domains: Vec<String> = atoms.iter().map(|a| a.source.clone()).collect();
    domains.dedup();
    discovered_patterns.push(DiscoveredPattern {
        pattern_name: "definition_length".to_string(),
        description: format!(
            "average definition length {:.1} chars; {} short, {} long",
            lengths.average_length, lengths.short_definitions, lengths.long_definitions
        ),
        frequency: atoms.len(),
        domains,
        concepts: Vec::new(),
    });

    PatternReport {
        analysis_metadata: PatternMetadata {
            total_atoms_analyzed: atoms.len(),
            sources_analyzed,
            analysis_date: iso_timestamp(Local::now()),
            pattern_discovery_version: VERSION,
        },
        discovered_patterns,
        definition_lengths: lengths,
        source_specializations: source_specializations(atoms),
        collection_by_day: collection_by_day(atoms),
    }
}

/// Load every store named in `prefixes` from `dir` and write the report there.
pub fn run(dir: &Path, prefixes: &[&str]) -> Result<(PathBuf, PatternReport)> {
    let (atoms, sources) = load_sources(dir, prefixes)?;
    if atoms.is_empty() {
        return Err(Error::MissingFile(dir.join("*_semantic_store.json")));
    }
    let report = analyze(&atoms, sources);
    let path = dir.join(OUTPUT_FILE);
    write_atomically(&path, &serde_json::to_string_pretty(&report)?)?;
    info!(
        path = %path.display(),
        atoms = atoms.len(),
        patterns = report.discovered_patterns.len(),
        "pattern report written"
    );
    Ok((path, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use panini_core::{Atom, Provenance};

    fn sourced(source: &str, concept: &str, definition: &str) -> SourcedAtom {
        SourcedAtom {
            source: source.into(),
            atom: Atom::new(concept, definition, "k", Provenance::new("t", 0.8, "m", concept)),
        }
    }

    #[test]
    fn first_matching_group_wins() {
        // "quantum" would also match computing_systems
        assert_eq!(
            keyword_group("Quantum Machine Learning", ""),
            "artificial_intelligence"
        );
        assert_eq!(keyword_group("Quantum Dots", "tiny"), "computing_systems");
        assert_eq!(keyword_group("Knowledge Graph", ""), "information_systems");
        assert_eq!(keyword_group("Percolation", "seuil"), "general_concepts");
    }

    #[test]
    fn ai_substring_is_literal() {
        // "ai" inside "domain" counts, as the rule is a plain substring test
        assert_eq!(keyword_group("Domain", ""), "artificial_intelligence");
    }

    #[test]
    fn length_buckets() {
        let atoms = vec![
            sourced("news", "a", "xx"),
            sourced("news", "b", "xxxxxxxxxx"),
            sourced("news", "c", "xxxxxx"),
        ];
        // average 6: short < 4.2, long > 7.8
        let l = definition_lengths(&atoms);
        assert_eq!(l.average_length, 6.0);
        assert_eq!(l.short_definitions, 1);
        assert_eq!(l.long_definitions, 1);
    }

    #[test]
    fn report_lists_clusters_then_length_pattern() {
        let atoms = vec![
            sourced("news", "Edge AI", "local inference"),
            sourced("analogy", "Percolation", "seuil"),
        ];
        let report = analyze(&atoms, 2);
        let names: Vec<&str> = report
            .discovered_patterns
            .iter()
            .map(|p| p.pattern_name.as_str())
            .collect();
        assert_eq!(names, ["artificial_intelligence", "general_concepts", "definition_length"]);
        assert_eq!(report.source_specializations["news"].count, 1);
    }
}

//! Analogy collector with explicit boundary marking.
//!
//! Every atom carries an [`AnalogyStructure`] derived from its record: the
//! domains it maps between, where the mapping breaks down, and how precise
//! it can be trusted to be.

use crate::record::{parse_sections, Section};
use crate::registry::Collector;
use panini_core::{AnalogyStructure, Atom, DomainMapping, Result};
use serde_json::{json, Map, Value};

const CATALOG: &str = include_str!("../../data/analogy.json");

pub const BOUNDARY_MARKING_PRINCIPLE: &str = "toute_analogie_avec_limites_explicites";

pub struct AnalogyCollector;

/// Build the boundary markers for one analogy record.
pub fn analogy_structure(record: &Map<String, Value>) -> AnalogyStructure {
    let mut structure = AnalogyStructure {
        analogy_type: "explicit_marked_analogy".into(),
        mapping_quality: "provisional_with_boundaries".into(),
        ..Default::default()
    };

    if let (Some(source), Some(target)) = (record.get("source_domain"), record.get("target_domain")) {
        structure.domain_mapping = Some(DomainMapping {
            source: domain_name(source),
            target: domain_name(target),
            mapping_direction: "source_to_target".into(),
        });
    }

    if let Some(limits) = record.get("boundary_limits") {
        structure.boundary_conditions = Some(limits.clone());
        structure.validity_scope = Some("limited_domain_with_explicit_boundaries".into());
        structure.invalid_correspondences = limits.get("invalid_mappings").cloned();
    }

    structure.valid_correspondences = record.get("valid_mappings").cloned();
    // presence marks the record; the value is copied whatever its type
    structure.cognitive_function = record.get("cognitive_utility").cloned();

    if let Some(precision) = record.get("precision_limit") {
        structure.precision_boundary = Some(precision.clone());
        structure.warning = Some("analogie_mnémonique_limites_explicites".into());
    }

    structure
}

fn domain_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Collector for AnalogyCollector {
    fn name(&self) -> &str {
        "analogy"
    }

    fn source_agent(&self) -> &str {
        "analogy_collector"
    }

    fn atom_prefix(&self) -> &str {
        "analogy"
    }

    fn description(&self) -> &str {
        "Collection analogies avec marquage limites explicites"
    }

    fn source_type(&self) -> &str {
        "analogy_mapping"
    }

    fn focus_areas(&self) -> &[&'static str] {
        &[
            "cognitive_analogies",
            "scientific_metaphors",
            "limit_boundaries",
            "mapping_failures",
        ]
    }

    fn sections(&self) -> Result<Vec<Section>> {
        parse_sections(self.name(), CATALOG)
    }

    fn decorate(&self, record: &Map<String, Value>, atom: Atom) -> Atom {
        atom.with_analogy_structure(analogy_structure(record))
    }

    fn statistics(&self, atoms: &[Atom]) -> Map<String, Value> {
        let markers = atoms.iter().filter_map(|a| a.analogy_structure.as_ref());
        let (mut boundaries, mut mappings, mut precision, mut utilities) = (0, 0, 0, 0);
        for m in markers {
            boundaries += usize::from(m.boundary_conditions.is_some());
            mappings += usize::from(m.domain_mapping.is_some());
            precision += usize::from(m.precision_boundary.is_some());
            utilities += usize::from(m.cognitive_function.is_some());
        }

        let mut stats = Map::new();
        stats.insert(
            "analogy_markers".into(),
            json!({
                "explicit_boundaries": boundaries,
                "domain_mappings": mappings,
                "precision_limits": precision,
                "cognitive_utilities": utilities,
            }),
        );
        stats.insert(
            "boundary_marking_principle".into(),
            json!(BOUNDARY_MARKING_PRINCIPLE),
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn hydraulic_analogy_is_fully_marked() {
        let atoms = AnalogyCollector.collect(Local::now()).unwrap();
        let hydraulic = &atoms[0];
        assert_eq!(hydraulic.concept, "Analogie Hydraulique Électricité");

        let s = hydraulic.analogy_structure.as_ref().unwrap();
        assert_eq!(s.analogy_type, "explicit_marked_analogy");
        let mapping = s.domain_mapping.as_ref().unwrap();
        assert_eq!(mapping.source, "hydraulique");
        assert_eq!(mapping.target, "électricité");
        assert_eq!(s.precision_boundary, Some(json!(0.6)));
        assert_eq!(
            s.validity_scope.as_deref(),
            Some("limited_domain_with_explicit_boundaries")
        );
        assert!(s.invalid_correspondences.is_some());
        assert!(s.warning.is_some());
    }

    #[test]
    fn failure_records_carry_only_base_markers() {
        let atoms = AnalogyCollector.collect(Local::now()).unwrap();
        let ether = atoms
            .iter()
            .find(|a| a.concept.contains("Éther"))
            .unwrap();
        let s = ether.analogy_structure.as_ref().unwrap();
        assert_eq!(s.mapping_quality, "provisional_with_boundaries");
        assert!(s.domain_mapping.is_none());
        assert!(s.boundary_conditions.is_none());
        assert!(s.warning.is_none());
    }

    #[test]
    fn markers_copy_values_of_any_type() {
        let record = json!({
            "source_domain": "thermodynamique",
            "target_domain": ["information", "calcul"],
            "cognitive_utility": {"teaching": "high"},
            "precision_limit": "qualitative"
        });
        let s = analogy_structure(record.as_object().unwrap());

        assert_eq!(s.cognitive_function, Some(json!({"teaching": "high"})));
        assert_eq!(s.precision_boundary, Some(json!("qualitative")));
        assert!(s.warning.is_some());
        let mapping = s.domain_mapping.as_ref().unwrap();
        assert_eq!(mapping.target, r#"["information","calcul"]"#);

        let stats = AnalogyCollector.statistics(&[Atom::new(
            "c",
            "d",
            "k",
            panini_core::Provenance::new("analogy_collector", 0.85, "m", "id"),
        )
        .with_analogy_structure(s)]);
        assert_eq!(stats["analogy_markers"]["cognitive_utilities"], 1);
        assert_eq!(stats["analogy_markers"]["precision_limits"], 1);
    }

    #[test]
    fn marker_statistics() {
        let atoms = AnalogyCollector.collect(Local::now()).unwrap();
        assert_eq!(atoms.len(), 12);
        let stats = AnalogyCollector.statistics(&atoms);
        assert_eq!(
            stats["analogy_markers"],
            json!({
                "explicit_boundaries": 8,
                "domain_mappings": 8,
                "precision_limits": 8,
                "cognitive_utilities": 10
            })
        );
        assert_eq!(stats["boundary_marking_principle"], BOUNDARY_MARKING_PRINCIPLE);
    }
}

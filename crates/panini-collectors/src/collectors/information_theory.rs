//! Information theory collector: Shannon, compression, fractals, emergence.

use super::count_mathematical_forms;
use crate::record::{parse_sections, Section};
use crate::registry::Collector;
use panini_core::{Atom, Result};
use serde_json::{json, Map, Value};

const CATALOG: &str = include_str!("../../data/information_theory.json");

pub struct InformationTheoryCollector;

impl Collector for InformationTheoryCollector {
    fn name(&self) -> &str {
        "information_theory"
    }

    fn source_agent(&self) -> &str {
        "information_theory_collector"
    }

    fn atom_prefix(&self) -> &str {
        "info_theory"
    }

    fn description(&self) -> &str {
        "Collecte théories information, compression, fractales"
    }

    fn focus_areas(&self) -> &[&'static str] {
        &[
            "shannon_theory",
            "compression_algorithms",
            "fractal_geometry",
            "emergence_theory",
        ]
    }

    fn sections(&self) -> Result<Vec<Section>> {
        parse_sections(self.name(), CATALOG)
    }

    fn statistics(&self, atoms: &[Atom]) -> Map<String, Value> {
        let mut stats = Map::new();
        stats.insert(
            "mathematical_concepts".into(),
            json!(count_mathematical_forms(atoms)),
        );
        stats
    }
}

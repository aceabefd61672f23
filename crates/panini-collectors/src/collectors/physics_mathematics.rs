//! Physics and mathematics collector: quantum information, statistical
//! mechanics, relativity, thermodynamics.

use super::count_mathematical_forms;
use crate::record::{parse_sections, Section};
use crate::registry::Collector;
use panini_core::{Atom, Result};
use serde_json::{json, Map, Value};

const CATALOG: &str = include_str!("../../data/physics_mathematics.json");

pub struct PhysicsMathematicsCollector;

impl Collector for PhysicsMathematicsCollector {
    fn name(&self) -> &str {
        "physics_mathematics"
    }

    fn source_agent(&self) -> &str {
        "physics_math_collector"
    }

    fn atom_prefix(&self) -> &str {
        "physics"
    }

    fn description(&self) -> &str {
        "Collecte physique mathématique et structures informationnelles"
    }

    fn focus_areas(&self) -> &[&'static str] {
        &[
            "quantum_information",
            "statistical_mechanics",
            "relativity",
            "thermodynamics",
        ]
    }

    fn default_confidence(&self) -> f64 {
        0.88
    }

    fn sections(&self) -> Result<Vec<Section>> {
        parse_sections(self.name(), CATALOG)
    }

    fn statistics(&self, atoms: &[Atom]) -> Map<String, Value> {
        let quantum = atoms
            .iter()
            .filter(|a| a.category.to_lowercase().contains("quantum"))
            .count();
        let mut stats = Map::new();
        stats.insert("mathematical_forms".into(), json!(count_mathematical_forms(atoms)));
        stats.insert("quantum_concepts".into(), json!(quantum));
        stats
    }
}

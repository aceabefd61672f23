//! Semantic atom model shared by collectors, loader and integrator.
//!
//! Atoms are immutable once emitted. The integrator never edits one; it wraps
//! it in a [`UnifiedAtom`] envelope instead.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Confidence assigned when a record carries no `relevance_score`.
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Local ISO 8601 timestamp with microseconds, e.g. `2026-10-15T09:41:07.123456`.
pub fn iso_timestamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

pub fn iso_now() -> String {
    iso_timestamp(Local::now())
}

/// `<prefix>_<YYYYMMDD>_<section>_<NNN>`
pub fn atom_id(prefix: &str, date: DateTime<Local>, section: &str, index: usize) -> String {
    format!("{}_{}_{}_{:03}", prefix, date.format("%Y%m%d"), section, index)
}

/// Where an atom came from and how much the producer trusts it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Provenance {
    pub source_agent: String,
    pub timestamp: String,
    /// Never clipped: out-of-range values survive loading unchanged.
    pub extraction_confidence: f64,
    pub collection_method: String,
    pub atom_id: String,
}

impl Provenance {
    pub fn new(
        source_agent: impl Into<String>,
        extraction_confidence: f64,
        collection_method: impl Into<String>,
        atom_id: impl Into<String>,
    ) -> Self {
        Self {
            source_agent: source_agent.into(),
            timestamp: iso_now(),
            extraction_confidence,
            collection_method: collection_method.into(),
            atom_id: atom_id.into(),
        }
    }
}

// `timestamp` is excluded: two emissions of the same record are the same atom.
impl PartialEq for Provenance {
    fn eq(&self, other: &Self) -> bool {
        self.source_agent == other.source_agent
            && self.extraction_confidence == other.extraction_confidence
            && self.collection_method == other.collection_method
            && self.atom_id == other.atom_id
    }
}

/// Direction of an analogy between two domains.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainMapping {
    pub source: String,
    pub target: String,
    pub mapping_direction: String,
}

/// Boundary markers attached to analogy atoms.
///
/// Fields outside the recognized set are kept in `extra` so the structure
/// round-trips verbatim through the integrator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalogyStructure {
    #[serde(default)]
    pub analogy_type: String,
    #[serde(default)]
    pub mapping_quality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_mapping: Option<DomainMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary_conditions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_correspondences: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_correspondences: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cognitive_function: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision_boundary: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One concept record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "AtomRecord")]
pub struct Atom {
    pub concept: String,
    pub definition: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analogy_structure: Option<AnalogyStructure>,
    pub metadata: Map<String, Value>,
    pub provenance: Provenance,
}

impl Atom {
    pub fn new(
        concept: impl Into<String>,
        definition: impl Into<String>,
        category: impl Into<String>,
        provenance: Provenance,
    ) -> Self {
        Self {
            concept: concept.into(),
            definition: definition.into(),
            category: category.into(),
            analogy_structure: None,
            metadata: Map::new(),
            provenance,
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_analogy_structure(mut self, structure: AnalogyStructure) -> Self {
        self.analogy_structure = Some(structure);
        self
    }

    pub fn atom_id(&self) -> &str {
        &self.provenance.atom_id
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Wire shape of an atom. Unknown top-level keys are collected in `unknown`
/// and folded into `metadata` on conversion.
#[derive(Deserialize)]
struct AtomRecord {
    concept: String,
    definition: String,
    category: String,
    #[serde(default)]
    analogy_structure: Option<AnalogyStructure>,
    #[serde(default)]
    metadata: Map<String, Value>,
    provenance: Provenance,
    #[serde(flatten)]
    unknown: Map<String, Value>,
}

impl From<AtomRecord> for Atom {
    fn from(record: AtomRecord) -> Self {
        let mut metadata = record.metadata;
        for (key, value) in record.unknown {
            metadata.entry(key).or_insert(value);
        }
        Self {
            concept: record.concept,
            definition: record.definition,
            category: record.category,
            analogy_structure: record.analogy_structure,
            metadata,
            provenance: record.provenance,
        }
    }
}

/// Coarse role of the component an atom was integrated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchitecturalLayer {
    Infrastructure,
    TheoreticalFoundation,
    IntegrationLayer,
    SafetyLayer,
    AnalysisLayer,
    Unknown,
}

impl ArchitecturalLayer {
    pub fn for_component(component: &str) -> Self {
        match component {
            "autonomous_engine" => Self::Infrastructure,
            "information_theory" | "physics_mathematics" => Self::TheoreticalFoundation,
            "convergence_analysis" => Self::IntegrationLayer,
            "analogy_safety" => Self::SafetyLayer,
            "pattern_discovery" => Self::AnalysisLayer,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Infrastructure => "infrastructure",
            Self::TheoreticalFoundation => "theoretical_foundation",
            Self::IntegrationLayer => "integration_layer",
            Self::SafetyLayer => "safety_layer",
            Self::AnalysisLayer => "analysis_layer",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ArchitecturalLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An atom as it sits in the unified store.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnifiedAtom {
    #[serde(flatten)]
    pub atom: Atom,
    pub component_source: String,
    pub integration_timestamp: String,
    pub architectural_layer: ArchitecturalLayer,
}

impl UnifiedAtom {
    pub fn wrap(atom: Atom, component: &str) -> Self {
        Self {
            atom,
            component_source: component.to_string(),
            integration_timestamp: iso_now(),
            architectural_layer: ArchitecturalLayer::for_component(component),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn atom_id_format() {
        let date = Local.with_ymd_and_hms(2025, 3, 7, 10, 0, 0).unwrap();
        assert_eq!(
            atom_id("info_theory", date, "shannon_fundamentals", 4),
            "info_theory_20250307_shannon_fundamentals_004"
        );
    }

    #[test]
    fn equality_ignores_timestamp() {
        let mut a = Provenance::new("c", 0.9, "structured_x", "id_1");
        let b = a.clone();
        a.timestamp = "1999-01-01T00:00:00".into();
        assert_eq!(a, b);
    }

    #[test]
    fn layer_mapping() {
        assert_eq!(
            ArchitecturalLayer::for_component("physics_mathematics"),
            ArchitecturalLayer::TheoreticalFoundation
        );
        assert_eq!(
            ArchitecturalLayer::for_component("wikipedia"),
            ArchitecturalLayer::Unknown
        );
        assert_eq!(
            serde_json::to_string(&ArchitecturalLayer::SafetyLayer).unwrap(),
            r#""safety_layer""#
        );
    }
}

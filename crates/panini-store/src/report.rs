//! Architecture report and unified-store snapshot.

use crate::convergence::{top_convergences, Convergence};
use crate::integrator::{Integration, UnifiedStore};
use chrono::{DateTime, Local};
use panini_collectors::write_atomically;
use panini_core::{iso_timestamp, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

pub const THEORETICAL_FOUNDATIONS: [&str; 5] = [
    "Shannon Information Theory",
    "Quantum Information",
    "Fractal Geometry",
    "Thermodynamic Information",
    "Emergence Theory",
];

pub const SAFETY_MECHANISMS: [&str; 3] = [
    "Explicit Boundary Marking",
    "Analogy Risk Assessment",
    "Domain Restriction Validation",
];

pub const PANINI_VERSION: &str = "2.0-architectural";

const TOP_CONVERGENCES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitecturalPrinciple {
    pub principle: String,
    pub description: String,
    pub implementation: String,
    pub validation: String,
}

impl ArchitecturalPrinciple {
    fn new(principle: &str, description: &str, implementation: &str, validation: &str) -> Self {
        Self {
            principle: principle.into(),
            description: description.into(),
            implementation: implementation.into(),
            validation: validation.into(),
        }
    }
}

pub fn architectural_principles() -> Vec<ArchitecturalPrinciple> {
    vec![
        ArchitecturalPrinciple::new(
            "Autonomous Decision Making",
            "Système capable de prendre décisions sans micro-confirmations",
            "total_autonomy_engine avec seuils confiance adaptatifs",
            "100% success rate sur mission nocturne",
        ),
        ArchitecturalPrinciple::new(
            "Theoretical Foundation Integration",
            "Architecture basée sur théories fondamentales physique/mathématiques",
            "Intégration Shannon, quantum, fractals, emergence",
            "Convergences détectées entre domaines théoriques",
        ),
        ArchitecturalPrinciple::new(
            "Analogy Safety Mechanisms",
            "Prévention pièges analogiques par marquage frontières explicites",
            "Boundary marking avec domain restrictions",
            "Validation contextuelle et alertes breakdown points",
        ),
        ArchitecturalPrinciple::new(
            "Semantic Unification",
            "Store sémantique unifié pour cohérence cross-domaines",
            "Integration layer avec détection convergences",
            "Cross-domain relations automatiquement détectées",
        ),
        ArchitecturalPrinciple::new(
            "Pattern Discovery Automation",
            "Découverte automatique motifs et structures émergentes",
            "Pattern discovery analyzer avec frequency analysis",
            "Motifs récurrents identifiés automatiquement",
        ),
    ]
}

pub fn recommendations(convergences_detected: usize, principle_count: usize) -> Vec<String> {
    let mut out = Vec::new();
    if convergences_detected > 5 {
        out.push("Strong cross-domain connectivity detected".to_string());
    } else {
        out.push("Enrich cross-domain relations".to_string());
    }
    if principle_count >= 5 {
        out.push("Well-structured architecture with clear principles".to_string());
    }
    out.extend(
        [
            "Maintain regular autonomous execution",
            "Monitor emergence of new patterns",
            "Continuously validate analogical safety",
            "Analyse convergences for optimization",
        ]
        .map(String::from),
    );
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSummary {
    pub total_components: usize,
    pub integrated_components: usize,
    pub total_atoms: usize,
    pub convergences_detected: usize,
    pub architectural_principles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopConvergence {
    pub keyword: String,
    pub cross_domain_strength: usize,
    pub significance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitecturalHealth {
    pub theoretical_coverage: usize,
    pub safety_coverage: usize,
    pub integration_completeness: f64,
    pub cross_domain_connectivity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureReport {
    pub integration_summary: IntegrationSummary,
    pub component_distribution: BTreeMap<String, usize>,
    pub architectural_layers: BTreeMap<String, usize>,
    pub theoretical_foundations: Vec<String>,
    pub safety_mechanisms: Vec<String>,
    pub top_convergences: Vec<TopConvergence>,
    pub architectural_health: ArchitecturalHealth,
    pub recommendations: Vec<String>,
}

impl ArchitectureReport {
    /// Fold the integration result and its convergences into a report.
    pub fn build(integration: &Integration, convergences: &[Convergence]) -> Self {
        let principles = architectural_principles().len();
        let total_components = integration.total_components();
        let integrated_components = integration.integrated_components();

        let integration_completeness = if total_components == 0 {
            0.0
        } else {
            integrated_components as f64 / total_components as f64
        };

        let architectural_layers = integration
            .store
            .layer_distribution()
            .into_iter()
            .map(|(layer, count)| (layer.to_string(), count))
            .collect();

        let theoretical_foundations: Vec<String> =
            THEORETICAL_FOUNDATIONS.iter().map(|s| s.to_string()).collect();
        let safety_mechanisms: Vec<String> =
            SAFETY_MECHANISMS.iter().map(|s| s.to_string()).collect();

        Self {
            integration_summary: IntegrationSummary {
                total_components,
                integrated_components,
                total_atoms: integration.store.len(),
                convergences_detected: convergences.len(),
                architectural_principles: principles,
            },
            component_distribution: integration.store.component_distribution(),
            architectural_layers,
            architectural_health: ArchitecturalHealth {
                theoretical_coverage: theoretical_foundations.len(),
                safety_coverage: safety_mechanisms.len(),
                integration_completeness,
                cross_domain_connectivity: convergences.len(),
            },
            theoretical_foundations,
            safety_mechanisms,
            top_convergences: top_convergences(convergences, TOP_CONVERGENCES)
                .into_iter()
                .map(|c| TopConvergence {
                    keyword: c.convergence_keyword.clone(),
                    cross_domain_strength: c.cross_domain_strength,
                    significance: c.theoretical_significance.clone(),
                })
                .collect(),
            recommendations: recommendations(convergences.len(), principles),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IntegratedComponent {
    pub name: String,
    pub atoms_count: usize,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct IntegrationMetadata {
    pub integration_date: String,
    pub panini_version: &'static str,
    pub components_integrated: Vec<IntegratedComponent>,
    pub total_atoms: usize,
    pub theoretical_foundations: Vec<&'static str>,
    pub safety_mechanisms: Vec<&'static str>,
}

/// Full unified store as persisted by `integrate`.
#[derive(Debug, Serialize)]
pub struct UnifiedStoreSnapshot<'a> {
    pub integration_metadata: IntegrationMetadata,
    pub unified_semantic_atoms: &'a UnifiedStore,
    pub cross_domain_relations: &'a [Convergence],
    pub architectural_principles: Vec<ArchitecturalPrinciple>,
}

impl<'a> UnifiedStoreSnapshot<'a> {
    pub fn new(
        integration: &'a Integration,
        convergences: &'a [Convergence],
        at: DateTime<Local>,
    ) -> Self {
        Self {
            integration_metadata: IntegrationMetadata {
                integration_date: iso_timestamp(at),
                panini_version: PANINI_VERSION,
                components_integrated: integration
                    .integrated()
                    .map(|c| IntegratedComponent {
                        name: c.name.clone(),
                        atoms_count: c.atoms,
                        status: "integrated",
                    })
                    .collect(),
                total_atoms: integration.store.len(),
                theoretical_foundations: THEORETICAL_FOUNDATIONS.to_vec(),
                safety_mechanisms: SAFETY_MECHANISMS.to_vec(),
            },
            unified_semantic_atoms: &integration.store,
            cross_domain_relations: convergences,
            architectural_principles: architectural_principles(),
        }
    }
}

fn stamp(at: DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// A serialized document and the path it will be written to.
#[derive(Debug)]
pub struct Rendered {
    pub path: PathBuf,
    text: String,
}

fn render<T: Serialize>(path: PathBuf, value: &T) -> Result<Rendered> {
    Ok(Rendered {
        path,
        text: serde_json::to_string_pretty(value)?,
    })
}

/// Serialize the report as `panini_unified_architecture_<YYYYMMDD_HHMMSS>.json`.
pub fn render_report(dir: &Path, report: &ArchitectureReport, at: DateTime<Local>) -> Result<Rendered> {
    render(dir.join(format!("panini_unified_architecture_{}.json", stamp(at))), report)
}

/// Serialize the snapshot as `panini_unified_store_<YYYYMMDD_HHMMSS>.json`.
pub fn render_snapshot(dir: &Path, snapshot: &UnifiedStoreSnapshot<'_>, at: DateTime<Local>) -> Result<Rendered> {
    render(dir.join(format!("panini_unified_store_{}.json", stamp(at))), snapshot)
}

/// Write the snapshot, then the report. The pair lands together or not at
/// all: a failed report write removes the snapshot again.
pub fn write_outputs(snapshot: Rendered, report: Rendered) -> Result<(PathBuf, PathBuf)> {
    write_atomically(&snapshot.path, &snapshot.text)?;
    if let Err(e) = write_atomically(&report.path, &report.text) {
        let _ = std::fs::remove_file(&snapshot.path);
        return Err(e.into());
    }
    info!(path = %snapshot.path.display(), "unified store written");
    info!(path = %report.path.display(), "architecture report written");
    Ok((snapshot.path, report.path))
}

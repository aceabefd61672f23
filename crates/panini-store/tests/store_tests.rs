//! Tests for panini-store: loader shapes, integration, convergence, reports

use chrono::Local;
use panini_collectors::{create_default_registry, write_store};
use panini_core::ArchitecturalLayer;
use panini_store::analyzers::{math_physics, pattern_discovery};
use panini_store::*;
use serde_json::{json, Value};
use std::path::Path;

fn write_json(dir: &Path, name: &str, value: &Value) {
    std::fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn atom_json(concept: &str, definition: &str, category: &str, id: &str) -> Value {
    json!({
        "concept": concept,
        "definition": definition,
        "category": category,
        "metadata": {},
        "provenance": {
            "source_agent": "test",
            "timestamp": "2025-01-01T00:00:00",
            "extraction_confidence": 0.9,
            "collection_method": "structured_test",
            "atom_id": id
        }
    })
}

fn store_json(atoms: Vec<Value>) -> Value {
    json!({"metadata": {"version": "1.0"}, "semantic_atoms": atoms})
}

fn entropy_atom() -> Value {
    json!({
        "concept": "Entropie Informationnelle",
        "definition": "Mesure quantitative de l'incertitude contenue dans un message, H(X) = -Σ p(x) log₂ p(x)",
        "category": "shannon_theory",
        "metadata": {"mathematical_form": "H(X) = -Σ p(x) log₂ p(x)", "relevance_score": 0.98},
        "provenance": {
            "source_agent": "information_theory_collector",
            "timestamp": "2025-01-01T00:00:00",
            "extraction_confidence": 0.98,
            "collection_method": "structured_shannon_fundamentals",
            "atom_id": "info_theory_20250101_shannon_fundamentals_000"
        }
    })
}

fn integrate(dir: &Path) -> (Integration, Vec<Convergence>, ArchitectureReport) {
    let integration = Integrator::new(dir).integrate().unwrap();
    let convergences = detect_convergences(&integration.store);
    let report = ArchitectureReport::build(&integration, &convergences);
    (integration, convergences, report)
}

// ===========================================================================
// End-to-end scenarios
// ===========================================================================

#[test]
fn single_information_theory_source() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "information_theory_semantic_store.json",
        &store_json(vec![entropy_atom()]),
    );

    let (integration, convergences, report) = integrate(dir.path());
    assert_eq!(integration.store.len(), 1);
    assert_eq!(report.component_distribution.len(), 1);
    assert_eq!(report.component_distribution["information_theory"], 1);
    assert_eq!(report.architectural_layers["theoretical_foundation"], 1);

    // "entropie" is not "entropy"; "information" matches once only
    assert!(convergences.is_empty());
    assert!(detect_convergences(&integration.store)
        .iter()
        .all(|c| c.convergence_keyword != "entropy"));
    assert!(report.top_convergences.is_empty());
    assert_eq!(report.integration_summary.integrated_components, 1);
    assert_eq!(report.integration_summary.total_components, 6);
}

#[test]
fn two_atoms_share_information_keyword() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "information_theory_semantic_store.json",
        &store_json(vec![entropy_atom()]),
    );
    write_json(
        dir.path(),
        "physics_mathematics_semantic_store.json",
        &store_json(vec![atom_json(
            "Quantum Information",
            "Information-theoretic view of quantum states",
            "quantum_information",
            "physics_20250101_quantum_information_000",
        )]),
    );

    let (_, convergences, report) = integrate(dir.path());
    assert_eq!(convergences.len(), 1);
    let info = &convergences[0];
    assert_eq!(info.convergence_keyword, "information");
    assert_eq!(info.matching_atoms.len(), 2);
    assert_eq!(info.cross_domain_strength, 2);
    assert_eq!(info.theoretical_significance, "foundational_theory");

    assert_eq!(report.top_convergences.len(), 1);
    assert_eq!(report.top_convergences[0].keyword, "information");
    assert_eq!(report.top_convergences[0].cross_domain_strength, 2);
}

#[test]
fn loader_tolerates_keyed_values() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "analogy_legacy.json",
        &json!({
            "concept_a": "definition of A",
            "concept_b": {"concept": "B", "definition": "def B", "category": "c"}
        }),
    );

    let loaded = load_latest(dir.path(), "analogy").unwrap().unwrap();
    assert_eq!(loaded.atoms.len(), 2);

    let a = &loaded.atoms[0];
    assert_eq!(a.concept, "concept_a");
    assert_eq!(a.definition, "definition of A");
    assert_eq!(a.category, "key_value");
    assert_eq!(a.provenance.source_agent, "legacy");
    assert_eq!(a.provenance.extraction_confidence, 0.85);
    assert_eq!(a.provenance.collection_method, "direct_load");

    let b = &loaded.atoms[1];
    assert_eq!(b.concept, "B");
    assert_eq!(b.definition, "def B");
    assert_eq!(b.category, "c");
}

#[test]
fn convergence_ties_follow_keyword_order() {
    let dir = tempfile::tempdir().unwrap();
    let both = |id: &str| atom_json("Entropy Quantum Fractal", "x", "k", id);
    write_json(
        dir.path(),
        "information_theory_semantic_store.json",
        &store_json(vec![both("i1")]),
    );
    write_json(
        dir.path(),
        "physics_mathematics_semantic_store.json",
        &store_json(vec![both("p1")]),
    );
    write_json(
        dir.path(),
        "analogy_semantic_store.json",
        &store_json(vec![atom_json("Quantum Entropy", "y", "k", "a1")]),
    );

    let (_, convergences, report) = integrate(dir.path());
    let strengths: Vec<(&str, usize)> = convergences
        .iter()
        .map(|c| (c.convergence_keyword.as_str(), c.cross_domain_strength))
        .collect();
    assert_eq!(strengths, [("entropy", 3), ("quantum", 3), ("fractal", 2)]);

    let top: Vec<&str> = report.top_convergences.iter().map(|c| c.keyword.as_str()).collect();
    assert_eq!(top, ["entropy", "quantum", "fractal"]);
}

// ===========================================================================
// Loader
// ===========================================================================

#[test]
fn newest_store_wins() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "news_20250101_000000.json",
        &store_json(vec![atom_json("Old", "d", "k", "o")]),
    );
    let old = dir.path().join("news_20250101_000000.json");
    let f = std::fs::File::options().write(true).open(&old).unwrap();
    f.set_modified(std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000))
        .unwrap();
    write_json(
        dir.path(),
        "news_semantic_store.json",
        &store_json(vec![atom_json("New", "d", "k", "n")]),
    );

    let loaded = load_latest(dir.path(), "news").unwrap().unwrap();
    assert_eq!(loaded.atoms[0].concept, "New");
}

#[test]
fn missing_prefix_yields_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(find_latest(dir.path(), "analogy").unwrap().is_none());
    assert!(find_latest(&dir.path().join("nope"), "analogy").unwrap().is_none());
}

#[test]
fn malformed_store_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("analogy_semantic_store.json"), "{ not json").unwrap();
    write_json(
        dir.path(),
        "information_theory_semantic_store.json",
        &store_json(vec![entropy_atom()]),
    );

    let integration = Integrator::new(dir.path()).integrate().unwrap();
    assert_eq!(integration.integrated_components(), 1);
    let analogy = integration
        .components
        .iter()
        .find(|c| c.name == "analogy_safety")
        .unwrap();
    assert!(matches!(analogy.status, ComponentStatus::Failed(_)));
}

#[test]
fn every_collector_round_trips_through_the_loader() {
    let dir = tempfile::tempdir().unwrap();
    let at = Local::now();
    for collector in create_default_registry().iter() {
        let summary = write_store(collector.as_ref(), dir.path(), at).unwrap();
        let loaded = load_file(&summary.path).unwrap();
        let original = collector.collect(at).unwrap();
        assert_eq!(loaded.atoms, original, "{} did not round-trip", collector.name());
        assert_eq!(loaded.defaulted_fields, 0);
    }
}

// ===========================================================================
// Integration properties
// ===========================================================================

fn full_work_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let registry = create_default_registry();
    for name in registry.list() {
        registry.run(name, dir.path()).unwrap();
    }
    math_physics::run(dir.path()).unwrap();
    pattern_discovery::run(dir.path(), &registry.list()).unwrap();
    dir
}

#[test]
fn merge_completeness() {
    let dir = full_work_dir();
    let (integration, _, report) = integrate(dir.path());

    assert_eq!(integration.integrated_components(), 6);
    assert_eq!(report.architectural_health.integration_completeness, 1.0);

    let by_component: usize = report.component_distribution.values().sum();
    let by_layer: usize = report.architectural_layers.values().sum();
    assert_eq!(report.integration_summary.total_atoms, by_component);
    assert_eq!(by_component, by_layer);
    assert!(!report.architectural_layers.contains_key("unknown"));
}

#[test]
fn duplicate_ids_agree_across_counts() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "information_theory_semantic_store.json",
        &store_json(vec![
            atom_json("Entropy", "first", "shannon_theory", "dup"),
            atom_json("Channel", "capacity", "shannon_theory", "other"),
            atom_json("Entropy", "second", "shannon_theory", "dup"),
        ]),
    );

    let out = run_pipeline(dir.path()).unwrap();
    assert_eq!(out.integration.store.len(), 2);
    assert_eq!(out.report.component_distribution["information_theory"], 2);
    assert_eq!(
        out.integration.store.get("information_theory_dup").unwrap().atom.definition,
        "second"
    );

    let snapshot: Value =
        serde_json::from_str(&std::fs::read_to_string(&out.snapshot_path).unwrap()).unwrap();
    let meta = &snapshot["integration_metadata"];
    assert_eq!(meta["total_atoms"], 2);
    assert_eq!(meta["components_integrated"][0]["name"], "information_theory");
    assert_eq!(meta["components_integrated"][0]["atoms_count"], 2);
}

#[test]
fn relevance_stays_in_bounds() {
    let dir = full_work_dir();
    let (integration, convergences, _) = integrate(dir.path());
    assert!(!convergences.is_empty());
    for c in &convergences {
        for m in &c.matching_atoms {
            assert!(m.relevance > 0.0 && m.relevance <= 1.0);
            if (m.relevance - 0.8).abs() < 1e-9 {
                let atom = &integration.store.get(&m.atom_id).unwrap().atom;
                assert!(atom.concept.to_lowercase().contains(&c.convergence_keyword));
                assert!(atom.definition.to_lowercase().contains(&c.convergence_keyword));
            }
        }
    }
}

#[test]
fn keys_are_stable_across_runs() {
    let dir = full_work_dir();
    let first: Vec<String> = Integrator::new(dir.path())
        .integrate()
        .unwrap()
        .store
        .keys()
        .map(String::from)
        .collect();
    let second: Vec<String> = Integrator::new(dir.path())
        .integrate()
        .unwrap()
        .store
        .keys()
        .map(String::from)
        .collect();
    assert_eq!(first, second);
}

#[test]
fn adding_a_matching_atom_never_weakens_a_convergence() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "information_theory_semantic_store.json",
        &store_json(vec![
            atom_json("Fractal Dimension", "x", "k", "i1"),
            atom_json("Fractal Coding", "y", "k", "i2"),
        ]),
    );
    let before = integrate(dir.path()).1;
    assert_eq!(before[0].cross_domain_strength, 1);

    write_json(
        dir.path(),
        "pattern_discovery_report.json",
        &json!({"discovered_patterns": [{"pattern_name": "fractal_motifs", "description": "d"}]}),
    );
    let after = integrate(dir.path()).1;
    let fractal = after
        .iter()
        .find(|c| c.convergence_keyword == "fractal")
        .unwrap();
    assert!(fractal.cross_domain_strength >= before[0].cross_domain_strength);
    assert_eq!(fractal.cross_domain_strength, 2);
}

#[test]
fn unknown_layer_only_for_unrecognized_components() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "arxiv_semantic_store.json",
        &store_json(vec![atom_json("Paper", "d", "k", "x")]),
    );
    write_json(
        dir.path(),
        "analogy_semantic_store.json",
        &store_json(vec![atom_json("Analogy", "d", "k", "y")]),
    );

    let components = vec![
        Component { name: "arxiv", prefix: "arxiv" },
        Component { name: "analogy_safety", prefix: "analogy" },
    ];
    let integration = Integrator::new(dir.path())
        .with_components(components)
        .integrate()
        .unwrap();
    let layers: Vec<ArchitecturalLayer> = integration
        .store
        .iter()
        .map(|(_, a)| a.architectural_layer)
        .collect();
    assert_eq!(layers, [ArchitecturalLayer::Unknown, ArchitecturalLayer::SafetyLayer]);
}

// ===========================================================================
// Pipeline output
// ===========================================================================

#[test]
fn pipeline_writes_report_and_snapshot() {
    let dir = full_work_dir();
    let out = run_pipeline(dir.path()).unwrap();

    let name = out.report_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("panini_unified_architecture_") && name.ends_with(".json"));

    let report: Value =
        serde_json::from_str(&std::fs::read_to_string(&out.report_path).unwrap()).unwrap();
    assert_eq!(report["integration_summary"]["architectural_principles"], 5);
    assert_eq!(report["theoretical_foundations"][0], "Shannon Information Theory");
    assert_eq!(report["safety_mechanisms"].as_array().unwrap().len(), 3);
    assert_eq!(
        report["recommendations"].as_array().unwrap().last().unwrap(),
        "Analyse convergences for optimization"
    );

    let snapshot: Value =
        serde_json::from_str(&std::fs::read_to_string(&out.snapshot_path).unwrap()).unwrap();
    assert_eq!(snapshot["integration_metadata"]["panini_version"], "2.0-architectural");
    let atoms = snapshot["unified_semantic_atoms"].as_object().unwrap();
    assert_eq!(atoms.len(), out.integration.store.len());
    // load order: the news collector is the first component
    assert!(atoms.keys().next().unwrap().starts_with("autonomous_engine_news_"));
    let analogy = atoms
        .values()
        .find(|a| a["component_source"] == "analogy_safety" && a.get("analogy_structure").is_some())
        .unwrap();
    assert_eq!(analogy["analogy_structure"]["analogy_type"], "explicit_marked_analogy");
}

#[test]
fn analyzers_feed_the_integrator() {
    let dir = full_work_dir();
    let (integration, _, _) = integrate(dir.path());
    let dist = integration.store.component_distribution();
    assert!(dist["convergence_analysis"] >= 1);
    assert!(dist["pattern_discovery"] >= 2);

    let analysis: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join(math_physics::OUTPUT_FILE)).unwrap(),
    )
    .unwrap();
    let first = &analysis["convergence_patterns"][0];
    assert_eq!(first["convergence_type"], "information_entropy_convergence");
    assert!(first["domains"].is_array());
}

#[test]
fn analyzers_need_at_least_one_store() {
    let dir = tempfile::tempdir().unwrap();
    assert!(math_physics::run(dir.path()).is_err());
    assert!(pattern_discovery::run(dir.path(), &["news"]).is_err());
}

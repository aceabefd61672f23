//! Per-collector semantic store writer.

use crate::registry::Collector;
use chrono::{DateTime, Local};
use panini_core::{iso_timestamp, Atom, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const STORE_VERSION: &str = "1.0";

/// On-disk shape of a collector store.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreEnvelope {
    pub metadata: Map<String, Value>,
    pub semantic_atoms: Vec<Atom>,
}

#[derive(Debug, Clone)]
pub struct CollectionSummary {
    pub collector: String,
    pub path: PathBuf,
    pub total_atoms: usize,
    pub domain_distribution: BTreeMap<String, usize>,
}

fn domain_distribution(atoms: &[Atom]) -> BTreeMap<String, usize> {
    let mut dist = BTreeMap::new();
    for atom in atoms {
        *dist.entry(atom.category.clone()).or_insert(0) += 1;
    }
    dist
}

/// Build the store document for `collector` as of `at`.
pub fn build_envelope(collector: &dyn Collector, at: DateTime<Local>) -> Result<StoreEnvelope> {
    let atoms = collector.collect(at)?;

    let mut metadata = Map::new();
    metadata.insert("version".into(), json!(STORE_VERSION));
    metadata.insert("description".into(), json!(collector.description()));
    metadata.insert("creation_date".into(), json!(iso_timestamp(at)));
    metadata.insert("source_type".into(), json!(collector.source_type()));
    metadata.insert("focus_areas".into(), json!(collector.focus_areas()));
    metadata.insert("total_atoms".into(), json!(atoms.len()));
    metadata.insert("domain_distribution".into(), json!(domain_distribution(&atoms)));
    for (key, value) in collector.statistics(&atoms) {
        metadata.insert(key, value);
    }

    Ok(StoreEnvelope {
        metadata,
        semantic_atoms: atoms,
    })
}

/// Write `path` via a sibling temp file so readers never see a partial store.
pub fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

/// Collect and write `<dir>/<collector>_semantic_store.json`.
pub fn write_store(
    collector: &dyn Collector,
    dir: &Path,
    at: DateTime<Local>,
) -> Result<CollectionSummary> {
    let envelope = build_envelope(collector, at)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(collector.output_file());
    let text = serde_json::to_string_pretty(&envelope)?;
    write_atomically(&path, &text)?;

    let summary = CollectionSummary {
        collector: collector.name().to_string(),
        path,
        total_atoms: envelope.semantic_atoms.len(),
        domain_distribution: domain_distribution(&envelope.semantic_atoms),
    };
    tracing::info!(
        collector = %summary.collector,
        atoms = summary.total_atoms,
        path = %summary.path.display(),
        "store written"
    );
    Ok(summary)
}

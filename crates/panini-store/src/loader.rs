//! Store loader: find the newest store per prefix and extract its atoms.
//!
//! Accepted document shapes:
//! - `{"semantic_atoms": [...]}` or `{"semantic_atoms": {id: atom, ...}}`
//! - a bare list of atoms
//! - `{"convergence_patterns": [...]}` / `{"discovered_patterns": [...]}`
//! - any other object, read as `{concept: atom-or-value, ...}`
//!
//! Records missing required fields are repaired, never rejected. The number
//! of repaired fields is reported next to the atoms.

use globset::GlobBuilder;
use panini_core::{
    iso_now, AnalogyStructure, Atom, Error, Provenance, Result, DEFAULT_CONFIDENCE,
};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

const LEGACY_AGENT: &str = "legacy";
const LEGACY_METHOD: &str = "direct_load";

/// Keys that map onto atom fields rather than metadata.
const KNOWN_KEYS: [&str; 6] = [
    "concept",
    "definition",
    "category",
    "metadata",
    "provenance",
    "analogy_structure",
];

/// Atoms extracted from one store file, in document order.
#[derive(Debug, Clone)]
pub struct LoadedStore {
    pub path: PathBuf,
    pub atoms: Vec<Atom>,
    /// Required fields synthesized by the loader across all atoms.
    pub defaulted_fields: usize,
}

/// Newest `<prefix>*.json` file directly inside `dir`.
///
/// Ties on modification time go to the lexicographically greater name.
pub fn find_latest(dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    let matcher = GlobBuilder::new(&format!("{prefix}*.json"))
        .literal_separator(true)
        .build()
        .map_err(|e| Error::Internal(format!("invalid store prefix {prefix:?}: {e}")))?
        .compile_matcher();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut matches: Vec<(SystemTime, String, PathBuf)> = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().to_string();
        if !matcher.is_match(&name) {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_file() {
            continue;
        }
        let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        matches.push((mtime, name, entry.path()));
    }

    // Newest first, then greatest name
    matches.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    debug!(prefix, candidates = matches.len(), "store lookup");
    Ok(matches.into_iter().next().map(|(_, _, path)| path))
}

/// Load the newest store for `prefix`, if any exists.
pub fn load_latest(dir: &Path, prefix: &str) -> Result<Option<LoadedStore>> {
    match find_latest(dir, prefix)? {
        Some(path) => load_file(&path).map(Some),
        None => Ok(None),
    }
}

pub fn load_file(path: &Path) -> Result<LoadedStore> {
    let text = std::fs::read_to_string(path)?;
    let doc: Value =
        serde_json::from_str(&text).map_err(|e| Error::parse(path, e.to_string()))?;
    let (atoms, defaulted_fields) = extract_atoms(doc).map_err(|e| match e {
        Error::Parse { message, .. } => Error::parse(path, message),
        other => other,
    })?;
    Ok(LoadedStore {
        path: path.to_path_buf(),
        atoms,
        defaulted_fields,
    })
}

/// Extract atoms from a parsed store document.
pub fn extract_atoms(doc: Value) -> Result<(Vec<Atom>, usize)> {
    let mut out = Extraction::default();
    match doc {
        Value::Array(items) => out.list(items),
        Value::Object(mut map) => {
            if let Some(atoms) = map.remove("semantic_atoms") {
                match atoms {
                    Value::Array(items) => out.list(items),
                    Value::Object(entries) => out.keyed(entries),
                    other => {
                        return Err(Error::parse(
                            "<document>",
                            format!("semantic_atoms is {}", kind(&other)),
                        ))
                    }
                }
            } else if let Some(patterns) = map.remove("convergence_patterns") {
                out.convergence_patterns(array_field("convergence_patterns", patterns)?);
            } else if let Some(patterns) = map.remove("discovered_patterns") {
                out.discovered_patterns(array_field("discovered_patterns", patterns)?);
            } else {
                out.keyed_values(map);
            }
        }
        other => {
            return Err(Error::parse(
                "<document>",
                format!("unrecognized top-level {}", kind(&other)),
            ))
        }
    }
    Ok((out.atoms, out.defaulted))
}

fn array_field(field: &str, value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(Error::parse("<document>", format!("{field} is {}", kind(&other)))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strings as-is, everything else as compact JSON text.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Default)]
struct Extraction {
    atoms: Vec<Atom>,
    defaulted: usize,
}

impl Extraction {
    fn list(&mut self, items: Vec<Value>) {
        for (i, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(record) => {
                    self.record(record, i.to_string(), format!("concept_{i}"));
                }
                other => self.direct_value(format!("item_{i}"), i.to_string(), other, "direct_value"),
            }
        }
    }

    fn keyed(&mut self, entries: Map<String, Value>) {
        for (i, (key, value)) in entries.into_iter().enumerate() {
            match value {
                Value::Object(record) => self.record(record, key, format!("concept_{i}")),
                other => self.direct_value(key.clone(), key, other, "key_value"),
            }
        }
    }

    /// Top-level `{concept: value}` mapping: the key doubles as concept.
    fn keyed_values(&mut self, entries: Map<String, Value>) {
        for (key, value) in entries {
            match value {
                Value::Object(record) => self.record(record, key.clone(), key),
                other => self.direct_value(key.clone(), key, other, "key_value"),
            }
        }
    }

    fn convergence_patterns(&mut self, patterns: Vec<Value>) {
        for (i, pattern) in patterns.into_iter().enumerate() {
            let p = pattern.as_object().cloned().unwrap_or_default();
            let mut record = Map::new();
            record.insert(
                "concept".into(),
                p.get("convergence_type")
                    .cloned()
                    .unwrap_or_else(|| json!(format!("convergence_{i}"))),
            );
            record.insert(
                "definition".into(),
                p.get("description").cloned().unwrap_or_else(|| json!("")),
            );
            record.insert(
                "metadata".into(),
                json!({
                    "mathematical_form": p.get("mathematical_evidence").cloned().unwrap_or_else(|| json!({})),
                    "domains": p.get("domains").cloned().unwrap_or_else(|| json!([])),
                }),
            );
            self.record(record, format!("convergence_{i}"), format!("convergence_{i}"));
        }
    }

    fn discovered_patterns(&mut self, patterns: Vec<Value>) {
        for (i, pattern) in patterns.into_iter().enumerate() {
            let p = pattern.as_object().cloned().unwrap_or_default();
            let mut record = Map::new();
            record.insert(
                "concept".into(),
                p.get("pattern_name")
                    .cloned()
                    .unwrap_or_else(|| json!(format!("pattern_{i}"))),
            );
            record.insert(
                "definition".into(),
                p.get("description").cloned().unwrap_or_else(|| json!("")),
            );
            record.insert(
                "metadata".into(),
                json!({
                    "frequency": p.get("frequency").cloned().unwrap_or_else(|| json!(0)),
                    "domains": p.get("domains").cloned().unwrap_or_else(|| json!([])),
                }),
            );
            self.record(record, format!("pattern_{i}"), format!("pattern_{i}"));
        }
    }

    fn direct_value(&mut self, concept: String, id: String, value: Value, category: &str) {
        let mut metadata = Map::new();
        let definition = text_of(&value);
        metadata.insert("raw_data".into(), value);
        self.defaulted += 1;
        let atom = Atom::new(concept, definition, category, legacy_provenance(id))
            .with_metadata(metadata);
        self.atoms.push(atom);
    }

    /// Normalize one object record, synthesizing whatever is missing.
    fn record(&mut self, mut record: Map<String, Value>, id: String, fallback_concept: String) {
        let concept = match record.get("concept") {
            Some(v) => text_of(v),
            None => {
                self.defaulted += 1;
                record
                    .get("name")
                    .map(text_of)
                    .unwrap_or(fallback_concept)
            }
        };
        let definition = match record.get("definition") {
            Some(v) => text_of(v),
            None => {
                self.defaulted += 1;
                record.get("description").map(text_of).unwrap_or_default()
            }
        };
        let category = match record.get("category") {
            Some(v) => text_of(v),
            None => {
                self.defaulted += 1;
                "unknown".to_string()
            }
        };

        let provenance = match record.remove("provenance") {
            Some(Value::Object(p)) => self.provenance(p, id),
            _ => {
                self.defaulted += 1;
                legacy_provenance(id)
            }
        };

        let mut metadata = match record.remove("metadata") {
            Some(Value::Object(m)) => m,
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                let mut m = Map::new();
                m.insert("metadata".into(), other);
                m
            }
        };

        let analogy_structure = match record.remove("analogy_structure") {
            None | Some(Value::Null) => None,
            Some(raw) => match serde_json::from_value::<AnalogyStructure>(raw.clone()) {
                Ok(s) => Some(s),
                Err(_) => {
                    metadata.entry("analogy_structure").or_insert(raw);
                    None
                }
            },
        };

        for (key, value) in record {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                metadata.entry(key).or_insert(value);
            }
        }

        let mut atom = Atom::new(concept, definition, category, provenance).with_metadata(metadata);
        atom.analogy_structure = analogy_structure;
        self.atoms.push(atom);
    }

    fn provenance(&mut self, p: Map<String, Value>, id: String) -> Provenance {
        let mut missing = 0;
        let mut text = |key: &str, default: String| match p.get(key) {
            Some(v) => text_of(v),
            None => {
                missing += 1;
                default
            }
        };
        let source_agent = text("source_agent", LEGACY_AGENT.into());
        let timestamp = text("timestamp", iso_now());
        let collection_method = text("collection_method", LEGACY_METHOD.into());
        let atom_id = text("atom_id", id);
        let extraction_confidence = match p.get("extraction_confidence").and_then(Value::as_f64) {
            Some(c) => c,
            None => {
                missing += 1;
                DEFAULT_CONFIDENCE
            }
        };
        self.defaulted += missing;
        Provenance {
            source_agent,
            timestamp,
            extraction_confidence,
            collection_method,
            atom_id,
        }
    }
}

fn legacy_provenance(atom_id: String) -> Provenance {
    Provenance::new(LEGACY_AGENT, DEFAULT_CONFIDENCE, LEGACY_METHOD, atom_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_list_with_scalar_items() {
        let (atoms, defaulted) = extract_atoms(json!([
            {"concept": "A", "definition": "a", "category": "k"},
            42
        ]))
        .unwrap();
        assert_eq!(atoms.len(), 2);
        assert_eq!(atoms[0].atom_id(), "0");
        assert_eq!(atoms[0].provenance.source_agent, "legacy");
        assert_eq!(atoms[1].concept, "item_1");
        assert_eq!(atoms[1].definition, "42");
        assert_eq!(atoms[1].category, "direct_value");
        assert_eq!(atoms[1].metadata["raw_data"], 42);
        assert_eq!(defaulted, 2);
    }

    #[test]
    fn keyed_semantic_atoms_use_key_as_id() {
        let (atoms, _) = extract_atoms(json!({
            "semantic_atoms": {"x1": {"name": "Named", "description": "from description"}}
        }))
        .unwrap();
        assert_eq!(atoms[0].concept, "Named");
        assert_eq!(atoms[0].definition, "from description");
        assert_eq!(atoms[0].category, "unknown");
        assert_eq!(atoms[0].atom_id(), "x1");
    }

    #[test]
    fn malformed_analyzer_envelope_is_a_parse_error() {
        for doc in [
            json!({"convergence_patterns": {"information_entropy": {}}}),
            json!({"discovered_patterns": "none"}),
        ] {
            let err = extract_atoms(doc).unwrap_err();
            assert!(matches!(err, Error::Parse { .. }), "{err}");
            assert!(err.is_recoverable());
        }
    }

    #[test]
    fn partial_provenance_is_completed() {
        let (atoms, defaulted) = extract_atoms(json!([{
            "concept": "c", "definition": "d", "category": "k",
            "provenance": {"source_agent": "news", "extraction_confidence": 1.4}
        }]))
        .unwrap();
        let p = &atoms[0].provenance;
        assert_eq!(p.source_agent, "news");
        assert_eq!(p.extraction_confidence, 1.4);
        assert_eq!(p.collection_method, "direct_load");
        assert_eq!(p.atom_id, "0");
        assert_eq!(defaulted, 3);
    }

    #[test]
    fn bad_analogy_structure_is_kept_in_metadata() {
        let (atoms, _) = extract_atoms(json!([{
            "concept": "c", "definition": "d", "category": "k",
            "analogy_structure": "not an object"
        }]))
        .unwrap();
        assert!(atoms[0].analogy_structure.is_none());
        assert_eq!(atoms[0].metadata["analogy_structure"], "not an object");
    }

    #[test]
    fn scalar_documents_are_rejected() {
        assert!(extract_atoms(json!(3)).is_err());
        assert!(extract_atoms(json!("store")).is_err());
        assert!(extract_atoms(json!({"semantic_atoms": 7})).is_err());
    }

    #[test]
    fn analyzer_envelopes() {
        let (atoms, _) = extract_atoms(json!({
            "analysis_metadata": {},
            "convergence_patterns": [{
                "convergence_type": "information_entropy_convergence",
                "description": "entropy as universal information measure",
                "mathematical_evidence": [{"concept": "Entropie"}],
                "domains": ["shannon_theory"]
            }]
        }))
        .unwrap();
        assert_eq!(atoms[0].concept, "information_entropy_convergence");
        assert_eq!(atoms[0].atom_id(), "convergence_0");
        assert_eq!(atoms[0].metadata["domains"], json!(["shannon_theory"]));

        let (atoms, _) = extract_atoms(json!({
            "discovered_patterns": [{"description": "no name", "frequency": 3}]
        }))
        .unwrap();
        assert_eq!(atoms[0].concept, "pattern_0");
        assert_eq!(atoms[0].metadata["frequency"], 3);
    }
}

//! Record catalogs and the record to atom conversion shared by all collectors.

use chrono::{DateTime, Local};
use panini_core::{atom_id, iso_timestamp, Atom, Error, Provenance, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Keys lifted out of a record into the atom's top level.
const ATOM_KEYS: [&str; 3] = ["concept", "definition", "category"];

/// A named group of records; the name feeds `atom_id` and `collection_method`.
#[derive(Clone, Debug, Deserialize)]
pub struct Section {
    pub name: String,
    pub records: Vec<Map<String, Value>>,
}

#[derive(Deserialize)]
struct Catalog {
    sections: Vec<Section>,
}

/// Parse an embedded `{"sections": [...]}` catalog.
pub fn parse_sections(collector: &str, raw: &str) -> Result<Vec<Section>> {
    serde_json::from_str::<Catalog>(raw)
        .map(|catalog| catalog.sections)
        .map_err(|e| Error::parse(format!("<embedded {collector} catalog>"), e.to_string()))
}

fn required_str<'a>(record: &'a Map<String, Value>, key: &str, collector: &str) -> Result<&'a str> {
    record.get(key).and_then(Value::as_str).ok_or_else(|| {
        Error::parse(
            format!("<embedded {collector} catalog>"),
            format!("record without string `{key}`"),
        )
    })
}

/// Provenance inputs shared by every record of one section.
#[derive(Clone, Debug)]
pub struct RecordOrigin<'a> {
    pub collector: &'a str,
    pub source_agent: &'a str,
    pub prefix: &'a str,
    pub section: &'a str,
    pub method: String,
    pub default_confidence: f64,
}

/// Wrap one literal record into the atom shape.
///
/// Every key other than concept/definition/category lands in `metadata`.
/// `extraction_confidence` is the record's `relevance_score`, falling back
/// to the origin's default.
pub fn atom_from_record(
    record: &Map<String, Value>,
    origin: &RecordOrigin<'_>,
    index: usize,
    at: DateTime<Local>,
) -> Result<Atom> {
    let concept = required_str(record, "concept", origin.collector)?;
    let definition = required_str(record, "definition", origin.collector)?;
    let category = required_str(record, "category", origin.collector)?;

    let metadata: Map<String, Value> = record
        .iter()
        .filter(|(k, _)| !ATOM_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let confidence = record
        .get("relevance_score")
        .and_then(Value::as_f64)
        .unwrap_or(origin.default_confidence);

    let mut provenance = Provenance::new(
        origin.source_agent,
        confidence,
        origin.method.clone(),
        atom_id(origin.prefix, at, origin.section, index),
    );
    provenance.timestamp = iso_timestamp(at);

    Ok(Atom::new(concept, definition, category, provenance).with_metadata(metadata))
}

//! Collector registry and trait definitions
//!
//! Each collector is a self-contained module implementing the Collector
//! trait. Registry order is run order.

use crate::record::{atom_from_record, RecordOrigin, Section};
use crate::store::{write_store, CollectionSummary};
use chrono::{DateTime, Local};
use panini_core::{Atom, Error, Result, DEFAULT_CONFIDENCE};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

/// A fixed-domain concept source.
///
/// The records a collector emits are literal data; only the atom envelope
/// (ids, provenance, statistics) is computed.
pub trait Collector: Send + Sync {
    /// Registry name (e.g. "information_theory"); also the store file prefix.
    fn name(&self) -> &str;

    /// `provenance.source_agent` on every emitted atom.
    fn source_agent(&self) -> &str;

    /// First segment of every `atom_id`.
    fn atom_prefix(&self) -> &str;

    fn description(&self) -> &str;

    fn source_type(&self) -> &str {
        self.name()
    }

    fn focus_areas(&self) -> &[&'static str] {
        &[]
    }

    fn default_confidence(&self) -> f64 {
        DEFAULT_CONFIDENCE
    }

    /// The literal record catalog, in emission order.
    fn sections(&self) -> Result<Vec<Section>>;

    /// `provenance.collection_method` for atoms of `section`.
    fn collection_method(&self, section: &str) -> String {
        format!("structured_{section}")
    }

    fn output_file(&self) -> String {
        format!("{}_semantic_store.json", self.name())
    }

    /// Hook for collector-specific atom fields.
    fn decorate(&self, _record: &Map<String, Value>, atom: Atom) -> Atom {
        atom
    }

    /// Extra aggregate statistics for the store's metadata envelope.
    fn statistics(&self, _atoms: &[Atom]) -> Map<String, Value> {
        Map::new()
    }

    /// Wrap every record into an atom stamped with `at`.
    fn collect(&self, at: DateTime<Local>) -> Result<Vec<Atom>> {
        let mut atoms = Vec::new();
        for section in self.sections()? {
            for (index, record) in section.records.iter().enumerate() {
                let origin = RecordOrigin {
                    collector: self.name(),
                    source_agent: self.source_agent(),
                    prefix: self.atom_prefix(),
                    section: &section.name,
                    method: self.collection_method(&section.name),
                    default_confidence: self.default_confidence(),
                };
                let atom = atom_from_record(record, &origin, index, at)?;
                atoms.push(self.decorate(record, atom));
            }
        }
        Ok(atoms)
    }
}

pub struct CollectorRegistry {
    collectors: Vec<Arc<dyn Collector>>,
}

impl Default for CollectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self {
            collectors: Vec::new(),
        }
    }

    /// Register a collector. Replaces any existing collector with the same
    /// name, keeping its position.
    pub fn register(&mut self, collector: impl Collector + 'static) {
        let collector: Arc<dyn Collector> = Arc::new(collector);
        match self
            .collectors
            .iter()
            .position(|c| c.name() == collector.name())
        {
            Some(pos) => self.collectors[pos] = collector,
            None => self.collectors.push(collector),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Collector>> {
        self.collectors.iter().find(|c| c.name() == name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Collector>> {
        self.collectors.iter()
    }

    /// Run one collector and write its store into `dir`.
    pub fn run(&self, name: &str, dir: &Path) -> Result<CollectionSummary> {
        let collector = self
            .get(name)
            .ok_or_else(|| Error::UnknownCollector(name.to_string()))?;
        write_store(collector.as_ref(), dir, Local::now())
    }
}

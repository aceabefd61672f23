//! Integrator: merge every component's newest store into one unified store.

use crate::loader::load_latest;
use panini_core::{ArchitecturalLayer, Atom, Error, Result, UnifiedAtom};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A pipeline component and the store file prefix it is loaded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Component {
    pub name: &'static str,
    pub prefix: &'static str,
}

/// Integration order. Iteration follows this table, never filesystem order.
pub const COMPONENTS: [Component; 6] = [
    Component { name: "autonomous_engine", prefix: "news" },
    Component { name: "information_theory", prefix: "information_theory" },
    Component { name: "physics_mathematics", prefix: "physics_mathematics" },
    Component { name: "convergence_analysis", prefix: "mathematics_physics_convergence" },
    Component { name: "analogy_safety", prefix: "analogy" },
    Component { name: "pattern_discovery", prefix: "pattern_discovery" },
];

/// Unified atoms keyed by `<component>_<atom_id>`, iterated in load order.
///
/// A repeated key replaces the earlier atom in place.
#[derive(Debug, Default, Clone)]
pub struct UnifiedStore {
    entries: Vec<(String, UnifiedAtom)>,
    index: HashMap<String, usize>,
}

impl UnifiedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_for(component: &str, atom: &Atom) -> String {
        format!("{}_{}", component, atom.atom_id())
    }

    /// Wrap and insert; returns the key used.
    pub fn insert(&mut self, component: &str, atom: Atom) -> String {
        let key = Self::key_for(component, &atom);
        let unified = UnifiedAtom::wrap(atom, component);
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = unified,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key.clone(), unified));
            }
        }
        key
    }

    pub fn get(&self, key: &str) -> Option<&UnifiedAtom> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnifiedAtom)> {
        self.entries.iter().map(|(k, a)| (k.as_str(), a))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Atom count per `component_source`.
    pub fn component_distribution(&self) -> BTreeMap<String, usize> {
        let mut dist = BTreeMap::new();
        for (_, atom) in self.iter() {
            *dist.entry(atom.component_source.clone()).or_insert(0) += 1;
        }
        dist
    }

    /// Atom count per architectural layer.
    pub fn layer_distribution(&self) -> BTreeMap<ArchitecturalLayer, usize> {
        let mut dist = BTreeMap::new();
        for (_, atom) in self.iter() {
            *dist.entry(atom.architectural_layer).or_insert(0) += 1;
        }
        dist
    }
}

impl Serialize for UnifiedStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, atom) in &self.entries {
            map.serialize_entry(key, atom)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    Integrated,
    Missing,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ComponentOutcome {
    pub name: String,
    pub path: Option<PathBuf>,
    pub atoms: usize,
    pub defaulted_fields: usize,
    pub status: ComponentStatus,
}

/// Result of one integration pass.
#[derive(Debug, Clone)]
pub struct Integration {
    pub store: UnifiedStore,
    pub components: Vec<ComponentOutcome>,
}

impl Integration {
    pub fn total_components(&self) -> usize {
        self.components.len()
    }

    pub fn integrated(&self) -> impl Iterator<Item = &ComponentOutcome> {
        self.components
            .iter()
            .filter(|c| c.status == ComponentStatus::Integrated)
    }

    pub fn integrated_components(&self) -> usize {
        self.integrated().count()
    }

    pub fn defaulted_fields(&self) -> usize {
        self.components.iter().map(|c| c.defaulted_fields).sum()
    }
}

pub struct Integrator {
    dir: PathBuf,
    components: Vec<Component>,
}

impl Integrator {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            components: COMPONENTS.to_vec(),
        }
    }

    pub fn with_components(mut self, components: Vec<Component>) -> Self {
        self.components = components;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load each component in table order and unify its atoms.
    ///
    /// Unreadable or malformed stores are skipped and reported as failed;
    /// any other error aborts the pass.
    pub fn integrate(&self) -> Result<Integration> {
        let mut store = UnifiedStore::new();
        let mut outcomes = Vec::with_capacity(self.components.len());

        for component in &self.components {
            let outcome = match load_latest(&self.dir, component.prefix) {
                Ok(Some(loaded)) => {
                    let read = loaded.atoms.len();
                    // atoms_count is the number of distinct keys, not records read
                    let keys: HashSet<String> = loaded
                        .atoms
                        .into_iter()
                        .map(|atom| store.insert(component.name, atom))
                        .collect();
                    let count = keys.len();
                    if count < read {
                        warn!(
                            component = component.name,
                            read,
                            kept = count,
                            "duplicate atom ids replaced"
                        );
                    }
                    info!(
                        component = component.name,
                        atoms = count,
                        path = %loaded.path.display(),
                        "component integrated"
                    );
                    ComponentOutcome {
                        name: component.name.to_string(),
                        path: Some(loaded.path),
                        atoms: count,
                        defaulted_fields: loaded.defaulted_fields,
                        status: ComponentStatus::Integrated,
                    }
                }
                Ok(None) => {
                    info!(component = component.name, "no store on disk");
                    ComponentOutcome {
                        name: component.name.to_string(),
                        path: None,
                        atoms: 0,
                        defaulted_fields: 0,
                        status: ComponentStatus::Missing,
                    }
                }
                Err(e) if e.is_recoverable() || matches!(e, Error::Io(_)) => {
                    warn!(component = component.name, error = %e, "component skipped");
                    ComponentOutcome {
                        name: component.name.to_string(),
                        path: None,
                        atoms: 0,
                        defaulted_fields: 0,
                        status: ComponentStatus::Failed(e.to_string()),
                    }
                }
                Err(e) => return Err(e),
            };
            outcomes.push(outcome);
        }

        Ok(Integration {
            store,
            components: outcomes,
        })
    }
}

//! Panini Collectors: fixed-domain concept collectors
//!
//! Each collector is a self-contained file in src/collectors/ holding its
//! literal records in data/. To add a collector: create the file, implement
//! the Collector trait, register it below.

pub mod collectors;
pub mod record;
pub mod registry;
pub mod store;

pub use record::{atom_from_record, parse_sections, RecordOrigin, Section};
pub use registry::{Collector, CollectorRegistry};
pub use store::{write_atomically, write_store, CollectionSummary, StoreEnvelope};

/// Create the registry with every shipped collector, in run order.
pub fn create_default_registry() -> CollectorRegistry {
    let mut registry = CollectorRegistry::new();

    // --- Theoretical sources ---
    registry.register(collectors::information_theory::InformationTheoryCollector);
    registry.register(collectors::physics_mathematics::PhysicsMathematicsCollector);

    // --- Analogy safety ---
    registry.register(collectors::analogy::AnalogyCollector);

    // --- Synthetic collector created by the autonomy driver ---
    registry.register(collectors::news::NewsCollector);

    registry
}

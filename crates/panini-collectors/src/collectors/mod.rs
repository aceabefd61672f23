//! Shipped collectors.
//!
//! Each collector is a self-contained module; its records live in
//! `data/<name>.json` and are embedded at compile time. To add a collector:
//! 1. Add the record catalog to data/
//! 2. Create a new file in this directory implementing the Collector trait
//! 3. Add `pub mod <name>;` here
//! 4. Register it in create_default_registry() in ../lib.rs

pub mod analogy;
pub mod information_theory;
pub mod news;
pub mod physics_mathematics;

use panini_core::Atom;

/// Number of atoms carrying `metadata.mathematical_form`.
pub(crate) fn count_mathematical_forms(atoms: &[Atom]) -> usize {
    atoms
        .iter()
        .filter(|a| a.metadata.contains_key("mathematical_form"))
        .count()
}

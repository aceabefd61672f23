//! Standalone analyzers whose reports feed back into the integrator.
//!
//! Each reads collector stores through the loader and writes one JSON
//! report into the working directory.

pub mod math_physics;
pub mod pattern_discovery;

use crate::loader::load_latest;
use panini_core::{Atom, Result};
use std::path::Path;
use tracing::{info, warn};

/// An atom tagged with the collector store it was read from.
#[derive(Debug, Clone)]
pub struct SourcedAtom {
    pub source: String,
    pub atom: Atom,
}

/// Load the newest store for each prefix, skipping missing or malformed ones.
pub(crate) fn load_sources(dir: &Path, prefixes: &[&str]) -> Result<(Vec<SourcedAtom>, usize)> {
    let mut atoms = Vec::new();
    let mut sources = 0;
    for prefix in prefixes {
        match load_latest(dir, prefix) {
            Ok(Some(loaded)) => {
                info!(source = prefix, atoms = loaded.atoms.len(), "source loaded");
                sources += 1;
                atoms.extend(loaded.atoms.into_iter().map(|atom| SourcedAtom {
                    source: prefix.to_string(),
                    atom,
                }));
            }
            Ok(None) => {}
            Err(e) if e.is_recoverable() => {
                warn!(source = prefix, error = %e, "source skipped");
            }
            Err(e) => return Err(e),
        }
    }
    Ok((atoms, sources))
}

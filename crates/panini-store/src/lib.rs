//! Panini Store: load, unify, analyze and report on collector stores
//!
//! The pipeline is: [`loader`] finds the newest store per prefix,
//! [`integrator`] wraps every atom into the unified store, [`convergence`]
//! scans it for shared keywords and [`report`] writes the result.

pub mod analyzers;
pub mod convergence;
pub mod integrator;
pub mod loader;
pub mod report;

pub use convergence::{detect_convergences, top_convergences, Convergence, MatchingAtom};
pub use integrator::{Component, ComponentStatus, Integration, Integrator, UnifiedStore, COMPONENTS};
pub use loader::{extract_atoms, find_latest, load_file, load_latest, LoadedStore};
pub use report::{
    render_report, render_snapshot, write_outputs, ArchitectureReport, Rendered, UnifiedStoreSnapshot,
};

use chrono::Local;
use std::path::{Path, PathBuf};

/// Everything one `integrate` run produced.
#[derive(Debug)]
pub struct PipelineOutput {
    pub integration: Integration,
    pub convergences: Vec<Convergence>,
    pub report: ArchitectureReport,
    pub report_path: PathBuf,
    pub snapshot_path: PathBuf,
}

/// Integrate `dir`, detect convergences, and write both the report and the
/// unified-store snapshot into `dir`.
pub fn run_pipeline(dir: &Path) -> panini_core::Result<PipelineOutput> {
    let integration = Integrator::new(dir).integrate()?;
    let convergences = detect_convergences(&integration.store);
    let report = ArchitectureReport::build(&integration, &convergences);

    let at = Local::now();
    // serialize both before writing either
    let snapshot = render_snapshot(dir, &UnifiedStoreSnapshot::new(&integration, &convergences, at), at)?;
    let rendered_report = render_report(dir, &report, at)?;
    let (snapshot_path, report_path) = write_outputs(snapshot, rendered_report)?;

    Ok(PipelineOutput {
        integration,
        convergences,
        report,
        report_path,
        snapshot_path,
    })
}

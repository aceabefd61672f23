//! Snapshot of the working directory the driver decides from.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use panini_collectors::CollectorRegistry;
use panini_store::analyzers::{math_physics, pattern_discovery};
use panini_store::extract_atoms;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

/// Analyzer report names as they appear in an [`Observation`].
pub const CONVERGENCE_REPORT: &str = "convergence_analysis";
pub const PATTERN_REPORT: &str = "pattern_discovery";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    CollectorStore,
    AnalyzerReport,
}

#[derive(Debug, Clone)]
pub struct SourceStatus {
    pub name: String,
    pub kind: SourceKind,
    pub path: PathBuf,
    pub exists: bool,
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone, Default)]
pub struct Observation {
    pub sources: Vec<SourceStatus>,
    /// `git log --oneline -10`, informational only.
    pub recent_operations: Vec<String>,
    /// Atoms across every collector store present.
    pub total_atoms: usize,
}

impl Observation {
    pub fn source(&self, name: &str) -> Option<&SourceStatus> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.source(name).is_some_and(|s| s.exists)
    }

    pub fn collector_stores(&self) -> impl Iterator<Item = &SourceStatus> {
        self.sources
            .iter()
            .filter(|s| s.kind == SourceKind::CollectorStore)
    }

    pub fn present_stores(&self) -> usize {
        self.collector_stores().filter(|s| s.exists).count()
    }

    /// Newest mtime among present collector stores.
    pub fn newest_store(&self) -> Option<SystemTime> {
        self.collector_stores().filter_map(|s| s.modified).max()
    }
}

async fn stat(name: &str, kind: SourceKind, path: PathBuf) -> SourceStatus {
    let meta = fs::metadata(&path).await.ok().filter(|m| m.is_file());
    SourceStatus {
        name: name.to_string(),
        kind,
        exists: meta.is_some(),
        size: meta.as_ref().map(|m| m.len()),
        modified: meta.and_then(|m| m.modified().ok()),
        path,
    }
}

async fn run_git(dir: &Path, args: &[&str]) -> Result<String, String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| format!("git exec failed: {e}"))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!("git error: {stderr}"))
    }
}

pub async fn recent_operations(dir: &Path) -> Vec<String> {
    match run_git(dir, &["log", "--oneline", "-10"]).await {
        Ok(out) => out.lines().map(str::to_string).collect(),
        Err(e) => {
            debug!(error = %e.trim(), "no git history");
            Vec::new()
        }
    }
}

async fn count_atoms(path: &Path) -> usize {
    let counted = async {
        let text = fs::read_to_string(path).await.map_err(|e| e.to_string())?;
        let doc: serde_json::Value = serde_json::from_str(&text).map_err(|e| e.to_string())?;
        extract_atoms(doc)
            .map(|(atoms, _)| atoms.len())
            .map_err(|e| e.to_string())
    };
    match counted.await {
        Ok(n) => n,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "store not counted");
            0
        }
    }
}

/// Stat every collector store and analyzer report in `dir`.
pub async fn observe(dir: &Path, registry: &CollectorRegistry) -> Observation {
    let mut sources = Vec::new();
    for collector in registry.iter() {
        let path = dir.join(collector.output_file());
        sources.push(stat(collector.name(), SourceKind::CollectorStore, path).await);
    }
    sources.push(
        stat(
            CONVERGENCE_REPORT,
            SourceKind::AnalyzerReport,
            dir.join(math_physics::OUTPUT_FILE),
        )
        .await,
    );
    sources.push(
        stat(
            PATTERN_REPORT,
            SourceKind::AnalyzerReport,
            dir.join(pattern_discovery::OUTPUT_FILE),
        )
        .await,
    );

    let mut total_atoms = 0;
    for store in sources
        .iter()
        .filter(|s| s.kind == SourceKind::CollectorStore && s.exists)
    {
        total_atoms += count_atoms(&store.path).await;
    }

    Observation {
        sources,
        recent_operations: recent_operations(dir).await,
        total_atoms,
    }
}

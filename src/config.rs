//! Panini configuration: loaded from TOML, every field defaulted.

use panini_core::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "panini.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaniniConfig {
    /// Directory collectors write into and the integrator reads from.
    pub work_dir: PathBuf,
    pub max_iterations: u32,
    pub collector_timeout_secs: u64,
    pub build_timeout_secs: u64,
    /// Pause between autonomy iterations.
    pub pause_ms: u64,
    pub confidence_minimum: f64,
    /// Total atoms above which the driver proposes a Rust build.
    pub rust_build_atom_threshold: usize,
}

impl Default for PaniniConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            max_iterations: 15,
            collector_timeout_secs: 300,
            build_timeout_secs: 600,
            pause_ms: 2_000,
            confidence_minimum: 0.5,
            rust_build_atom_threshold: 1_000,
        }
    }
}

impl PaniniConfig {
    /// Read a TOML file. `Ok(None)` when there is no file.
    ///
    /// Called before logging is set up, so the caller reports the outcome.
    pub fn try_load(path: &Path) -> panini_core::Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .map(Some)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn collector_timeout(&self) -> Duration {
        Duration::from_secs(self.collector_timeout_secs)
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

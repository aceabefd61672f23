use chrono::Local;
use panini_core::iso_timestamp;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::PaniniConfig;

/// Which analyzer an `Analyze` target runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Convergence,
    Patterns,
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Convergence => write!(f, "convergence"),
            Self::Patterns => write!(f, "patterns"),
        }
    }
}

/// What an approved action actually does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ActionTarget {
    Collector(String),
    Analysis(AnalysisKind),
    /// The news collector the driver creates on its own initiative.
    SyntheticCollector,
    RustBuild,
}

impl ActionTarget {
    /// CLI arguments that perform this target, `None` for the build pass-through.
    pub fn cli_args(&self) -> Option<Vec<String>> {
        match self {
            Self::Collector(name) => Some(vec!["collect".into(), name.clone()]),
            Self::Analysis(kind) => Some(vec!["analyze".into(), kind.to_string()]),
            Self::SyntheticCollector => Some(vec!["collect".into(), SYNTHETIC_COLLECTOR.into()]),
            Self::RustBuild => None,
        }
    }
}

impl std::fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collector(name) => write!(f, "collector:{name}"),
            Self::Analysis(kind) => write!(f, "analysis:{kind}"),
            Self::SyntheticCollector => write!(f, "collector:{SYNTHETIC_COLLECTOR}"),
            Self::RustBuild => write!(f, "rust-build"),
        }
    }
}

pub const SYNTHETIC_COLLECTOR: &str = "news";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedAction {
    /// Lower runs first.
    pub priority: u8,
    pub confidence: f64,
    /// Action type the approval rules match against.
    pub action: String,
    pub reason: String,
    pub target: ActionTarget,
}

impl ProposedAction {
    pub fn new(
        priority: u8,
        confidence: f64,
        action: &str,
        reason: impl Into<String>,
        target: ActionTarget,
    ) -> Self {
        Self {
            priority,
            confidence,
            action: action.to_string(),
            reason: reason.into(),
            target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Matched the unconditional action list.
    Immediate,
    /// Auto-approved type with enough confidence.
    Approved,
    Deferred,
}

impl Decision {
    pub fn is_approved(self) -> bool {
        !matches!(self, Self::Deferred)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate => write!(f, "immediate"),
            Self::Approved => write!(f, "approved"),
            Self::Deferred => write!(f, "deferred"),
        }
    }
}

/// Outcome of running one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    /// Combined stdout and stderr, or the failure message.
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Wall-clock seconds.
    pub duration: f64,
}

impl StepResult {
    pub fn success(output: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            success: true,
            output: output.into(),
            exit_code,
            duration: 0.0,
        }
    }

    pub fn failure(output: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            success: false,
            output: output.into(),
            exit_code,
            duration: 0.0,
        }
    }

    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration = elapsed.as_secs_f64();
        self
    }
}

/// One persisted decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub step: ProposedAction,
    pub result: StepResult,
}

impl HistoryEntry {
    pub fn now(step: ProposedAction, result: StepResult) -> Self {
        Self {
            timestamp: iso_timestamp(Local::now()),
            step,
            result,
        }
    }
}

/// Driver knobs, resolved from [`PaniniConfig`].
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub max_iterations: u32,
    pub collector_timeout: Duration,
    pub build_timeout: Duration,
    pub pause: Duration,
    pub confidence_minimum: f64,
    pub rust_build_atom_threshold: usize,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self::from(&PaniniConfig::default())
    }
}

impl From<&PaniniConfig> for DriverOptions {
    fn from(config: &PaniniConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            collector_timeout: config.collector_timeout(),
            build_timeout: config.build_timeout(),
            pause: config.pause(),
            confidence_minimum: config.confidence_minimum,
            rust_build_atom_threshold: config.rust_build_atom_threshold,
        }
    }
}

/// What one autonomy run did.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub start_time: String,
    pub end_time: String,
    pub iterations: u32,
    /// Approved, attempted and succeeded.
    pub executed_steps: Vec<ProposedAction>,
    pub failed_steps: Vec<ProposedAction>,
    pub skipped_steps: Vec<ProposedAction>,
    pub total_operations: usize,
    pub success_rate: f64,
    pub cancelled: bool,
}

impl CycleSummary {
    pub fn started() -> Self {
        Self {
            start_time: iso_timestamp(Local::now()),
            end_time: String::new(),
            iterations: 0,
            executed_steps: Vec::new(),
            failed_steps: Vec::new(),
            skipped_steps: Vec::new(),
            total_operations: 0,
            success_rate: 0.0,
            cancelled: false,
        }
    }

    pub fn record(&mut self, step: ProposedAction, result: &StepResult) {
        self.total_operations += 1;
        if result.success {
            self.executed_steps.push(step);
        } else {
            self.failed_steps.push(step);
        }
    }

    pub fn finish(&mut self) {
        if self.total_operations > 0 {
            self.success_rate = self.executed_steps.len() as f64 / self.total_operations as f64;
        }
        self.end_time = iso_timestamp(Local::now());
    }
}

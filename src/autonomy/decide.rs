//! Proposal and approval rules. Pure functions over an [`Observation`].

use super::observe::{Observation, CONVERGENCE_REPORT, PATTERN_REPORT};
use super::types::{ActionTarget, AnalysisKind, Decision, ProposedAction, SYNTHETIC_COLLECTOR};

/// Collectors proposed when their store is missing, in run order.
pub const PRIORITY_COLLECTORS: [&str; 3] = ["information_theory", "physics_mathematics", "analogy"];

/// Action substrings approved without a confidence check.
pub const IMMEDIATE_ACTIONS: [&str; 4] = [
    "execute_script",
    "create_and_execute",
    "analysis_generation",
    "data_collection",
];

/// Action types approved at or above the confidence minimum.
pub const AUTO_APPROVE_ACTIONS: [&str; 9] = [
    "data_collection",
    "analysis_generation",
    "performance_benchmarking",
    "documentation_updates",
    "code_refactoring",
    "test_execution",
    "execute_script",
    "consensus_analysis",
    "create_and_execute",
];

fn matches_any(action: &str, list: &[&str]) -> bool {
    list.iter().any(|a| action.contains(a))
}

/// Every action the observed state calls for, sorted by priority.
pub fn propose(obs: &Observation, rust_build_atom_threshold: usize) -> Vec<ProposedAction> {
    let mut steps = Vec::new();

    for name in PRIORITY_COLLECTORS {
        if obs.source(name).is_some() && !obs.exists(name) {
            steps.push(ProposedAction::new(
                1,
                0.9,
                "execute_script",
                format!("{name} store missing, collecting first"),
                ActionTarget::Collector(name.to_string()),
            ));
        }
    }

    if !obs.exists(CONVERGENCE_REPORT) {
        steps.push(ProposedAction::new(
            2,
            0.85,
            "execute_script",
            "convergence analysis missing",
            ActionTarget::Analysis(AnalysisKind::Convergence),
        ));
    }

    if obs.present_stores() >= 2 && pattern_report_stale(obs) {
        steps.push(ProposedAction::new(
            3,
            0.8,
            "execute_script",
            "several sources available, pattern analysis possible",
            ActionTarget::Analysis(AnalysisKind::Patterns),
        ));
    }

    if !obs.exists(SYNTHETIC_COLLECTOR) {
        steps.push(ProposedAction::new(
            4,
            0.75,
            "create_and_execute_collector",
            "expanding sources for semantic diversity",
            ActionTarget::SyntheticCollector,
        ));
    }

    if obs.total_atoms > rust_build_atom_threshold {
        steps.push(ProposedAction::new(
            5,
            0.7,
            "rust_optimization",
            "dataset large enough for the Rust build",
            ActionTarget::RustBuild,
        ));
    }

    steps.sort_by_key(|s| s.priority);
    steps
}

/// Missing, or older than the newest collector store.
fn pattern_report_stale(obs: &Observation) -> bool {
    let Some(report) = obs.source(PATTERN_REPORT).filter(|s| s.exists) else {
        return true;
    };
    match (report.modified, obs.newest_store()) {
        (Some(report), Some(newest)) => report < newest,
        _ => false,
    }
}

pub fn decide(step: &ProposedAction, confidence_minimum: f64) -> Decision {
    if matches_any(&step.action, &IMMEDIATE_ACTIONS) {
        Decision::Immediate
    } else if matches_any(&step.action, &AUTO_APPROVE_ACTIONS)
        && step.confidence >= confidence_minimum
    {
        Decision::Approved
    } else {
        Decision::Deferred
    }
}

/// Last check before running anything: an action outside the auto-approve
/// set never runs below the confidence minimum.
pub fn may_execute(step: &ProposedAction, confidence_minimum: f64) -> bool {
    matches_any(&step.action, &AUTO_APPROVE_ACTIONS) || step.confidence >= confidence_minimum
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use panini_collectors::CollectorRegistry;
use panini_core::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::decide::{decide, may_execute, propose};
use super::history::DecisionHistory;
use super::observe::observe;
use super::runner::ActionRunner;
use super::types::{ActionTarget, CycleSummary, DriverOptions, HistoryEntry};

/// Observe, propose, decide, run at most one action, repeat.
pub struct Driver<R: ActionRunner> {
    work_dir: PathBuf,
    registry: Arc<CollectorRegistry>,
    runner: R,
    options: DriverOptions,
    history: DecisionHistory,
}

impl<R: ActionRunner> Driver<R> {
    pub async fn new(
        work_dir: impl AsRef<Path>,
        registry: Arc<CollectorRegistry>,
        runner: R,
        options: DriverOptions,
    ) -> Result<Self> {
        let work_dir = work_dir.as_ref().to_path_buf();
        let history = DecisionHistory::open(&work_dir).await?;
        Ok(Self {
            work_dir,
            registry,
            runner,
            options,
            history,
        })
    }

    pub fn history(&self) -> &DecisionHistory {
        &self.history
    }

    pub async fn run(&mut self, cancel: CancellationToken) -> CycleSummary {
        let mut summary = CycleSummary::started();
        let max = self.options.max_iterations;

        info!(
            work_dir = %self.work_dir.display(),
            max_iterations = max,
            "autonomy cycle started"
        );

        for iteration in 1..=max {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            summary.iterations = iteration;
            info!(iteration, max_iterations = max, "autonomous iteration");

            let obs = observe(&self.work_dir, &self.registry).await;
            let steps = propose(&obs, self.options.rust_build_atom_threshold);
            let Some(step) = steps.into_iter().next() else {
                info!("no further steps");
                break;
            };

            let decision = decide(&step, self.options.confidence_minimum);
            if !decision.is_approved() {
                info!(
                    reason = %step.reason,
                    confidence = step.confidence,
                    "action deferred"
                );
                summary.skipped_steps.push(step);
            } else if !may_execute(&step, self.options.confidence_minimum) {
                // last gate before running
                warn!(action = %step.action, confidence = step.confidence, "action refused");
                summary.skipped_steps.push(step);
            } else {
                info!(
                    decision = %decision,
                    reason = %step.reason,
                    confidence = step.confidence,
                    "action approved"
                );
                let timeout = match step.target {
                    ActionTarget::RustBuild => self.options.build_timeout,
                    _ => self.options.collector_timeout,
                };
                info!(action = %step.action, step = %step.target, "executing");
                let result = self.runner.run(&step.target, timeout, cancel.clone()).await;

                if result.success {
                    info!(reason = %step.reason, duration = result.duration, "succeeded");
                } else {
                    let head: String = result.output.chars().take(200).collect();
                    warn!(step = %step.target, output = %head, "failed");
                }

                summary.record(step.clone(), &result);
                if let Err(e) = self.history.append(HistoryEntry::now(step, result)).await {
                    error!(error = %e, "history not written");
                }
            }

            info!(
                iteration,
                executed = summary.executed_steps.len(),
                failed = summary.failed_steps.len(),
                deferred = summary.skipped_steps.len(),
                total_atoms = obs.total_atoms,
                "cycle"
            );

            if iteration < max {
                tokio::select! {
                    _ = tokio::time::sleep(self.options.pause) => {}
                    _ = cancel.cancelled() => {
                        summary.cancelled = true;
                        break;
                    }
                }
            }
        }

        summary.finish();
        info!(
            succeeded = summary.executed_steps.len(),
            deferred = summary.skipped_steps.len(),
            success_rate = summary.success_rate,
            history = self.history.len(),
            "autonomy cycle finished"
        );
        summary
    }
}

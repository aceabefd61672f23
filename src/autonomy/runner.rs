//! Action runners: re-invoke the binary as a child process, or call the
//! library directly.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use panini_collectors::CollectorRegistry;
use panini_store::analyzers::{math_physics, pattern_discovery};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::types::{ActionTarget, AnalysisKind, StepResult};

/// Executes one approved action against a working directory.
#[async_trait::async_trait]
pub trait ActionRunner: Send + Sync {
    async fn run(
        &self,
        target: &ActionTarget,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> StepResult;
}

fn build_pass_through() -> StepResult {
    info!("rust build requested, nothing to do");
    StepResult::success("rust build skipped", None)
}

/// Runs `<program> <leading_args..> --work-dir <dir> <target args..>`.
pub struct ProcessRunner {
    program: PathBuf,
    leading_args: Vec<String>,
    work_dir: PathBuf,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>, work_dir: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            work_dir: work_dir.as_ref().to_path_buf(),
        }
    }

    /// Re-invoke the running executable.
    pub fn current_exe(work_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, work_dir))
    }

    pub fn with_leading_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command(&self, target_args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg("--work-dir")
            .arg(&self.work_dir)
            .args(target_args)
            .current_dir(&self.work_dir)
            .kill_on_drop(true)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        cmd
    }
}

#[async_trait::async_trait]
impl ActionRunner for ProcessRunner {
    async fn run(
        &self,
        target: &ActionTarget,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> StepResult {
        let Some(args) = target.cli_args() else {
            return build_pass_through();
        };
        let started = Instant::now();
        debug!(program = %self.program.display(), args = ?args, "spawning");

        let mut child = match self.command(&args).spawn() {
            Ok(child) => child,
            Err(e) => return StepResult::failure(format!("Failed to spawn: {e}"), None),
        };

        // drain both pipes while waiting; a child blocked on a full pipe never exits
        let mut stdout = tokio::spawn(read_pipe(child.stdout.take()));
        let mut stderr = tokio::spawn(read_pipe(child.stderr.take()));

        // wait() rather than wait_with_output() so the child can still be killed
        let exit = tokio::select! {
            waited = tokio::time::timeout(timeout, async {
                let status = child.wait().await;
                let (out, err) = tokio::join!(&mut stdout, &mut stderr);
                (status, format!("{}{}", out.unwrap_or_default(), err.unwrap_or_default()))
            }) => match waited {
                Ok((status, output)) => Exit::Finished(status, output),
                Err(_) => Exit::TimedOut,
            },
            _ = cancel.cancelled() => Exit::Interrupted,
        };

        let result = match exit {
            Exit::Finished(Ok(status), output) => {
                if status.success() {
                    StepResult::success(output, status.code())
                } else {
                    StepResult::failure(output, status.code())
                }
            }
            Exit::Finished(Err(e), _) => StepResult::failure(format!("Failed to wait: {e}"), None),
            Exit::TimedOut => {
                let _ = child.kill().await;
                warn!(action = %target, timeout_secs = timeout.as_secs_f64(), "action timed out");
                StepResult::failure(format!("timed out after {:.1}s", timeout.as_secs_f64()), None)
            }
            Exit::Interrupted => {
                let _ = child.kill().await;
                StepResult::failure("[process killed by interrupt]", None)
            }
        };
        stdout.abort();
        stderr.abort();
        result.with_duration(started.elapsed())
    }
}

enum Exit {
    Finished(std::io::Result<std::process::ExitStatus>, String),
    TimedOut,
    Interrupted,
}

/// Read all bytes from an optional child pipe into a string.
async fn read_pipe(pipe: Option<impl tokio::io::AsyncRead + Unpin>) -> String {
    use tokio::io::AsyncReadExt;
    match pipe {
        Some(mut p) => {
            let mut buf = Vec::new();
            let _ = p.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).to_string()
        }
        None => String::new(),
    }
}

/// Calls collectors and analyzers on the blocking pool.
///
/// A timed-out call is abandoned, not stopped: its output file may still
/// appear later.
pub struct InProcessRunner {
    registry: Arc<CollectorRegistry>,
    work_dir: PathBuf,
}

impl InProcessRunner {
    pub fn new(registry: Arc<CollectorRegistry>, work_dir: impl AsRef<Path>) -> Self {
        Self {
            registry,
            work_dir: work_dir.as_ref().to_path_buf(),
        }
    }
}

fn run_blocking(registry: &CollectorRegistry, dir: &Path, target: &ActionTarget) -> StepResult {
    let outcome = match target {
        ActionTarget::Collector(name) => registry
            .run(name, dir)
            .map(|s| format!("{}: {} atoms -> {}", s.collector, s.total_atoms, s.path.display())),
        ActionTarget::SyntheticCollector => registry
            .run(super::types::SYNTHETIC_COLLECTOR, dir)
            .map(|s| format!("{}: {} atoms -> {}", s.collector, s.total_atoms, s.path.display())),
        ActionTarget::Analysis(AnalysisKind::Convergence) => math_physics::run(dir).map(|(path, a)| {
            format!("{} patterns -> {}", a.convergence_patterns.len(), path.display())
        }),
        ActionTarget::Analysis(AnalysisKind::Patterns) => {
            let names = registry.list();
            pattern_discovery::run(dir, &names).map(|(path, r)| {
                format!("{} patterns -> {}", r.discovered_patterns.len(), path.display())
            })
        }
        ActionTarget::RustBuild => return build_pass_through(),
    };
    match outcome {
        Ok(output) => StepResult::success(output, None),
        Err(e) => StepResult::failure(e.to_string(), None),
    }
}

#[async_trait::async_trait]
impl ActionRunner for InProcessRunner {
    async fn run(
        &self,
        target: &ActionTarget,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> StepResult {
        let started = Instant::now();
        let registry = Arc::clone(&self.registry);
        let dir = self.work_dir.clone();
        let owned = target.clone();
        let task = tokio::task::spawn_blocking(move || run_blocking(&registry, &dir, &owned));

        let result = tokio::select! {
            joined = tokio::time::timeout(timeout, task) => match joined {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => StepResult::failure(format!("task failed: {e}"), None),
                Err(_) => {
                    warn!(action = %target, timeout_secs = timeout.as_secs_f64(), "action timed out");
                    StepResult::failure(format!("timed out after {:.1}s", timeout.as_secs_f64()), None)
                }
            },
            _ = cancel.cancelled() => StepResult::failure("[interrupted]", None),
        };
        result.with_duration(started.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panini_collectors::create_default_registry;

    #[tokio::test]
    async fn in_process_collector_writes_store() {
        let dir = tempfile::tempdir().unwrap();
        let runner = InProcessRunner::new(Arc::new(create_default_registry()), dir.path());
        let result = runner
            .run(
                &ActionTarget::Collector("news".into()),
                Duration::from_secs(30),
                CancellationToken::new(),
            )
            .await;
        assert!(result.success, "{}", result.output);
        assert!(result.output.contains("5 atoms"));
        assert!(dir.path().join("news_semantic_store.json").exists());
    }

    #[tokio::test]
    async fn in_process_unknown_collector_fails() {
        let dir = tempfile::tempdir().unwrap();
        let runner = InProcessRunner::new(Arc::new(create_default_registry()), dir.path());
        let result = runner
            .run(
                &ActionTarget::Collector("arxiv".into()),
                Duration::from_secs(30),
                CancellationToken::new(),
            )
            .await;
        assert!(!result.success);
        assert!(result.output.contains("arxiv"));
    }

    #[tokio::test]
    async fn analysis_without_sources_fails() {
        let dir = tempfile::tempdir().unwrap();
        let runner = InProcessRunner::new(Arc::new(create_default_registry()), dir.path());
        let result = runner
            .run(
                &ActionTarget::Analysis(AnalysisKind::Convergence),
                Duration::from_secs(30),
                CancellationToken::new(),
            )
            .await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn rust_build_is_a_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new("/nonexistent/panini", dir.path());
        let result = runner
            .run(&ActionTarget::RustBuild, Duration::from_secs(1), CancellationToken::new())
            .await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new("/nonexistent/panini", dir.path());
        let result = runner
            .run(
                &ActionTarget::Collector("news".into()),
                Duration::from_secs(1),
                CancellationToken::new(),
            )
            .await;
        assert!(!result.success);
        assert!(result.output.starts_with("Failed to spawn"));
    }
}

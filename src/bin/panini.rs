//! panini: semantic atom collection and integration
//!
//! Usage:
//!   panini collect information_theory   -> write one collector store
//!   panini collect-all                  -> every collector, registry order
//!   panini analyze convergence          -> cross-domain convergence report
//!   panini integrate                    -> unified store + architecture report
//!   panini autonomy 5                   -> decision loop, at most 5 iterations
//!   panini version                      -> show version

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use panini::autonomy::log::{file_writer, AutonomeFormat};
use panini::autonomy::{
    ActionRunner, AnalysisKind, CycleSummary, Driver, DriverOptions, InProcessRunner,
    ProcessRunner,
};
use panini::{PaniniConfig, CONFIG_FILE};
use panini_collectors::{create_default_registry, CollectorRegistry};
use panini_store::analyzers::{math_physics, pattern_discovery};
use panini_store::{run_pipeline, ComponentStatus};
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "panini",
    about = "Semantic atom collectors, unified store and autonomy driver",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Working directory for stores and reports (default: config work_dir)
    #[arg(short, long, global = true)]
    work_dir: Option<PathBuf>,

    /// Config file (default: <work-dir>/panini.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one collector and write its store
    Collect {
        /// Collector name (information_theory, physics_mathematics, analogy, news)
        name: String,
    },
    /// Run every registered collector
    CollectAll,
    /// Run one analyzer over the collector stores
    Analyze {
        #[arg(value_enum)]
        kind: AnalysisKind,
    },
    /// Load every store, detect convergences, write the report and snapshot
    Integrate,
    /// Autonomous decision loop
    Autonomy {
        /// Iteration cap (default from config, 15)
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        max_iterations: Option<u32>,

        /// Call collectors in this process instead of re-invoking the binary
        #[arg(long, default_value_t = false)]
        in_process: bool,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(|| {
        cli.work_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILE)
    });
    let loaded = PaniniConfig::try_load(&config_path);
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => PaniniConfig::default(),
    };
    let work_dir = cli.work_dir.clone().unwrap_or_else(|| config.work_dir.clone());

    let _guard = match &cli.command {
        Commands::Autonomy { .. } => {
            std::fs::create_dir_all(&work_dir)?;
            let (writer, guard) = file_writer(&work_dir);
            init_tracing(Some(writer));
            Some(guard)
        }
        _ => {
            init_tracing(None);
            None::<WorkerGuard>
        }
    };

    match &loaded {
        Ok(Some(_)) => tracing::info!("Loaded config from {}", config_path.display()),
        Ok(None) => tracing::debug!("No config at {}, using defaults", config_path.display()),
        Err(e) => tracing::warn!("{}, using defaults", e),
    }

    match cli.command {
        Commands::Version => {
            println!("panini {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Collect { name } => {
            std::fs::create_dir_all(&work_dir)?;
            let registry = create_default_registry();
            collect(&registry, &name, &work_dir)?;
        }
        Commands::CollectAll => {
            std::fs::create_dir_all(&work_dir)?;
            let registry = create_default_registry();
            for name in registry.list() {
                collect(&registry, name, &work_dir)?;
            }
        }
        Commands::Analyze { kind } => match kind {
            AnalysisKind::Convergence => {
                let (path, analysis) = math_physics::run(&work_dir)?;
                println!(
                    "convergence: {} patterns from {} atoms -> {}",
                    analysis.convergence_patterns.len(),
                    analysis.analysis_metadata.total_atoms_analyzed,
                    path.display()
                );
            }
            AnalysisKind::Patterns => {
                let registry = create_default_registry();
                let (path, report) = pattern_discovery::run(&work_dir, &registry.list())?;
                println!(
                    "patterns: {} patterns from {} atoms -> {}",
                    report.discovered_patterns.len(),
                    report.analysis_metadata.total_atoms_analyzed,
                    path.display()
                );
            }
        },
        Commands::Integrate => integrate(&work_dir)?,
        Commands::Autonomy {
            max_iterations,
            in_process,
        } => {
            let mut options = DriverOptions::from(&config);
            if let Some(max) = max_iterations {
                options.max_iterations = max;
            }

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, stopping after current step");
                    on_interrupt.cancel();
                }
            });

            let registry = Arc::new(create_default_registry());
            let summary = if in_process {
                let runner = InProcessRunner::new(Arc::clone(&registry), &work_dir);
                drive(&work_dir, registry, runner, options, cancel).await?
            } else {
                let runner = ProcessRunner::current_exe(&work_dir)?;
                drive(&work_dir, registry, runner, options, cancel).await?
            };
            print_summary(&summary);
        }
    }

    Ok(())
}

fn init_tracing(decision_log: Option<NonBlocking>) {
    let file_layer = decision_log.map(|writer| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .event_format(AutonomeFormat)
    });
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "panini=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
}

fn collect(registry: &CollectorRegistry, name: &str, dir: &Path) -> anyhow::Result<()> {
    let summary = registry.run(name, dir)?;
    println!(
        "{}: {} atoms -> {}",
        summary.collector,
        summary.total_atoms,
        summary.path.display()
    );
    for (category, count) in &summary.domain_distribution {
        println!("  {category}: {count}");
    }
    Ok(())
}

fn integrate(dir: &Path) -> anyhow::Result<()> {
    let output = run_pipeline(dir)?;
    let integration = &output.integration;

    for component in &integration.components {
        match &component.status {
            ComponentStatus::Integrated => {
                println!("  + {}: {} atoms", component.name, component.atoms)
            }
            ComponentStatus::Missing => println!("  - {}: no store", component.name),
            ComponentStatus::Failed(reason) => println!("  ! {}: {}", component.name, reason),
        }
    }

    let summary = &output.report.integration_summary;
    println!(
        "integrated {}/{} components, {} atoms, {} convergences",
        summary.integrated_components,
        summary.total_components,
        summary.total_atoms,
        summary.convergences_detected
    );
    for top in &output.report.top_convergences {
        println!(
            "  {} (strength {}, {})",
            top.keyword, top.cross_domain_strength, top.significance
        );
    }
    if integration.defaulted_fields() > 0 {
        println!("{} missing fields filled with defaults", integration.defaulted_fields());
    }
    println!("report: {}", output.report_path.display());
    println!("unified store: {}", output.snapshot_path.display());
    Ok(())
}

async fn drive<R: ActionRunner>(
    dir: &Path,
    registry: Arc<CollectorRegistry>,
    runner: R,
    options: DriverOptions,
    cancel: CancellationToken,
) -> anyhow::Result<CycleSummary> {
    let mut driver = Driver::new(dir, registry, runner, options).await?;
    Ok(driver.run(cancel).await)
}

fn print_summary(summary: &CycleSummary) {
    println!();
    println!("autonomy cycle finished after {} iterations", summary.iterations);
    println!("  succeeded: {}", summary.executed_steps.len());
    println!("  failed:    {}", summary.failed_steps.len());
    println!("  deferred:  {}", summary.skipped_steps.len());
    println!("  success rate: {:.1}%", summary.success_rate * 100.0);
    if summary.cancelled {
        println!("  (interrupted)");
    }
}

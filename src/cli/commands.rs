//! Command dispatch. Configuration I/O, payload loading and output happen
//! here so the analyzers stay free of side effects.

use super::args::{Cli, Commands};
use super::setup::configure_thread_pool;
use crate::analyzers::migration::FixedMigration;
use crate::analyzers::pr_review::LcovCoverage;
use crate::analyzers::{
    ComplexityAnalyzer, ContributorAnalyzer, DependencyAnalyzer, IssueTrackerAnalyzer,
    LicenseAnalyzer, MigrationPlanner, MigrationRegistry, PerformanceAnalyzer, PrReviewAnalyzer,
    RepositoryAnalyzer, StructureAnalyzer,
};
use crate::config::{discover_config, load_config_file, ReposcopeConfig};
use crate::core::AnalysisResult;
use crate::github::{load_issues, load_json, load_pull_requests, ContributorData, PullRequest};
use crate::io::output::{create_writer, OutputFormat};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Effective settings for one invocation.
pub struct RunContext {
    pub config: ReposcopeConfig,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

impl RunContext {
    /// Explicit `--config` wins; otherwise discover from `start`.
    pub fn resolve(cli: &Cli, start: &Path) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => load_config_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => discover_config(start),
        };
        let format = cli
            .format
            .or_else(|| config.default_format().and_then(OutputFormat::parse))
            .unwrap_or(OutputFormat::Terminal);
        Ok(Self {
            config,
            format,
            output: cli.output.clone(),
        })
    }

    pub fn write(&self, results: &[AnalysisResult]) -> Result<()> {
        let sink: Box<dyn Write> = match &self.output {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                colored::control::set_override(false);
                Box::new(
                    fs::File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?,
                )
            }
            None => Box::new(std::io::stdout()),
        };
        create_writer(self.format, sink).write_results(results)
    }
}

/// The filesystem analyzers configured from `config`, in reporting order.
pub fn tree_analyzers(config: &ReposcopeConfig) -> Vec<Box<dyn RepositoryAnalyzer>> {
    let walker = config.walker();
    vec![
        Box::new(StructureAnalyzer::new().with_walker_config(walker.clone())),
        Box::new(
            ComplexityAnalyzer::new(config.complexity_thresholds())
                .with_walker_config(walker.clone()),
        ),
        Box::new(DependencyAnalyzer::new()),
        Box::new(LicenseAnalyzer::default()),
        Box::new(PerformanceAnalyzer::new().with_walker_config(walker)),
    ]
}

/// Run `analyzers` over `repo` on the rayon pool. Each analyzer stays
/// single threaded; results keep the order of `analyzers`.
pub fn run_all(
    repo: &Path,
    analyzers: &[Box<dyn RepositoryAnalyzer>],
) -> crate::errors::Result<Vec<AnalysisResult>> {
    let _span = tracing::info_span!("run_all", repo = %repo.display()).entered();
    analyzers
        .par_iter()
        .map(|analyzer| {
            tracing::debug!("Starting {} analyzer", analyzer.kind());
            analyzer.analyze(repo)
        })
        .collect()
}

fn run_tree(
    cli: &Cli,
    path: &Path,
    pick: impl Fn(&ReposcopeConfig) -> Box<dyn RepositoryAnalyzer>,
) -> Result<()> {
    let ctx = RunContext::resolve(cli, path)?;
    let analyzer = pick(&ctx.config);
    let result = analyzer
        .analyze(path)
        .with_context(|| format!("{} analysis of {} failed", analyzer.kind(), path.display()))?;
    ctx.write(&[result])
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to read the current directory")
}

pub fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Structure { path } => run_tree(&cli, path, |config| {
            Box::new(StructureAnalyzer::new().with_walker_config(config.walker()))
        }),
        Commands::Complexity { path } => run_tree(&cli, path, |config| {
            Box::new(
                ComplexityAnalyzer::new(config.complexity_thresholds())
                    .with_walker_config(config.walker()),
            )
        }),
        Commands::Dependencies { path } => {
            run_tree(&cli, path, |_| Box::new(DependencyAnalyzer::new()))
        }
        Commands::Licenses { path } => {
            run_tree(&cli, path, |_| Box::new(LicenseAnalyzer::default()))
        }
        Commands::Performance { path } => run_tree(&cli, path, |config| {
            Box::new(PerformanceAnalyzer::new().with_walker_config(config.walker()))
        }),
        Commands::Pr { input, lcov } => {
            let ctx = RunContext::resolve(&cli, &current_dir()?)?;
            let pr: PullRequest = load_json(input)?;
            let mut analyzer = PrReviewAnalyzer::new();
            if let Some(lcov) = lcov {
                analyzer = analyzer.with_coverage_source(Box::new(LcovCoverage::from_file(lcov)?));
            }
            ctx.write(&[analyzer.analyze(&pr)?])
        }
        Commands::Contributors { input } => {
            let ctx = RunContext::resolve(&cli, &current_dir()?)?;
            let data: ContributorData = load_json(input)?;
            let result =
                ContributorAnalyzer::new(ctx.config.contributor_settings()).analyze(&data)?;
            ctx.write(&[result])
        }
        Commands::Issues { issues, prs } => {
            let ctx = RunContext::resolve(&cli, &current_dir()?)?;
            let issues = load_issues(issues)?;
            let prs = match prs {
                Some(path) => load_pull_requests(path)?,
                None => Vec::new(),
            };
            let result =
                IssueTrackerAnalyzer::new(ctx.config.issue_settings()).analyze(&issues, &prs)?;
            ctx.write(&[result])
        }
        Commands::Migrate {
            path,
            migration_type,
            list,
        } => {
            let registry = MigrationRegistry::builtin();
            if *list {
                let mut stdout = std::io::stdout();
                for kind in registry.supported_types() {
                    writeln!(stdout, "{kind}")?;
                }
                return Ok(());
            }
            let (Some(path), Some(migration_type)) = (path, migration_type) else {
                anyhow::bail!("migrate needs a path and --type (or --list)");
            };
            let ctx = RunContext::resolve(&cli, path)?;
            let migration = FixedMigration {
                planner: MigrationPlanner::new(registry).with_walker_config(ctx.config.walker()),
                migration_type: migration_type.clone(),
            };
            ctx.write(&[migration.analyze(path)?])
        }
        Commands::All { path, jobs } => {
            configure_thread_pool(*jobs);
            let ctx = RunContext::resolve(&cli, path)?;
            let results = run_all(path, &tree_analyzers(&ctx.config))
                .with_context(|| format!("Analysis of {} failed", path.display()))?;
            ctx.write(&results)
        }
    }
}

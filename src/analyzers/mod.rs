//! The nine repository analyzers.
//!
//! Filesystem analyzers implement [`RepositoryAnalyzer`] so an orchestrator
//! can run them side by side; the JSON-facing analyzers (PR review,
//! contributors, issue tracker) take their payloads directly.

use crate::config::WalkerConfig;
use crate::core::{AnalysisKind, AnalysisResult, ParseWarning};
use crate::errors::Result;
use crate::io::{ensure_repository, DirectoryWalker};
use std::path::{Path, PathBuf};

pub mod complexity;
pub mod contributors;
pub mod dependency;
pub mod issues;
pub mod license;
pub mod migration;
pub mod performance;
pub mod pr_review;
pub mod structure;

pub use complexity::{analyze_code_complexity, ComplexityAnalyzer};
pub use contributors::{analyze_contributors, ContributorAnalyzer};
pub use dependency::{analyze_dependencies, DependencyAnalyzer};
pub use issues::{analyze_issue_tracker, IssueTrackerAnalyzer};
pub use license::{analyze_licenses, LicenseAnalyzer};
pub use migration::{plan_migration, MigrationPlanner, MigrationRegistry};
pub use performance::{analyze_performance, PerformanceAnalyzer};
pub use pr_review::{analyze_pr, PrReviewAnalyzer};
pub use structure::{analyze_structure, StructureAnalyzer, StructureConfig};

/// An analyzer that inspects a repository tree.
pub trait RepositoryAnalyzer: Send + Sync {
    fn kind(&self) -> AnalysisKind;
    fn analyze(&self, repo: &Path) -> Result<AnalysisResult>;
}

/// Files (and optionally directories) under `repo`, in walk order.
pub(crate) struct Scan {
    pub paths: Vec<PathBuf>,
    pub warnings: Vec<ParseWarning>,
}

impl Scan {
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter().filter(|p| p.is_file())
    }
}

pub(crate) fn scan_repository(
    repo: &Path,
    walker: &WalkerConfig,
    include_dirs: bool,
) -> Result<Scan> {
    ensure_repository(repo)?;
    let mut paths = Vec::new();
    let warnings = DirectoryWalker::from_config(repo, walker)?
        .include_dirs(include_dirs)
        .walk(|path| paths.push(path.to_path_buf()));
    tracing::debug!("Scanned {} paths under {}", paths.len(), repo.display());
    Ok(Scan { paths, warnings })
}

/// Lower-cased extension of `path`, empty when there is none.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// `path` relative to `root`, with forward slashes.
pub(crate) fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

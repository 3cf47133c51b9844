// Export modules for library usage
pub mod analyzers;
pub mod cli;
pub mod config;
pub mod core;
pub mod detectors;
pub mod errors;
pub mod github;
pub mod io;

// Re-export commonly used types
pub use crate::core::{
    AnalysisData, AnalysisKind, AnalysisResult, Finding, Language, ParseWarning, Priority,
    Recommendation, Severity,
};

pub use crate::analyzers::{
    analyze_code_complexity, analyze_contributors, analyze_dependencies, analyze_issue_tracker,
    analyze_licenses, analyze_performance, analyze_pr, analyze_structure, plan_migration,
    RepositoryAnalyzer,
};

pub use crate::config::ReposcopeConfig;
pub use crate::errors::{Error, Result};
pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};
pub use crate::io::{walk, walk_collect, DirectoryWalker};

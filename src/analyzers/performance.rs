//! Performance anti-pattern scan over JavaScript/TypeScript and Python
//! sources. Detection lives in [`crate::detectors::performance`]; this module
//! walks the tree, locates findings and groups them into recommendations.

use super::{extension_of, relative_display, scan_repository, RepositoryAnalyzer};
use crate::config::WalkerConfig;
use crate::core::{
    AnalysisData, AnalysisKind, AnalysisResult, Finding, Language, Priority, Recommendation,
    ResultBuilder, Severity,
};
use crate::detectors::performance::{default_detectors, SourceFile};
use crate::detectors::Detector;
use crate::errors::Result;
use crate::io::read_source;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

const SCANNED_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "py"];

#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash, Copy, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    NPlusOneQuery,
    QuadraticLoop,
    SyncIoInAsync,
    MemoryLeak,
    UnboundedCache,
    LargeJson,
    MissingIndex,
    /// Findings of detectors outside the built-in catalogue
    Other,
}

impl IssueType {
    pub const ALL: [IssueType; 7] = [
        IssueType::NPlusOneQuery,
        IssueType::QuadraticLoop,
        IssueType::SyncIoInAsync,
        IssueType::MemoryLeak,
        IssueType::UnboundedCache,
        IssueType::LargeJson,
        IssueType::MissingIndex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::NPlusOneQuery => "n-plus-one-query",
            IssueType::QuadraticLoop => "quadratic-loop",
            IssueType::SyncIoInAsync => "sync-io-in-async",
            IssueType::MemoryLeak => "memory-leak",
            IssueType::UnboundedCache => "unbounded-cache",
            IssueType::LargeJson => "large-json",
            IssueType::MissingIndex => "missing-index",
            IssueType::Other => "other",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn severity(&self) -> Severity {
        match self {
            IssueType::NPlusOneQuery | IssueType::SyncIoInAsync => Severity::High,
            IssueType::QuadraticLoop
            | IssueType::MemoryLeak
            | IssueType::UnboundedCache
            | IssueType::Other => Severity::Medium,
            IssueType::LargeJson | IssueType::MissingIndex => Severity::Low,
        }
    }

    /// Effort to fix `count` occurrences, banded at ≤2, ≤5 and above.
    pub fn effort(&self, count: usize) -> &'static str {
        let bands: [&'static str; 3] = match self {
            IssueType::NPlusOneQuery => ["2-4 hours", "1-2 days", "3-5 days"],
            IssueType::QuadraticLoop => ["1-2 hours", "4-8 hours", "1-2 days"],
            IssueType::SyncIoInAsync => ["1-2 hours", "2-4 hours", "1 day"],
            IssueType::MemoryLeak => ["1-2 hours", "4-8 hours", "1-2 days"],
            IssueType::UnboundedCache => ["2-4 hours", "1 day", "2-3 days"],
            IssueType::LargeJson => ["1-2 hours", "2-4 hours", "1 day"],
            IssueType::MissingIndex | IssueType::Other => ["1-2 hours", "2-4 hours", "1 day"],
        };
        match count {
            0..=2 => bands[0],
            3..=5 => bands[1],
            _ => bands[2],
        }
    }

    fn advice(&self) -> &'static str {
        match self {
            IssueType::NPlusOneQuery => {
                "Batch queries issued inside loops (eager loading, IN clauses or Promise.all)"
            }
            IssueType::QuadraticLoop => {
                "Replace linear lookups inside loops with a Set or Map built once"
            }
            IssueType::SyncIoInAsync => "Use the asynchronous I/O APIs inside async functions",
            IssueType::MemoryLeak => {
                "Release listeners, intervals, subscriptions and sockets when their owner is torn down"
            }
            IssueType::UnboundedCache => "Bound caches with a size limit, TTL or LRU eviction",
            IssueType::LargeJson => "Stream large JSON payloads instead of (de)serializing them whole",
            IssueType::MissingIndex => "Check that filtered query columns are backed by indexes",
            IssueType::Other => "Review the findings of the additional performance detectors",
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PerformanceIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub file: String,
    pub line: usize,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Default)]
pub struct PerformanceSummary {
    pub total_issues: usize,
    pub files_scanned: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_type: BTreeMap<IssueType, usize>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PerformanceReport {
    pub summary: PerformanceSummary,
    pub issues: Vec<PerformanceIssue>,
}

pub struct PerformanceAnalyzer {
    detectors: Vec<Box<dyn Detector<SourceFile> + Send + Sync>>,
    walker: WalkerConfig,
}

impl PerformanceAnalyzer {
    pub fn new() -> Self {
        Self {
            detectors: default_detectors(),
            walker: WalkerConfig::default(),
        }
    }

    pub fn with_detectors(
        mut self,
        detectors: Vec<Box<dyn Detector<SourceFile> + Send + Sync>>,
    ) -> Self {
        self.detectors = detectors;
        self
    }

    pub fn with_walker_config(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    /// Every issue in one file, in detector order then by line.
    pub fn analyze_file(&self, file_path: &str, file: &SourceFile) -> Vec<PerformanceIssue> {
        let mut issues: Vec<PerformanceIssue> = self
            .detectors
            .iter()
            .flat_map(|detector| detector.detect(file))
            .map(|finding| to_issue(file_path, finding))
            .collect();
        issues.sort_by_key(|issue| (issue.issue_type, issue.line));
        issues
    }

    pub fn analyze(&self, repo: &Path) -> Result<AnalysisResult> {
        let _span = tracing::debug_span!("analyzer", kind = "performance").entered();
        let scan = scan_repository(repo, &self.walker, false)?;
        let mut warnings = scan.warnings.clone();
        let mut issues = Vec::new();
        let mut files_scanned = 0;

        for path in scan.files() {
            let ext = extension_of(path);
            if !SCANNED_EXTENSIONS.contains(&ext.as_str()) {
                continue;
            }
            let content = match read_source(path, "performance") {
                Ok(content) => content,
                Err(warning) => {
                    warnings.push(warning);
                    continue;
                }
            };
            files_scanned += 1;
            let file = SourceFile::new(content, Language::from_extension(&ext));
            let found = self.analyze_file(&relative_display(repo, path), &file);
            if !found.is_empty() {
                tracing::debug!("{} performance issues in {}", found.len(), path.display());
            }
            issues.extend(found);
        }

        let summary = summarize(&issues, files_scanned);
        tracing::info!(
            "Performance: {} issues in {} files",
            summary.total_issues,
            summary.files_scanned
        );
        let report = PerformanceReport { summary, issues };

        Ok(ResultBuilder::new(AnalysisData::Performance(report.clone()))
            .summary(format!(
                "Found {} potential performance issues across {} files",
                report.summary.total_issues, report.summary.files_scanned
            ))
            .insights(insights(&report))
            .recommendations(recommendations(&report.summary))
            .warnings(warnings)
            .build())
    }
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryAnalyzer for PerformanceAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Performance
    }

    fn analyze(&self, repo: &Path) -> Result<AnalysisResult> {
        PerformanceAnalyzer::analyze(self, repo)
    }
}

/// Findings of unknown detectors become [`IssueType::Other`], keeping the
/// detector name in the description.
fn to_issue(file_path: &str, finding: Finding) -> PerformanceIssue {
    let (issue_type, description) = match IssueType::from_name(finding.detector) {
        Some(issue_type) => (issue_type, finding.message),
        None => (
            IssueType::Other,
            format!("{}: {}", finding.detector, finding.message),
        ),
    };
    PerformanceIssue {
        issue_type,
        severity: finding.severity,
        file: file_path.to_string(),
        line: finding.line.unwrap_or(1),
        description,
    }
}

fn summarize(issues: &[PerformanceIssue], files_scanned: usize) -> PerformanceSummary {
    let mut summary = PerformanceSummary {
        total_issues: issues.len(),
        files_scanned,
        ..Default::default()
    };
    for issue in issues {
        *summary.by_severity.entry(issue.severity).or_default() += 1;
        *summary.by_type.entry(issue.issue_type).or_default() += 1;
    }
    summary
}

fn insights(report: &PerformanceReport) -> Vec<String> {
    let summary = &report.summary;
    if summary.total_issues == 0 {
        return vec!["No performance anti-patterns detected".to_string()];
    }

    let mut insights = Vec::new();
    let high = summary.by_severity.get(&Severity::High).copied().unwrap_or(0);
    if high > 0 {
        insights.push(format!("{} high severity issues need attention first", high));
    }
    if let Some((issue_type, count)) = summary
        .by_type
        .iter()
        .max_by_key(|(t, c)| (**c, std::cmp::Reverse(**t)))
    {
        insights.push(format!("Most common issue: {} ({} occurrences)", issue_type, count));
    }

    let mut per_file: BTreeMap<&str, usize> = BTreeMap::new();
    for issue in &report.issues {
        *per_file.entry(issue.file.as_str()).or_default() += 1;
    }
    if let Some((file, count)) = per_file
        .iter()
        .max_by_key(|(f, c)| (**c, std::cmp::Reverse(**f)))
    {
        insights.push(format!("{} has the most issues ({})", file, count));
    }
    insights
}

fn recommendations(summary: &PerformanceSummary) -> Vec<Recommendation> {
    summary
        .by_type
        .iter()
        .map(|(issue_type, count)| {
            Recommendation::new(
                "performance",
                Priority::from(issue_type.severity()),
                format!("{} ({} occurrences)", issue_type.advice(), count),
                issue_type.effort(*count),
            )
        })
        .collect()
}

/// Scan the repository at `repo` with the default detector set.
pub fn analyze_performance(repo: &Path) -> Result<AnalysisResult> {
    PerformanceAnalyzer::new().analyze(repo)
}

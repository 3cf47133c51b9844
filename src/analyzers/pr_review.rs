//! Pull request review from a GitHub PR payload.
//!
//! Probes only look at added lines. Coverage comes from a
//! [`CoverageSource`]; when none is known the coverage term drops out of the
//! score instead of being guessed.

use crate::core::{
    round1, AnalysisData, AnalysisResult, Priority, Recommendation, ResultBuilder, Severity,
};
use crate::detectors::patch::{probe_sets, ProbeCategory};
use crate::detectors::Detector;
use crate::errors::{Error, Result};
use crate::github::{PullRequest, PullRequestFile};
use lcov::{Reader, Record};
use serde::Serialize;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Where a PR's test coverage comes from.
pub trait CoverageSource: Send + Sync {
    /// Line coverage (0-100) of the PR, or `None` when unknown.
    fn coverage(&self, pr: &PullRequest) -> Result<Option<f64>>;
}

/// Coverage reported in the PR payload itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct PayloadCoverage;

impl CoverageSource for PayloadCoverage {
    fn coverage(&self, pr: &PullRequest) -> Result<Option<f64>> {
        Ok(pr.coverage.map(|c| c.clamp(0.0, 100.0)))
    }
}

/// Line coverage of the PR's changed files taken from an LCOV report.
#[derive(Debug, Default, Clone)]
pub struct LcovCoverage {
    /// (lines found, lines hit) per source file
    files: HashMap<PathBuf, (u64, u64)>,
}

impl LcovCoverage {
    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = Reader::open_file(path).map_err(|e| Error::Coverage {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::collect(reader, path)
    }

    pub fn from_lcov_text(content: &str) -> Result<Self> {
        Self::collect(Reader::new(content.as_bytes()), Path::new("<lcov>"))
    }

    fn collect<B: BufRead>(reader: Reader<B>, origin: &Path) -> Result<Self> {
        let mut files: HashMap<PathBuf, (u64, u64)> = HashMap::new();
        let mut current: Option<PathBuf> = None;

        for record in reader {
            let record = record.map_err(|e| Error::Coverage {
                path: origin.to_path_buf(),
                message: e.to_string(),
            })?;
            match record {
                Record::SourceFile { path } => {
                    files.entry(path.clone()).or_default();
                    current = Some(path);
                }
                Record::LineData { count, .. } => {
                    if let Some(entry) = current.as_ref().and_then(|p| files.get_mut(p)) {
                        entry.0 += 1;
                        if count > 0 {
                            entry.1 += 1;
                        }
                    }
                }
                Record::EndOfRecord => current = None,
                _ => {}
            }
        }
        tracing::debug!("Loaded LCOV data for {} files", files.len());
        Ok(Self { files })
    }

    /// (found, hit) for a PR file name; report paths are often absolute, so
    /// a report path matches when it ends with the PR's relative path.
    fn lines_for(&self, filename: &str) -> Option<(u64, u64)> {
        let wanted = Path::new(filename);
        self.files
            .iter()
            .find(|(path, _)| path.as_path() == wanted || path.ends_with(wanted))
            .map(|(_, lines)| *lines)
    }
}

impl CoverageSource for LcovCoverage {
    fn coverage(&self, pr: &PullRequest) -> Result<Option<f64>> {
        let (found, hit) = pr
            .files
            .iter()
            .filter_map(|f| self.lines_for(&f.filename))
            .fold((0u64, 0u64), |(found, hit), (f, h)| (found + f, hit + h));
        if found == 0 {
            return Ok(None);
        }
        Ok(Some(round1(hit as f64 / found as f64 * 100.0)))
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, Copy, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Assessment {
    NeedsImprovement,
    Acceptable,
    Good,
    Excellent,
}

impl Assessment {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Assessment::Excellent
        } else if score >= 75.0 {
            Assessment::Good
        } else if score >= 60.0 {
            Assessment::Acceptable
        } else {
            Assessment::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Assessment::Excellent => "excellent",
            Assessment::Good => "good",
            Assessment::Acceptable => "acceptable",
            Assessment::NeedsImprovement => "needs-improvement",
        }
    }
}

impl std::fmt::Display for Assessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PrFinding {
    pub file: String,
    pub category: ProbeCategory,
    pub probe: &'static str,
    pub severity: Severity,
    /// Line in the new version of the file
    pub line: Option<usize>,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct PrReview {
    pub pr_number: u64,
    pub title: String,
    pub author: String,
    /// Lines added plus lines deleted
    pub changes: u64,
    pub files_changed: u64,
    pub bugs_found: usize,
    pub security_issues: usize,
    pub quality_issues: usize,
    pub test_coverage: Option<f64>,
    pub score: f64,
    pub overall_assessment: Assessment,
    pub findings: Vec<PrFinding>,
}

/// 100 - 5/bug - 10/security issue - 2/quality issue - 0.5 per missing
/// coverage point, clamped to 0..=100. Unknown coverage costs nothing.
pub fn review_score(bugs: usize, security: usize, quality: usize, coverage: Option<f64>) -> f64 {
    let mut score = 100.0 - 5.0 * bugs as f64 - 10.0 * security as f64 - 2.0 * quality as f64;
    if let Some(coverage) = coverage {
        score -= 0.5 * (100.0 - coverage.clamp(0.0, 100.0));
    }
    round1(score.clamp(0.0, 100.0))
}

pub struct PrReviewAnalyzer {
    coverage: Box<dyn CoverageSource>,
}

impl PrReviewAnalyzer {
    pub fn new() -> Self {
        Self {
            coverage: Box::new(PayloadCoverage),
        }
    }

    pub fn with_coverage_source(mut self, source: Box<dyn CoverageSource>) -> Self {
        self.coverage = source;
        self
    }

    pub fn review_file(&self, file: &PullRequestFile) -> Vec<PrFinding> {
        let added = file.added_lines();
        if added.is_empty() {
            return Vec::new();
        }
        let text = added.iter().map(|(_, l)| *l).collect::<Vec<_>>().join("\n");

        let mut findings = Vec::new();
        for (category, probes) in probe_sets() {
            for probe in probes {
                for finding in probe.detect(&text) {
                    let line = finding
                        .line
                        .and_then(|index| added.get(index - 1))
                        .map(|(number, _)| *number);
                    findings.push(PrFinding {
                        file: file.filename.clone(),
                        category,
                        probe: finding.detector,
                        severity: finding.severity,
                        line,
                        message: finding.message,
                    });
                }
            }
        }
        findings
    }

    pub fn analyze(&self, pr: &PullRequest) -> Result<AnalysisResult> {
        let _span = tracing::debug_span!("analyzer", kind = "pr-review").entered();
        let findings: Vec<PrFinding> = pr.files.iter().flat_map(|f| self.review_file(f)).collect();
        let count =
            |category: ProbeCategory| findings.iter().filter(|f| f.category == category).count();
        let bugs_found = count(ProbeCategory::Bug);
        let security_issues = count(ProbeCategory::Security);
        let quality_issues = count(ProbeCategory::Quality);

        let test_coverage = self.coverage.coverage(pr)?;
        let score = review_score(bugs_found, security_issues, quality_issues, test_coverage);
        let files_changed = if pr.changed_files > 0 {
            pr.changed_files
        } else {
            pr.files.len() as u64
        };

        let review = PrReview {
            pr_number: pr.number,
            title: pr.title.clone(),
            author: pr.author().to_string(),
            changes: pr.additions + pr.deletions,
            files_changed,
            bugs_found,
            security_issues,
            quality_issues,
            test_coverage,
            score,
            overall_assessment: Assessment::from_score(score),
            findings,
        };
        tracing::info!(
            "PR #{}: score {} ({}), {} bugs, {} security, {} quality",
            review.pr_number,
            review.score,
            review.overall_assessment,
            review.bugs_found,
            review.security_issues,
            review.quality_issues
        );

        Ok(ResultBuilder::new(AnalysisData::PrReview(review.clone()))
            .summary(format!(
                "PR #{} by {} scored {} ({})",
                review.pr_number, review.author, review.score, review.overall_assessment
            ))
            .insights(insights(&review))
            .recommendations(recommendations(&review))
            .build())
    }
}

impl Default for PrReviewAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn insights(review: &PrReview) -> Vec<String> {
    let mut insights = vec![format!(
        "{} lines changed across {} files",
        review.changes, review.files_changed
    )];
    match review.test_coverage {
        Some(coverage) => insights.push(format!("Test coverage: {}%", coverage)),
        None => insights.push("Test coverage unknown; score excludes coverage".to_string()),
    }
    if review.findings.is_empty() {
        insights.push("No issues found in added lines".to_string());
    } else {
        insights.push(format!(
            "{} bugs, {} security issues and {} quality issues in added lines",
            review.bugs_found, review.security_issues, review.quality_issues
        ));
    }
    insights
}

fn recommendations(review: &PrReview) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if review.security_issues > 0 {
        recs.push(Recommendation::new(
            "security",
            Priority::Critical,
            format!("Resolve {} security issues before merging", review.security_issues),
            "1-2 hours",
        ));
    }
    if review.bugs_found > 0 {
        recs.push(Recommendation::new(
            "bugs",
            Priority::High,
            format!("Fix {} potential bugs", review.bugs_found),
            "1-2 hours",
        ));
    }
    if review.quality_issues > 5 {
        recs.push(Recommendation::new(
            "code-quality",
            Priority::Low,
            format!("Address {} code quality issues", review.quality_issues),
            "30 minutes",
        ));
    }
    if let Some(coverage) = review.test_coverage {
        if coverage < 80.0 {
            recs.push(Recommendation::new(
                "testing",
                Priority::High,
                format!("Increase test coverage from {}% to at least 80%", coverage),
                "2-4 hours",
            ));
        }
    }
    if review.overall_assessment < Assessment::Good {
        recs.push(Recommendation::new(
            "review",
            Priority::Medium,
            "Request additional review before merging",
            "30 minutes",
        ));
    }
    recs
}

/// Review `pr` using the coverage carried in its payload.
pub fn analyze_pr(pr: &PullRequest) -> Result<AnalysisResult> {
    PrReviewAnalyzer::new().analyze(pr)
}

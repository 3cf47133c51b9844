//! Per-file complexity metrics and refactoring priorities.
//!
//! All metrics are lexical: decision keywords are counted with word-bounded
//! regexes, functions are found by header patterns and nesting is a plain
//! bracket counter. A file scores two points for each metric strictly above
//! its threshold.

use super::{extension_of, relative_display, scan_repository, RepositoryAnalyzer};
use crate::config::{ComplexityThresholds, WalkerConfig};
use crate::core::{
    round1, AnalysisData, AnalysisKind, AnalysisResult, Language, Priority, Recommendation,
    ResultBuilder,
};
use crate::errors::Result;
use crate::io::read_source;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

const SCANNED_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "py", "java", "go", "rb", "php", "cs", "c", "h", "cpp",
    "cc", "cxx", "hpp", "rs", "swift", "kt", "scala",
];

static C_FAMILY_DECISIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(if|for|while|case|catch)\b|&&|\|\||\s\?\s").unwrap());
static PYTHON_DECISIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(if|elif|for|while|except|and|or)\b").unwrap());
static GO_DECISIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(if|for|case|select)\b|&&|\|\|").unwrap());
static RUBY_DECISIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(if|elsif|unless|while|until|when|rescue)\b|&&|\|\|").unwrap()
});
static RUST_DECISIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(if|for|while|loop|match)\b|&&|\|\|").unwrap());

static JS_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfunction\b[^(\n]*\(|\)\s*=>").unwrap());
static DEF_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*def\s+\w+").unwrap());
static GO_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^func\s").unwrap());
static RUST_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfn\s+\w+").unwrap());
static KOTLIN_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfun\s+[\w.<>]+\s*\(").unwrap());
static SWIFT_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfunc\s+\w+").unwrap());
static PHP_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfunction\s+&?\w+\s*\(").unwrap());
/// Typed method headers (`int main(void) {`, `public void run() {`).
static TYPED_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:[\w:<>\[\],*&]+[ \t]+)*?([\w:<>\[\]*&]+)[ \t]+[*&]?(\w+)[ \t]*\([^;{}]*\)[ \t]*(?:const[ \t]*)?(?:throws[ \t]+[\w., \t]+)?\s*\{",
    )
    .unwrap()
});

const CONTROL_WORDS: &[&str] = &[
    "if", "else", "for", "while", "switch", "catch", "return", "new", "do", "using", "lock",
];

pub fn decision_pattern(language: Language) -> &'static Regex {
    match language {
        Language::Python => &*PYTHON_DECISIONS,
        Language::Go => &*GO_DECISIONS,
        Language::Ruby => &*RUBY_DECISIONS,
        Language::Rust => &*RUST_DECISIONS,
        _ => &*C_FAMILY_DECISIONS,
    }
}

/// Byte offsets where functions start.
fn function_starts(content: &str, language: Language) -> Vec<usize> {
    let simple = |re: &Regex| -> Vec<usize> { re.find_iter(content).map(|m| m.start()).collect() };
    match language {
        Language::JavaScript | Language::TypeScript | Language::Vue => simple(&*JS_FUNCTION),
        Language::Python | Language::Ruby | Language::Scala => simple(&*DEF_FUNCTION),
        Language::Go => simple(&*GO_FUNCTION),
        Language::Rust => simple(&*RUST_FUNCTION),
        Language::Kotlin => simple(&*KOTLIN_FUNCTION),
        Language::Swift => simple(&*SWIFT_FUNCTION),
        Language::Php => simple(&*PHP_FUNCTION),
        _ => TYPED_FUNCTION
            .captures_iter(content)
            .filter(|caps| {
                let return_type = caps.get(1).map_or("", |m| m.as_str());
                let name = caps.get(2).map_or("", |m| m.as_str());
                !CONTROL_WORDS.contains(&return_type) && !CONTROL_WORDS.contains(&name)
            })
            .filter_map(|caps| caps.get(0).map(|m| m.start()))
            .collect(),
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityMetrics {
    pub cyclomatic: u32,
    pub lines_of_code: usize,
    pub function_length: f64,
    pub nesting_depth: u32,
    pub duplication: f64,
}

impl ComplexityMetrics {
    pub fn measure(content: &str, language: Language) -> Self {
        Self {
            cyclomatic: cyclomatic_complexity(content, language),
            lines_of_code: content.lines().filter(|l| !l.trim().is_empty()).count(),
            function_length: average_function_length(content, language),
            nesting_depth: nesting_depth(content),
            duplication: duplication_percentage(content),
        }
    }
}

pub fn cyclomatic_complexity(content: &str, language: Language) -> u32 {
    1 + decision_pattern(language).find_iter(content).count() as u32
}

/// Mean line count of the segments between function boundaries, ignoring
/// everything before the first one.
pub fn average_function_length(content: &str, language: Language) -> f64 {
    let starts = function_starts(content, language);
    if starts.is_empty() {
        return 0.0;
    }
    let total: usize = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(content.len());
            content[start..end].lines().count()
        })
        .sum();
    round1(total as f64 / starts.len() as f64)
}

pub fn nesting_depth(content: &str) -> u32 {
    let mut depth: u32 = 0;
    let mut max_depth = 0;
    for c in content.chars() {
        match c {
            '{' | '[' | '(' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max_depth
}

/// Share of non-trivial lines (longer than 10 characters once trimmed and
/// whitespace-collapsed) whose text appears more than once in the file.
pub fn duplication_percentage(content: &str) -> f64 {
    let normalized: Vec<String> = content
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| line.len() > 10)
        .collect();
    if normalized.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in &normalized {
        *counts.entry(line.as_str()).or_default() += 1;
    }
    let duplicated: usize = counts.values().filter(|&&n| n >= 2).sum();
    round1(duplicated as f64 / normalized.len() as f64 * 100.0)
}

/// Two points per metric strictly above its threshold (0-8).
pub fn priority_score(metrics: &ComplexityMetrics, thresholds: &ComplexityThresholds) -> u8 {
    [
        metrics.cyclomatic > thresholds.cyclomatic,
        metrics.function_length > thresholds.function_length,
        metrics.nesting_depth > thresholds.nesting_depth,
        metrics.duplication > thresholds.duplication,
    ]
    .iter()
    .filter(|&&exceeded| exceeded)
    .count() as u8
        * 2
}

pub fn priority_for_score(score: u8) -> Priority {
    match score {
        s if s >= 6 => Priority::Critical,
        4 | 5 => Priority::High,
        2 | 3 => Priority::Medium,
        _ => Priority::Low,
    }
}

pub fn effort_for(priority: Priority) -> Option<&'static str> {
    match priority {
        Priority::Critical => Some("2-4 hours"),
        Priority::High => Some("1-2 hours"),
        _ => None,
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileComplexity {
    pub file_path: String,
    pub language: Language,
    pub complexity: ComplexityMetrics,
    pub priority: Priority,
    pub priority_score: u8,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRefactoring {
    pub file_path: String,
    pub priority: Priority,
    pub priority_score: u8,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub estimated_effort: String,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexitySummary {
    pub files_analyzed: usize,
    pub total_lines_of_code: usize,
    pub average_cyclomatic: f64,
    pub max_cyclomatic: u32,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityReport {
    pub summary: ComplexitySummary,
    pub files: Vec<FileComplexity>,
    pub refactorings: Vec<FileRefactoring>,
}

pub struct ComplexityAnalyzer {
    thresholds: ComplexityThresholds,
    walker: WalkerConfig,
}

impl ComplexityAnalyzer {
    pub fn new(thresholds: ComplexityThresholds) -> Self {
        Self {
            thresholds,
            walker: WalkerConfig::default(),
        }
    }

    pub fn with_walker_config(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    pub fn analyze_file(
        &self,
        file_path: String,
        content: &str,
        language: Language,
    ) -> FileComplexity {
        let complexity = ComplexityMetrics::measure(content, language);
        let priority_score = priority_score(&complexity, &self.thresholds);
        FileComplexity {
            file_path,
            language,
            complexity,
            priority: priority_for_score(priority_score),
            priority_score,
        }
    }

    /// Itemized issues and suggestions for a high or critical file.
    pub fn refactoring_for(&self, file: &FileComplexity) -> Option<FileRefactoring> {
        let effort = effort_for(file.priority)?;
        let metrics = &file.complexity;
        let t = &self.thresholds;
        let mut issues = Vec::new();
        let mut suggestions = Vec::new();

        if metrics.cyclomatic > t.cyclomatic {
            issues.push(format!(
                "Cyclomatic complexity {} exceeds {}",
                metrics.cyclomatic, t.cyclomatic
            ));
            suggestions.push("Extract conditional branches into well-named functions".to_string());
        }
        if metrics.function_length > t.function_length {
            issues.push(format!(
                "Average function length {} lines exceeds {}",
                metrics.function_length, t.function_length
            ));
            suggestions.push("Split long functions into smaller single-purpose ones".to_string());
        }
        if metrics.nesting_depth > t.nesting_depth {
            issues.push(format!(
                "Nesting depth {} exceeds {}",
                metrics.nesting_depth, t.nesting_depth
            ));
            suggestions.push("Use early returns and guard clauses to flatten nesting".to_string());
        }
        if metrics.duplication > t.duplication {
            issues.push(format!(
                "{}% of lines are duplicated (limit {}%)",
                metrics.duplication, t.duplication
            ));
            suggestions.push("Move repeated code into shared helpers".to_string());
        }

        Some(FileRefactoring {
            file_path: file.file_path.clone(),
            priority: file.priority,
            priority_score: file.priority_score,
            issues,
            suggestions,
            estimated_effort: effort.to_string(),
        })
    }

    pub fn analyze(&self, repo: &Path) -> Result<AnalysisResult> {
        let _span = tracing::debug_span!("analyzer", kind = "complexity").entered();
        let scan = scan_repository(repo, &self.walker, false)?;
        let mut warnings = scan.warnings.clone();
        let mut files = Vec::new();

        for path in scan.files() {
            let ext = extension_of(path);
            if !SCANNED_EXTENSIONS.contains(&ext.as_str()) {
                continue;
            }
            match read_source(path, "complexity") {
                Ok(content) => {
                    tracing::debug!("Measuring {}", path.display());
                    files.push(self.analyze_file(
                        relative_display(repo, path),
                        &content,
                        Language::from_extension(&ext),
                    ));
                }
                Err(warning) => warnings.push(warning),
            }
        }
        files.sort_by(|a, b| {
            b.complexity
                .cyclomatic
                .cmp(&a.complexity.cyclomatic)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });

        let refactorings: Vec<FileRefactoring> =
            files.iter().filter_map(|f| self.refactoring_for(f)).collect();
        let summary = summarize(&files);
        tracing::info!(
            "Complexity: {} files, {} critical, {} high",
            summary.files_analyzed,
            summary.critical,
            summary.high
        );

        let report = ComplexityReport {
            summary,
            files,
            refactorings,
        };
        Ok(ResultBuilder::new(AnalysisData::Complexity(report.clone()))
            .summary(format!(
                "Analyzed {} files ({} lines of code): {} critical and {} high priority",
                report.summary.files_analyzed,
                report.summary.total_lines_of_code,
                report.summary.critical,
                report.summary.high
            ))
            .insights(insights(&report))
            .recommendations(recommendations(&report.refactorings))
            .warnings(warnings)
            .build())
    }
}

impl Default for ComplexityAnalyzer {
    fn default() -> Self {
        Self::new(ComplexityThresholds::default())
    }
}

impl RepositoryAnalyzer for ComplexityAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Complexity
    }

    fn analyze(&self, repo: &Path) -> Result<AnalysisResult> {
        ComplexityAnalyzer::analyze(self, repo)
    }
}

fn summarize(files: &[FileComplexity]) -> ComplexitySummary {
    let mut summary = ComplexitySummary {
        files_analyzed: files.len(),
        ..Default::default()
    };
    for file in files {
        summary.total_lines_of_code += file.complexity.lines_of_code;
        summary.max_cyclomatic = summary.max_cyclomatic.max(file.complexity.cyclomatic);
        match file.priority {
            Priority::Critical => summary.critical += 1,
            Priority::High => summary.high += 1,
            Priority::Medium => summary.medium += 1,
            Priority::Low => summary.low += 1,
        }
    }
    if !files.is_empty() {
        let total: u32 = files.iter().map(|f| f.complexity.cyclomatic).sum();
        summary.average_cyclomatic = round1(total as f64 / files.len() as f64);
    }
    summary
}

fn insights(report: &ComplexityReport) -> Vec<String> {
    let summary = &report.summary;
    if summary.files_analyzed == 0 {
        return vec!["No source files found to analyze".to_string()];
    }

    let mut insights = vec![format!(
        "Average cyclomatic complexity is {} across {} files",
        summary.average_cyclomatic, summary.files_analyzed
    )];
    if let Some(worst) = report.files.first() {
        insights.push(format!(
            "Most complex file: {} (cyclomatic {})",
            worst.file_path, worst.complexity.cyclomatic
        ));
    }
    let flagged = summary.critical + summary.high;
    if flagged > 0 {
        insights.push(format!("{} files need refactoring", flagged));
    }
    insights
}

fn recommendations(refactorings: &[FileRefactoring]) -> Vec<Recommendation> {
    refactorings
        .iter()
        .map(|r| {
            Recommendation::new(
                "complexity",
                r.priority,
                format!("Refactor {}: {}", r.file_path, r.issues.join("; ")),
                r.estimated_effort.clone(),
            )
        })
        .collect()
}

/// Measure every source file under `repo` with the default thresholds.
pub fn analyze_code_complexity(repo: &Path) -> Result<AnalysisResult> {
    ComplexityAnalyzer::default().analyze(repo)
}

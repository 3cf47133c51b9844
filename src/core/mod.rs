pub mod language;
pub mod result;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use language::Language;
pub use result::{AnalysisData, AnalysisKind, AnalysisResult, ResultBuilder};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Ord, PartialOrd)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(Priority, &str)] = &[
            (Priority::Low, "low"),
            (Priority::Medium, "medium"),
            (Priority::High, "high"),
            (Priority::Critical, "critical"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(p, _)| p == self)
            .map(|(_, s)| *s)
            .unwrap_or("unknown");

        write!(f, "{display_str}")
    }
}

/// Severity of a single detected condition, before it is grouped into a
/// [`Recommendation`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Ord, PartialOrd)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl From<Severity> for Priority {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => Priority::Low,
            Severity::Medium => Priority::Medium,
            Severity::High => Priority::High,
            Severity::Critical => Priority::Critical,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared recommendation value emitted by every analyzer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub category: String,
    pub priority: Priority,
    pub description: String,
    pub actionable: bool,
    pub estimated_effort: String,
}

impl Recommendation {
    pub fn new(
        category: impl Into<String>,
        priority: Priority,
        description: impl Into<String>,
        estimated_effort: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            priority,
            description: description.into(),
            actionable: true,
            estimated_effort: estimated_effort.into(),
        }
    }

    /// Mark the recommendation as informational (nothing to change in code).
    pub fn informational(mut self) -> Self {
        self.actionable = false;
        self
    }
}

/// A non-fatal problem met while extracting data (malformed manifest,
/// unreadable file, symlink loop, bad timestamp).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseWarning {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub message: String,
}

impl ParseWarning {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            path: None,
            message: message.into(),
        }
    }

    pub fn at(
        source: impl Into<String>,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            path: Some(path.into()),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[{}] {}: {}", self.source, path.display(), self.message),
            None => write!(f, "[{}] {}", self.source, self.message),
        }
    }
}

/// Single detected condition produced by a detector.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Finding {
    pub detector: &'static str,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl Finding {
    pub fn new(detector: &'static str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            detector,
            severity,
            line: None,
            message: message.into(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// Round to one decimal place, the precision used for every reported
/// percentage and average.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage of `part` in `total`, clamped to [0, 100]; zero when `total` is zero.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1((part as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_priority_serializes_lowercase() {
        let json = serde_json::to_string(&Priority::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }

    #[test]
    fn test_recommendation_uses_camel_case_effort() {
        let rec = Recommendation::new("security", Priority::High, "Update lodash", "1 hour");
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["estimatedEffort"], "1 hour");
        assert_eq!(json["actionable"], true);
    }

    #[test]
    fn test_percentage_handles_zero_total() {
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(5, 4), 100.0);
    }

    #[test]
    fn test_warning_display_includes_path() {
        let warning = ParseWarning::at("npm", "package.json", "expected value");
        assert_eq!(warning.to_string(), "[npm] package.json: expected value");
    }
}

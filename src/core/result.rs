//! The uniform output contract shared by every analyzer.
//!
//! An [`AnalysisResult`] wraps one analyzer-specific report in the
//! [`AnalysisData`] tagged union, so downstream renderers can match on the
//! kind exhaustively while treating summary, insights, recommendations and
//! warnings uniformly.

use super::{ParseWarning, Recommendation};
use crate::analyzers::complexity::ComplexityReport;
use crate::analyzers::contributors::ContributorReport;
use crate::analyzers::dependency::DependencyReport;
use crate::analyzers::issues::IssueTrackerReport;
use crate::analyzers::license::LicenseReport;
use crate::analyzers::migration::MigrationPlan;
use crate::analyzers::performance::PerformanceReport;
use crate::analyzers::pr_review::PrReview;
use crate::analyzers::structure::StructureReport;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "report", rename_all = "kebab-case")]
pub enum AnalysisData {
    Structure(StructureReport),
    Complexity(ComplexityReport),
    Dependencies(DependencyReport),
    Licenses(LicenseReport),
    Performance(PerformanceReport),
    PrReview(PrReview),
    Contributors(ContributorReport),
    IssueTracker(IssueTrackerReport),
    Migration(MigrationPlan),
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    Structure,
    Complexity,
    Dependencies,
    Licenses,
    Performance,
    PrReview,
    Contributors,
    IssueTracker,
    Migration,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Structure => "structure",
            AnalysisKind::Complexity => "complexity",
            AnalysisKind::Dependencies => "dependencies",
            AnalysisKind::Licenses => "licenses",
            AnalysisKind::Performance => "performance",
            AnalysisKind::PrReview => "pr-review",
            AnalysisKind::Contributors => "contributors",
            AnalysisKind::IssueTracker => "issue-tracker",
            AnalysisKind::Migration => "migration",
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AnalysisData {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisData::Structure(_) => AnalysisKind::Structure,
            AnalysisData::Complexity(_) => AnalysisKind::Complexity,
            AnalysisData::Dependencies(_) => AnalysisKind::Dependencies,
            AnalysisData::Licenses(_) => AnalysisKind::Licenses,
            AnalysisData::Performance(_) => AnalysisKind::Performance,
            AnalysisData::PrReview(_) => AnalysisKind::PrReview,
            AnalysisData::Contributors(_) => AnalysisKind::Contributors,
            AnalysisData::IssueTracker(_) => AnalysisKind::IssueTracker,
            AnalysisData::Migration(_) => AnalysisKind::Migration,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub data: AnalysisData,
    pub insights: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn kind(&self) -> AnalysisKind {
        self.data.kind()
    }
}

/// Incrementally assembles an [`AnalysisResult`].
pub struct ResultBuilder {
    data: AnalysisData,
    summary: String,
    insights: Vec<String>,
    recommendations: Vec<Recommendation>,
    warnings: Vec<ParseWarning>,
    generated_at: Option<DateTime<Utc>>,
}

impl ResultBuilder {
    pub fn new(data: AnalysisData) -> Self {
        Self {
            data,
            summary: String::new(),
            insights: Vec::new(),
            recommendations: Vec::new(),
            warnings: Vec::new(),
            generated_at: None,
        }
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn insights(mut self, insights: Vec<String>) -> Self {
        self.insights = insights;
        self
    }

    pub fn recommendations(mut self, recommendations: Vec<Recommendation>) -> Self {
        self.recommendations = recommendations;
        self
    }

    pub fn warnings(mut self, warnings: Vec<ParseWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// Finish the result. Recommendations are ordered most urgent first,
    /// keeping the analyzer's order within one priority.
    pub fn build(mut self) -> AnalysisResult {
        for warning in &self.warnings {
            tracing::warn!(kind = %self.data.kind(), "{}", warning);
        }
        self.recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));

        AnalysisResult {
            summary: self.summary,
            data: self.data,
            insights: self.insights,
            recommendations: self.recommendations,
            warnings: self.warnings,
            generated_at: self.generated_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::migration::MigrationPlan;
    use crate::core::Priority;

    fn empty_plan() -> AnalysisData {
        AnalysisData::Migration(MigrationPlan {
            migration_type: "react-class-to-hooks".into(),
            source_framework: "React Class Components".into(),
            target_framework: "React Hooks".into(),
            files_to_change: Vec::new(),
            estimated_effort: crate::analyzers::migration::MigrationEffort::Low,
            breaking_changes: Vec::new(),
            steps: Vec::new(),
        })
    }

    #[test]
    fn test_build_sorts_recommendations_by_priority() {
        let result = ResultBuilder::new(empty_plan())
            .recommendations(vec![
                Recommendation::new("a", Priority::Low, "low", "1 hour"),
                Recommendation::new("b", Priority::Critical, "critical", "1 hour"),
                Recommendation::new("c", Priority::Medium, "medium", "1 hour"),
            ])
            .build();

        let order: Vec<Priority> = result.recommendations.iter().map(|r| r.priority).collect();
        assert_eq!(order, vec![Priority::Critical, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn test_data_serializes_with_type_tag() {
        let result = ResultBuilder::new(empty_plan()).summary("nothing").build();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["data"]["type"], "migration");
        assert_eq!(json["summary"], "nothing");
        assert!(json.get("generatedAt").is_some());
        assert!(json.get("warnings").is_none());
        assert_eq!(result.kind(), AnalysisKind::Migration);
    }
}

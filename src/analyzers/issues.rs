//! Issue tracker health from GitHub issue and pull request lists.
//!
//! The health score starts at 100 and loses points per tripped threshold:
//!
//! | signal | mild | severe |
//! |---|---|---|
//! | backlog ratio (open / all) | ≥ 0.3: −10 | ≥ 0.5: −20 |
//! | average resolution (days) | > 30: −15 | > 60: −25 |
//! | stale ratio (stale / open) | ≥ 0.3: −10 | ≥ 0.5: −20 |
//! | merge rate (%) | < 70: −10 | < 50: −20 |

use crate::config::IssueTrackerSettings;
use crate::core::{
    round1, AnalysisData, AnalysisResult, ParseWarning, Priority, Recommendation, ResultBuilder,
};
use crate::errors::Result;
use crate::github::{parse_optional_timestamp, Issue, PullRequest};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

const TOP_LABELS: usize = 10;
const LABEL_SHARE_LIMIT: f64 = 0.3;
const LABEL_SHARE_MIN_ISSUES: usize = 5;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct LabelCount {
    pub name: String,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct IssueTrackerMetrics {
    pub open_issues: usize,
    pub closed_issues: usize,
    pub open_prs: usize,
    pub merged_prs: usize,
    pub total_prs: usize,
    /// Mean days from creation to close, over closed issues with both dates
    pub avg_resolution_time: f64,
    pub common_labels: Vec<LabelCount>,
    pub stale_issues: usize,
    pub merge_rate: f64,
}

impl IssueTrackerMetrics {
    pub fn total_issues(&self) -> usize {
        self.open_issues + self.closed_issues
    }

    pub fn backlog_ratio(&self) -> f64 {
        ratio(self.open_issues, self.total_issues())
    }

    pub fn stale_ratio(&self) -> f64 {
        ratio(self.stale_issues, self.open_issues)
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, Copy, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum HealthLevel {
    NeedsImprovement,
    Acceptable,
    Good,
    Excellent,
}

impl HealthLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 80 => HealthLevel::Excellent,
            s if s >= 60 => HealthLevel::Good,
            s if s >= 40 => HealthLevel::Acceptable,
            _ => HealthLevel::NeedsImprovement,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthLevel::Excellent => "excellent",
            HealthLevel::Good => "good",
            HealthLevel::Acceptable => "acceptable",
            HealthLevel::NeedsImprovement => "needs-improvement",
        }
    }
}

impl std::fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum BottleneckKind {
    Backlog,
    SlowResolution,
    StaleIssues,
    LowMergeRate,
    LabelConcentration,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Bottleneck {
    pub kind: BottleneckKind,
    pub priority: Priority,
    pub description: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct IssueTrackerReport {
    pub metrics: IssueTrackerMetrics,
    pub health_score: u32,
    pub health_level: HealthLevel,
    pub bottlenecks: Vec<Bottleneck>,
}

/// Points lost per signal, in table order.
fn penalties(metrics: &IssueTrackerMetrics) -> [(BottleneckKind, u32); 4] {
    let backlog = metrics.backlog_ratio();
    let stale = metrics.stale_ratio();
    let resolution = metrics.avg_resolution_time;

    let backlog_penalty = if backlog > 0.5 {
        20
    } else if backlog > 0.3 {
        10
    } else {
        0
    };
    let resolution_penalty = if resolution > 60.0 {
        25
    } else if resolution > 30.0 {
        15
    } else {
        0
    };
    let stale_penalty = if stale >= 0.5 {
        20
    } else if stale >= 0.3 {
        10
    } else {
        0
    };
    let merge_penalty = if metrics.total_prs == 0 {
        0
    } else if metrics.merge_rate < 50.0 {
        20
    } else if metrics.merge_rate < 70.0 {
        10
    } else {
        0
    };

    [
        (BottleneckKind::Backlog, backlog_penalty),
        (BottleneckKind::SlowResolution, resolution_penalty),
        (BottleneckKind::StaleIssues, stale_penalty),
        (BottleneckKind::LowMergeRate, merge_penalty),
    ]
}

/// 100 minus penalties, clamped to 0..=100.
pub fn health_score(metrics: &IssueTrackerMetrics) -> u32 {
    let lost: u32 = penalties(metrics).iter().map(|(_, p)| p).sum();
    100u32.saturating_sub(lost).min(100)
}

fn bottlenecks(metrics: &IssueTrackerMetrics) -> Vec<Bottleneck> {
    let mut found: Vec<Bottleneck> = penalties(metrics)
        .into_iter()
        .filter(|(_, penalty)| *penalty > 0)
        .map(|(kind, penalty)| {
            let priority = if penalty >= 20 {
                Priority::High
            } else {
                Priority::Medium
            };
            let description = match kind {
                BottleneckKind::Backlog => format!(
                    "{:.0}% of issues are still open",
                    metrics.backlog_ratio() * 100.0
                ),
                BottleneckKind::SlowResolution => format!(
                    "Issues take {} days on average to resolve",
                    metrics.avg_resolution_time
                ),
                BottleneckKind::StaleIssues => format!(
                    "{} of {} open issues are stale",
                    metrics.stale_issues, metrics.open_issues
                ),
                BottleneckKind::LowMergeRate => {
                    format!("Only {}% of pull requests are merged", metrics.merge_rate)
                }
                BottleneckKind::LabelConcentration => String::new(),
            };
            Bottleneck {
                kind,
                priority,
                description,
            }
        })
        .collect();

    let total = metrics.total_issues();
    if let Some(top) = metrics.common_labels.first() {
        if total >= LABEL_SHARE_MIN_ISSUES && ratio(top.count, total) > LABEL_SHARE_LIMIT {
            found.push(Bottleneck {
                kind: BottleneckKind::LabelConcentration,
                priority: Priority::Medium,
                description: format!(
                    "'{}' covers {} of {} issues",
                    top.name, top.count, total
                ),
            });
        }
    }
    found
}

fn recommendation_for(bottleneck: &Bottleneck) -> Recommendation {
    let (category, action, effort) = match bottleneck.kind {
        BottleneckKind::Backlog => {
            ("issue-management", "hold regular triage sessions", "2-4 hours/week")
        }
        BottleneckKind::SlowResolution => {
            ("issue-management", "assign owners and set response targets", "1-2 weeks")
        }
        BottleneckKind::StaleIssues => {
            ("issue-management", "close or refresh stale issues", "1 day")
        }
        BottleneckKind::LowMergeRate => {
            ("pull-requests", "review contribution guidelines and PR scope", "1 week")
        }
        BottleneckKind::LabelConcentration => {
            ("focus-area", "dedicate effort to the dominant issue area", "2-4 weeks")
        }
    };
    Recommendation::new(
        category,
        bottleneck.priority,
        format!("{}; {}", bottleneck.description, action),
        effort,
    )
}

pub struct IssueTrackerAnalyzer {
    settings: IssueTrackerSettings,
    reference_time: Option<DateTime<Utc>>,
}

impl IssueTrackerAnalyzer {
    pub fn new(settings: IssueTrackerSettings) -> Self {
        Self {
            settings,
            reference_time: None,
        }
    }

    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    pub fn metrics(
        &self,
        issues: &[Issue],
        prs: &[PullRequest],
        now: DateTime<Utc>,
    ) -> (IssueTrackerMetrics, Vec<ParseWarning>) {
        let mut warnings = Vec::new();
        let stale_after = Duration::days(self.settings.stale_days);
        let mut open_issues = 0;
        let mut closed_issues = 0;
        let mut stale_issues = 0;
        let mut resolution_days = Vec::new();
        let mut labels: HashMap<&str, usize> = HashMap::new();

        for issue in issues.iter().filter(|i| !i.is_pull_request()) {
            for label in &issue.labels {
                *labels.entry(label.name()).or_default() += 1;
            }
            let created =
                parse_optional_timestamp("issues", issue.created_at.as_deref(), &mut warnings);

            if issue.is_open() {
                open_issues += 1;
                let updated =
                    parse_optional_timestamp("issues", issue.updated_at.as_deref(), &mut warnings)
                        .or(created);
                if updated.is_some_and(|at| now - at > stale_after) {
                    stale_issues += 1;
                }
            } else {
                closed_issues += 1;
                let closed =
                    parse_optional_timestamp("issues", issue.closed_at.as_deref(), &mut warnings);
                if let (Some(created), Some(closed)) = (created, closed) {
                    resolution_days.push((closed - created).num_seconds() as f64 / 86_400.0);
                }
            }
        }

        let mut common_labels: Vec<LabelCount> = labels
            .into_iter()
            .map(|(name, count)| LabelCount {
                name: name.to_string(),
                count,
            })
            .collect();
        common_labels.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        common_labels.truncate(TOP_LABELS);

        let avg_resolution_time = if resolution_days.is_empty() {
            0.0
        } else {
            round1(resolution_days.iter().sum::<f64>() / resolution_days.len() as f64)
        };

        let merged_prs = prs.iter().filter(|p| p.is_merged()).count();
        let open_prs = prs.iter().filter(|p| p.is_open() && !p.is_merged()).count();
        let merge_rate = if prs.is_empty() {
            0.0
        } else {
            round1(merged_prs as f64 / prs.len() as f64 * 100.0)
        };

        let metrics = IssueTrackerMetrics {
            open_issues,
            closed_issues,
            open_prs,
            merged_prs,
            total_prs: prs.len(),
            avg_resolution_time,
            common_labels,
            stale_issues,
            merge_rate,
        };
        (metrics, warnings)
    }

    pub fn analyze(&self, issues: &[Issue], prs: &[PullRequest]) -> Result<AnalysisResult> {
        let _span = tracing::debug_span!("analyzer", kind = "issue-tracker").entered();
        let now = self.reference_time.unwrap_or_else(Utc::now);
        let (metrics, warnings) = self.metrics(issues, prs, now);
        let health_score = health_score(&metrics);
        let report = IssueTrackerReport {
            health_level: HealthLevel::from_score(health_score),
            health_score,
            bottlenecks: bottlenecks(&metrics),
            metrics,
        };
        tracing::info!(
            "Issue tracker: health {} ({}), {} bottlenecks",
            report.health_score,
            report.health_level,
            report.bottlenecks.len()
        );

        let recommendations = report.bottlenecks.iter().map(recommendation_for).collect();
        Ok(ResultBuilder::new(AnalysisData::IssueTracker(report.clone()))
            .summary(format!(
                "Issue tracker health {} ({}): {} open and {} closed issues, {}% of PRs merged",
                report.health_score,
                report.health_level,
                report.metrics.open_issues,
                report.metrics.closed_issues,
                report.metrics.merge_rate
            ))
            .insights(insights(&report))
            .recommendations(recommendations)
            .warnings(warnings)
            .generated_at(now)
            .build())
    }
}

impl Default for IssueTrackerAnalyzer {
    fn default() -> Self {
        Self::new(IssueTrackerSettings::default())
    }
}

fn insights(report: &IssueTrackerReport) -> Vec<String> {
    let m = &report.metrics;
    let mut insights = vec![format!(
        "{} open issues, {} stale",
        m.open_issues, m.stale_issues
    )];
    if m.avg_resolution_time > 0.0 {
        insights.push(format!("Average resolution time: {} days", m.avg_resolution_time));
    }
    if m.total_prs > 0 {
        insights.push(format!(
            "{} of {} pull requests merged, {} still open",
            m.merged_prs, m.total_prs, m.open_prs
        ));
    }
    if !m.common_labels.is_empty() {
        let top: Vec<String> = m
            .common_labels
            .iter()
            .take(3)
            .map(|l| format!("{} ({})", l.name, l.count))
            .collect();
        insights.push(format!("Most common labels: {}", top.join(", ")));
    }
    insights
}

/// Assess `issues` and `prs` with default settings against the current time.
pub fn analyze_issue_tracker(issues: &[Issue], prs: &[PullRequest]) -> Result<AnalysisResult> {
    IssueTrackerAnalyzer::default().analyze(issues, prs)
}

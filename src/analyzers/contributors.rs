//! Contributor activity folded from commit, PR, review and issue streams.

use crate::config::ContributorSettings;
use crate::core::{
    percentage, AnalysisData, AnalysisResult, ParseWarning, Priority, Recommendation,
    ResultBuilder,
};
use crate::errors::Result;
use crate::github::{parse_optional_timestamp, ContributorData};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash, Copy, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Engagement {
    Core,
    Active,
    Moderate,
    Declining,
}

impl Engagement {
    /// Classify an activity score given the days since the last activity.
    pub fn classify(score: u64, days_inactive: Option<i64>) -> Self {
        let Some(days) = days_inactive else {
            return Engagement::Declining;
        };
        match (score, days) {
            (s, d) if s >= 100 && d < 30 => Engagement::Core,
            (s, d) if s >= 50 && d < 60 => Engagement::Active,
            (s, d) if s >= 10 && d < 90 => Engagement::Moderate,
            _ => Engagement::Declining,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Engagement::Core => "core",
            Engagement::Active => "active",
            Engagement::Moderate => "moderate",
            Engagement::Declining => "declining",
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Default)]
pub struct ContributorActivity {
    pub login: String,
    pub commits: u64,
    pub prs_opened: u64,
    pub prs_reviewed: u64,
    pub issues_triaged: u64,
    pub code_additions: u64,
    pub code_deletions: u64,
    pub last_active_date: Option<DateTime<Utc>>,
    pub score: u64,
    pub engagement: Option<Engagement>,
}

impl ContributorActivity {
    fn new(login: &str) -> Self {
        Self {
            login: login.to_string(),
            ..Default::default()
        }
    }

    /// 2 per commit, 3 per PR opened, 2 per review, 1 per issue.
    pub fn activity_score(&self) -> u64 {
        2 * self.commits + 3 * self.prs_opened + 2 * self.prs_reviewed + self.issues_triaged
    }

    fn touch(&mut self, at: Option<DateTime<Utc>>) {
        if let Some(at) = at {
            if self.last_active_date.map_or(true, |last| at > last) {
                self.last_active_date = Some(at);
            }
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ContributorReport {
    pub total_contributors: usize,
    pub total_commits: u64,
    pub total_reviews: u64,
    pub engagement_breakdown: BTreeMap<Engagement, usize>,
    pub leaderboard: Vec<ContributorActivity>,
    pub core_maintainers: Vec<ContributorActivity>,
    pub declining_contributors: Vec<ContributorActivity>,
    pub bus_factor: usize,
    pub contributors: Vec<ContributorActivity>,
}

/// Fewest contributors whose commits cover at least half of all commits.
pub fn bus_factor(contributors: &[ContributorActivity]) -> usize {
    let total: u64 = contributors.iter().map(|c| c.commits).sum();
    if total == 0 {
        return 0;
    }
    let mut commits: Vec<u64> = contributors.iter().map(|c| c.commits).collect();
    commits.sort_unstable_by(|a, b| b.cmp(a));

    let mut covered = 0;
    for (i, count) in commits.iter().enumerate() {
        covered += count;
        if covered * 2 >= total {
            return i + 1;
        }
    }
    commits.len()
}

pub struct ContributorAnalyzer {
    settings: ContributorSettings,
    reference_time: Option<DateTime<Utc>>,
}

impl ContributorAnalyzer {
    pub fn new(settings: ContributorSettings) -> Self {
        Self {
            settings,
            reference_time: None,
        }
    }

    /// Measure inactivity against `now` instead of the wall clock.
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// One entry per login, unclassified and unsorted.
    pub fn fold(&self, data: &ContributorData) -> (Vec<ContributorActivity>, Vec<ParseWarning>) {
        let mut warnings = Vec::new();
        let mut by_login: HashMap<String, ContributorActivity> = HashMap::new();

        for commit in &data.commits {
            let Some(login) = commit.login() else {
                continue;
            };
            let at = parse_optional_timestamp("commits", commit.date(), &mut warnings);
            let entry = by_login
                .entry(login.to_string())
                .or_insert_with(|| ContributorActivity::new(login));
            entry.commits += 1;
            if let Some(stats) = commit.stats {
                entry.code_additions += stats.additions;
                entry.code_deletions += stats.deletions;
            }
            entry.touch(at);
        }

        for pr in &data.prs {
            let Some(login) = pr
                .user
                .as_ref()
                .map(|u| u.login.as_str())
                .filter(|l| !l.is_empty())
            else {
                continue;
            };
            let created = parse_optional_timestamp("prs", pr.created_at.as_deref(), &mut warnings);
            let merged = parse_optional_timestamp("prs", pr.merged_at.as_deref(), &mut warnings);
            let entry = by_login
                .entry(login.to_string())
                .or_insert_with(|| ContributorActivity::new(login));
            entry.prs_opened += 1;
            entry.touch(created);
            entry.touch(merged);
        }

        for review in &data.reviews {
            let Some(login) = review
                .user
                .as_ref()
                .map(|u| u.login.as_str())
                .filter(|l| !l.is_empty())
            else {
                continue;
            };
            let at =
                parse_optional_timestamp("reviews", review.submitted_at.as_deref(), &mut warnings);
            let entry = by_login
                .entry(login.to_string())
                .or_insert_with(|| ContributorActivity::new(login));
            entry.prs_reviewed += 1;
            entry.touch(at);
        }

        for issue in &data.issues {
            let Some(login) = issue
                .user
                .as_ref()
                .map(|u| u.login.as_str())
                .filter(|l| !l.is_empty())
            else {
                continue;
            };
            let stamp = issue.updated_at.as_deref().or(issue.created_at.as_deref());
            let at = parse_optional_timestamp("issues", stamp, &mut warnings);
            let entry = by_login
                .entry(login.to_string())
                .or_insert_with(|| ContributorActivity::new(login));
            entry.issues_triaged += 1;
            entry.touch(at);
        }

        (by_login.into_values().collect(), warnings)
    }

    pub fn analyze(&self, data: &ContributorData) -> Result<AnalysisResult> {
        let _span = tracing::debug_span!("analyzer", kind = "contributors").entered();
        let now = self.reference_time.unwrap_or_else(Utc::now);
        let (mut contributors, warnings) = self.fold(data);

        for contributor in &mut contributors {
            contributor.score = contributor.activity_score();
            let days = contributor.last_active_date.map(|last| (now - last).num_days());
            contributor.engagement = Some(Engagement::classify(contributor.score, days));
        }
        contributors.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.login.cmp(&b.login)));

        let leaderboard: Vec<ContributorActivity> = contributors
            .iter()
            .take(self.settings.leaderboard_size)
            .cloned()
            .collect();

        let mut core_maintainers: Vec<ContributorActivity> = contributors
            .iter()
            .filter(|c| c.engagement == Some(Engagement::Core))
            .cloned()
            .collect();
        core_maintainers
            .sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.login.cmp(&b.login)));

        // Oldest activity first; `None` sorts before any date.
        let mut declining_contributors: Vec<ContributorActivity> = contributors
            .iter()
            .filter(|c| c.engagement == Some(Engagement::Declining))
            .cloned()
            .collect();
        declining_contributors.sort_by(|a, b| {
            a.last_active_date
                .cmp(&b.last_active_date)
                .then_with(|| a.login.cmp(&b.login))
        });

        let mut engagement_breakdown = BTreeMap::new();
        for contributor in &contributors {
            if let Some(level) = contributor.engagement {
                *engagement_breakdown.entry(level).or_insert(0) += 1;
            }
        }

        let report = ContributorReport {
            total_contributors: contributors.len(),
            total_commits: contributors.iter().map(|c| c.commits).sum(),
            total_reviews: contributors.iter().map(|c| c.prs_reviewed).sum(),
            engagement_breakdown,
            bus_factor: bus_factor(&contributors),
            leaderboard,
            core_maintainers,
            declining_contributors,
            contributors,
        };
        tracing::info!(
            "Contributors: {} total, {} core, bus factor {}",
            report.total_contributors,
            report.core_maintainers.len(),
            report.bus_factor
        );

        Ok(ResultBuilder::new(AnalysisData::Contributors(report.clone()))
            .summary(format!(
                "{} contributors, {} core maintainers, bus factor {}",
                report.total_contributors,
                report.core_maintainers.len(),
                report.bus_factor
            ))
            .insights(insights(&report))
            .recommendations(recommendations(&report))
            .warnings(warnings)
            .generated_at(now)
            .build())
    }
}

impl Default for ContributorAnalyzer {
    fn default() -> Self {
        Self::new(ContributorSettings::default())
    }
}

fn top_reviewer(report: &ContributorReport) -> Option<&ContributorActivity> {
    report
        .contributors
        .iter()
        .filter(|c| c.prs_reviewed > 0)
        .max_by(|a, b| a.prs_reviewed.cmp(&b.prs_reviewed).then_with(|| b.login.cmp(&a.login)))
}

fn insights(report: &ContributorReport) -> Vec<String> {
    if report.total_contributors == 0 {
        return vec!["No contributor activity found".to_string()];
    }

    let mut insights = Vec::new();
    if let Some(top) = report.leaderboard.first() {
        insights.push(format!("Most active contributor: {} (score {})", top.login, top.score));
    }
    let declining = report.declining_contributors.len();
    insights.push(format!(
        "{}% of contributors are declining ({} of {})",
        percentage(declining, report.total_contributors),
        declining,
        report.total_contributors
    ));
    insights.push(format!(
        "{} contributors account for half of all commits",
        report.bus_factor
    ));
    insights
}

fn recommendations(report: &ContributorReport) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if report.total_contributors == 0 {
        return recs;
    }

    if report.core_maintainers.len() < 2 {
        recs.push(Recommendation::new(
            "community",
            Priority::High,
            format!(
                "Only {} core maintainers; mentor active contributors towards maintainer roles",
                report.core_maintainers.len()
            ),
            "ongoing",
        ));
    }
    if report.declining_contributors.len() * 2 > report.total_contributors {
        recs.push(Recommendation::new(
            "community",
            Priority::Medium,
            format!(
                "{} of {} contributors are declining; reach out and label good first issues",
                report.declining_contributors.len(),
                report.total_contributors
            ),
            "1-2 weeks",
        ));
    }
    if report.bus_factor == 1 && report.total_contributors > 1 {
        recs.push(Recommendation::new(
            "knowledge-sharing",
            Priority::High,
            "Bus factor is 1; document critical areas and spread ownership",
            "2-4 weeks",
        ));
    }
    if let Some(reviewer) = top_reviewer(report) {
        if reviewer.prs_reviewed * 2 > report.total_reviews {
            recs.push(Recommendation::new(
                "review-process",
                Priority::Medium,
                format!(
                    "{} performs {} of {} reviews; distribute review load",
                    reviewer.login, reviewer.prs_reviewed, report.total_reviews
                ),
                "1 week",
            ));
        }
    }
    recs
}

/// Fold `data` with the default settings against the current time.
pub fn analyze_contributors(data: &ContributorData) -> Result<AnalysisResult> {
    ContributorAnalyzer::default().analyze(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn commit(login: &str, date: &str) -> serde_json::Value {
        json!({
            "sha": "abc",
            "author": { "login": login },
            "commit": { "author": { "name": login, "date": date }, "message": "change" },
            "stats": { "additions": 10, "deletions": 2 },
        })
    }

    fn report(result: &AnalysisResult) -> &ContributorReport {
        match &result.data {
            AnalysisData::Contributors(report) => report,
            other => panic!("unexpected data {:?}", other.kind()),
        }
    }

    #[test]
    fn test_engagement_thresholds() {
        assert_eq!(Engagement::classify(100, Some(29)), Engagement::Core);
        assert_eq!(Engagement::classify(100, Some(30)), Engagement::Active);
        assert_eq!(Engagement::classify(50, Some(59)), Engagement::Active);
        assert_eq!(Engagement::classify(10, Some(89)), Engagement::Moderate);
        assert_eq!(Engagement::classify(9, Some(1)), Engagement::Declining);
        assert_eq!(Engagement::classify(500, None), Engagement::Declining);
    }

    #[test]
    fn test_bus_factor() {
        let make = |commits| ContributorActivity {
            commits,
            ..Default::default()
        };
        assert_eq!(bus_factor(&[make(8), make(1), make(1)]), 1);
        assert_eq!(bus_factor(&[make(3), make(3), make(3), make(3)]), 2);
        assert_eq!(bus_factor(&[]), 0);
    }

    #[test]
    fn test_fold_scores_and_classifies() {
        let mut commits: Vec<serde_json::Value> =
            (0..50).map(|_| commit("alice", "2024-05-20T10:00:00Z")).collect();
        commits.push(commit("bob", "2023-01-01T00:00:00Z"));
        commits.push(json!({ "sha": "x", "commit": { "message": "anonymous" } }));

        let data: ContributorData = serde_json::from_value(json!({
            "commits": commits,
            "prs": [{ "number": 1, "user": { "login": "bob" }, "created_at": "2024-05-30T00:00:00Z" }],
            "reviews": [
                { "user": { "login": "carol" }, "submitted_at": "2024-05-31T00:00:00Z" },
                { "user": { "login": "carol" }, "submitted_at": "not-a-date" }
            ],
            "issues": [{ "user": { "login": "alice" }, "created_at": "2024-05-01T00:00:00Z" }]
        }))
        .unwrap();

        let result = ContributorAnalyzer::default()
            .with_reference_time(now())
            .analyze(&data)
            .unwrap();
        let report = report(&result);

        assert_eq!(report.total_contributors, 3);
        let alice = &report.leaderboard[0];
        assert_eq!(alice.login, "alice");
        assert_eq!(alice.score, 101);
        assert_eq!(alice.code_additions, 500);
        assert_eq!(alice.engagement, Some(Engagement::Core));

        let bob = report.contributors.iter().find(|c| c.login == "bob").unwrap();
        assert_eq!(bob.score, 5);
        assert_eq!(bob.engagement, Some(Engagement::Declining));

        assert_eq!(report.core_maintainers.len(), 1);
        assert_eq!(report.bus_factor, 1);
        assert_eq!(result.warnings.len(), 1);

        let categories: Vec<&str> = result
            .recommendations
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert!(categories.contains(&"community"));
        assert!(categories.contains(&"knowledge-sharing"));
        assert!(categories.contains(&"review-process"));
    }

    #[test]
    fn test_declining_sorted_oldest_first() {
        let data: ContributorData = serde_json::from_value(json!({
            "commits": [
                commit("recent", "2024-01-01T00:00:00Z"),
                commit("older", "2022-01-01T00:00:00Z")
            ],
            "issues": [{ "user": { "login": "undated" } }]
        }))
        .unwrap();

        let result = ContributorAnalyzer::default()
            .with_reference_time(now())
            .analyze(&data)
            .unwrap();
        let order: Vec<&str> = report(&result)
            .declining_contributors
            .iter()
            .map(|c| c.login.as_str())
            .collect();
        assert_eq!(order, vec!["undated", "older", "recent"]);
    }

    #[test]
    fn test_leaderboard_size_is_configurable() {
        let commits: Vec<serde_json::Value> = ["a", "b", "c"]
            .iter()
            .map(|l| commit(l, "2024-05-01T00:00:00Z"))
            .collect();
        let data: ContributorData = serde_json::from_value(json!({ "commits": commits })).unwrap();

        let result = ContributorAnalyzer::new(ContributorSettings { leaderboard_size: 2 })
            .with_reference_time(now())
            .analyze(&data)
            .unwrap();
        let logins: Vec<&str> = report(&result)
            .leaderboard
            .iter()
            .map(|c| c.login.as_str())
            .collect();
        assert_eq!(logins, vec!["a", "b"]);
    }
}

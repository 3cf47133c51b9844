mod common;

use chrono::{TimeZone, Utc};
use common::{complex_javascript, create_test_project};
use pretty_assertions::assert_eq;
use reposcope::analyzers::complexity::ComplexityAnalyzer;
use reposcope::analyzers::dependency::{DependencyAnalyzer, Ecosystem};
use reposcope::analyzers::issues::{HealthLevel, IssueTrackerAnalyzer};
use reposcope::analyzers::license::ComplianceStatus;
use reposcope::analyzers::migration::MigrationEffort;
use reposcope::config::{ComplexityThresholds, IssueTrackerSettings};
use reposcope::github::{Issue, PullRequest};
use reposcope::{analyze_licenses, plan_migration, AnalysisData, Error, Priority};

#[test]
fn test_requirements_txt_dependencies() {
    let project = create_test_project(&[("requirements.txt", "flask>=2.0\n# comment\nrequests")]);

    let result = DependencyAnalyzer::new().analyze(project.path()).unwrap();
    let AnalysisData::Dependencies(report) = &result.data else {
        panic!("expected a dependency report");
    };

    let found: Vec<(&str, &str, Ecosystem)> = report
        .dependencies
        .iter()
        .map(|d| (d.name.as_str(), d.version.as_str(), d.ecosystem))
        .collect();
    assert_eq!(
        found,
        vec![
            ("flask", ">=2.0", Ecosystem::Pip),
            ("requests", "*", Ecosystem::Pip),
        ]
    );
}

#[test]
fn test_complex_file_is_critical() {
    let source = complex_javascript();
    assert_eq!(source.lines().count(), 120);
    let project = create_test_project(&[("big.js", &source)]);

    let result = ComplexityAnalyzer::new(ComplexityThresholds::default())
        .analyze(project.path())
        .unwrap();
    let AnalysisData::Complexity(report) = &result.data else {
        panic!("expected a complexity report");
    };

    let file = &report.files[0];
    assert_eq!(file.complexity.cyclomatic, 21);
    assert_eq!(file.complexity.nesting_depth, 6);
    assert_eq!(file.priority_score, 8);
    assert_eq!(file.priority, Priority::Critical);

    let refactoring = &report.refactorings[0];
    assert_eq!(refactoring.issues.len(), 4);
    assert_eq!(refactoring.estimated_effort, "2-4 hours");
}

fn issue(state: &str, created: &str, updated: Option<&str>, closed: Option<&str>) -> Issue {
    Issue {
        state: state.to_string(),
        created_at: Some(created.to_string()),
        updated_at: updated.map(String::from),
        closed_at: closed.map(String::from),
        ..Issue::default()
    }
}

fn pull_request(merged: bool) -> PullRequest {
    PullRequest {
        state: "closed".to_string(),
        merged_at: merged.then(|| "2024-05-01T00:00:00Z".to_string()),
        ..PullRequest::default()
    }
}

#[test]
fn test_issue_tracker_health_is_acceptable() {
    let mut issues = Vec::new();
    for _ in 0..5 {
        issues.push(issue("open", "2023-10-01T00:00:00Z", Some("2023-12-01T00:00:00Z"), None));
        issues.push(issue("open", "2024-05-01T00:00:00Z", Some("2024-05-20T00:00:00Z"), None));
    }
    for _ in 0..40 {
        issues.push(issue(
            "closed",
            "2024-01-01T00:00:00Z",
            None,
            Some("2024-02-15T00:00:00Z"),
        ));
    }
    let prs: Vec<PullRequest> = (0..20).map(|i| pull_request(i < 11)).collect();

    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let result = IssueTrackerAnalyzer::new(IssueTrackerSettings::default())
        .with_reference_time(now)
        .analyze(&issues, &prs)
        .unwrap();
    let AnalysisData::IssueTracker(report) = &result.data else {
        panic!("expected an issue tracker report");
    };

    assert_eq!(report.metrics.open_issues, 10);
    assert_eq!(report.metrics.closed_issues, 40);
    assert_eq!(report.metrics.stale_issues, 5);
    assert_eq!(report.metrics.avg_resolution_time, 45.0);
    assert_eq!(report.metrics.merge_rate, 55.0);
    assert_eq!(report.health_score, 55);
    assert_eq!(report.health_level, HealthLevel::Acceptable);
}

#[test]
fn test_react_class_migration_plan() {
    let component = "class App extends React.Component {\n  componentDidMount() {}\n}\n";
    let project = create_test_project(&[
        ("src/App.jsx", component),
        ("src/Header.js", component),
        ("src/Footer.tsx", component),
        ("src/util.js", "export const add = (a, b) => a + b;\n"),
    ]);

    let result = plan_migration(project.path(), "react-class-to-hooks").unwrap();
    let AnalysisData::Migration(plan) = &result.data else {
        panic!("expected a migration plan");
    };

    assert_eq!(plan.files_to_change.len(), 3);
    assert_eq!(plan.estimated_effort, MigrationEffort::Low);
    assert_eq!(plan.breaking_changes.len(), 7);
    let orders: Vec<usize> = plan.steps.iter().map(|s| s.order).collect();
    assert_eq!(orders, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_unknown_migration_type_is_an_error() {
    let project = create_test_project(&[("index.js", "componentDidMount")]);

    match plan_migration(project.path(), "cobol-to-rust") {
        Err(Error::UnknownMigrationType { requested, supported }) => {
            assert_eq!(requested, "cobol-to-rust");
            assert!(supported.iter().any(|s| s == "react-class-to-hooks"));
        }
        other => panic!("expected an unknown migration type error, got {other:?}"),
    }
}

#[test]
fn test_mit_project_without_dependencies_is_compliant() {
    let project = create_test_project(&[
        ("LICENSE", "MIT License\n\nPermission is hereby granted, free of charge, to any person"),
        ("package.json", r#"{"name": "demo", "license": "MIT"}"#),
    ]);

    let result = analyze_licenses(project.path()).unwrap();
    let AnalysisData::Licenses(report) = &result.data else {
        panic!("expected a license report");
    };

    assert_eq!(report.project_license.license_type, "MIT");
    assert!(report.incompatibilities.is_empty());
    assert_eq!(report.compliance.status, ComplianceStatus::Compliant);
}

mod common;

use common::create_test_project;
use proptest::prelude::*;
use reposcope::analyzers::complexity::{
    cyclomatic_complexity, duplication_percentage, priority_for_score, priority_score,
    ComplexityMetrics,
};
use reposcope::analyzers::issues::{health_score, IssueTrackerMetrics};
use reposcope::config::ComplexityThresholds;
use reposcope::io::EXCLUDED_DIRS;
use reposcope::{walk_collect, Language};

fn metrics_strategy() -> impl Strategy<Value = IssueTrackerMetrics> {
    (
        0usize..500,
        0usize..500,
        0usize..100,
        0.0f64..400.0,
        0usize..50,
        0.0f64..=100.0,
    )
        .prop_map(|(open, closed, total_prs, resolution, stale, merge_rate)| IssueTrackerMetrics {
            open_issues: open,
            closed_issues: closed,
            open_prs: 0,
            merged_prs: 0,
            total_prs,
            avg_resolution_time: resolution,
            common_labels: Vec::new(),
            stale_issues: stale.min(open),
            merge_rate,
        })
}

proptest! {
    #[test]
    fn prop_cyclomatic_is_at_least_one(content in ".{0,400}") {
        for language in [Language::JavaScript, Language::Python, Language::Go, Language::Rust] {
            prop_assert!(cyclomatic_complexity(&content, language) >= 1);
        }
    }

    #[test]
    fn prop_duplication_is_a_percentage(lines in prop::collection::vec("[a-c ]{0,16}", 0..40)) {
        let duplication = duplication_percentage(&lines.join("\n"));
        prop_assert!((0.0..=100.0).contains(&duplication));
    }

    #[test]
    fn prop_priority_never_drops_as_score_rises(a in 0u8..=8, b in 0u8..=8) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(priority_for_score(low) <= priority_for_score(high));
    }

    #[test]
    fn prop_priority_score_is_even_and_bounded(
        cyclomatic in 0u32..100,
        function_length in 0.0f64..200.0,
        nesting_depth in 0u32..20,
        duplication in 0.0f64..=100.0,
    ) {
        let metrics = ComplexityMetrics {
            cyclomatic,
            lines_of_code: 0,
            function_length,
            nesting_depth,
            duplication,
        };
        let score = priority_score(&metrics, &ComplexityThresholds::default());
        prop_assert!(score <= 8);
        prop_assert_eq!(score % 2, 0);
    }

    #[test]
    fn prop_health_score_is_clamped(metrics in metrics_strategy()) {
        prop_assert!(health_score(&metrics) <= 100);
    }

    #[test]
    fn prop_walker_never_enters_excluded_dirs(
        excluded in prop::sample::select(EXCLUDED_DIRS.to_vec()),
        depth in 0usize..3,
    ) {
        let nested = format!("{}{}/hidden.js", "pkg/".repeat(depth), excluded);
        let project = create_test_project(&[("src/visible.js", "x"), (nested.as_str(), "x")]);

        let (files, warnings) = walk_collect(project.path());
        prop_assert!(warnings.is_empty());
        prop_assert_eq!(files.len(), 1);
        prop_assert!(files[0].ends_with("src/visible.js"));
    }
}

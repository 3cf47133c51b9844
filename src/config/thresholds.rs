use serde::{Deserialize, Serialize};

/// Per-file thresholds of the complexity analyzer. A metric strictly above
/// its threshold adds two points to the file's priority score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityThresholds {
    #[serde(default = "default_cyclomatic")]
    pub cyclomatic: u32,

    #[serde(default = "default_function_length")]
    pub function_length: f64,

    #[serde(default = "default_nesting_depth")]
    pub nesting_depth: u32,

    #[serde(default = "default_duplication")]
    pub duplication: f64,
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            cyclomatic: default_cyclomatic(),
            function_length: default_function_length(),
            nesting_depth: default_nesting_depth(),
            duplication: default_duplication(),
        }
    }
}

fn default_cyclomatic() -> u32 {
    15
}
fn default_function_length() -> f64 {
    50.0
}
fn default_nesting_depth() -> u32 {
    5
}
fn default_duplication() -> f64 {
    30.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTrackerSettings {
    /// Days without an update after which an open issue counts as stale
    #[serde(default = "default_stale_days")]
    pub stale_days: i64,
}

impl Default for IssueTrackerSettings {
    fn default() -> Self {
        Self {
            stale_days: default_stale_days(),
        }
    }
}

fn default_stale_days() -> i64 {
    90
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorSettings {
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
}

impl Default for ContributorSettings {
    fn default() -> Self {
        Self {
            leaderboard_size: default_leaderboard_size(),
        }
    }
}

fn default_leaderboard_size() -> usize {
    10
}

use serde::{Deserialize, Serialize};

use super::thresholds::{ComplexityThresholds, ContributorSettings, IssueTrackerSettings};

/// Root configuration structure for reposcope
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReposcopeConfig {
    /// Directory walker configuration
    #[serde(default)]
    pub walker: Option<WalkerConfig>,

    /// Complexity analyzer thresholds
    #[serde(default)]
    pub complexity: Option<ComplexityThresholds>,

    /// Issue tracker configuration
    #[serde(default)]
    pub issues: Option<IssueTrackerSettings>,

    /// Contributor analyzer configuration
    #[serde(default)]
    pub contributors: Option<ContributorSettings>,

    /// Output configuration
    #[serde(default)]
    pub output: Option<OutputConfig>,
}

impl ReposcopeConfig {
    pub fn walker(&self) -> WalkerConfig {
        self.walker.clone().unwrap_or_default()
    }

    pub fn complexity_thresholds(&self) -> ComplexityThresholds {
        self.complexity.unwrap_or_default()
    }

    pub fn issue_settings(&self) -> IssueTrackerSettings {
        self.issues.unwrap_or_default()
    }

    pub fn contributor_settings(&self) -> ContributorSettings {
        self.contributors.unwrap_or_default()
    }

    pub fn default_format(&self) -> Option<&str> {
        self.output
            .as_ref()
            .and_then(|o| o.default_format.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerConfig {
    /// Directory names pruned in addition to the fixed exclusion set
    #[serde(default)]
    pub exclude_dirs: Vec<String>,

    /// Glob patterns of files to skip
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: Vec::new(),
            ignore_patterns: Vec::new(),
            follow_symlinks: default_follow_symlinks(),
        }
    }
}

fn default_follow_symlinks() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub default_format: Option<String>,
}

//! Serde models of the GitHub REST payloads consumed by the JSON-facing
//! analyzers. Only the fields the analyzers read are modelled; everything
//! else in a payload is ignored. Timestamps stay strings here and are
//! parsed by [`parse_timestamp`] so one bad value degrades to a warning
//! instead of rejecting the whole payload.

use crate::core::ParseWarning;
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

static HUNK_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@ -\d+(?:,\d+)? \+(\d+)(?:,\d+)? @@").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// GitHub sends label objects; hand-written fixtures often use plain names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Named { name: String },
    Plain(String),
}

impl Label {
    pub fn name(&self) -> &str {
        match self {
            Label::Named { name } => name,
            Label::Plain(name) => name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    /// Present when the issues endpoint returned a pull request
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn is_open(&self) -> bool {
        self.state.eq_ignore_ascii_case("open")
    }

    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub merged_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changed_files: u64,
    #[serde(default)]
    pub files: Vec<PullRequestFile>,
    /// Line coverage (0-100) reported by the caller's CI, if any
    #[serde(default)]
    pub coverage: Option<f64>,
}

impl PullRequest {
    pub fn is_open(&self) -> bool {
        self.state.eq_ignore_ascii_case("open")
    }

    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    pub fn author(&self) -> &str {
        self.user.as_ref().map(|u| u.login.as_str()).unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changes: u64,
    #[serde(default)]
    pub patch: Option<String>,
}

impl PullRequestFile {
    /// Lines added by the patch, without the leading `+`, with their line
    /// number in the new file.
    pub fn added_lines(&self) -> Vec<(usize, &str)> {
        self.patch.as_deref().map(numbered_added_lines).unwrap_or_default()
    }
}

/// Added lines of a unified diff together with their line number in the new
/// file. `+++`/`---` are file headers only before the first hunk; inside a
/// hunk they are an added `++…` or removed `--…` source line.
pub fn numbered_added_lines(patch: &str) -> Vec<(usize, &str)> {
    let mut added = Vec::new();
    let mut next_line = 1usize;
    let mut in_hunk = false;
    for line in patch.lines() {
        if let Some(caps) = HUNK_HEADER.captures(line) {
            next_line = caps[1].parse().unwrap_or(1);
            in_hunk = true;
            continue;
        }
        if line.starts_with('\\') {
            continue;
        }
        if !in_hunk && (line.starts_with("+++") || line.starts_with("---")) {
            continue;
        }
        if let Some(text) = line.strip_prefix('+') {
            added.push((next_line, text));
            next_line += 1;
        } else if !line.starts_with('-') {
            next_line += 1;
        }
    }
    added
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub sha: String,
    /// GitHub account of the author, absent for unlinked emails
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub commit: CommitDetail,
    #[serde(default)]
    pub stats: Option<CommitStats>,
}

impl Commit {
    pub fn login(&self) -> Option<&str> {
        self.author
            .as_ref()
            .map(|u| u.login.as_str())
            .or_else(|| self.commit.author.as_ref().map(|a| a.name.as_str()))
            .filter(|login| !login.is_empty())
    }

    pub fn date(&self) -> Option<&str> {
        self.commit.author.as_ref().and_then(|a| a.date.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub author: Option<GitAuthor>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CommitStats {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

/// The four event streams folded by the contributor analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContributorData {
    #[serde(default)]
    pub commits: Vec<Commit>,
    #[serde(default, alias = "pull_requests", alias = "pullRequests")]
    pub prs: Vec<PullRequest>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// A list payload, either bare or wrapped in an object under `key`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Feed<T> {
    List(Vec<T>),
    Issues { issues: Vec<T> },
    Prs {
        #[serde(alias = "pull_requests", alias = "pullRequests")]
        prs: Vec<T>,
    },
}

impl<T> Feed<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Feed::List(items) => items,
            Feed::Issues { issues } => issues,
            Feed::Prs { prs } => prs,
        }
    }
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| Error::json(path, e))
}

pub fn load_issues(path: &Path) -> Result<Vec<Issue>> {
    load_json::<Feed<Issue>>(path).map(Feed::into_vec)
}

pub fn load_pull_requests(path: &Path) -> Result<Vec<PullRequest>> {
    load_json::<Feed<PullRequest>>(path).map(Feed::into_vec)
}

/// Parse an RFC 3339 timestamp as GitHub emits them.
pub fn parse_timestamp(
    source: &str,
    value: &str,
) -> std::result::Result<DateTime<Utc>, ParseWarning> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ParseWarning::new(source, format!("invalid timestamp '{}': {}", value, e)))
}

/// Parse an optional timestamp, pushing a warning when it is malformed.
pub fn parse_optional_timestamp(
    source: &str,
    value: Option<&str>,
    warnings: &mut Vec<ParseWarning>,
) -> Option<DateTime<Utc>> {
    let value = value?;
    match parse_timestamp(source, value) {
        Ok(dt) => Some(dt),
        Err(warning) => {
            warnings.push(warning);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_issue_accepts_label_objects_and_strings() {
        let issue: Issue = serde_json::from_str(indoc! {r#"
            {"number": 1, "state": "open", "labels": [{"name": "bug", "color": "red"}, "ui"],
             "user": null, "created_at": "2024-01-01T00:00:00Z"}
        "#})
        .unwrap();

        let names: Vec<&str> = issue.labels.iter().map(Label::name).collect();
        assert_eq!(names, vec!["bug", "ui"]);
        assert!(issue.is_open());
        assert!(issue.user.is_none());
        assert!(!issue.is_pull_request());
    }

    #[test]
    fn test_added_lines_skip_headers_and_context() {
        let file = PullRequestFile {
            filename: "a.js".into(),
            patch: Some("--- a/a.js\n+++ b/a.js\n@@ -1,2 +1,3 @@\n context\n-removed\n+added();\n".into()),
            ..Default::default()
        };
        assert_eq!(file.added_lines(), vec![(2, "added();")]);
    }

    #[test]
    fn test_numbered_added_lines_follow_hunks() {
        let patch = indoc! {"
            @@ -10,3 +10,4 @@ fn main
             context
            -removed
            +added one
            +added two
            @@ -40,1 +41,2 @@
            +late
        "};
        let lines = numbered_added_lines(patch);
        assert_eq!(lines, vec![(11, "added one"), (12, "added two"), (41, "late")]);
    }

    #[test]
    fn test_increment_lines_inside_hunk_are_kept() {
        let patch = indoc! {"
            @@ -5,3 +5,4 @@
             let i = 0;
            +++i;
            ---j;
            +done();
        "};
        let lines = numbered_added_lines(patch);
        assert_eq!(lines, vec![(6, "++i;"), (7, "done();")]);
    }

    #[test]
    fn test_commit_login_falls_back_to_git_author_name() {
        let commit: Commit = serde_json::from_str(
            r#"{"sha": "abc", "author": null, "commit": {"author": {"name": "Dana", "date": "2024-02-01T10:00:00Z"}}}"#,
        )
        .unwrap();
        assert_eq!(commit.login(), Some("Dana"));
        assert_eq!(commit.date(), Some("2024-02-01T10:00:00Z"));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("issues", "2024-03-01T12:00:00Z").is_ok());
        let warning = parse_timestamp("issues", "yesterday").unwrap_err();
        assert!(warning.message.contains("yesterday"));
    }

    #[test]
    fn test_feed_accepts_wrapped_and_bare_lists() {
        let bare: Feed<PullRequest> = serde_json::from_str(r#"[{"number": 3}]"#).unwrap();
        let wrapped: Feed<PullRequest> =
            serde_json::from_str(r#"{"pull_requests": [{"number": 4}, {"number": 5}]}"#).unwrap();
        assert_eq!(bare.into_vec().len(), 1);
        assert_eq!(wrapped.into_vec().len(), 2);
    }
}

//! Dependency inventory across npm, pip, Go modules and Maven manifests.
//!
//! Only manifests at the repository root are read. Vulnerability and
//! freshness data come from pluggable [`VulnerabilitySource`] and
//! [`VersionRegistry`] implementations; the defaults are offline
//! heuristics.

use super::RepositoryAnalyzer;
use crate::core::{
    AnalysisData, AnalysisKind, AnalysisResult, ParseWarning, Priority, Recommendation,
    ResultBuilder, Severity,
};
use crate::errors::Result;
use crate::io::{ensure_repository, read_optional};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

static REQUIREMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)(\[[^\]]*\])?\s*(.*)$").unwrap());
static INSTALL_REQUIRES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"install_requires\s*=\s*\[([^\]]*)\]").unwrap());
static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());
static POM_DEPENDENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<dependency>(.*?)</dependency>").unwrap());
static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Npm,
    Pip,
    Go,
    Maven,
}

impl Ecosystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Pip => "pip",
            Ecosystem::Go => "go",
            Ecosystem::Maven => "maven",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    Runtime,
    Development,
    Peer,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Vulnerability {
    pub id: String,
    pub severity: Severity,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub ecosystem: Ecosystem,
    pub scope: DependencyScope,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub indirect: bool,
    pub vulnerabilities: Vec<Vulnerability>,
    pub outdated: bool,
    pub latest_version: Option<String>,
}

impl Dependency {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        ecosystem: Ecosystem,
        scope: DependencyScope,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ecosystem,
            scope,
            indirect: false,
            vulnerabilities: Vec::new(),
            outdated: false,
            latest_version: None,
        }
    }

    pub fn is_vulnerable(&self) -> bool {
        !self.vulnerabilities.is_empty()
    }
}

/// Supplies known vulnerabilities for a dependency.
pub trait VulnerabilitySource: Send + Sync {
    fn lookup(&self, name: &str, version: &str, ecosystem: Ecosystem) -> Vec<Vulnerability>;
}

/// Offline advisory table matched by package-name substring.
pub struct KnownAdvisories {
    advisories: Vec<(&'static str, Severity, &'static str)>,
}

impl Default for KnownAdvisories {
    fn default() -> Self {
        Self {
            advisories: vec![
                ("event-stream", Severity::Critical, "Malicious flatmap-stream payload published in 3.3.6"),
                ("flatmap-stream", Severity::Critical, "Package contained a credential-stealing payload"),
                ("node-serialize", Severity::Critical, "Remote code execution through unserialize()"),
                ("lodash", Severity::High, "Prototype pollution in versions before 4.17.21"),
                ("jackson-databind", Severity::Critical, "Polymorphic deserialization gadget chains"),
                ("log4j", Severity::Critical, "JNDI lookup remote code execution (Log4Shell)"),
                ("minimist", Severity::Medium, "Prototype pollution in argument parsing"),
                ("pyyaml", Severity::Medium, "Arbitrary code execution through yaml.load"),
            ],
        }
    }
}

impl VulnerabilitySource for KnownAdvisories {
    fn lookup(&self, name: &str, _version: &str, _ecosystem: Ecosystem) -> Vec<Vulnerability> {
        let name = name.to_ascii_lowercase();
        self.advisories
            .iter()
            .filter(|(needle, _, _)| name.contains(needle))
            .map(|(needle, severity, description)| Vulnerability {
                id: format!("ADVISORY-{}", needle.to_ascii_uppercase()),
                severity: *severity,
                description: description.to_string(),
            })
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionStatus {
    pub outdated: bool,
    pub latest_version: Option<String>,
}

/// Answers whether a declared version is behind the latest release.
pub trait VersionRegistry: Send + Sync {
    fn status(&self, name: &str, version: &str, ecosystem: Ecosystem) -> VersionStatus;
}

/// Flags any dependency pinned below major version 2.
#[derive(Default)]
pub struct MajorVersionHeuristic;

impl VersionRegistry for MajorVersionHeuristic {
    fn status(&self, _name: &str, version: &str, _ecosystem: Ecosystem) -> VersionStatus {
        VersionStatus {
            outdated: major_version(version).is_some_and(|major| major < 2),
            latest_version: None,
        }
    }
}

/// Major version of a requirement, `None` when it cannot be told.
pub fn major_version(spec: &str) -> Option<u64> {
    let spec = spec.trim();
    if spec.is_empty()
        || spec == "*"
        || spec.eq_ignore_ascii_case("latest")
        || spec.contains("://")
        || spec.starts_with("git")
        || spec.starts_with("file:")
        || spec.starts_with("${")
    {
        return None;
    }
    let trimmed = spec.trim_start_matches(['v', 'V']);
    if let Ok(req) = semver::VersionReq::parse(trimmed) {
        if let Some(comparator) = req.comparators.first() {
            return Some(comparator.major);
        }
        return None;
    }
    FIRST_NUMBER
        .find(spec)
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse one requirements.txt line; `None` for blanks, comments, options
/// and direct URLs.
pub fn parse_requirement(line: &str) -> Option<(String, String)> {
    let line = line.split('#').next().unwrap_or_default();
    let line = line.split(';').next().unwrap_or_default().trim();
    if line.is_empty() || line.starts_with('-') || line.contains("://") {
        return None;
    }
    let caps = REQUIREMENT.captures(line)?;
    let name = caps.get(1)?.as_str().to_string();
    let spec = caps.get(3).map_or("", |m| m.as_str()).trim();
    let version = if spec.is_empty() { "*" } else { spec };
    Some((name, version.to_string()))
}

pub fn parse_package_json(text: &str) -> std::result::Result<Vec<Dependency>, String> {
    let manifest: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let mut deps = Vec::new();
    for (section, scope) in [
        ("dependencies", DependencyScope::Runtime),
        ("devDependencies", DependencyScope::Development),
        ("peerDependencies", DependencyScope::Peer),
    ] {
        let Some(entries) = manifest.get(section).and_then(|s| s.as_object()) else {
            continue;
        };
        for (name, version) in entries {
            let version = version
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| version.to_string());
            deps.push(Dependency::new(name, version, Ecosystem::Npm, scope));
        }
    }
    Ok(deps)
}

pub fn parse_requirements_txt(text: &str) -> Vec<Dependency> {
    text.lines()
        .filter_map(parse_requirement)
        .map(|(name, version)| {
            Dependency::new(name, version, Ecosystem::Pip, DependencyScope::Runtime)
        })
        .collect()
}

pub fn parse_setup_py(text: &str) -> Vec<Dependency> {
    INSTALL_REQUIRES
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .flat_map(|list| {
            QUOTED
                .captures_iter(list.as_str())
                .filter_map(|c| c.get(1).and_then(|m| parse_requirement(m.as_str())))
                .collect::<Vec<_>>()
        })
        .map(|(name, version)| {
            Dependency::new(name, version, Ecosystem::Pip, DependencyScope::Runtime)
        })
        .collect()
}

pub fn parse_go_mod(text: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    let mut in_block = false;

    for raw in text.lines() {
        let line = raw.trim();
        let entry = if in_block {
            if line.starts_with(')') {
                in_block = false;
                continue;
            }
            line
        } else if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest.starts_with('(') {
                in_block = true;
                continue;
            }
            rest
        } else {
            continue;
        };

        let indirect = entry.contains("// indirect");
        let entry = entry.split("//").next().unwrap_or_default();
        let mut parts = entry.split_whitespace();
        if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
            let mut dep = Dependency::new(name, version, Ecosystem::Go, DependencyScope::Runtime);
            dep.indirect = indirect;
            deps.push(dep);
        }
    }
    deps
}

fn xml_tag<'a>(block: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = block.find(&open)? + open.len();
    let end = block[start..].find(&close)? + start;
    Some(block[start..end].trim())
}

/// Parse every `<dependency>` block. A block without coordinates is
/// reported and skipped; the rest are still returned.
pub fn parse_pom_xml(text: &str) -> (Vec<Dependency>, Vec<String>) {
    let mut deps = Vec::new();
    let mut problems = Vec::new();
    for (index, caps) in POM_DEPENDENCY.captures_iter(text).enumerate() {
        let block = caps.get(1).map_or("", |m| m.as_str());
        let group = xml_tag(block, "groupId");
        let artifact = xml_tag(block, "artifactId");
        let (Some(group), Some(artifact)) = (group, artifact) else {
            problems.push(format!(
                "<dependency> #{} without groupId or artifactId skipped",
                index + 1
            ));
            continue;
        };
        let scope = match xml_tag(block, "scope") {
            Some("test") => DependencyScope::Development,
            _ => DependencyScope::Runtime,
        };
        deps.push(Dependency::new(
            format!("{}:{}", group, artifact),
            xml_tag(block, "version").unwrap_or("*"),
            Ecosystem::Maven,
            scope,
        ));
    }
    (deps, problems)
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySummary {
    pub total: usize,
    pub by_ecosystem: BTreeMap<String, usize>,
    pub runtime: usize,
    pub development: usize,
    pub vulnerable: usize,
    pub outdated: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct DependencyReport {
    pub summary: DependencySummary,
    pub dependencies: Vec<Dependency>,
}

pub struct DependencyAnalyzer {
    vulnerabilities: Box<dyn VulnerabilitySource>,
    registry: Box<dyn VersionRegistry>,
}

impl DependencyAnalyzer {
    pub fn new() -> Self {
        Self {
            vulnerabilities: Box::new(KnownAdvisories::default()),
            registry: Box::new(MajorVersionHeuristic),
        }
    }

    pub fn with_vulnerability_source(mut self, source: impl VulnerabilitySource + 'static) -> Self {
        self.vulnerabilities = Box::new(source);
        self
    }

    pub fn with_version_registry(mut self, registry: impl VersionRegistry + 'static) -> Self {
        self.registry = Box::new(registry);
        self
    }

    /// Read every root manifest, skipping (with a warning) the ones that
    /// cannot be parsed.
    pub fn collect(&self, repo: &Path) -> (Vec<Dependency>, Vec<ParseWarning>) {
        let mut deps = Vec::new();
        let mut warnings = Vec::new();
        let read = |name: &str, warnings: &mut Vec<ParseWarning>| -> Option<String> {
            match read_optional(&repo.join(name), "dependencies") {
                Ok(text) => text,
                Err(warning) => {
                    warnings.push(warning);
                    None
                }
            }
        };

        if let Some(text) = read("package.json", &mut warnings) {
            match parse_package_json(&text) {
                Ok(found) => deps.extend(found),
                Err(message) => {
                    warnings.push(ParseWarning::at("npm", repo.join("package.json"), message))
                }
            }
        }

        let mut pip_names = HashSet::new();
        if let Some(text) = read("requirements.txt", &mut warnings) {
            for dep in parse_requirements_txt(&text) {
                pip_names.insert(dep.name.to_ascii_lowercase());
                deps.push(dep);
            }
        }
        if let Some(text) = read("setup.py", &mut warnings) {
            deps.extend(
                parse_setup_py(&text)
                    .into_iter()
                    .filter(|dep| !pip_names.contains(&dep.name.to_ascii_lowercase())),
            );
        }

        if let Some(text) = read("go.mod", &mut warnings) {
            deps.extend(parse_go_mod(&text));
        }

        if let Some(text) = read("pom.xml", &mut warnings) {
            let (found, problems) = parse_pom_xml(&text);
            deps.extend(found);
            let pom = repo.join("pom.xml");
            warnings.extend(
                problems
                    .into_iter()
                    .map(|message| ParseWarning::at("maven", &pom, message)),
            );
        }

        for dep in &mut deps {
            dep.vulnerabilities = self
                .vulnerabilities
                .lookup(&dep.name, &dep.version, dep.ecosystem);
            let status = self.registry.status(&dep.name, &dep.version, dep.ecosystem);
            dep.outdated = status.outdated;
            dep.latest_version = status.latest_version;
        }
        tracing::debug!("Collected {} dependencies from {}", deps.len(), repo.display());
        (deps, warnings)
    }

    pub fn analyze(&self, repo: &Path) -> Result<AnalysisResult> {
        let _span = tracing::debug_span!("analyzer", kind = "dependencies").entered();
        ensure_repository(repo)?;
        let (dependencies, warnings) = self.collect(repo);
        let summary = summarize(&dependencies);
        tracing::info!(
            "Dependencies: {} total, {} vulnerable, {} outdated",
            summary.total,
            summary.vulnerable,
            summary.outdated
        );

        let report = DependencyReport {
            summary,
            dependencies,
        };
        let ecosystems = report
            .summary
            .by_ecosystem
            .iter()
            .map(|(eco, n)| format!("{}: {}", eco, n))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(ResultBuilder::new(AnalysisData::Dependencies(report.clone()))
            .summary(format!(
                "Found {} dependencies{}: {} vulnerable, {} outdated",
                report.summary.total,
                if ecosystems.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", ecosystems)
                },
                report.summary.vulnerable,
                report.summary.outdated
            ))
            .insights(insights(&report))
            .recommendations(recommendations(&report))
            .warnings(warnings)
            .build())
    }
}

impl Default for DependencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryAnalyzer for DependencyAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Dependencies
    }

    fn analyze(&self, repo: &Path) -> Result<AnalysisResult> {
        DependencyAnalyzer::analyze(self, repo)
    }
}

fn summarize(deps: &[Dependency]) -> DependencySummary {
    let mut summary = DependencySummary {
        total: deps.len(),
        ..Default::default()
    };
    for dep in deps {
        *summary
            .by_ecosystem
            .entry(dep.ecosystem.to_string())
            .or_default() += 1;
        match dep.scope {
            DependencyScope::Development => summary.development += 1,
            DependencyScope::Runtime | DependencyScope::Peer => summary.runtime += 1,
        }
        summary.vulnerable += usize::from(dep.is_vulnerable());
        summary.outdated += usize::from(dep.outdated);
    }
    summary
}

fn insights(report: &DependencyReport) -> Vec<String> {
    let summary = &report.summary;
    if summary.total == 0 {
        return vec!["No dependency manifests found at the repository root".to_string()];
    }
    let mut insights = vec![format!(
        "{} runtime and {} development dependencies",
        summary.runtime, summary.development
    )];
    if summary.vulnerable > 0 {
        insights.push(format!(
            "{} dependencies have known vulnerabilities",
            summary.vulnerable
        ));
    }
    if summary.outdated > 0 {
        insights.push(format!(
            "{} dependencies may be outdated",
            summary.outdated
        ));
    }
    insights
}

fn recommendations(report: &DependencyReport) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    let vulnerable: Vec<&str> = report
        .dependencies
        .iter()
        .filter(|d| d.is_vulnerable())
        .map(|d| d.name.as_str())
        .collect();
    if !vulnerable.is_empty() {
        recs.push(Recommendation::new(
            "security",
            Priority::Critical,
            format!(
                "Update or replace vulnerable dependencies: {}",
                vulnerable.join(", ")
            ),
            if vulnerable.len() <= 3 { "2-4 hours" } else { "1-2 days" },
        ));
    }

    let outdated = report.summary.outdated;
    if outdated > 0 {
        let (priority, effort) = if outdated > 10 {
            (Priority::High, "1-2 days")
        } else {
            (Priority::Medium, "4-8 hours")
        };
        recs.push(Recommendation::new(
            "maintenance",
            priority,
            format!("Update {} outdated dependencies", outdated),
            effort,
        ));
    }

    if report.summary.total > 0 {
        recs.push(Recommendation::new(
            "security",
            Priority::Medium,
            "Add automated dependency vulnerability scanning to CI",
            "1-2 hours",
        ));
        recs.push(Recommendation::new(
            "maintenance",
            Priority::Low,
            "Enable an automated dependency update bot",
            "1 hour",
        ));
    }
    recs
}

pub fn analyze_dependencies(repo: &Path) -> Result<AnalysisResult> {
    DependencyAnalyzer::new().analyze(repo)
}

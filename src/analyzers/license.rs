//! License compliance: the project's own license against the licenses of
//! its installed npm dependencies.

use super::RepositoryAnalyzer;
use crate::core::{
    AnalysisData, AnalysisKind, AnalysisResult, ParseWarning, Priority, Recommendation,
    ResultBuilder, Severity,
};
use crate::errors::{Error, Result};
use crate::io::{dir_exists, ensure_repository, read_optional};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Risk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Risk::Low => "low",
            Risk::Medium => "medium",
            Risk::High => "high",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LicenseEntry {
    pub id: &'static str,
    pub compatible: bool,
    pub copyleft: bool,
    pub risk: Risk,
    pub description: &'static str,
}

/// Immutable table of recognized licenses.
#[derive(Clone, Debug)]
pub struct LicenseTable {
    entries: Vec<LicenseEntry>,
}

impl LicenseTable {
    pub fn new(entries: Vec<LicenseEntry>) -> Self {
        Self { entries }
    }

    pub fn builtin() -> Self {
        let permissive = |id, description| LicenseEntry {
            id,
            compatible: true,
            copyleft: false,
            risk: Risk::Low,
            description,
        };
        let weak = |id, description| LicenseEntry {
            id,
            compatible: true,
            copyleft: true,
            risk: Risk::Medium,
            description,
        };
        let strong = |id, description| LicenseEntry {
            id,
            compatible: false,
            copyleft: true,
            risk: Risk::High,
            description,
        };
        Self::new(vec![
            permissive("MIT", "Permissive; requires keeping the copyright notice"),
            permissive("Apache-2.0", "Permissive with an explicit patent grant"),
            permissive("BSD-2-Clause", "Permissive; requires keeping the copyright notice"),
            permissive("BSD-3-Clause", "Permissive; forbids endorsement using contributor names"),
            permissive("ISC", "Permissive; functionally equivalent to MIT"),
            weak("LGPL-2.1", "Weak copyleft; modifications to the library must be shared"),
            weak("LGPL-3.0", "Weak copyleft; modifications to the library must be shared"),
            weak("MPL-2.0", "File-level copyleft; modified files must stay MPL"),
            strong("GPL-2.0", "Strong copyleft; derivative works must be GPL-2.0"),
            strong("GPL-3.0", "Strong copyleft; derivative works must be GPL-3.0"),
            strong("AGPL-3.0", "Network copyleft; hosted derivatives must publish source"),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&LicenseEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Describe a single identifier, recognized or not.
    pub fn info(&self, raw: &str) -> LicenseInfo {
        match normalize_identifier(raw).and_then(|id| self.get(id)) {
            Some(entry) => LicenseInfo::from_entry(entry),
            None => LicenseInfo::unknown(raw),
        }
    }

    /// Describe a list of alternatives or an SPDX expression.
    pub fn info_for_all(&self, raws: &[String]) -> LicenseInfo {
        let parts: Vec<LicenseInfo> = raws
            .iter()
            .flat_map(|raw| split_expression(raw))
            .map(|id| self.info(&id))
            .collect();
        LicenseInfo::combine(parts)
    }
}

impl Default for LicenseTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Canonical table id for common spellings (`GPLv3`, `Apache License 2.0`,
/// `MIT License`, `GPL-2.0-or-later`).
pub fn normalize_identifier(raw: &str) -> Option<&'static str> {
    let upper = raw.trim().to_ascii_uppercase();
    let stripped = upper
        .replace("-OR-LATER", "")
        .replace("-ONLY", "")
        .replace('+', "")
        .replace("LICENSE", "")
        .replace("LICENCE", "")
        .replace("VERSION", "")
        .replace("GNU", "");
    let key: String = stripped.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let id = match key.as_str() {
        "MIT" | "EXPAT" => "MIT",
        "APACHE" | "APACHE2" | "APACHE20" | "ASL20" => "Apache-2.0",
        "BSD2" | "BSD2CLAUSE" | "SIMPLIFIEDBSD" | "FREEBSD" => "BSD-2-Clause",
        "BSD" | "BSD3" | "BSD3CLAUSE" | "NEWBSD" | "MODIFIEDBSD" => "BSD-3-Clause",
        "ISC" => "ISC",
        "GPL2" | "GPL20" | "GPLV2" | "GPLV20" => "GPL-2.0",
        "GPL" | "GPL3" | "GPL30" | "GPLV3" | "GPLV30" => "GPL-3.0",
        "AGPL" | "AGPL3" | "AGPL30" | "AGPLV3" => "AGPL-3.0",
        "LGPL2" | "LGPL21" | "LGPLV21" => "LGPL-2.1",
        "LGPL" | "LGPL3" | "LGPL30" | "LGPLV3" => "LGPL-3.0",
        "MPL" | "MPL2" | "MPL20" => "MPL-2.0",
        _ => return None,
    };
    Some(id)
}

/// Split `(MIT OR Apache-2.0)` / `MIT AND BSD-3-Clause` into identifiers.
pub fn split_expression(raw: &str) -> Vec<String> {
    raw.replace(['(', ')'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .split(" OR ")
        .flat_map(|part| part.split(" AND "))
        .flat_map(|part| part.split(" or "))
        .flat_map(|part| part.split(" and "))
        .flat_map(|part| part.split('/'))
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInfo {
    #[serde(rename = "type")]
    pub license_type: String,
    pub compatible: bool,
    pub gpl_or_copyleft: bool,
    pub risk: Risk,
    pub description: String,
    pub recognized: bool,
}

impl LicenseInfo {
    pub fn from_entry(entry: &LicenseEntry) -> Self {
        Self {
            license_type: entry.id.to_string(),
            compatible: entry.compatible,
            gpl_or_copyleft: entry.copyleft,
            risk: entry.risk,
            description: entry.description.to_string(),
            recognized: true,
        }
    }

    pub fn unknown(raw: &str) -> Self {
        let raw = raw.trim();
        Self {
            license_type: if raw.is_empty() { "Unknown".to_string() } else { raw.to_string() },
            compatible: false,
            gpl_or_copyleft: false,
            risk: Risk::Medium,
            description: "Unrecognized license; verify its terms manually".to_string(),
            recognized: false,
        }
    }

    pub fn none() -> Self {
        Self {
            license_type: "None".to_string(),
            compatible: false,
            gpl_or_copyleft: false,
            risk: Risk::High,
            description: "No license file; all rights reserved by default".to_string(),
            recognized: false,
        }
    }

    /// Copyleft if any part is, riskiest part wins, compatible only if all are.
    pub fn combine(parts: Vec<LicenseInfo>) -> Self {
        match parts.len() {
            0 => Self::unknown(""),
            1 => parts.into_iter().next().unwrap_or_else(|| Self::unknown("")),
            _ => Self {
                license_type: parts
                    .iter()
                    .map(|p| p.license_type.as_str())
                    .collect::<Vec<_>>()
                    .join(" OR "),
                compatible: parts.iter().all(|p| p.compatible),
                gpl_or_copyleft: parts.iter().any(|p| p.gpl_or_copyleft),
                risk: parts.iter().map(|p| p.risk).max().unwrap_or(Risk::Medium),
                description: parts
                    .iter()
                    .map(|p| p.description.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
                recognized: parts.iter().all(|p| p.recognized),
            },
        }
    }

    pub fn is_none(&self) -> bool {
        self.license_type == "None" && !self.recognized
    }

    pub fn is_unknown(&self) -> bool {
        !self.recognized && !self.is_none()
    }

    pub fn is_permissive(&self) -> bool {
        self.recognized && self.compatible && !self.gpl_or_copyleft
    }
}

/// Non-blank lines inspected for a license title.
const HEADING_LINES: usize = 3;

static HEADING_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"VERSION (\d+(?:\.\d+)?)").unwrap());

/// Identify a license from the text of a LICENSE file.
///
/// Full license texts name other licenses in their bodies (GPL-2 points at
/// the Library GPL, MPL-2.0 lists the GNU licenses as secondary), so the
/// copyleft families are only recognised from the title lines.
pub fn detect_license_text(text: &str) -> Option<&'static str> {
    let heading = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(HEADING_LINES)
        .collect::<Vec<_>>()
        .join("\n")
        .to_ascii_uppercase();

    detect_from_heading(&heading).or_else(|| detect_from_body(&text.to_ascii_uppercase()))
}

fn detect_from_heading(heading: &str) -> Option<&'static str> {
    let has = |needle: &str| heading.contains(needle);
    let version = HEADING_VERSION
        .captures(heading)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());

    let id = if has("MOZILLA PUBLIC LICENSE") {
        "MPL-2.0"
    } else if has("GNU AFFERO GENERAL PUBLIC LICENSE") {
        "AGPL-3.0"
    } else if has("GNU LESSER GENERAL PUBLIC LICENSE")
        || has("GNU LIBRARY GENERAL PUBLIC LICENSE")
    {
        match version {
            Some("3") => "LGPL-3.0",
            _ => "LGPL-2.1",
        }
    } else if has("GNU GENERAL PUBLIC LICENSE") {
        match version {
            Some("2") => "GPL-2.0",
            _ => "GPL-3.0",
        }
    } else if has("APACHE LICENSE") {
        "Apache-2.0"
    } else {
        return None;
    };
    Some(id)
}

/// Permissive licenses carry no title; a GPL notice without the full text
/// is the last resort.
fn detect_from_body(upper: &str) -> Option<&'static str> {
    let has = |needle: &str| upper.contains(needle);

    let id = if has("MIT LICENSE") || has("PERMISSION IS HEREBY GRANTED, FREE OF CHARGE") {
        "MIT"
    } else if has("REDISTRIBUTION AND USE IN SOURCE AND BINARY FORMS") {
        if has("NEITHER THE NAME") {
            "BSD-3-Clause"
        } else {
            "BSD-2-Clause"
        }
    } else if has("PERMISSION TO USE, COPY, MODIFY, AND/OR DISTRIBUTE") {
        "ISC"
    } else if has("GNU AFFERO GENERAL PUBLIC LICENSE") {
        "AGPL-3.0"
    } else if has("GNU LESSER GENERAL PUBLIC LICENSE") {
        "LGPL-3.0"
    } else if has("GNU GENERAL PUBLIC LICENSE") {
        if has("VERSION 2") && !has("VERSION 3") {
            "GPL-2.0"
        } else {
            "GPL-3.0"
        }
    } else {
        return None;
    };
    Some(id)
}

/// Licenses declared by a package manifest, in any of the forms npm has
/// accepted over time. Empty when none is declared.
pub fn declared_licenses(manifest: &Value) -> Vec<String> {
    fn from_value(value: &Value) -> Vec<String> {
        match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items.iter().flat_map(from_value).collect(),
            Value::Object(map) => map
                .get("type")
                .and_then(Value::as_str)
                .map(|s| vec![s.to_string()])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    let declared = manifest.get("license").map(from_value).unwrap_or_default();
    if !declared.is_empty() {
        return declared;
    }
    manifest.get("licenses").map(from_value).unwrap_or_default()
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DependencyLicense {
    pub name: String,
    pub version: Option<String>,
    pub license: LicenseInfo,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IncompatibleLicense {
    pub dependency: String,
    pub dependency_license: String,
    pub project_license: String,
    pub severity: Severity,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceStatus {
    Compliant,
    NeedsReview,
    NonCompliant,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub status: ComplianceStatus,
    pub risk_level: Risk,
    pub copyleft_count: usize,
    pub unknown_count: usize,
    pub license_histogram: BTreeMap<String, usize>,
    pub action_items: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseReport {
    pub project_license: LicenseInfo,
    pub license_file: Option<String>,
    pub dependencies: Vec<DependencyLicense>,
    pub incompatibilities: Vec<IncompatibleLicense>,
    pub compliance: ComplianceReport,
}

pub struct LicenseAnalyzer {
    table: LicenseTable,
}

impl LicenseAnalyzer {
    pub fn new(table: LicenseTable) -> Self {
        Self { table }
    }

    /// The project license and the file it was read from.
    pub fn project_license(
        &self,
        repo: &Path,
        warnings: &mut Vec<ParseWarning>,
    ) -> Result<(LicenseInfo, Option<String>)> {
        let mut candidates: Vec<String> = std::fs::read_dir(repo)
            .map_err(|e| Error::io(repo, e))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| {
                let upper = name.to_ascii_uppercase();
                upper.starts_with("LICENSE")
                    || upper.starts_with("LICENCE")
                    || upper.starts_with("COPYING")
            })
            .collect();
        candidates.sort();

        let Some(name) = candidates.into_iter().next() else {
            return Ok((LicenseInfo::none(), None));
        };
        let info = match read_optional(&repo.join(&name), "licenses") {
            Ok(Some(text)) => match detect_license_text(&text).and_then(|id| self.table.get(id)) {
                Some(entry) => LicenseInfo::from_entry(entry),
                None => LicenseInfo::unknown("Unknown"),
            },
            Ok(None) => LicenseInfo::none(),
            Err(warning) => {
                warnings.push(warning);
                LicenseInfo::unknown("Unknown")
            }
        };
        Ok((info, Some(name)))
    }

    /// Licenses of every dependency listed in the root package.json, read
    /// from the installed manifests under node_modules.
    pub fn dependency_licenses(
        &self,
        repo: &Path,
        warnings: &mut Vec<ParseWarning>,
    ) -> Vec<DependencyLicense> {
        let manifest_path = repo.join("package.json");
        let manifest = match read_optional(&manifest_path, "licenses") {
            Ok(Some(text)) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => value,
                Err(e) => {
                    warnings.push(ParseWarning::at("licenses", &manifest_path, e.to_string()));
                    return Vec::new();
                }
            },
            Ok(None) => return Vec::new(),
            Err(warning) => {
                warnings.push(warning);
                return Vec::new();
            }
        };

        let names: Vec<String> = ["dependencies", "devDependencies"]
            .iter()
            .filter_map(|section| manifest.get(*section).and_then(Value::as_object))
            .flat_map(|deps| deps.keys().cloned())
            .collect();
        if names.is_empty() {
            return Vec::new();
        }

        let modules = repo.join("node_modules");
        if !dir_exists(&modules) {
            warnings.push(ParseWarning::at(
                "licenses",
                &modules,
                "node_modules not found; install dependencies to check their licenses",
            ));
            return Vec::new();
        }

        names
            .into_iter()
            .map(|name| {
                let path = modules.join(&name).join("package.json");
                let installed = match read_optional(&path, "licenses") {
                    Ok(Some(text)) => serde_json::from_str::<Value>(&text)
                        .map_err(|e| ParseWarning::at("licenses", &path, e.to_string())),
                    Ok(None) => {
                        Err(ParseWarning::at("licenses", &path, "package manifest not found"))
                    }
                    Err(warning) => Err(warning),
                };
                match installed {
                    Ok(package) => {
                        let declared = declared_licenses(&package);
                        DependencyLicense {
                            version: package
                                .get("version")
                                .and_then(Value::as_str)
                                .map(String::from),
                            license: if declared.is_empty() {
                                LicenseInfo::unknown("Unknown")
                            } else {
                                self.table.info_for_all(&declared)
                            },
                            name,
                        }
                    }
                    Err(warning) => {
                        warnings.push(warning);
                        DependencyLicense {
                            name,
                            version: None,
                            license: LicenseInfo::unknown("Unknown"),
                        }
                    }
                }
            })
            .collect()
    }

    pub fn analyze(&self, repo: &Path) -> Result<AnalysisResult> {
        let _span = tracing::debug_span!("analyzer", kind = "licenses").entered();
        ensure_repository(repo)?;
        let mut warnings = Vec::new();
        let (project_license, license_file) = self.project_license(repo, &mut warnings)?;
        let dependencies = self.dependency_licenses(repo, &mut warnings);
        let incompatibilities = find_incompatibilities(&project_license, &dependencies);
        let compliance = compliance(&project_license, &dependencies, &incompatibilities);
        tracing::info!(
            "Licenses: project {}, {} dependencies, {} incompatible",
            project_license.license_type,
            dependencies.len(),
            incompatibilities.len()
        );

        let report = LicenseReport {
            project_license,
            license_file,
            dependencies,
            incompatibilities,
            compliance,
        };
        Ok(ResultBuilder::new(AnalysisData::Licenses(report.clone()))
            .summary(format!(
                "Project license {} with {} dependencies: {} incompatible, {} copyleft",
                report.project_license.license_type,
                report.dependencies.len(),
                report.incompatibilities.len(),
                report.compliance.copyleft_count
            ))
            .insights(insights(&report))
            .recommendations(recommendations(&report))
            .warnings(warnings)
            .build())
    }
}

impl Default for LicenseAnalyzer {
    fn default() -> Self {
        Self::new(LicenseTable::builtin())
    }
}

impl RepositoryAnalyzer for LicenseAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Licenses
    }

    fn analyze(&self, repo: &Path) -> Result<AnalysisResult> {
        LicenseAnalyzer::analyze(self, repo)
    }
}

pub fn find_incompatibilities(
    project: &LicenseInfo,
    deps: &[DependencyLicense],
) -> Vec<IncompatibleLicense> {
    if !project.is_permissive() {
        return Vec::new();
    }
    deps.iter()
        .filter(|dep| dep.license.gpl_or_copyleft)
        .map(|dep| IncompatibleLicense {
            dependency: dep.name.clone(),
            dependency_license: dep.license.license_type.clone(),
            project_license: project.license_type.clone(),
            severity: Severity::High,
            reason: format!(
                "Copyleft {} terms conflict with distributing under {}",
                dep.license.license_type, project.license_type
            ),
        })
        .collect()
}

pub fn compliance(
    project: &LicenseInfo,
    deps: &[DependencyLicense],
    incompatibilities: &[IncompatibleLicense],
) -> ComplianceReport {
    let copyleft_count = deps.iter().filter(|d| d.license.gpl_or_copyleft).count();
    let unknown: Vec<&str> = deps
        .iter()
        .filter(|d| d.license.is_unknown())
        .map(|d| d.name.as_str())
        .collect();

    let status = if !incompatibilities.is_empty() {
        ComplianceStatus::NonCompliant
    } else if project.is_none() || project.is_unknown() {
        ComplianceStatus::NeedsReview
    } else {
        ComplianceStatus::Compliant
    };
    let risk_level = if !incompatibilities.is_empty() || project.is_none() {
        Risk::High
    } else if copyleft_count > 0 || !unknown.is_empty() || project.is_unknown() {
        Risk::Medium
    } else {
        Risk::Low
    };

    let mut license_histogram = BTreeMap::new();
    for dep in deps {
        *license_histogram
            .entry(dep.license.license_type.clone())
            .or_insert(0) += 1;
    }

    let mut action_items = Vec::new();
    if project.is_none() {
        action_items.push("Add a LICENSE file to the repository root".to_string());
    }
    for incompatible in incompatibilities {
        action_items.push(format!(
            "Replace {} ({}) or relicense the project",
            incompatible.dependency, incompatible.dependency_license
        ));
    }
    if !unknown.is_empty() {
        action_items.push(format!("Verify the licenses of: {}", unknown.join(", ")));
    }
    if copyleft_count > 0 && incompatibilities.is_empty() {
        action_items.push(format!(
            "Honour the obligations of {} copyleft dependencies",
            copyleft_count
        ));
    }

    ComplianceReport {
        status,
        risk_level,
        copyleft_count,
        unknown_count: unknown.len(),
        license_histogram,
        action_items,
    }
}

fn insights(report: &LicenseReport) -> Vec<String> {
    let mut insights = Vec::new();
    match &report.license_file {
        Some(file) => insights.push(format!(
            "Project is licensed under {} ({})",
            report.project_license.license_type, file
        )),
        None => insights.push("No LICENSE file found".to_string()),
    }
    if let Some((license, count)) = report
        .compliance
        .license_histogram
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
    {
        insights.push(format!("Most common dependency license: {} ({})", license, count));
    }
    insights.push(format!(
        "Compliance risk is {}",
        report.compliance.risk_level
    ));
    insights
}

fn recommendations(report: &LicenseReport) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if report.project_license.is_none() {
        recs.push(Recommendation::new(
            "legal",
            Priority::High,
            "Add a LICENSE file so others know how the code may be used",
            "30 minutes",
        ));
    }
    if !report.incompatibilities.is_empty() {
        let names: Vec<&str> = report
            .incompatibilities
            .iter()
            .map(|i| i.dependency.as_str())
            .collect();
        recs.push(Recommendation::new(
            "legal",
            Priority::Critical,
            format!(
                "Replace dependencies incompatible with {}: {}",
                report.project_license.license_type,
                names.join(", ")
            ),
            "1-2 days",
        ));
    }
    if report.compliance.unknown_count > 0 {
        recs.push(Recommendation::new(
            "legal",
            Priority::Medium,
            format!(
                "Verify the licenses of {} dependencies with unknown terms",
                report.compliance.unknown_count
            ),
            "1-2 hours",
        ));
    }
    if report.compliance.copyleft_count > 0 && !report.project_license.is_permissive() {
        recs.push(
            Recommendation::new(
                "legal",
                Priority::Low,
                format!(
                    "Document how the {} copyleft dependencies' obligations are met",
                    report.compliance.copyleft_count
                ),
                "1 hour",
            )
            .informational(),
        );
    }
    recs
}

pub fn analyze_licenses(repo: &Path) -> Result<AnalysisResult> {
    LicenseAnalyzer::default().analyze(repo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::fs;
    use tempfile::TempDir;

    const MIT_TEXT: &str = "MIT License\n\nPermission is hereby granted, free of charge, to any person";

    fn create_test_project(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = temp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        temp
    }

    fn report(result: &AnalysisResult) -> &LicenseReport {
        match &result.data {
            AnalysisData::Licenses(report) => report,
            other => panic!("unexpected data {:?}", other.kind()),
        }
    }

    #[test]
    fn test_normalize_common_spellings() {
        assert_eq!(normalize_identifier("GPLv3"), Some("GPL-3.0"));
        assert_eq!(normalize_identifier("GPL-2.0-or-later"), Some("GPL-2.0"));
        assert_eq!(normalize_identifier("Apache License 2.0"), Some("Apache-2.0"));
        assert_eq!(normalize_identifier("apache 2.0"), Some("Apache-2.0"));
        assert_eq!(normalize_identifier("BSD"), Some("BSD-3-Clause"));
        assert_eq!(normalize_identifier("LGPL-2.1-only"), Some("LGPL-2.1"));
        assert_eq!(normalize_identifier("WTFPL"), None);
    }

    #[test]
    fn test_spdx_expression_combines_parts() {
        let table = LicenseTable::builtin();
        let info = table.info_for_all(&["(MIT OR GPL-3.0)".to_string()]);
        assert!(info.gpl_or_copyleft);
        assert!(!info.compatible);
        assert_eq!(info.risk, Risk::High);
        assert_eq!(info.license_type, "MIT OR GPL-3.0");
    }

    #[test]
    fn test_declared_license_forms() {
        let forms = [
            (r#"{"license": "MIT"}"#, vec!["MIT"]),
            (r#"{"license": ["MIT", "GPL-3.0"]}"#, vec!["MIT", "GPL-3.0"]),
            (r#"{"license": {"type": "ISC"}}"#, vec!["ISC"]),
            (r#"{"licenses": [{"type": "BSD"}]}"#, vec!["BSD"]),
            (r#"{"name": "x"}"#, vec![]),
        ];
        for (json, expected) in forms {
            let value: Value = serde_json::from_str(json).unwrap();
            assert_eq!(declared_licenses(&value), expected, "{json}");
        }
    }

    #[test]
    fn test_detect_license_text() {
        assert_eq!(detect_license_text(MIT_TEXT), Some("MIT"));
        assert_eq!(
            detect_license_text("GNU GENERAL PUBLIC LICENSE\nVersion 2, June 1991"),
            Some("GPL-2.0")
        );
        assert_eq!(
            detect_license_text("Redistribution and use in source and binary forms... Neither the name"),
            Some("BSD-3-Clause")
        );
        assert_eq!(detect_license_text("All rights reserved."), None);
    }

    #[test]
    fn test_license_title_wins_over_body_references() {
        let gpl2 = indoc! {"
                GNU GENERAL PUBLIC LICENSE
                   Version 2, June 1991

            Our General Public Licenses are designed to make sure that you have
            the freedom to distribute copies. The GNU Library General Public
            License applies to some other Free Software Foundation software.
        "};
        assert_eq!(detect_license_text(gpl2), Some("GPL-2.0"));

        let mpl = indoc! {"
            Mozilla Public License Version 2.0
            ==================================

            1.12. \"Secondary License\" means either the GNU General Public License,
            Version 2.0, the GNU Lesser General Public License, Version 2.1, the GNU
            Affero General Public License, Version 3.0, or any later versions.
        "};
        assert_eq!(detect_license_text(mpl), Some("MPL-2.0"));

        let agpl = "GNU AFFERO GENERAL PUBLIC LICENSE\nVersion 3, 19 November 2007";
        assert_eq!(detect_license_text(agpl), Some("AGPL-3.0"));
    }

    #[test]
    fn test_gpl_notice_without_title_falls_back_to_body() {
        let notice = indoc! {"
            Copyright (C) 2024 Example Authors

            This program is free software: you can redistribute it under the terms
            of the GNU General Public License as published by the Free Software
            Foundation, either version 3 of the License, or any later version.
        "};
        assert_eq!(detect_license_text(notice), Some("GPL-3.0"));
    }

    #[test]
    fn test_missing_license_needs_review() {
        let temp = create_test_project(&[("README.md", "hi")]);
        let result = analyze_licenses(temp.path()).unwrap();
        let report = report(&result);

        assert_eq!(report.project_license.license_type, "None");
        assert_eq!(report.project_license.risk, Risk::High);
        assert_eq!(report.compliance.status, ComplianceStatus::NeedsReview);
        assert_eq!(report.compliance.risk_level, Risk::High);
        assert_eq!(result.recommendations[0].category, "legal");
    }

    #[test]
    fn test_copyleft_dependency_under_mit_is_incompatible() {
        let temp = create_test_project(&[
            ("LICENSE", MIT_TEXT),
            (
                "package.json",
                r#"{"dependencies": {"left": "1", "@scope/gpl-lib": "2"}, "devDependencies": {"ghost": "1"}}"#,
            ),
            ("node_modules/left/package.json", r#"{"version": "1.0.0", "license": "MIT"}"#),
            ("node_modules/@scope/gpl-lib/package.json", r#"{"license": "GPL-3.0-only"}"#),
        ]);
        let result = analyze_licenses(temp.path()).unwrap();
        let report = report(&result);

        assert_eq!(report.incompatibilities.len(), 1);
        assert_eq!(report.incompatibilities[0].dependency, "@scope/gpl-lib");
        assert_eq!(report.compliance.status, ComplianceStatus::NonCompliant);
        assert_eq!(report.compliance.unknown_count, 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.recommendations[0].priority, Priority::Critical);
    }

    #[test]
    fn test_missing_node_modules_is_one_warning() {
        let temp = create_test_project(&[
            ("LICENSE", MIT_TEXT),
            ("package.json", r#"{"dependencies": {"a": "1", "b": "1"}}"#),
        ]);
        let result = analyze_licenses(temp.path()).unwrap();

        assert!(report(&result).dependencies.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(report(&result).compliance.status, ComplianceStatus::Compliant);
    }
}

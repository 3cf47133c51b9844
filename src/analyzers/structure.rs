//! Repository layout: languages, frameworks, tooling, organization and
//! documentation.

use super::{relative_display, scan_repository, RepositoryAnalyzer, Scan};
use crate::config::WalkerConfig;
use crate::core::{
    percentage, AnalysisData, AnalysisKind, AnalysisResult, Language, ParseWarning, Priority,
    Recommendation, ResultBuilder,
};
use crate::errors::Result;
use crate::io::{file_exists, read_optional, read_source};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// package.json dependency key -> framework name
const NPM_FRAMEWORKS: &[(&str, &str)] = &[
    ("react", "React"),
    ("next", "Next.js"),
    ("vue", "Vue"),
    ("nuxt", "Nuxt"),
    ("@angular/core", "Angular"),
    ("angular", "AngularJS"),
    ("svelte", "Svelte"),
    ("express", "Express"),
    ("@nestjs/core", "NestJS"),
    ("electron", "Electron"),
    ("gatsby", "Gatsby"),
    ("jquery", "jQuery"),
];

const PYTHON_FRAMEWORKS: &[(&str, &str)] = &[
    ("django", "Django"),
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("pyramid", "Pyramid"),
    ("tornado", "Tornado"),
];

const BUILD_TOOLS: &[(&str, &str)] = &[
    ("webpack.config.js", "Webpack"),
    ("vite.config.js", "Vite"),
    ("vite.config.ts", "Vite"),
    ("rollup.config.js", "Rollup"),
    ("gulpfile.js", "Gulp"),
    ("Gruntfile.js", "Grunt"),
    ("tsconfig.json", "TypeScript Compiler"),
    ("Makefile", "Make"),
    ("CMakeLists.txt", "CMake"),
    ("pom.xml", "Maven"),
    ("build.gradle", "Gradle"),
    ("build.gradle.kts", "Gradle"),
    ("Cargo.toml", "Cargo"),
    ("setup.py", "setuptools"),
];

const LOCK_FILES: &[(&str, &str)] = &[
    ("package-lock.json", "npm"),
    ("yarn.lock", "Yarn"),
    ("pnpm-lock.yaml", "pnpm"),
];

const PACKAGE_MANAGERS: &[(&str, &str)] = &[
    ("requirements.txt", "pip"),
    ("Pipfile", "Pipenv"),
    ("poetry.lock", "Poetry"),
    ("go.mod", "Go Modules"),
    ("Gemfile", "Bundler"),
    ("composer.json", "Composer"),
    ("Cargo.toml", "Cargo"),
];

const CI_MARKERS: &[(&str, &str)] = &[
    (".github/workflows", "GitHub Actions"),
    (".gitlab-ci.yml", "GitLab CI"),
    (".circleci", "CircleCI"),
    ("Jenkinsfile", "Jenkins"),
    (".travis.yml", "Travis CI"),
    ("azure-pipelines.yml", "Azure Pipelines"),
];

const TEST_SEGMENTS: &[&str] = &["test", "tests", "__tests__", "spec", "specs"];
const EXAMPLE_DIRS: &[&str] = &["example", "examples", "demo", "demos", "sample", "samples"];

#[derive(Clone, Debug)]
pub struct StructureConfig {
    pub repo_path: PathBuf,
    pub walker: WalkerConfig,
}

impl StructureConfig {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            walker: WalkerConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LanguageStat {
    pub language: String,
    pub files: usize,
    pub lines: usize,
    pub percentage: f64,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub has_tests: bool,
    pub has_docs: bool,
    pub has_source_dir: bool,
    pub has_config: bool,
    pub has_assets: bool,
    pub total_files: usize,
    pub total_directories: usize,
    pub max_depth: usize,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Documentation {
    pub readme: bool,
    pub api_docs: bool,
    pub contributing: bool,
    pub architecture: bool,
    pub setup_instructions: bool,
    pub examples: bool,
    pub score: u32,
}

impl Documentation {
    fn scored(mut self) -> Self {
        self.score = [
            (self.readme, 20),
            (self.api_docs, 20),
            (self.contributing, 15),
            (self.architecture, 15),
            (self.setup_instructions, 15),
            (self.examples, 15),
        ]
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, weight)| weight)
        .sum();
        self
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureReport {
    pub languages: Vec<LanguageStat>,
    pub primary_language: Option<String>,
    pub frameworks: Vec<String>,
    pub build_tools: Vec<String>,
    pub package_managers: Vec<String>,
    pub ci_systems: Vec<String>,
    pub organization: Organization,
    pub documentation: Documentation,
    pub code_files: usize,
    pub test_files: usize,
    /// Test files per code file, as a percentage
    pub test_coverage: f64,
}

pub fn is_test_path(relative: &str) -> bool {
    let lower = relative.to_ascii_lowercase();
    let mut segments: Vec<&str> = lower.split('/').collect();
    let file_name = segments.pop().unwrap_or_default();
    segments.iter().any(|s| TEST_SEGMENTS.contains(s))
        || file_name.contains(".test.")
        || file_name.contains(".spec.")
        || file_name.contains("_test.")
        || file_name.starts_with("test_")
}

/// Walker settings apply when the analyzer runs through
/// [`RepositoryAnalyzer`]; [`StructureAnalyzer::analyze`] uses the config's.
#[derive(Default)]
pub struct StructureAnalyzer {
    walker: WalkerConfig,
}

impl StructureAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_walker_config(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    pub fn analyze(&self, config: &StructureConfig) -> Result<AnalysisResult> {
        let _span = tracing::debug_span!("analyzer", kind = "structure").entered();
        let repo = config.repo_path.as_path();
        let scan = scan_repository(repo, &config.walker, true)?;
        let mut warnings = scan.warnings.clone();

        let (languages, code_files, test_files) = language_histogram(repo, &scan, &mut warnings);
        let organization = organization(repo, &scan);
        let documentation = documentation(repo, &scan, &mut warnings);
        let (package_managers, lock_file_missing) = package_managers(repo);

        let report = StructureReport {
            primary_language: languages.first().map(|l| l.language.clone()),
            languages,
            frameworks: frameworks(repo, &mut warnings),
            build_tools: present(repo, BUILD_TOOLS),
            package_managers,
            ci_systems: CI_MARKERS
                .iter()
                .filter(|(marker, _)| repo.join(marker).exists())
                .map(|(_, name)| name.to_string())
                .collect(),
            organization,
            documentation,
            code_files,
            test_files,
            test_coverage: percentage(test_files, code_files),
        };
        tracing::info!(
            "Structure: {} files, {} languages, documentation score {}",
            report.organization.total_files,
            report.languages.len(),
            report.documentation.score
        );

        Ok(ResultBuilder::new(AnalysisData::Structure(report.clone()))
            .summary(format!(
                "{} project with {} files in {} directories; documentation score {}/100",
                report.primary_language.as_deref().unwrap_or("Unknown"),
                report.organization.total_files,
                report.organization.total_directories,
                report.documentation.score
            ))
            .insights(insights(&report))
            .recommendations(recommendations(&report, lock_file_missing))
            .warnings(warnings)
            .build())
    }
}

impl RepositoryAnalyzer for StructureAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Structure
    }

    fn analyze(&self, repo: &Path) -> Result<AnalysisResult> {
        let config = StructureConfig {
            repo_path: repo.to_path_buf(),
            walker: self.walker.clone(),
        };
        StructureAnalyzer::analyze(self, &config)
    }
}

/// Languages ordered by line count, plus the number of code and test files.
fn language_histogram(
    repo: &Path,
    scan: &Scan,
    warnings: &mut Vec<ParseWarning>,
) -> (Vec<LanguageStat>, usize, usize) {
    let mut histogram: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    let mut code_files = 0;
    let mut test_files = 0;

    for path in scan.files() {
        let language = Language::from_path(path);
        if language == Language::Unknown {
            continue;
        }
        let lines = match read_source(path, "structure") {
            Ok(content) => content.lines().count(),
            Err(warning) => {
                warnings.push(warning);
                continue;
            }
        };
        let entry = histogram.entry(language.to_string()).or_default();
        entry.0 += 1;
        entry.1 += lines;

        if language.is_code() {
            code_files += 1;
            if is_test_path(&relative_display(repo, path)) {
                test_files += 1;
            }
        }
    }

    let total_lines: usize = histogram.values().map(|(_, lines)| lines).sum();
    let mut languages: Vec<LanguageStat> = histogram
        .into_iter()
        .map(|(language, (files, lines))| LanguageStat {
            language,
            files,
            lines,
            percentage: percentage(lines, total_lines),
        })
        .collect();
    languages.sort_by(|a, b| b.lines.cmp(&a.lines).then_with(|| a.language.cmp(&b.language)));
    (languages, code_files, test_files)
}

fn organization(repo: &Path, scan: &Scan) -> Organization {
    let mut org = Organization::default();
    for path in &scan.paths {
        let relative = relative_display(repo, path);
        if !path.is_dir() {
            org.total_files += 1;
            continue;
        }
        org.total_directories += 1;
        org.max_depth = org.max_depth.max(relative.split('/').count());

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        org.has_tests |= contains_any(&name, &["test", "spec"]);
        org.has_docs |= contains_any(&name, &["doc"]);
        org.has_source_dir |= contains_any(&name, &["src", "lib"]);
        org.has_config |= contains_any(&name, &["config", "conf"]);
        org.has_assets |= contains_any(&name, &["asset", "static", "public", "image"]);
    }
    org
}

fn contains_any(name: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| name.contains(needle))
}

fn is_doc_file(name: &str) -> bool {
    matches!(
        Path::new(name).extension().and_then(|e| e.to_str()),
        None | Some("md") | Some("txt") | Some("rst") | Some("adoc")
    )
}

fn documentation(repo: &Path, scan: &Scan, warnings: &mut Vec<ParseWarning>) -> Documentation {
    let mut docs = Documentation::default();
    let mut readme_path = None;

    for path in &scan.paths {
        let relative = relative_display(repo, path).to_ascii_lowercase();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let at_root = path.parent() == Some(repo);

        if path.is_dir() {
            docs.examples |= EXAMPLE_DIRS.contains(&name.as_str());
            continue;
        }
        if at_root && name.starts_with("readme") {
            docs.readme = true;
            readme_path.get_or_insert_with(|| path.clone());
        }
        if at_root && name.starts_with("contributing") {
            docs.contributing = true;
        }
        let in_docs_dir = relative
            .split('/')
            .rev()
            .skip(1)
            .any(|segment| segment.contains("doc"));
        if (in_docs_dir && relative.contains("api"))
            || name.contains("openapi")
            || name.contains("swagger")
        {
            docs.api_docs = true;
        }
        if name.contains("architecture") || name.contains("design") {
            docs.architecture = true;
        }
        if (name.starts_with("install") || name.starts_with("setup")) && is_doc_file(&name) {
            docs.setup_instructions = true;
        }
    }

    if !docs.setup_instructions {
        if let Some(readme) = readme_path {
            match read_optional(&readme, "structure") {
                Ok(Some(text)) => {
                    let text = text.to_ascii_lowercase();
                    docs.setup_instructions = ["install", "setup", "getting started"]
                        .iter()
                        .any(|needle| text.contains(needle));
                }
                Ok(None) => {}
                Err(warning) => warnings.push(warning),
            }
        }
    }
    docs.scored()
}

fn present(repo: &Path, table: &[(&str, &str)]) -> Vec<String> {
    let names: BTreeSet<&str> = table
        .iter()
        .filter(|(file, _)| file_exists(&repo.join(file)))
        .map(|(_, name)| *name)
        .collect();
    names.into_iter().map(String::from).collect()
}

/// Package managers in use, and whether package.json lacks a lock file.
fn package_managers(repo: &Path) -> (Vec<String>, bool) {
    let mut managers: BTreeSet<String> = present(repo, LOCK_FILES).into_iter().collect();
    let has_lock = !managers.is_empty();
    let has_package_json = file_exists(&repo.join("package.json"));
    if has_package_json && !has_lock {
        managers.insert("npm".to_string());
    }
    managers.extend(present(repo, PACKAGE_MANAGERS));
    (managers.into_iter().collect(), has_package_json && !has_lock)
}

fn frameworks(repo: &Path, warnings: &mut Vec<ParseWarning>) -> Vec<String> {
    let mut found = BTreeSet::new();

    match read_optional(&repo.join("package.json"), "structure") {
        Ok(Some(text)) => match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(manifest) => {
                for section in ["dependencies", "devDependencies"] {
                    if let Some(deps) = manifest.get(section).and_then(|d| d.as_object()) {
                        for (key, framework) in NPM_FRAMEWORKS {
                            if deps.contains_key(*key) {
                                found.insert(framework.to_string());
                            }
                        }
                    }
                }
            }
            Err(e) => warnings.push(ParseWarning::at(
                "structure",
                repo.join("package.json"),
                e.to_string(),
            )),
        },
        Ok(None) => {}
        Err(warning) => warnings.push(warning),
    }

    for manifest in ["requirements.txt", "setup.py"] {
        match read_optional(&repo.join(manifest), "structure") {
            Ok(Some(text)) => {
                let text = text.to_ascii_lowercase();
                for (needle, framework) in PYTHON_FRAMEWORKS {
                    if text.contains(needle) {
                        found.insert(framework.to_string());
                    }
                }
            }
            Ok(None) => {}
            Err(warning) => warnings.push(warning),
        }
    }

    match read_optional(&repo.join("pom.xml"), "structure") {
        Ok(Some(text)) => {
            if text.contains("spring-boot") {
                found.insert("Spring Boot".to_string());
            } else if text.contains("spring") {
                found.insert("Spring".to_string());
            }
        }
        Ok(None) => {}
        Err(warning) => warnings.push(warning),
    }

    if file_exists(&repo.join("manage.py")) {
        found.insert("Django".to_string());
    }
    found.into_iter().collect()
}

fn insights(report: &StructureReport) -> Vec<String> {
    let mut insights = Vec::new();
    if let Some(primary) = report.languages.first() {
        insights.push(format!(
            "{} is the primary language ({}% of lines)",
            primary.language, primary.percentage
        ));
    }
    if !report.frameworks.is_empty() {
        insights.push(format!("Frameworks detected: {}", report.frameworks.join(", ")));
    }
    if !report.build_tools.is_empty() {
        insights.push(format!("Build tools: {}", report.build_tools.join(", ")));
    }
    if report.ci_systems.is_empty() {
        insights.push("No continuous integration configuration found".to_string());
    } else {
        insights.push(format!("CI: {}", report.ci_systems.join(", ")));
    }
    insights.push(format!(
        "{} of {} code files are tests ({}%)",
        report.test_files, report.code_files, report.test_coverage
    ));
    insights
}

fn recommendations(report: &StructureReport, lock_file_missing: bool) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    let docs = &report.documentation;

    if !docs.readme {
        recs.push(Recommendation::new(
            "documentation",
            Priority::High,
            "Add a README describing the project, its setup and usage",
            "1-2 hours",
        ));
    }
    if docs.score < 50 {
        recs.push(Recommendation::new(
            "documentation",
            Priority::Medium,
            format!(
                "Documentation score is {}/100; add API docs, architecture notes and examples",
                docs.score
            ),
            "4-8 hours",
        ));
    }
    if report.code_files > 0 && report.test_files == 0 {
        recs.push(Recommendation::new(
            "testing",
            Priority::High,
            "No test files found; add an automated test suite",
            "1-2 days",
        ));
    } else if report.code_files > 0 && report.test_coverage < 20.0 {
        recs.push(Recommendation::new(
            "testing",
            Priority::Medium,
            format!(
                "Only {}% of code files are tests; extend test coverage",
                report.test_coverage
            ),
            "1-2 days",
        ));
    }
    if report.ci_systems.is_empty() {
        recs.push(Recommendation::new(
            "ci",
            Priority::Medium,
            "Set up continuous integration to run builds and tests on every change",
            "2-4 hours",
        ));
    }
    if lock_file_missing {
        recs.push(Recommendation::new(
            "dependencies",
            Priority::Low,
            "Commit a lock file so installs are reproducible",
            "15 minutes",
        ));
    }
    if !docs.contributing && report.code_files >= 50 {
        recs.push(Recommendation::new(
            "documentation",
            Priority::Low,
            "Add a CONTRIBUTING guide for new contributors",
            "1-2 hours",
        ));
    }
    recs
}

pub fn analyze_structure(config: &StructureConfig) -> Result<AnalysisResult> {
    StructureAnalyzer::new().analyze(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_project(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = temp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        temp
    }

    fn report(result: &AnalysisResult) -> &StructureReport {
        match &result.data {
            AnalysisData::Structure(report) => report,
            other => panic!("unexpected data {:?}", other.kind()),
        }
    }

    #[test]
    fn test_language_histogram_weighted_by_lines() {
        let temp = create_test_project(&[
            ("src/app.ts", "a\nb\nc\n"),
            ("src/util.js", "a\n"),
            ("styles/site.css", "a\nb\nc\nd\n"),
        ]);
        let result = analyze_structure(&StructureConfig::new(temp.path())).unwrap();
        let report = report(&result);

        assert_eq!(report.primary_language.as_deref(), Some("CSS"));
        let names: Vec<&str> = report.languages.iter().map(|l| l.language.as_str()).collect();
        assert_eq!(names, vec!["CSS", "TypeScript", "JavaScript"]);
        assert_eq!(report.languages[1].percentage, 37.5);
        assert_eq!(report.code_files, 2);
    }

    #[test]
    fn test_frameworks_and_tooling() {
        let temp = create_test_project(&[
            (
                "package.json",
                indoc! {r#"
                    {"dependencies": {"react": "^18.0.0", "express": "4"},
                     "devDependencies": {"vite": "5"}}
                "#},
            ),
            ("vite.config.ts", ""),
            ("requirements.txt", "Flask>=2.0\n"),
            ("Makefile", "all:\n"),
        ]);
        let result = analyze_structure(&StructureConfig::new(temp.path())).unwrap();
        let report = report(&result);

        assert_eq!(report.frameworks, vec!["Express", "Flask", "React"]);
        assert_eq!(report.build_tools, vec!["Make", "Vite"]);
        assert_eq!(report.package_managers, vec!["npm", "pip"]);
        assert!(result.recommendations.iter().any(|r| r.description.contains("lock file")));
    }

    #[test]
    fn test_documentation_score_and_setup_from_readme() {
        let temp = create_test_project(&[
            ("README.md", "# Demo\n\n## Getting Started\nrun it\n"),
            ("CONTRIBUTING.md", "be nice"),
            ("docs/api/endpoints.md", "GET /"),
            ("examples/basic.js", "run();\n"),
        ]);
        let result = analyze_structure(&StructureConfig::new(temp.path())).unwrap();
        let docs = &report(&result).documentation;

        assert!(docs.readme && docs.contributing && docs.api_docs && docs.examples);
        assert!(docs.setup_instructions);
        assert!(!docs.architecture);
        assert_eq!(docs.score, 85);
    }

    #[test]
    fn test_missing_readme_and_tests_are_recommended() {
        let temp = create_test_project(&[("src/main.py", "print('hi')\n")]);
        let result = analyze_structure(&StructureConfig::new(temp.path())).unwrap();

        assert_eq!(result.recommendations[0].priority, Priority::High);
        let categories: Vec<&str> = result
            .recommendations
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert!(categories.contains(&"documentation"));
        assert!(categories.contains(&"testing"));
        assert!(categories.contains(&"ci"));
        assert_eq!(report(&result).documentation.score, 0);
    }

    #[test]
    fn test_organization_flags_and_test_proxy() {
        let temp = create_test_project(&[
            ("src/lib.rs", "fn a() {}\n"),
            ("src/parser.rs", "fn b() {}\n"),
            ("tests/parser_test.rs", "fn t() {}\n"),
            ("config/app.toml", "x = 1\n"),
            ("public/logo.svg", "<svg/>"),
            (".github/workflows/ci.yml", "on: push\n"),
        ]);
        let result = analyze_structure(&StructureConfig::new(temp.path())).unwrap();
        let report = report(&result);

        let org = &report.organization;
        assert!(org.has_tests && org.has_source_dir && org.has_config && org.has_assets);
        assert!(!org.has_docs);
        assert_eq!(org.max_depth, 2);
        assert_eq!(report.test_coverage, 33.3);
        assert_eq!(report.ci_systems, vec!["GitHub Actions"]);
    }

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path("src/__tests__/a.js"));
        assert!(is_test_path("app.spec.ts"));
        assert!(is_test_path("pkg/handler_test.go"));
        assert!(is_test_path("test_models.py"));
        assert!(!is_test_path("src/contest.js"));
    }
}

//! Framework migration planning.
//!
//! A [`MigrationRegistry`] maps a migration type to its source and target
//! frameworks, the file extensions it applies to and the patterns that mark
//! a file as needing change. A file is selected when any pattern matches.

use super::{extension_of, relative_display, scan_repository, RepositoryAnalyzer};
use crate::config::WalkerConfig;
use crate::core::{
    AnalysisData, AnalysisKind, AnalysisResult, Priority, Recommendation, ResultBuilder,
};
use crate::errors::{Error, Result};
use crate::io::read_source;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::Path;

#[derive(Clone, Debug, Serialize, PartialEq, Eq, Copy, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationEffort {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl MigrationEffort {
    pub fn from_file_count(files: usize) -> Self {
        match files {
            0..=9 => MigrationEffort::Low,
            10..=49 => MigrationEffort::Medium,
            50..=99 => MigrationEffort::High,
            _ => MigrationEffort::VeryHigh,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationEffort::Low => "low",
            MigrationEffort::Medium => "medium",
            MigrationEffort::High => "high",
            MigrationEffort::VeryHigh => "very-high",
        }
    }

    pub fn time_estimate(&self) -> &'static str {
        match self {
            MigrationEffort::Low => "1-2 days",
            MigrationEffort::Medium => "1-2 weeks",
            MigrationEffort::High => "2-4 weeks",
            MigrationEffort::VeryHigh => "1-3 months",
        }
    }

    fn priority(&self) -> Priority {
        match self {
            MigrationEffort::Low => Priority::Low,
            MigrationEffort::Medium => Priority::Medium,
            MigrationEffort::High => Priority::High,
            MigrationEffort::VeryHigh => Priority::Critical,
        }
    }
}

impl std::fmt::Display for MigrationEffort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileToChange {
    pub path: String,
    pub matched_patterns: Vec<String>,
    pub occurrences: usize,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct MigrationStep {
    pub order: usize,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    pub migration_type: String,
    pub source_framework: String,
    pub target_framework: String,
    pub files_to_change: Vec<FileToChange>,
    pub estimated_effort: MigrationEffort,
    pub breaking_changes: Vec<String>,
    pub steps: Vec<MigrationStep>,
}

#[derive(Clone, Debug)]
pub struct MigrationPattern {
    pub label: &'static str,
    pub regex: Regex,
}

/// One registered migration type.
#[derive(Clone, Debug)]
pub struct MigrationDefinition {
    pub migration_type: &'static str,
    pub source_framework: &'static str,
    pub target_framework: &'static str,
    pub extensions: &'static [&'static str],
    pub patterns: Vec<MigrationPattern>,
    /// Hand-authored plan; `None` falls back to the generic plan
    pub authored: Option<AuthoredPlan>,
}

#[derive(Clone, Debug)]
pub struct AuthoredPlan {
    pub breaking_changes: &'static [&'static str],
    pub steps: &'static [(&'static str, &'static str)],
}

impl MigrationDefinition {
    pub fn applies_to(&self, path: &Path) -> bool {
        let ext = extension_of(path);
        self.extensions.contains(&ext.as_str())
    }

    fn breaking_changes(&self) -> Vec<String> {
        self.authored
            .as_ref()
            .map(|plan| plan.breaking_changes.iter().map(|c| c.to_string()).collect())
            .unwrap_or_default()
    }

    fn steps(&self) -> Vec<MigrationStep> {
        match &self.authored {
            Some(plan) => plan
                .steps
                .iter()
                .enumerate()
                .map(|(i, (title, description))| MigrationStep {
                    order: i + 1,
                    title: title.to_string(),
                    description: description.to_string(),
                })
                .collect(),
            None => generic_steps(self.source_framework, self.target_framework),
        }
    }

    fn match_file(&self, content: &str) -> Option<(Vec<String>, usize)> {
        let mut matched = Vec::new();
        let mut occurrences = 0;
        for pattern in &self.patterns {
            let count = pattern.regex.find_iter(content).count();
            if count > 0 {
                matched.push(pattern.label.to_string());
                occurrences += count;
            }
        }
        (!matched.is_empty()).then_some((matched, occurrences))
    }
}

fn generic_steps(source: &str, target: &str) -> Vec<MigrationStep> {
    [
        (
            "Inventory usage".to_string(),
            format!("List every module that depends on {} and record the features it uses", source),
        ),
        (
            "Introduce the target".to_string(),
            format!("Add {} next to {} so both can run during the transition", target, source),
        ),
        (
            "Migrate incrementally".to_string(),
            "Convert files one module at a time, keeping the test suite green after each".to_string(),
        ),
        (
            "Remove the source".to_string(),
            format!(
                "Delete remaining {} code and dependencies once nothing references them",
                source
            ),
        ),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (title, description))| MigrationStep {
        order: i + 1,
        title,
        description,
    })
    .collect()
}

fn pattern(label: &'static str, regex: &str) -> MigrationPattern {
    MigrationPattern {
        label,
        regex: Regex::new(regex).unwrap(),
    }
}

const REACT_BREAKING_CHANGES: &[&str] = &[
    "Lifecycle methods (componentDidMount, componentDidUpdate, componentWillUnmount) must be rewritten with useEffect",
    "this.state and this.setState are replaced by useState or useReducer",
    "Refs created with createRef and instance fields become useRef",
    "Error boundaries (componentDidCatch, getDerivedStateFromError) have no hook equivalent and stay class components",
    "getSnapshotBeforeUpdate has no hook equivalent",
    "shouldComponentUpdate is replaced by React.memo with a comparison function",
    "Methods bound to this become closures or useCallback handlers",
];

const REACT_STEPS: &[(&str, &str)] = &[
    (
        "Upgrade React",
        "Move to React 16.8 or later and enable eslint-plugin-react-hooks",
    ),
    (
        "Convert presentational components",
        "Rewrite class components without state or lifecycle methods as function components",
    ),
    (
        "Replace component state",
        "Move this.state and this.setState to useState or useReducer",
    ),
    (
        "Replace lifecycle methods",
        "Express mount, update and unmount behaviour with useEffect and its cleanup function",
    ),
    (
        "Verify and clean up",
        "Run the test suite, check rendering behaviour and remove unused class helpers",
    ),
];

const TYPESCRIPT_BREAKING_CHANGES: &[&str] = &[
    "Implicit any values are rejected under strict mode",
    "CommonJS require/module.exports should become ES module imports and exports",
    "Objects extended with ad hoc properties need explicit interfaces",
    "Third-party packages without bundled types need @types packages or declarations",
    "Build and test tooling must compile .ts/.tsx sources",
];

const TYPESCRIPT_STEPS: &[(&str, &str)] = &[
    (
        "Add TypeScript tooling",
        "Install typescript, add tsconfig.json with allowJs and wire the compiler into the build",
    ),
    (
        "Install type declarations",
        "Add @types packages for dependencies that do not ship their own types",
    ),
    (
        "Rename leaf modules",
        "Convert modules without internal dependents to .ts first and fix reported errors",
    ),
    (
        "Type shared models",
        "Introduce interfaces for data passed between modules",
    ),
    (
        "Convert remaining files",
        "Rename the rest of the codebase and switch module syntax to ES imports",
    ),
    (
        "Enable strict mode",
        "Turn on strict and noImplicitAny once all files compile",
    ),
];

const VUE_BREAKING_CHANGES: &[&str] = &[
    "new Vue() is replaced by createApp()",
    "Global Vue.component/Vue.use registration moves to the app instance",
    "Filters are removed and become methods or computed properties",
    "$on, $off and $once event emitter APIs are removed",
    "$listeners is merged into $attrs",
    "The .sync modifier is replaced by v-model arguments",
    "beforeDestroy and destroyed are renamed to beforeUnmount and unmounted",
];

const VUE_STEPS: &[(&str, &str)] = &[
    (
        "Run the migration build",
        "Install @vue/compat and fix the deprecation warnings it reports",
    ),
    (
        "Update the application bootstrap",
        "Replace new Vue() with createApp() and move global registrations",
    ),
    (
        "Remove deprecated APIs",
        "Replace filters, event emitter usage and the .sync modifier",
    ),
    (
        "Update dependencies",
        "Move Vue Router, Vuex and UI libraries to their Vue 3 releases",
    ),
    (
        "Drop the compatibility build",
        "Remove @vue/compat once no compatibility warnings remain",
    ),
];

const ANGULAR_BREAKING_CHANGES: &[&str] = &[
    "$scope is removed; component state lives on component classes",
    "Controllers and directives become components",
    "Factories and services become injectable classes",
    "$http is replaced by HttpClient returning observables",
    "Template syntax changes (ng-repeat to *ngFor, ng-if to *ngIf, ng-model to [(ngModel)])",
    "Routing moves from ngRoute/ui-router to the Angular router",
];

const ANGULAR_STEPS: &[(&str, &str)] = &[
    (
        "Prepare the AngularJS code",
        "Adopt component-style directives and TypeScript in the AngularJS application",
    ),
    (
        "Bootstrap a hybrid application",
        "Run Angular and AngularJS side by side with ngUpgrade",
    ),
    (
        "Migrate services",
        "Convert factories and services to injectable classes and downgrade them for AngularJS",
    ),
    (
        "Migrate components",
        "Rewrite controllers and directives as Angular components, leaves first",
    ),
    (
        "Migrate routing",
        "Move routes to the Angular router",
    ),
    (
        "Remove AngularJS",
        "Drop ngUpgrade and AngularJS once no AngularJS code remains",
    ),
];

static BUILTIN: Lazy<MigrationRegistry> = Lazy::new(|| {
    MigrationRegistry::new(vec![
        MigrationDefinition {
            migration_type: "react-class-to-hooks",
            source_framework: "React Class Components",
            target_framework: "React Hooks",
            extensions: &["js", "jsx", "ts", "tsx"],
            patterns: vec![
                pattern("class component", r"extends\s+(React\.)?(Pure)?Component\b"),
                pattern("componentDidMount", r"\bcomponentDidMount\b"),
                pattern("componentDidUpdate", r"\bcomponentDidUpdate\b"),
                pattern("componentWillUnmount", r"\bcomponentWillUnmount\b"),
                pattern("setState", r"this\.setState\s*\("),
            ],
            authored: Some(AuthoredPlan {
                breaking_changes: REACT_BREAKING_CHANGES,
                steps: REACT_STEPS,
            }),
        },
        MigrationDefinition {
            migration_type: "javascript-to-typescript",
            source_framework: "JavaScript",
            target_framework: "TypeScript",
            extensions: &["js", "jsx", "mjs", "cjs"],
            patterns: vec![
                pattern("function", r"\bfunction\b|=>"),
                pattern("require", r"\brequire\s*\("),
                pattern("module.exports", r"\bmodule\.exports\b"),
                pattern("es module", r"(?m)^\s*(import|export)\s"),
            ],
            authored: Some(AuthoredPlan {
                breaking_changes: TYPESCRIPT_BREAKING_CHANGES,
                steps: TYPESCRIPT_STEPS,
            }),
        },
        MigrationDefinition {
            migration_type: "vue2-to-vue3",
            source_framework: "Vue 2",
            target_framework: "Vue 3",
            extensions: &["vue", "js", "ts"],
            patterns: vec![
                pattern("new Vue", r"new\s+Vue\s*\("),
                pattern("global registration", r"\bVue\.(component|use|filter|mixin)\s*\("),
                pattern("event emitter", r"\$(on|off|once)\s*\("),
                pattern("$listeners", r"\$listeners\b"),
                pattern("filters", r"\bfilters\s*:"),
                pattern(".sync", r"\.sync\b"),
                pattern("destroy hooks", r"\b(beforeDestroy|destroyed)\b"),
            ],
            authored: Some(AuthoredPlan {
                breaking_changes: VUE_BREAKING_CHANGES,
                steps: VUE_STEPS,
            }),
        },
        MigrationDefinition {
            migration_type: "angularjs-to-angular",
            source_framework: "AngularJS",
            target_framework: "Angular",
            extensions: &["js", "ts", "html"],
            patterns: vec![
                pattern("angular.module", r"angular\.module\s*\("),
                pattern("$scope", r"\$scope\b"),
                pattern("ng directives", r"\bng-(controller|repeat|model|if|click)\b"),
                pattern("registrations", r"\.(controller|directive|factory|service)\s*\("),
                pattern("$http", r"\$http\b"),
            ],
            authored: Some(AuthoredPlan {
                breaking_changes: ANGULAR_BREAKING_CHANGES,
                steps: ANGULAR_STEPS,
            }),
        },
        MigrationDefinition {
            migration_type: "jquery-to-vanilla",
            source_framework: "jQuery",
            target_framework: "Vanilla JavaScript",
            extensions: &["js", "jsx", "ts", "html"],
            patterns: vec![
                pattern("selector", r"(\$|jQuery)\s*\("),
                pattern("utilities", r"\$\.(ajax|get|post|each|extend)\s*\("),
            ],
            authored: None,
        },
        MigrationDefinition {
            migration_type: "python2-to-python3",
            source_framework: "Python 2",
            target_framework: "Python 3",
            extensions: &["py"],
            patterns: vec![
                pattern("print statement", r#"(?m)^\s*print\s+[^(\s=]"#),
                pattern("removed builtins", r"\b(xrange|raw_input|unicode|basestring)\s*\("),
                pattern("dict iterators", r"\.(iteritems|iterkeys|itervalues|has_key)\s*\("),
                pattern("urllib2", r"\burllib2\b"),
                pattern("except syntax", r"except\s+\w+\s*,\s*\w+\s*:"),
            ],
            authored: None,
        },
    ])
});

/// Immutable table of supported migrations.
#[derive(Clone, Debug)]
pub struct MigrationRegistry {
    definitions: Vec<MigrationDefinition>,
}

impl MigrationRegistry {
    pub fn new(definitions: Vec<MigrationDefinition>) -> Self {
        Self { definitions }
    }

    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn get(&self, migration_type: &str) -> Option<&MigrationDefinition> {
        self.definitions
            .iter()
            .find(|d| d.migration_type == migration_type)
    }

    pub fn supported_types(&self) -> Vec<String> {
        self.definitions
            .iter()
            .map(|d| d.migration_type.to_string())
            .collect()
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

pub struct MigrationPlanner {
    registry: MigrationRegistry,
    walker: WalkerConfig,
}

impl MigrationPlanner {
    pub fn new(registry: MigrationRegistry) -> Self {
        Self {
            registry,
            walker: WalkerConfig::default(),
        }
    }

    pub fn with_walker_config(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    pub fn plan(&self, repo: &Path, migration_type: &str) -> Result<AnalysisResult> {
        let definition =
            self.registry
                .get(migration_type)
                .ok_or_else(|| Error::UnknownMigrationType {
                    requested: migration_type.to_string(),
                    supported: self.registry.supported_types(),
                })?;

        let _span = tracing::debug_span!("analyzer", kind = "migration").entered();
        let scan = scan_repository(repo, &self.walker, false)?;
        let mut warnings = scan.warnings.clone();
        let mut files_to_change = Vec::new();

        for path in scan.files().filter(|p| definition.applies_to(p)) {
            let content = match read_source(path, "migration") {
                Ok(content) => content,
                Err(warning) => {
                    warnings.push(warning);
                    continue;
                }
            };
            if let Some((matched_patterns, occurrences)) = definition.match_file(&content) {
                tracing::debug!("{} matches {:?}", path.display(), matched_patterns);
                files_to_change.push(FileToChange {
                    path: relative_display(repo, path),
                    matched_patterns,
                    occurrences,
                });
            }
        }
        files_to_change.sort_by(|a, b| a.path.cmp(&b.path));

        let plan = MigrationPlan {
            migration_type: definition.migration_type.to_string(),
            source_framework: definition.source_framework.to_string(),
            target_framework: definition.target_framework.to_string(),
            estimated_effort: MigrationEffort::from_file_count(files_to_change.len()),
            files_to_change,
            breaking_changes: definition.breaking_changes(),
            steps: definition.steps(),
        };
        tracing::info!(
            "Migration {}: {} files to change ({})",
            plan.migration_type,
            plan.files_to_change.len(),
            plan.estimated_effort
        );

        Ok(ResultBuilder::new(AnalysisData::Migration(plan.clone()))
            .summary(format!(
                "Migrating from {} to {}: {} files to change, estimated effort {}",
                plan.source_framework,
                plan.target_framework,
                plan.files_to_change.len(),
                plan.estimated_effort
            ))
            .insights(insights(&plan))
            .recommendations(recommendations(&plan))
            .warnings(warnings)
            .build())
    }
}

impl Default for MigrationPlanner {
    fn default() -> Self {
        Self::new(MigrationRegistry::builtin())
    }
}

fn insights(plan: &MigrationPlan) -> Vec<String> {
    let mut insights = Vec::new();
    if plan.files_to_change.is_empty() {
        insights.push(format!("No {} code found", plan.source_framework));
        return insights;
    }

    let occurrences: usize = plan.files_to_change.iter().map(|f| f.occurrences).sum();
    insights.push(format!(
        "{} occurrences of {} patterns across {} files",
        occurrences,
        plan.source_framework,
        plan.files_to_change.len()
    ));
    if let Some(heaviest) = plan.files_to_change.iter().max_by_key(|f| f.occurrences) {
        insights.push(format!(
            "{} has the most occurrences ({})",
            heaviest.path, heaviest.occurrences
        ));
    }
    insights.push(format!(
        "Estimated timeline: {}",
        plan.estimated_effort.time_estimate()
    ));
    insights
}

fn recommendations(plan: &MigrationPlan) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if plan.files_to_change.is_empty() {
        return recs;
    }

    recs.push(Recommendation::new(
        "migration",
        plan.estimated_effort.priority(),
        format!(
            "Migrate {} files from {} to {} incrementally, following the {} planned steps",
            plan.files_to_change.len(),
            plan.source_framework,
            plan.target_framework,
            plan.steps.len()
        ),
        plan.estimated_effort.time_estimate(),
    ));

    if !plan.breaking_changes.is_empty() {
        recs.push(Recommendation::new(
            "migration",
            Priority::High,
            format!(
                "Review the {} breaking changes before starting the migration",
                plan.breaking_changes.len()
            ),
            "2-4 hours",
        ));
    }

    if plan.estimated_effort >= MigrationEffort::High {
        recs.push(Recommendation::new(
            "planning",
            Priority::High,
            "Split the migration into phases with a feature freeze per phase",
            "1 day",
        ));
    }
    recs
}

/// Plan `migration_type` for the repository at `repo` with the built-in
/// registry.
pub fn plan_migration(repo: &Path, migration_type: &str) -> Result<AnalysisResult> {
    MigrationPlanner::default().plan(repo, migration_type)
}

/// Adapter so a fixed migration type can run with the other tree analyzers.
pub struct FixedMigration {
    pub planner: MigrationPlanner,
    pub migration_type: String,
}

impl RepositoryAnalyzer for FixedMigration {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Migration
    }

    fn analyze(&self, repo: &Path) -> Result<AnalysisResult> {
        self.planner.plan(repo, &self.migration_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn plan_of(result: &AnalysisResult) -> &MigrationPlan {
        match &result.data {
            AnalysisData::Migration(plan) => plan,
            other => panic!("unexpected data {:?}", other.kind()),
        }
    }

    #[test]
    fn test_effort_bands() {
        assert_eq!(MigrationEffort::from_file_count(0), MigrationEffort::Low);
        assert_eq!(MigrationEffort::from_file_count(9), MigrationEffort::Low);
        assert_eq!(MigrationEffort::from_file_count(10), MigrationEffort::Medium);
        assert_eq!(MigrationEffort::from_file_count(49), MigrationEffort::Medium);
        assert_eq!(MigrationEffort::from_file_count(50), MigrationEffort::High);
        assert_eq!(MigrationEffort::from_file_count(100), MigrationEffort::VeryHigh);
    }

    #[test]
    fn test_unknown_type_fails_before_touching_filesystem() {
        let err = plan_migration(Path::new("/definitely/not/here"), "cobol-to-rust").unwrap_err();
        match err {
            Error::UnknownMigrationType { requested, supported } => {
                assert_eq!(requested, "cobol-to-rust");
                assert!(supported.contains(&"vue2-to-vue3".to_string()));
                assert_eq!(supported.len(), 6);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_generic_plan_has_four_steps() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "legacy.py", "print 'hello'\nfor i in xrange(3):\n    pass\n");
        write(temp.path(), "modern.py", "print('hello')\n");

        let result = plan_migration(temp.path(), "python2-to-python3").unwrap();
        let plan = plan_of(&result);

        assert_eq!(plan.files_to_change.len(), 1);
        assert_eq!(plan.files_to_change[0].path, "legacy.py");
        assert_eq!(
            plan.files_to_change[0].matched_patterns,
            vec!["print statement", "removed builtins"]
        );
        assert_eq!(plan.steps.len(), 4);
        assert!(plan.breaking_changes.is_empty());
        assert_eq!(plan.steps[3].order, 4);
    }

    #[test]
    fn test_files_outside_extension_set_are_ignored() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "notes.md", "componentDidMount");
        write(temp.path(), "node_modules/react/index.js", "componentDidMount");

        let result = plan_migration(temp.path(), "react-class-to-hooks").unwrap();
        assert!(plan_of(&result).files_to_change.is_empty());
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_large_migration_recommends_phases() {
        let temp = TempDir::new().unwrap();
        for i in 0..50 {
            write(temp.path(), &format!("src/c{i}.vue"), "export default { filters: {} }");
        }

        let result = plan_migration(temp.path(), "vue2-to-vue3").unwrap();
        assert_eq!(plan_of(&result).estimated_effort, MigrationEffort::High);
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.category == "planning"));
    }
}

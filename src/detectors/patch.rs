//! Probes run over the lines a pull request adds.
//!
//! The signal is the added lines of one file joined with `\n`, so a
//! finding's line is the 1-based index into the added lines.

use super::RegexDetector;
use crate::core::Severity;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static ASSIGNMENT_IN_CONDITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:if|while)\s*\([^)]*?[^=!<>]=[^=>][^)]*\)").unwrap());
static PARSE_INT_WITHOUT_RADIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bparseInt\s*\(\s*[^,()]+\)").unwrap());
static EMPTY_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:catch\s*(?:\([^)]*\))?|if\s*\([^)]*\)|else)\s*\{\s*\}").unwrap()
});

static EVAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\beval\s*\(").unwrap());
static INNER_HTML: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.innerHTML\s*=[^=]").unwrap());
static DYNAMIC_REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\b(?:require|import)\s*\(\s*[^'"`\s)]"#).unwrap());
static CONSOLE_LOG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bconsole\.log\s*\(").unwrap());
static DEBUGGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdebugger\b").unwrap());

static VAR_DECLARATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bvar\s+\w").unwrap());
static TODO_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:TODO|FIXME)\b").unwrap());
static PROMISE_CHAIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.then\s*\(").unwrap());

#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ProbeCategory {
    Bug,
    Security,
    Quality,
}

pub static BUG_PROBES: [RegexDetector; 3] = [
    RegexDetector::new(
        "assignment-in-condition",
        Severity::High,
        &ASSIGNMENT_IN_CONDITION,
        "Assignment inside a condition; did you mean a comparison?",
    ),
    RegexDetector::new(
        "parse-int-radix",
        Severity::Medium,
        &PARSE_INT_WITHOUT_RADIX,
        "parseInt called without a radix",
    ),
    RegexDetector::new(
        "empty-block",
        Severity::Medium,
        &EMPTY_BLOCK,
        "Empty block swallows control flow",
    ),
];

pub static SECURITY_PROBES: [RegexDetector; 5] = [
    RegexDetector::new("eval", Severity::Critical, &EVAL, "eval() executes arbitrary code"),
    RegexDetector::new(
        "inner-html",
        Severity::High,
        &INNER_HTML,
        "Assigning innerHTML can inject markup",
    ),
    RegexDetector::new(
        "dynamic-require",
        Severity::High,
        &DYNAMIC_REQUIRE,
        "Module path is not a literal",
    ),
    RegexDetector::new(
        "console-log",
        Severity::Low,
        &CONSOLE_LOG,
        "Debug logging left in the change",
    ),
    RegexDetector::new(
        "debugger",
        Severity::Medium,
        &DEBUGGER,
        "debugger statement left in the change",
    ),
];

pub static QUALITY_PROBES: [RegexDetector; 3] = [
    RegexDetector::new("var", Severity::Low, &VAR_DECLARATION, "Use let or const instead of var"),
    RegexDetector::new("todo", Severity::Low, &TODO_MARKER, "Unresolved TODO/FIXME marker"),
    RegexDetector::new(
        "promise-chain",
        Severity::Low,
        &PROMISE_CHAIN,
        "Promise chain; async/await reads more clearly",
    ),
];

/// The probe sets, one per category.
pub fn probe_sets() -> [(ProbeCategory, &'static [RegexDetector]); 3] {
    [
        (ProbeCategory::Bug, &BUG_PROBES[..]),
        (ProbeCategory::Security, &SECURITY_PROBES[..]),
        (ProbeCategory::Quality, &QUALITY_PROBES[..]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::Detector;

    fn count(probes: &[RegexDetector], text: &str) -> usize {
        probes.iter().map(|p| p.detect(text).len()).sum()
    }

    #[test]
    fn test_assignment_in_condition_ignores_comparisons() {
        let probe = &BUG_PROBES[0];
        assert_eq!(probe.count("if (user = find(id)) {"), 1);
        assert_eq!(probe.count("if (a === b) {"), 0);
        assert_eq!(probe.count("while (n >= 0 && n != 3) {"), 0);
        assert_eq!(probe.count("if (items.some(x => x.ok)) {"), 0);
    }

    #[test]
    fn test_parse_int_radix() {
        let probe = &BUG_PROBES[1];
        assert_eq!(probe.count("const n = parseInt(value);"), 1);
        assert_eq!(probe.count("const n = parseInt(value, 10);"), 0);
    }

    #[test]
    fn test_empty_blocks() {
        let text = "try { run(); } catch (e) {}\nif (ok) { }\nelse {\n}";
        assert_eq!(BUG_PROBES[2].count(text), 3);
    }

    #[test]
    fn test_security_probes() {
        let text = "eval(code);\nel.innerHTML = html;\nrequire(name);\nrequire('fs');\nimport(`./a`);\nconsole.log(x);\ndebugger;";
        assert_eq!(count(&SECURITY_PROBES, text), 5);
        assert_eq!(INNER_HTML.find_iter("if (el.innerHTML == '') {}").count(), 0);
    }

    #[test]
    fn test_quality_probes() {
        let text = "var x = 1;\n// TODO: remove\nfetch(u).then(r => r.json());\nconst variance = 2;";
        assert_eq!(count(&QUALITY_PROBES, text), 3);
    }
}

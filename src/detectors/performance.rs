//! Performance anti-pattern detectors for JavaScript/TypeScript and Python
//! sources.
//!
//! Loop bodies are approximated lexically: for brace languages the body runs
//! from the loop header to the first `}`; for Python it is the block of lines
//! indented deeper than the header.

use super::{line_of, Detector};
use crate::core::{Finding, Language, Severity};
use once_cell::sync::Lazy;
use regex::Regex;

/// A source file handed to the performance detectors.
pub struct SourceFile {
    pub content: String,
    pub language: Language,
}

impl SourceFile {
    pub fn new(content: impl Into<String>, language: Language) -> Self {
        Self {
            content: content.into(),
            language,
        }
    }

    pub fn is_python(&self) -> bool {
        self.language == Language::Python
    }
}

static JS_LOOP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(for|while)\s*\(|\.(forEach|map)\s*\(").unwrap());
static PY_LOOP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)(for|while)\b.*:\s*$").unwrap());
static PY_ASYNC_DEF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)async\s+def\b").unwrap());
static JS_ASYNC_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"async\s+function\b[^{]*\{|async\s*(\([^)]*\)|\w+)\s*=>\s*\{|async\s+\w+\s*\([^)]*\)\s*\{")
        .unwrap()
});
static SYNC_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+Sync\s*\(").unwrap());
static PY_MEMBERSHIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*if\s+.+\s+(not\s+)?in\s+").unwrap());
static LARGE_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"JSON\.(parse|stringify)\s*\(\s*(await\s+)?(fs\.)?(readFileSync|promises\.readFile|readFile)\b|JSON\.(parse|stringify)\s*\(\s*[\w.]*\b(body|response|responseText|data)\b|json\.loads?\([^)]*\.read\(\)",
    )
    .unwrap()
});
static QUERY_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.(find|findOne|where|filter_by)\s*\(|(?i)\bSELECT\b[^;]*\bWHERE\b").unwrap()
});

const JS_QUERY_CALLS: &[&str] = &[
    "await ",
    "fetch(",
    ".find(",
    ".findOne(",
    ".findById(",
    ".query(",
    ".execute(",
    ".objects.",
];
const PY_QUERY_CALLS: &[&str] = &[
    ".objects.",
    ".query(",
    ".execute(",
    "requests.",
    "urlopen(",
    "session.get(",
];
const JS_SEARCH_CALLS: &[&str] = &[".includes(", ".indexOf(", ".find(", "for ("];
const PY_BLOCKING_CALLS: &[&str] = &["open(", "time.sleep(", "requests."];
const CACHE_BOUNDS: &[&str] = &[
    "maxsize", "max_size", "ttl", "lru", "evict", "maxage", "expire", ".delete(", ".clear(",
];

const LISTENER_RELEASE: &[&str] = &["removeEventListener"];
const INTERVAL_RELEASE: &[&str] = &["clearInterval"];
const EMITTER_RELEASE: &[&str] = &[".off(", "removeListener"];
const SUBSCRIPTION_RELEASE: &[&str] = &["unsubscribe"];
const SOCKET_RELEASE: &[&str] = &[".close("];

/// (acquire pattern, release markers) pairs checked per file.
static LEAK_PAIRS: Lazy<Vec<(Regex, &'static [&'static str], &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\baddEventListener\s*\(").unwrap(),
            LISTENER_RELEASE,
            "addEventListener without removeEventListener",
        ),
        (
            Regex::new(r"\bsetInterval\s*\(").unwrap(),
            INTERVAL_RELEASE,
            "setInterval without clearInterval",
        ),
        (
            Regex::new(r"\.on\s*\(").unwrap(),
            EMITTER_RELEASE,
            "event listener registered with .on() is never removed",
        ),
        (
            Regex::new(r"\bsubscribe\s*\(").unwrap(),
            SUBSCRIPTION_RELEASE,
            "subscription is never unsubscribed",
        ),
        (
            Regex::new(r"\bnew\s+WebSocket\s*\(").unwrap(),
            SOCKET_RELEASE,
            "WebSocket is never closed",
        ),
    ]
});

/// Text from `start` up to and including the first `}` after it.
fn brace_body(content: &str, start: usize) -> &str {
    let rest = &content[start..];
    match rest.find('}') {
        Some(end) => &rest[..=end],
        None => rest,
    }
}

/// Text from an opening brace at `open` to its matching close.
fn balanced_body(content: &str, open: usize) -> &str {
    let mut depth = 0usize;
    for (i, c) in content[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &content[open..=open + i];
                }
            }
            _ => {}
        }
    }
    &content[open..]
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Indented Python blocks following each header matched by `header`, as
/// (1-based header line, block lines).
fn python_blocks<'a>(content: &'a str, header: &Regex) -> Vec<(usize, Vec<&'a str>)> {
    let lines: Vec<&str> = content.lines().collect();
    let mut blocks = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if !header.is_match(line) {
            continue;
        }
        let indent = indentation(line);
        let body: Vec<&str> = lines[i + 1..]
            .iter()
            .take_while(|l| l.trim().is_empty() || indentation(l) > indent)
            .copied()
            .collect();
        blocks.push((i + 1, body));
    }
    blocks
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

pub struct NPlusOneDetector;

impl Detector<SourceFile> for NPlusOneDetector {
    fn name(&self) -> &'static str {
        "n-plus-one-query"
    }

    fn detect(&self, file: &SourceFile) -> Vec<Finding> {
        let message = "Query or request issued inside a loop";
        if file.is_python() {
            return python_blocks(&file.content, &PY_LOOP)
                .into_iter()
                .filter(|(_, body)| body.iter().any(|l| contains_any(l, PY_QUERY_CALLS)))
                .map(|(line, _)| Finding::new(self.name(), Severity::High, message).at_line(line))
                .collect();
        }
        JS_LOOP
            .find_iter(&file.content)
            .filter(|m| contains_any(brace_body(&file.content, m.end()), JS_QUERY_CALLS))
            .map(|m| {
                Finding::new(self.name(), Severity::High, message)
                    .at_line(line_of(&file.content, m.start()))
            })
            .collect()
    }
}

pub struct QuadraticLoopDetector;

impl Detector<SourceFile> for QuadraticLoopDetector {
    fn name(&self) -> &'static str {
        "quadratic-loop"
    }

    fn detect(&self, file: &SourceFile) -> Vec<Finding> {
        let message = "Linear search inside a loop gives O(n^2) behaviour";
        if file.is_python() {
            return python_blocks(&file.content, &PY_LOOP)
                .into_iter()
                .filter(|(_, body)| body.iter().any(|l| PY_MEMBERSHIP.is_match(l)))
                .map(|(line, _)| Finding::new(self.name(), Severity::Medium, message).at_line(line))
                .collect();
        }
        JS_LOOP
            .find_iter(&file.content)
            .filter(|m| contains_any(brace_body(&file.content, m.end()), JS_SEARCH_CALLS))
            .map(|m| {
                Finding::new(self.name(), Severity::Medium, message)
                    .at_line(line_of(&file.content, m.start()))
            })
            .collect()
    }
}

pub struct SyncIoInAsyncDetector;

impl Detector<SourceFile> for SyncIoInAsyncDetector {
    fn name(&self) -> &'static str {
        "sync-io-in-async"
    }

    fn detect(&self, file: &SourceFile) -> Vec<Finding> {
        let message = "Blocking I/O inside an async function";
        if file.is_python() {
            return python_blocks(&file.content, &PY_ASYNC_DEF)
                .into_iter()
                .filter(|(_, body)| body.iter().any(|l| contains_any(l, PY_BLOCKING_CALLS)))
                .map(|(line, _)| Finding::new(self.name(), Severity::High, message).at_line(line))
                .collect();
        }
        JS_ASYNC_FN
            .find_iter(&file.content)
            .filter(|m| {
                let open = m.end() - 1;
                SYNC_CALL.is_match(balanced_body(&file.content, open))
            })
            .map(|m| {
                Finding::new(self.name(), Severity::High, message)
                    .at_line(line_of(&file.content, m.start()))
            })
            .collect()
    }
}

pub struct MemoryLeakDetector;

impl Detector<SourceFile> for MemoryLeakDetector {
    fn name(&self) -> &'static str {
        "memory-leak"
    }

    fn detect(&self, file: &SourceFile) -> Vec<Finding> {
        let content = &file.content;
        LEAK_PAIRS
            .iter()
            .filter(|(_, releases, _)| !contains_any(content, releases))
            .flat_map(|(acquire, _, message)| {
                acquire.find_iter(content).map(move |m| {
                    Finding::new(self.name(), Severity::Medium, *message)
                        .at_line(line_of(content, m.start()))
                })
            })
            .collect()
    }
}

pub struct UnboundedCacheDetector;

impl Detector<SourceFile> for UnboundedCacheDetector {
    fn name(&self) -> &'static str {
        "unbounded-cache"
    }

    fn detect(&self, file: &SourceFile) -> Vec<Finding> {
        let lower = file.content.to_ascii_lowercase();
        match lower.find("cache") {
            Some(offset) if !contains_any(&lower, CACHE_BOUNDS) => vec![Finding::new(
                self.name(),
                Severity::Medium,
                "Cache without a size limit or eviction policy",
            )
            .at_line(line_of(&file.content, offset))],
            _ => Vec::new(),
        }
    }
}

pub struct LargeJsonDetector;

impl Detector<SourceFile> for LargeJsonDetector {
    fn name(&self) -> &'static str {
        "large-json"
    }

    fn detect(&self, file: &SourceFile) -> Vec<Finding> {
        LARGE_JSON
            .find_iter(&file.content)
            .map(|m| {
                Finding::new(
                    self.name(),
                    Severity::Low,
                    "Whole payload (de)serialized in one call",
                )
                .at_line(line_of(&file.content, m.start()))
            })
            .collect()
    }
}

pub struct MissingIndexDetector;

impl Detector<SourceFile> for MissingIndexDetector {
    fn name(&self) -> &'static str {
        "missing-index"
    }

    fn detect(&self, file: &SourceFile) -> Vec<Finding> {
        QUERY_TOKEN
            .find(&file.content)
            .map(|m| {
                vec![Finding::new(
                    self.name(),
                    Severity::Low,
                    "Filtered queries; confirm the filtered columns are indexed",
                )
                .at_line(line_of(&file.content, m.start()))]
            })
            .unwrap_or_default()
    }
}

/// The full detector set, in reporting order.
pub fn default_detectors() -> Vec<Box<dyn Detector<SourceFile> + Send + Sync>> {
    vec![
        Box::new(NPlusOneDetector),
        Box::new(QuadraticLoopDetector),
        Box::new(SyncIoInAsyncDetector),
        Box::new(MemoryLeakDetector),
        Box::new(UnboundedCacheDetector),
        Box::new(LargeJsonDetector),
        Box::new(MissingIndexDetector),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn js(code: &str) -> SourceFile {
        SourceFile::new(code, Language::JavaScript)
    }

    fn py(code: &str) -> SourceFile {
        SourceFile::new(code, Language::Python)
    }

    #[test]
    fn test_n_plus_one_in_js_loop() {
        let file = js(indoc! {"
            const users = await getUsers();
            for (const user of users) {
              const posts = await Post.find({ author: user.id });
            }
        "});
        let findings = NPlusOneDetector.detect(&file);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(2));
    }

    #[test]
    fn test_n_plus_one_in_python_loop() {
        let file = py(indoc! {"
            for order in orders:
                customer = Customer.objects.get(id=order.customer_id)
            print('done')
        "});
        assert_eq!(NPlusOneDetector.detect(&file).len(), 1);
    }

    #[test]
    fn test_quadratic_membership_checks() {
        let file = js("items.forEach(item => { if (seen.includes(item)) dup++; });");
        assert_eq!(QuadraticLoopDetector.detect(&file).len(), 1);

        let file = py("for a in xs:\n    if a in ys:\n        n += 1\n");
        assert_eq!(QuadraticLoopDetector.detect(&file).len(), 1);
    }

    #[test]
    fn test_sync_io_in_async_function() {
        let file = js(indoc! {"
            async function load(path) {
              if (ok) { log(); }
              return fs.readFileSync(path);
            }
            function plain() { return fs.readFileSync('x'); }
        "});
        let findings = SyncIoInAsyncDetector.detect(&file);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(1));

        let file = py("async def handler():\n    time.sleep(1)\n");
        assert_eq!(SyncIoInAsyncDetector.detect(&file).len(), 1);
    }

    #[test]
    fn test_memory_leak_reported_per_occurrence() {
        let file = js("window.addEventListener('a', f);\nwindow.addEventListener('b', g);\nsetInterval(tick, 10);\nclearInterval(t);\n");
        let findings = MemoryLeakDetector.detect(&file);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[1].line, Some(2));
    }

    #[test]
    fn test_unsubscribe_is_not_a_subscription() {
        let file = js("store.subscribe(render);\nconst off = () => sub.unsubscribe();\n");
        assert!(MemoryLeakDetector.detect(&file).is_empty());
    }

    #[test]
    fn test_cache_with_eviction_is_bounded() {
        assert_eq!(UnboundedCacheDetector.detect(&js("const cache = {};\n")).len(), 1);
        assert!(UnboundedCacheDetector
            .detect(&js("const cache = new LRU({ max: 10 });\n"))
            .is_empty());
    }

    #[test]
    fn test_large_json_and_missing_index() {
        let file = js("const cfg = JSON.parse(fs.readFileSync('big.json'));\nUser.find({ email });\nUser.where({ a });\n");
        assert_eq!(LargeJsonDetector.detect(&file).len(), 1);
        assert_eq!(MissingIndexDetector.detect(&file).len(), 1);

        let file = py("data = json.loads(handle.read())\ncursor.execute('SELECT * FROM t WHERE id = 1')\n");
        assert_eq!(LargeJsonDetector.detect(&file).len(), 1);
        assert_eq!(MissingIndexDetector.detect(&file)[0].line, Some(2));
    }
}

//! Lexical detectors.
//!
//! Every detector maps some signal (file content, diff lines) to a list of
//! [`Finding`]s. Analyzers only see the trait, so a parser-backed detector
//! can replace a regex one without touching scoring or recommendations.

pub mod patch;
pub mod performance;

use crate::core::{Finding, Severity};
use once_cell::sync::Lazy;
use regex::Regex;

pub trait Detector<S: ?Sized> {
    fn name(&self) -> &'static str;
    fn detect(&self, signal: &S) -> Vec<Finding>;
}

/// One finding per regex match, located by line.
pub struct RegexDetector {
    name: &'static str,
    severity: Severity,
    pattern: &'static Lazy<Regex>,
    message: &'static str,
}

impl RegexDetector {
    pub const fn new(
        name: &'static str,
        severity: Severity,
        pattern: &'static Lazy<Regex>,
        message: &'static str,
    ) -> Self {
        Self {
            name,
            severity,
            pattern,
            message,
        }
    }

    pub fn count(&self, text: &str) -> usize {
        self.pattern.find_iter(text).count()
    }
}

impl Detector<str> for RegexDetector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn detect(&self, content: &str) -> Vec<Finding> {
        self.pattern
            .find_iter(content)
            .map(|m| {
                Finding::new(self.name, self.severity, self.message)
                    .at_line(line_of(content, m.start()))
            })
            .collect()
    }
}

/// 1-based line number of a byte offset.
pub fn line_of(content: &str, offset: usize) -> usize {
    let end = offset.min(content.len());
    content.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// Total matches of all `patterns` in `text`.
pub fn count_all(patterns: &[&Lazy<Regex>], text: &str) -> usize {
    patterns.iter().map(|p| p.find_iter(text).count()).sum()
}

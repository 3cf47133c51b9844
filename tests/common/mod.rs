// Shared fixtures for reposcope integration tests
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Lay out `files` (relative path, contents) under a fresh temp directory.
pub fn create_test_project(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    for (path, contents) in files {
        write_file(temp.path(), path, contents);
    }
    temp
}

pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    fs::write(path, contents).expect("Failed to write fixture");
}

/// 120 lines: 20 `if` statements, one 60-line function reaching bracket
/// depth 6, and 42 repeated lines out of 119 non-trivial ones.
pub fn complex_javascript() -> String {
    let mut lines = Vec::new();
    for i in 1..=20 {
        lines.push(format!("if (flag{i}) {{ total += {i}; }}"));
    }
    for i in 1..=40 {
        lines.push(format!("let a{i} = {i};"));
    }
    lines.push("function big() {".to_string());
    lines.push("  return ((((( 1 )))));".to_string());
    for _ in 0..42 {
        lines.push("  console.log(\"repeated line\");".to_string());
    }
    for i in 1..=15 {
        lines.push(format!("  let b{i} = {i};"));
    }
    lines.push("}".to_string());
    let mut content = lines.join("\n");
    content.push('\n');
    content
}

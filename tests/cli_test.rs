mod common;

use assert_cmd::Command;
use common::create_test_project;
use indoc::indoc;
use std::fs;

fn reposcope() -> Command {
    let mut cmd = Command::cargo_bin("reposcope").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("REPOSCOPE_CONFIG");
    cmd
}

#[test]
fn test_structure_json_output() {
    let project = create_test_project(&[
        ("package.json", r#"{"dependencies": {"react": "^18.0.0"}}"#),
        ("src/App.jsx", "export default function App() { return null; }\n"),
        ("README.md", "# Demo\n"),
    ]);

    let output = reposcope()
        .args(["structure", "-f", "json"])
        .arg(project.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["data"]["type"], "structure");
    assert!(value["summary"].as_str().is_some());
}

#[test]
fn test_markdown_report_written_to_file() {
    let project = create_test_project(&[("index.js", "if (a && b) { run(); }\n")]);
    let out = project.path().join("reports/complexity.md");

    reposcope()
        .arg("complexity")
        .arg(project.path())
        .args(["-f", "markdown", "-o"])
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("# Reposcope Analysis Report"));
    assert!(text.contains("## Complexity Analysis"));
}

#[test]
fn test_format_from_config_file() {
    let project = create_test_project(&[
        (
            ".reposcope.toml",
            indoc! {r#"
                [output]
                default_format = "json"
            "#},
        ),
        ("main.py", "def main():\n    pass\n"),
    ]);

    let output = reposcope()
        .arg("performance")
        .arg(project.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["data"]["type"], "performance");
}

#[test]
fn test_missing_repository_fails() {
    let output = reposcope()
        .args(["complexity", "/definitely/not/a/repo"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("/definitely/not/a/repo"));
}

#[test]
fn test_migrate_list_and_unknown_type() {
    let output = reposcope().args(["migrate", "--list"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|l| l == "react-class-to-hooks"));

    let project = create_test_project(&[("index.js", "componentDidMount")]);
    let output = reposcope()
        .arg("migrate")
        .arg(project.path())
        .args(["--type", "cobol-to-rust"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown migration type"));
}

#[test]
fn test_issues_command_reads_payloads() {
    let project = create_test_project(&[
        (
            "issues.json",
            r#"[{"number": 1, "state": "open", "created_at": "2024-05-01T00:00:00Z", "labels": ["bug"]}]"#,
        ),
        (
            "prs.json",
            r#"{"prs": [{"number": 2, "state": "closed", "merged_at": "2024-05-02T00:00:00Z"}]}"#,
        ),
    ]);

    let output = reposcope()
        .args(["issues", "-f", "json", "--issues"])
        .arg(project.path().join("issues.json"))
        .arg("--prs")
        .arg(project.path().join("prs.json"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["data"]["type"], "issue-tracker");
    assert_eq!(value["data"]["report"]["metrics"]["open_issues"], 1);
    assert_eq!(value["data"]["report"]["metrics"]["merged_prs"], 1);
}

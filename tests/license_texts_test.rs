mod common;

use common::create_test_project;
use pretty_assertions::assert_eq;
use reposcope::analyzers::license::detect_license_text;
use reposcope::{analyze_licenses, AnalysisData};

const GPL_2: &str = include_str!("fixtures/licenses/GPL-2.txt");
const GPL_3: &str = include_str!("fixtures/licenses/GPL-3.txt");
const MPL_2: &str = include_str!("fixtures/licenses/MPL-2.0.txt");
const LGPL_21: &str = include_str!("fixtures/licenses/LGPL-2.1.txt");
const LGPL_3: &str = include_str!("fixtures/licenses/LGPL-3.txt");
const APACHE_2: &str = include_str!("fixtures/licenses/Apache-2.0.txt");
const BSD: &str = include_str!("fixtures/licenses/BSD.txt");

#[test]
fn test_full_license_texts_are_identified() {
    let cases = [
        (GPL_2, "GPL-2.0"),
        (GPL_3, "GPL-3.0"),
        (MPL_2, "MPL-2.0"),
        (LGPL_21, "LGPL-2.1"),
        (LGPL_3, "LGPL-3.0"),
        (APACHE_2, "Apache-2.0"),
        (BSD, "BSD-3-Clause"),
    ];
    for (text, expected) in cases {
        assert_eq!(detect_license_text(text), Some(expected));
    }
}

#[test]
fn test_gpl2_project_is_strong_copyleft() {
    let project = create_test_project(&[("COPYING", GPL_2)]);

    let result = analyze_licenses(project.path()).unwrap();
    let AnalysisData::Licenses(report) = &result.data else {
        panic!("expected a license report");
    };

    assert_eq!(report.project_license.license_type, "GPL-2.0");
    assert!(report.project_license.gpl_or_copyleft);
    assert!(!report.project_license.compatible);
}

/*!
 * Tests for the structural verifier
 */

use quizloc::pipeline::{ViolationKind, verify_files};
use crate::common;

const SOURCE: &str = r#"topic: [
  { id: "q1", text: "q one?", options: ["a", "b"], correctIndex: 0 },
  { id: "q2", text: "q two?", options: ["a", "b", "c"], correctIndex: 2 },
]
"#;

/// A structurally equal target verifies clean
#[test]
fn test_verify_withMatchingCorpora_shouldReportNothing() {
    let dir = common::create_temp_dir().unwrap();
    let source = common::create_test_file(dir.path(), "en.quiz", SOURCE).unwrap();
    let target = common::create_test_file(
        dir.path(),
        "es.quiz",
        r#"topic: [
  { id: "q1", text: "uno?", options: ["x", "y"], correctIndex: 0 },
  { id: "q2", text: "dos?", options: ["x", "y", "z"], correctIndex: 2 },
]
"#,
    )
    .unwrap();

    let violations = verify_files(&source, &target, "en", "es").unwrap();
    assert!(violations.is_empty());
}

/// A missing id is reported
#[test]
fn test_verify_withMissingId_shouldReportMissingInTarget() {
    let dir = common::create_temp_dir().unwrap();
    let source = common::create_test_file(dir.path(), "en.quiz", SOURCE).unwrap();
    let target = common::create_test_file(
        dir.path(),
        "es.quiz",
        r#"topic: [
  { id: "q1", text: "uno?", options: ["x", "y"], correctIndex: 0 },
]
"#,
    )
    .unwrap();

    let violations = verify_files(&source, &target, "en", "es").unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].id, "q2");
    assert_eq!(violations[0].kind, ViolationKind::MissingInTarget);
}

/// An id only present in the target is reported
#[test]
fn test_verify_withExtraneousId_shouldReportUnexpectedInTarget() {
    let dir = common::create_temp_dir().unwrap();
    let source = common::create_test_file(dir.path(), "en.quiz", SOURCE).unwrap();
    let target = common::create_test_file(
        dir.path(),
        "es.quiz",
        r#"topic: [
  { id: "q1", text: "uno?", options: ["x", "y"], correctIndex: 0 },
  { id: "q2", text: "dos?", options: ["x", "y", "z"], correctIndex: 2 },
  { id: "q9", text: "extra?", options: ["x"], correctIndex: 0 },
]
"#,
    )
    .unwrap();

    let violations = verify_files(&source, &target, "en", "es").unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].id, "q9");
    assert_eq!(violations[0].kind, ViolationKind::UnexpectedInTarget);
}

/// A wrong option count on a shared id is reported
#[test]
fn test_verify_withOptionCountMismatch_shouldReportViolation() {
    let dir = common::create_temp_dir().unwrap();
    let source = common::create_test_file(dir.path(), "en.quiz", SOURCE).unwrap();
    let target = common::create_test_file(
        dir.path(),
        "es.quiz",
        r#"topic: [
  { id: "q1", text: "uno?", options: ["x", "y"], correctIndex: 0 },
  { id: "q2", text: "dos?", options: ["x", "y"], correctIndex: 1 },
]
"#,
    )
    .unwrap();

    let violations = verify_files(&source, &target, "en", "es").unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].id, "q2");
    assert_eq!(violations[0].kind, ViolationKind::OptionCountMismatch);
}

/// A target record block that does not parse is reported with a
/// topic-positional label
#[test]
fn test_verify_withUnparseableTargetBlock_shouldReportViolation() {
    let dir = common::create_temp_dir().unwrap();
    let source = common::create_test_file(dir.path(), "en.quiz", SOURCE).unwrap();
    let target = common::create_test_file(
        dir.path(),
        "es.quiz",
        r#"topic: [
  { id: "q1", text: "uno?", options: ["x", "y"], correctIndex: 0 },
  { this block is broken },
]
"#,
    )
    .unwrap();

    let violations = verify_files(&source, &target, "en", "es").unwrap();
    assert!(violations
        .iter()
        .any(|v| v.kind == ViolationKind::UnparseableTarget && v.id == "topic[1]"));
    // q2 is also missing, since the broken block has no id
    assert!(violations
        .iter()
        .any(|v| v.kind == ViolationKind::MissingInTarget && v.id == "q2"));
}

/// A missing target file verifies like an empty corpus
#[test]
fn test_verify_withMissingTargetFile_shouldReportAllIdsMissing() {
    let dir = common::create_temp_dir().unwrap();
    let source = common::create_test_file(dir.path(), "en.quiz", SOURCE).unwrap();
    let target = dir.path().join("es.quiz");

    let violations = verify_files(&source, &target, "en", "es").unwrap();
    assert_eq!(violations.len(), 2);
    assert!(violations
        .iter()
        .all(|v| v.kind == ViolationKind::MissingInTarget));
}

/// The verifier reads from disk and never mutates the files
#[test]
fn test_verify_withAnyInput_shouldNotMutateFiles() {
    let dir = common::create_temp_dir().unwrap();
    let source = common::create_test_file(dir.path(), "en.quiz", SOURCE).unwrap();
    let target = common::create_test_file(dir.path(), "es.quiz", "garbage content").unwrap();

    let _ = verify_files(&source, &target, "en", "es").unwrap();

    assert_eq!(std::fs::read_to_string(&source).unwrap(), SOURCE);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "garbage content");
}

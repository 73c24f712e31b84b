//! End-to-end tests for the check/fix pipeline
//!
//! Drives the built binary against realistic documents: a messy document
//! fails the gate, --fix repairs the mechanical findings, and the fixed
//! document passes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn doclify_cmd() -> Command {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("Failed to find workspace root");
    let bin_path = workspace_root.join("target/debug/doclify");
    Command::new(bin_path)
}

const MESSY_DOC: &str = "\
# Release Notes
##Changes:
- added feature one
- added feature two
see http://example.com/changelog for details
";

#[test]
fn messy_document_fails_then_fix_makes_it_pass() {
    let dir = tempdir().unwrap();
    let doc = dir.path().join("notes.md");
    fs::write(&doc, MESSY_DOC).unwrap();

    // The mechanical defects here are all warnings, so the failing run
    // needs strict mode.
    doclify_cmd()
        .arg("check")
        .arg("--strict")
        .arg(&doc)
        .assert()
        .code(1);

    doclify_cmd()
        .arg("check")
        .arg("--fix")
        .arg("--strict")
        .arg(&doc)
        .assert()
        .success();

    let fixed = fs::read_to_string(&doc).unwrap();
    assert!(fixed.contains("## Changes"));
    assert!(fixed.contains("<https://example.com/changelog>"));

    doclify_cmd()
        .arg("check")
        .arg("--strict")
        .arg(&doc)
        .assert()
        .success();
}

#[test]
fn suppression_directives_work_end_to_end() {
    let dir = tempdir().unwrap();
    let doc = dir.path().join("doc.md");
    fs::write(
        &doc,
        "# Title\n\n<!-- doclify-disable-next-line insecure-link -->\nsee http://legacy.test\n",
    )
    .unwrap();

    let output = doclify_cmd()
        .arg("check")
        .arg("--format")
        .arg("json")
        .arg(&doc)
        .assert()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let warnings = parsed["files"][0]["findings"]["warnings"].as_array().unwrap();
    assert!(warnings.iter().all(|w| w["code"] != "insecure-link"));
}

#[test]
fn disable_file_silences_a_whole_document() {
    let dir = tempdir().unwrap();
    let doc = dir.path().join("doc.md");
    fs::write(
        &doc,
        "<!-- doclify-disable-file -->\nno heading, TODO everywhere, http://x\n",
    )
    .unwrap();

    doclify_cmd()
        .arg("check")
        .arg("--strict")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 errors and 0 warnings"));
}

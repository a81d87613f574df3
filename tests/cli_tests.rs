//! Integration tests for the CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const EOL: &str = if cfg!(windows) { "\r\n" } else { "\n" };

fn separator() -> String {
    format!("{EOL}{EOL}******************************{EOL}{EOL}")
}

fn write_package(dir: &Path, manifest: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("package.json"), manifest).unwrap();
}

/// npm project `app` with three installed production dependencies
fn sample_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_package(
        root,
        r#"{"name": "app", "version": "1.0.0",
            "dependencies": {"left-pad": "^1.0.0", "Bravo": "^3.0.0", "alpha": "^2.0.0"},
            "devDependencies": {"test-only": "*"}}"#,
    );

    let left_pad = root.join("node_modules/left-pad");
    write_package(
        &left_pad,
        r#"{"name": "left-pad", "version": "1.0.0", "license": "WTFPL",
            "author": {"name": "Steve", "email": "steve@x.com"},
            "repository": "git+https://github.com/stevemao/left-pad.git"}"#,
    );
    fs::write(left_pad.join("LICENSE.md"), "WTFPL full text").unwrap();

    let alpha = root.join("node_modules/alpha");
    write_package(
        &alpha,
        r#"{"name": "alpha", "version": "2.0.0", "license": "MIT",
            "author": "Alpha Dev <alpha@x.com>"}"#,
    );
    fs::write(alpha.join("readme.txt"), "Released under MIT").unwrap();

    write_package(
        &root.join("node_modules/Bravo"),
        r#"{"name": "Bravo", "version": "3.0.0", "license": "ISC",
            "repository": {"type": "git", "url": "https://github.com/b/bravo"},
            "maintainers": [{"name": "M1", "email": "m1@x.com"}, {"name": "M2"}]}"#,
    );

    write_package(
        &root.join("node_modules/test-only"),
        r#"{"name": "test-only", "version": "0.0.1", "license": "MIT"}"#,
    );

    tmp
}

fn run(project: &Path, output: &Path) -> assert_cmd::assert::Assert {
    Command::cargo_bin("oss-attribution")
        .unwrap()
        .arg("-b")
        .arg(project)
        .arg("-o")
        .arg(output)
        .assert()
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("oss-attribution").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("third-party attribution"))
        .stdout(predicate::str::contains("--base-dir"))
        .stdout(predicate::str::contains("--output-dir"));
}

#[test]
fn test_cli_generates_sorted_report() {
    let project = sample_project();
    let output = TempDir::new().unwrap();

    run(project.path(), output.path())
        .success()
        .stdout(predicate::str::contains("Generated attribution for 3 packages"));

    let report = fs::read_to_string(output.path().join("attribution.txt")).unwrap();
    let blocks: Vec<&str> = report.split(&separator()).collect();

    assert_eq!(
        blocks,
        vec![
            [
                "alpha",
                "2.0.0",
                "license: MIT",
                "authors: Alpha Dev <alpha@x.com>"
            ]
            .join(EOL),
            [
                "Bravo",
                "3.0.0 <https://github.com/b/bravo>",
                "license: ISC",
                "authors: M1 <m1@x.com>, M2"
            ]
            .join(EOL),
            [
                "left-pad",
                "1.0.0 <https://github.com/stevemao/left-pad>",
                "WTFPL full text"
            ]
            .join(EOL),
        ]
    );

    let infos: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output.path().join("licenseInfos.json")).unwrap(),
    )
    .unwrap();
    let keys: Vec<&String> = infos.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["Bravo", "alpha", "left-pad"]);
    assert!(infos.get("app").is_none());
    assert!(infos.get("test-only").is_none());
    assert_eq!(infos["left-pad"]["authors"], "Steve <steve@x.com>");
}

#[test]
fn test_cli_include_dev() {
    let project = sample_project();
    let output = TempDir::new().unwrap();

    Command::cargo_bin("oss-attribution")
        .unwrap()
        .arg("--baseDir")
        .arg(project.path())
        .arg("--outputDir")
        .arg(output.path())
        .arg("--include-dev")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated attribution for 4 packages"));

    let report = fs::read_to_string(output.path().join("attribution.txt")).unwrap();
    assert!(report.contains("test-only"));
}

#[test]
fn test_cli_applies_header_and_overrides() {
    let project = sample_project();
    let output = TempDir::new().unwrap();
    fs::write(output.path().join("header.txt"), "THIRD PARTY NOTICES").unwrap();
    fs::write(
        output.path().join("overrides.json"),
        r#"{"alpha": {"ignore": true}, "Bravo": {"licenseText": "ISC custom text"}}"#,
    )
    .unwrap();

    run(project.path(), output.path()).success();

    let report = fs::read_to_string(output.path().join("attribution.txt")).unwrap();
    assert!(report.starts_with(&format!("THIRD PARTY NOTICES{EOL}{EOL}Bravo{EOL}")));
    assert!(report.contains("ISC custom text"));
    assert!(!report.contains("alpha"));
    assert_eq!(report.matches("******************************").count(), 1);

    let infos: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output.path().join("licenseInfos.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(infos["alpha"]["ignore"], true);
    assert_eq!(infos["alpha"]["license"], "MIT");
    assert_eq!(infos["left-pad"]["licenseText"], "WTFPL full text");
}

#[test]
fn test_cli_malformed_overrides_exit_code() {
    let project = sample_project();
    let output = TempDir::new().unwrap();
    fs::write(output.path().join("overrides.json"), "{ not: valid json").unwrap();

    run(project.path(), output.path())
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to process overrides"));

    assert!(!output.path().join("attribution.txt").exists());
}

#[test]
fn test_cli_without_installed_dependencies() {
    let project = TempDir::new().unwrap();
    write_package(
        project.path(),
        r#"{"name": "app", "version": "1.0.0", "dependencies": {"left-pad": "*"}}"#,
    );
    let output = TempDir::new().unwrap();
    let out_dir = output.path().join("oss-attribution");

    run(project.path(), &out_dir)
        .success()
        .stdout(predicate::str::contains("Generated attribution for 0 packages"));

    assert_eq!(fs::read_to_string(out_dir.join("attribution.txt")).unwrap(), "");
    assert_eq!(fs::read_to_string(out_dir.join("licenseInfos.json")).unwrap(), "{}");
}

#[test]
fn test_cli_merges_multiple_roots() {
    let first = sample_project();
    let second = TempDir::new().unwrap();
    write_package(
        second.path(),
        r#"{"name": "other", "version": "0.1.0", "dependencies": {"charlie": "*"}}"#,
    );
    write_package(
        &second.path().join("node_modules/charlie"),
        r#"{"name": "charlie", "version": "1.1.0", "license": "Apache-2.0"}"#,
    );
    let output = TempDir::new().unwrap();

    Command::cargo_bin("oss-attribution")
        .unwrap()
        .arg("-b")
        .arg(first.path())
        .arg(second.path())
        .arg("-o")
        .arg(output.path())
        .assert()
        .success();

    let infos: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output.path().join("licenseInfos.json")).unwrap(),
    )
    .unwrap();
    assert!(infos.get("charlie").is_some());
    assert!(infos.get("left-pad").is_some());
    assert!(infos.get("app").is_none());
    // scanned projects are never attributed as their own dependencies
    assert!(infos.get("other").is_none());
    assert_eq!(infos.as_object().unwrap().len(), 4);
}

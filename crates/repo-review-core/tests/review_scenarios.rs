// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;

use repo_review_adapters::RealFs;
use repo_review_core::fixtures::Fixtures;
use repo_review_core::pytest::PytestDialect;
use repo_review_core::{run_review, ReviewError, ReviewSettings};
use repo_review_model::{ReviewReport, RuleStatus};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, text: &str) {
    let target = root.join(relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(target, text).expect("write");
}

fn status(report: &ReviewReport, id: &str) -> RuleStatus {
    report
        .results
        .iter()
        .find(|row| row.id.as_str() == id)
        .unwrap_or_else(|| panic!("{id} missing from report"))
        .status
}

fn review(root: &Path) -> ReviewReport {
    run_review(&RealFs, root, &ReviewSettings::default()).expect("review")
}

#[test]
fn well_configured_repository_passes_core_rules() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write(
        root,
        "pyproject.toml",
        r#"
[build-system]
requires = ["hatchling"]
build-backend = "hatchling.build"

[project]
name = "demo"
requires-python = ">=3.9"
license = "MIT"

[tool.pytest.ini_options]
minversion = "6.0"
addopts = ["-ra", "--strict-config", "--strict-markers"]
xfail_strict = true
filterwarnings = ["error"]
log_cli_level = "INFO"
testpaths = ["tests"]

[tool.ruff.lint]
extend-select = ["B", "I", "UP"]
"#,
    );
    write(root, "README.md", "# demo\n");
    write(root, "LICENSE", "MIT\n");
    write(root, "docs/index.md", "docs\n");
    write(root, "tests/test_demo.py", "def test():\n    pass\n");

    let report = review(root);
    for id in [
        "PY001", "PY002", "PY003", "PY004", "PY005", "PP002", "PP003", "PP004", "PP301", "PP302",
        "PP303", "PP304", "PP305", "PP306", "PP307", "PP308", "PP309", "RF001", "RF002", "RF101",
        "RF102", "RF103",
    ] {
        assert_eq!(status(&report, id), RuleStatus::Pass, "{id}");
    }
    assert_eq!(status(&report, "RF003"), RuleStatus::Skip);
    let general = report
        .families
        .values()
        .find(|family| family.name == "General")
        .expect("general family");
    assert_eq!(
        general.description.as_deref(),
        Some("- Detected build backend: `hatchling.build`\n- SPDX license expression: `MIT`")
    );
}

#[test]
fn pp002_fails_without_build_backend() {
    let tmp = TempDir::new().expect("tempdir");
    write(
        tmp.path(),
        "pyproject.toml",
        "[build-system]\nrequires = [\"setuptools\"]\n",
    );
    let report = review(tmp.path());
    assert_eq!(status(&report, "PY001"), RuleStatus::Pass);
    assert_eq!(status(&report, "PP002"), RuleStatus::Fail);
}

#[test]
fn noxfile_without_needs_version_fails_nox101() {
    let tmp = TempDir::new().expect("tempdir");
    write(tmp.path(), "noxfile.py", "import nox\n\n@nox.session\ndef tests(session):\n    pass\n");
    let report = review(tmp.path());
    assert_eq!(status(&report, "PY007"), RuleStatus::Pass);
    assert_eq!(status(&report, "NOX101"), RuleStatus::Fail);
}

#[test]
fn all_selects_every_rule_group() {
    let tmp = TempDir::new().expect("tempdir");
    write(tmp.path(), "ruff.toml", "[lint]\nselect = [\"ALL\"]\n");
    let report = review(tmp.path());
    for id in ["RF101", "RF102", "RF103"] {
        assert_eq!(status(&report, id), RuleStatus::Pass, "{id}");
    }
    let ruff = report
        .families
        .values()
        .find(|family| family.name == "Ruff")
        .expect("ruff family");
    assert_eq!(
        ruff.description.as_deref(),
        Some("- All recommended rule groups selected")
    );
}

#[test]
fn missing_readthedocs_config_is_not_a_failure() {
    let tmp = TempDir::new().expect("tempdir");
    let report = run_review(
        &RealFs,
        tmp.path(),
        &ReviewSettings {
            select: vec!["RTD101".to_string()],
            ignore: Vec::new(),
        },
    )
    .expect("review");
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].status, RuleStatus::Skip);
    assert_eq!(report.summary.failed, 0);
}

#[test]
fn renamed_precommit_repository_is_redirected() {
    let tmp = TempDir::new().expect("tempdir");
    write(
        tmp.path(),
        ".pre-commit-config.yaml",
        "repos:\n  - repo: https://github.com/psf/black\n    rev: 24.1.0\n    hooks:\n      - id: black\n",
    );
    let report = review(tmp.path());
    let pc110 = report
        .results
        .iter()
        .find(|row| row.id.as_str() == "PC110")
        .expect("PC110");
    assert_eq!(pc110.status, RuleStatus::Fail);
    assert_eq!(
        pc110.message.as_deref(),
        Some("Use `https://github.com/psf/black-pre-commit-mirror` instead of `https://github.com/psf/black` in `.pre-commit-config.yaml`")
    );
}

#[test]
fn dedicated_pytest_file_outranks_pyproject() {
    let tmp = TempDir::new().expect("tempdir");
    write(
        tmp.path(),
        "pyproject.toml",
        "[tool.pytest.ini_options]\nminversion = \"6\"\n",
    );
    write(tmp.path(), "pytest.toml", "[pytest]\nxfail_strict = true\n");
    let fixtures = Fixtures::new(&RealFs, tmp.path());
    let pytest = fixtures.pytest().expect("pytest");
    assert_eq!(pytest.dialect, PytestDialect::PytestToml);
    assert!(pytest.contains("xfail_strict"));
    assert!(!pytest.contains("minversion"));
}

#[test]
fn analysis_is_idempotent() {
    let tmp = TempDir::new().expect("tempdir");
    write(tmp.path(), "pyproject.toml", "[project]\nname = \"demo\"\n");
    write(tmp.path(), "noxfile.py", "import nox\nnox.needs_version = \">=2024\"\n");
    assert_eq!(review(tmp.path()), review(tmp.path()));
}

#[test]
fn malformed_workflow_aborts_the_review() {
    let tmp = TempDir::new().expect("tempdir");
    write(tmp.path(), ".github/workflows/ci.yml", "on: [push\n");
    let err = run_review(&RealFs, tmp.path(), &ReviewSettings::default()).expect_err("malformed");
    assert!(matches!(err, ReviewError::Config(_)));
    assert!(err.to_string().contains("ci.yml"));
}

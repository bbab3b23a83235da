// SPDX-License-Identifier: Apache-2.0

use repo_review_model::CheckOutcome;

use super::{RuleKind, RuleSpec};
use crate::error::ConfigParseError;
use crate::fixtures::{FixtureName, Fixtures, NOXFILE, PRECOMMIT_CONFIG};
use crate::lookup;

const FAMILY: &str = "general";

fn py001(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(fixtures.is_file("pyproject.toml").into())
}

fn py002(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok((fixtures.is_file("README.md") || fixtures.is_file("README.rst")).into())
}

fn py003(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let found = fixtures.root_entries()?.iter().any(|entry| {
        ["LICENSE", "LICENCE", "COPYING"]
            .iter()
            .any(|stem| entry.name.contains(stem))
    });
    Ok(found.into())
}

fn py004(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let found = fixtures
        .root_entries()?
        .iter()
        .any(|entry| entry.is_dir && entry.name.contains("doc"));
    Ok(found.into())
}

fn py005(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let is_test_dir = |entry: &repo_review_adapters::DirEntry| {
        entry.is_dir && entry.name.starts_with("test")
    };
    if fixtures.root_entries()?.iter().any(is_test_dir) {
        return Ok(CheckOutcome::Pass);
    }
    for package in fixtures.list_dir("src")?.into_iter().filter(|entry| entry.is_dir) {
        if fixtures
            .list_dir(&format!("src/{}", package.name))?
            .iter()
            .any(is_test_dir)
        {
            return Ok(CheckOutcome::Pass);
        }
    }
    Ok(CheckOutcome::Fail)
}

fn py006(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(fixtures.is_file(PRECOMMIT_CONFIG).into())
}

fn has_task_runner_table(pyproject: &serde_json::Value) -> bool {
    let direct = [
        &["tool", "hatch", "envs"][..],
        &["tool", "spin"],
        &["tool", "tox"],
        &["tool", "pixi", "tasks"],
    ]
    .iter()
    .any(|keys| lookup::has(pyproject, keys));
    direct
        || lookup::table(pyproject, &["tool", "pixi", "feature"]).is_some_and(|features| {
            features
                .values()
                .any(|feature| lookup::has(feature, &["tasks"]))
        })
}

fn py007(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    if [NOXFILE, "tox.ini", "pixi.toml"]
        .iter()
        .any(|file| fixtures.is_file(file))
    {
        return Ok(CheckOutcome::Pass);
    }
    Ok(fixtures
        .pyproject()?
        .is_some_and(has_task_runner_table)
        .into())
}

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "PY001",
        family: FAMILY,
        title: "Has a pyproject.toml",
        requires: &[],
        docs: "All projects should have a `pyproject.toml` file to support a modern build system and support wheel installs properly.",
        guide: None,
        needs: &[],
        kind: RuleKind::Predicate(py001),
    },
    RuleSpec {
        id: "PY002",
        family: FAMILY,
        title: "Has a README.(md|rst) file",
        requires: &[],
        docs: "Projects must have a readme file.",
        guide: None,
        needs: &[],
        kind: RuleKind::Predicate(py002),
    },
    RuleSpec {
        id: "PY003",
        family: FAMILY,
        title: "Has a LICENSE* file",
        requires: &[],
        docs: "Projects must have a license file (`LICENSE*`, `LICENCE*` or `COPYING*`).",
        guide: None,
        needs: &[FixtureName::Root],
        kind: RuleKind::Predicate(py003),
    },
    RuleSpec {
        id: "PY004",
        family: FAMILY,
        title: "Has docs folder",
        requires: &[],
        docs: "Projects must have documentation in a folder called docs (disable if not applicable).",
        guide: None,
        needs: &[FixtureName::Root],
        kind: RuleKind::Predicate(py004),
    },
    RuleSpec {
        id: "PY005",
        family: FAMILY,
        title: "Has tests folder",
        requires: &[],
        docs: "Projects must have a folder called `test*`, either at the top level or inside `src/<package>`.",
        guide: None,
        needs: &[FixtureName::Root],
        kind: RuleKind::Predicate(py005),
    },
    RuleSpec {
        id: "PY006",
        family: FAMILY,
        title: "Has pre-commit config",
        requires: &[],
        docs: "Projects must have a `.pre-commit-config.yaml` file.",
        guide: Some("style"),
        needs: &[],
        kind: RuleKind::Predicate(py006),
    },
    RuleSpec {
        id: "PY007",
        family: FAMILY,
        title: "Supports an easy task runner (nox, tox, pixi, etc.)",
        requires: &[],
        docs: "Projects must have a `noxfile.py`, `tox.ini`, or `tool.hatch.envs`/`tool.spin`/`tool.tox` in `pyproject.toml` to encourage new contributors.",
        guide: Some("tasks"),
        needs: &[FixtureName::Pyproject],
        kind: RuleKind::Predicate(py007),
    },
];

#[cfg(test)]
mod tests {
    use crate::checks::check;
    use repo_review_adapters::FakeFs;
    use repo_review_model::CheckOutcome;

    #[test]
    fn py001_needs_pyproject() {
        assert!(check("PY001", &FakeFs::new().with_file("pyproject.toml", "")).is_pass());
        assert_eq!(check("PY001", &FakeFs::new()), CheckOutcome::Fail);
    }

    #[test]
    fn py002_accepts_markdown_or_rst() {
        assert!(check("PY002", &FakeFs::new().with_file("README.rst", "x")).is_pass());
        assert!(!check("PY002", &FakeFs::new().with_file("README.txt", "x")).is_pass());
    }

    #[test]
    fn py003_accepts_license_spellings() {
        for name in ["LICENSE", "LICENSE.md", "LICENCE", "COPYING"] {
            assert!(check("PY003", &FakeFs::new().with_file(name, "")).is_pass(), "{name}");
        }
        assert!(!check("PY003", &FakeFs::new().with_file("README.md", "")).is_pass());
    }

    #[test]
    fn py004_needs_a_docs_directory() {
        assert!(check("PY004", &FakeFs::new().with_dir("docs")).is_pass());
        assert!(!check("PY004", &FakeFs::new().with_file("docs.md", "")).is_pass());
    }

    #[test]
    fn py005_finds_top_level_or_package_tests() {
        assert!(check("PY005", &FakeFs::new().with_dir("tests")).is_pass());
        assert!(check("PY005", &FakeFs::new().with_dir("src/pkg/tests")).is_pass());
        assert!(!check("PY005", &FakeFs::new().with_dir("src/pkg")).is_pass());
    }

    #[test]
    fn py007_accepts_runner_files_and_tables() {
        assert!(check("PY007", &FakeFs::new().with_file("tox.ini", "")).is_pass());
        let hatch = FakeFs::new().with_file("pyproject.toml", "[tool.hatch.envs.default]\n");
        assert!(check("PY007", &hatch).is_pass());
        let pixi = FakeFs::new().with_file(
            "pyproject.toml",
            "[tool.pixi.feature.test.tasks]\ntest = \"pytest\"\n",
        );
        assert!(check("PY007", &pixi).is_pass());
        let nothing = FakeFs::new().with_file("pyproject.toml", "[tool.pixi.feature.test]\n");
        assert!(!check("PY007", &nothing).is_pass());
    }
}

// SPDX-License-Identifier: Apache-2.0

use repo_review_model::CheckOutcome;
use serde_json::Value;

use super::{RuleKind, RuleSpec};
use crate::error::ConfigParseError;
use crate::fixtures::{FixtureName, Fixtures};
use crate::lookup;

const FAMILY: &str = "ruff";
const GUIDE: Option<&str> = Some("style");

/// Settings that moved under `[tool.ruff.lint]`.
///
/// `exclude` is absent: the outer one also stops config discovery.
pub const RUFF_LINT: &[&str] = &[
    "allowed-confusables",
    "dummy-variable-rgx",
    "explicit-preview-rules",
    "extend-fixable",
    "extend-ignore",
    "extend-per-file-ignores",
    "extend-safe-fixes",
    "extend-select",
    "extend-unfixable",
    "extend-unsafe-fixes",
    "external",
    "fixable",
    "flake8-annotations",
    "flake8-bandit",
    "flake8-bugbear",
    "flake8-builtins",
    "flake8-comprehensions",
    "flake8-copyright",
    "flake8-errmsg",
    "flake8-gettext",
    "flake8-implicit-str-concat",
    "flake8-import-conventions",
    "flake8-pytest-style",
    "flake8-quotes",
    "flake8-self",
    "flake8-tidy-imports",
    "flake8-type-checking",
    "flake8-unused-arguments",
    "ignore",
    "ignore-init-module-imports",
    "isort",
    "logger-objects",
    "mccabe",
    "pep8-naming",
    "per-file-ignores",
    "pycodestyle",
    "pydocstyle",
    "pyflakes",
    "pylint",
    "pyupgrade",
    "select",
    "task-tags",
    "typing-modules",
    "unfixable",
];

const DEPRECATED: &[(&str, &str)] = &[
    ("extend-unfixable", "unfixable"),
    ("extend-ignore", "ignore"),
];

fn rf001(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(fixtures.ruff()?.is_some().into())
}

fn rf002(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let pyproject = fixtures.pyproject()?;
    let requires_python = pyproject
        .and_then(|tree| lookup::str_at(tree, &["project", "requires-python"]))
        .is_some();
    let inline_target = pyproject
        .is_some_and(|tree| lookup::has(tree, &["tool", "ruff", "target-version"]));
    Ok(match (requires_python, inline_target) {
        (true, true) => CheckOutcome::from_message(
            "You have both Ruff's `target-version` and `project.requires-python`. You only need the latter.",
        ),
        (true, false) => CheckOutcome::Pass,
        (false, _) => fixtures
            .ruff()?
            .is_some_and(|ruff| lookup::has(ruff, &["target-version"]))
            .into(),
    })
}

fn rf003(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    if !fixtures.is_dir("src") {
        return Ok(CheckOutcome::NotApplicable);
    }
    let redundant = fixtures
        .ruff()?
        .and_then(|ruff| lookup::path(ruff, &["src"]))
        .is_some_and(|src| *src == Value::Array(vec![Value::from("src")]));
    Ok((!redundant).into())
}

fn rf201(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let Some(ruff) = fixtures.ruff()? else {
        return Ok(CheckOutcome::Fail);
    };
    let messages = DEPRECATED
        .iter()
        .filter(|(old, _)| lookup::has(ruff, &[*old]) || lookup::has(ruff, &["lint", *old]))
        .map(|(old, new)| format!("`{old}` deprecated, use `{new}` instead (identical)"))
        .collect::<Vec<_>>();
    Ok(CheckOutcome::from_message(messages.join("\n\n")))
}

fn rf202(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let Some(ruff) = fixtures.ruff()?.and_then(Value::as_object) else {
        return Ok(CheckOutcome::Fail);
    };
    let mut misplaced = ruff
        .keys()
        .filter(|key| RUFF_LINT.contains(&key.as_str()))
        .collect::<Vec<_>>();
    misplaced.sort();
    let messages = misplaced
        .into_iter()
        .map(|key| format!("`{key}` should be set as `lint.{key}` instead"))
        .collect::<Vec<_>>();
    Ok(CheckOutcome::from_message(messages.join("\n\n")))
}

const RUFF: &[FixtureName] = &[FixtureName::Ruff];

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "RF001",
        family: FAMILY,
        title: "Has Ruff config",
        requires: &[],
        docs: "Must have `[tool.ruff]` section in `pyproject.toml` or `ruff.toml`/`.ruff.toml`.",
        guide: GUIDE,
        needs: RUFF,
        kind: RuleKind::Predicate(rf001),
    },
    RuleSpec {
        id: "RF002",
        family: FAMILY,
        title: "Target version must be set",
        requires: &["RF001"],
        docs: "Must select a minimum version to target. Affects pyupgrade, isort, and others. Will be inferred from `project.requires-python`.",
        guide: GUIDE,
        needs: &[FixtureName::Pyproject, FixtureName::Ruff],
        kind: RuleKind::Predicate(rf002),
    },
    RuleSpec {
        id: "RF003",
        family: FAMILY,
        title: "src directory doesn't need to be specified anymore (0.6+)",
        requires: &["RF001"],
        docs: "Ruff now (0.6+) looks in the src directory by default. The src setting doesn't need to be specified if it's just set to `[\"src\"]`.",
        guide: GUIDE,
        needs: RUFF,
        kind: RuleKind::Predicate(rf003),
    },
    RuleSpec {
        id: "RF101",
        family: FAMILY,
        title: "Bugbear must be selected",
        requires: &["RF001"],
        docs: "",
        guide: GUIDE,
        needs: RUFF,
        kind: RuleKind::RuffSelect {
            code: "B",
            name: "flake8-bugbear",
        },
    },
    RuleSpec {
        id: "RF102",
        family: FAMILY,
        title: "isort must be selected",
        requires: &["RF001"],
        docs: "",
        guide: GUIDE,
        needs: RUFF,
        kind: RuleKind::RuffSelect {
            code: "I",
            name: "isort",
        },
    },
    RuleSpec {
        id: "RF103",
        family: FAMILY,
        title: "pyupgrade must be selected",
        requires: &["RF001"],
        docs: "",
        guide: GUIDE,
        needs: RUFF,
        kind: RuleKind::RuffSelect {
            code: "UP",
            name: "pyupgrade",
        },
    },
    RuleSpec {
        id: "RF201",
        family: FAMILY,
        title: "Avoid using deprecated config settings",
        requires: &["RF001"],
        docs: "Replace deprecated Ruff settings with their identical replacements.",
        guide: None,
        needs: RUFF,
        kind: RuleKind::Predicate(rf201),
    },
    RuleSpec {
        id: "RF202",
        family: FAMILY,
        title: "Use (new) lint config section",
        requires: &["RF001"],
        docs: "Linter settings belong in `[tool.ruff.lint]`, not at the top level of the Ruff config.",
        guide: None,
        needs: RUFF,
        kind: RuleKind::Predicate(rf202),
    },
];

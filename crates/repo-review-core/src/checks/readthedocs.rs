// SPDX-License-Identifier: Apache-2.0

use repo_review_model::CheckOutcome;
use serde_json::Value;

use super::{RuleKind, RuleSpec};
use crate::error::ConfigParseError;
use crate::fixtures::{FixtureName, Fixtures, READTHEDOCS_FILES};
use crate::lookup;

const FAMILY: &str = "docs";
const GUIDE: Option<&str> = Some("docs");
const READTHEDOCS: &[FixtureName] = &[FixtureName::Readthedocs];

/// Runs `check` against the config, or reports not applicable without one.
fn with_config(
    fixtures: &Fixtures<'_>,
    check: impl FnOnce(&Value) -> bool,
) -> Result<CheckOutcome, ConfigParseError> {
    Ok(match fixtures.readthedocs()? {
        Some(config) => check(config).into(),
        None => CheckOutcome::NotApplicable,
    })
}

fn rtd100(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(READTHEDOCS_FILES
        .iter()
        .any(|file| fixtures.is_file(file))
        .into())
}

fn rtd101(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    with_config(fixtures, |config| {
        lookup::path(config, &["version"])
            .and_then(Value::as_i64)
            .is_some_and(|version| version >= 2)
    })
}

fn rtd102(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    with_config(fixtures, |config| lookup::has(config, &["build", "os"]))
}

fn rtd103(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    with_config(fixtures, |config| {
        lookup::has(config, &["build", "tools", "python"])
    })
}

fn rtd104(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    with_config(fixtures, |config| {
        [
            &["build", "commands"][..],
            &["sphinx", "configuration"],
            &["mkdocs", "configuration"],
        ]
        .iter()
        .any(|keys| lookup::has(config, keys))
    })
}

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "RTD100",
        family: FAMILY,
        title: "Uses ReadTheDocs (pyproject config)",
        requires: &[],
        docs: "Should have a .readthedocs.yaml file in the root of the repository. Modern ReadTheDocs requires (or will require soon) this file.",
        guide: GUIDE,
        needs: &[],
        kind: RuleKind::Predicate(rtd100),
    },
    RuleSpec {
        id: "RTD101",
        family: FAMILY,
        title: "You have to set the RTD version number to 2",
        requires: &["RTD100"],
        docs: "You must set `version: 2` in the `.readthedocs.yaml` file.",
        guide: GUIDE,
        needs: READTHEDOCS,
        kind: RuleKind::Predicate(rtd101),
    },
    RuleSpec {
        id: "RTD102",
        family: FAMILY,
        title: "You have to set the RTD build image",
        requires: &["RTD100"],
        docs: "You must set `build: os: ubuntu-22.04` or similar in the `.readthedocs.yaml` file. Otherwise, you will get old, unsupported versions of software for backward compatibility.",
        guide: GUIDE,
        needs: READTHEDOCS,
        kind: RuleKind::Predicate(rtd102),
    },
    RuleSpec {
        id: "RTD103",
        family: FAMILY,
        title: "You have to set the RTD python version",
        requires: &["RTD102"],
        docs: "You must set `build: tools: python: \"3.12\"` or similar in the `.readthedocs.yaml` file for a Python project.",
        guide: GUIDE,
        needs: READTHEDOCS,
        kind: RuleKind::Predicate(rtd103),
    },
    RuleSpec {
        id: "RTD104",
        family: FAMILY,
        title: "You have to specify a build configuration now for readthedocs.",
        requires: &["RTD100"],
        docs: "You must set `sphinx: configuration:`, `mkdocs: configuration:` or `build: commands:`.",
        guide: GUIDE,
        needs: READTHEDOCS,
        kind: RuleKind::Predicate(rtd104),
    },
];

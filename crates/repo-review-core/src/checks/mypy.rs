// SPDX-License-Identifier: Apache-2.0

use repo_review_model::CheckOutcome;

use super::{RuleKind, RuleSpec};
use crate::error::ConfigParseError;
use crate::fixtures::{FixtureName, Fixtures};
use crate::lookup;

const FAMILY: &str = "mypy";
const MYPY: [&str; 2] = ["tool", "mypy"];

fn mypy_flag(fixtures: &Fixtures<'_>, flag: &str) -> Result<CheckOutcome, ConfigParseError> {
    let enabled = fixtures
        .pyproject()?
        .and_then(|pyproject| lookup::bool_at(pyproject, &[MYPY[0], MYPY[1], flag]))
        .unwrap_or(false);
    Ok(enabled.into())
}

fn enables_error_code(
    fixtures: &Fixtures<'_>,
    code: &str,
) -> Result<CheckOutcome, ConfigParseError> {
    let enabled = fixtures.pyproject()?.is_some_and(|pyproject| {
        lookup::str_list(pyproject, &[MYPY[0], MYPY[1], "enable_error_code"]).contains(&code)
    });
    Ok(enabled.into())
}

fn pp200(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(fixtures
        .pyproject()?
        .is_some_and(|pyproject| lookup::has(pyproject, &MYPY))
        .into())
}

fn pp201(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    mypy_flag(fixtures, "strict")
}

fn pp202(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    mypy_flag(fixtures, "show_error_codes")
}

fn pp203(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    mypy_flag(fixtures, "warn_unreachable")
}

fn pp204(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    enables_error_code(fixtures, "ignore-without-code")
}

fn pp205(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    enables_error_code(fixtures, "redundant-expr")
}

fn pp206(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    enables_error_code(fixtures, "truthy-bool")
}

const PYPROJECT: &[FixtureName] = &[FixtureName::Pyproject];

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "PP200",
        family: FAMILY,
        title: "Uses MyPy (pyproject config)",
        requires: &["PY001"],
        docs: "Must have `tool.mypy` section in `pyproject.toml`. Other forms of configuration are not supported by this check.",
        guide: Some("style"),
        needs: PYPROJECT,
        kind: RuleKind::Predicate(pp200),
    },
    RuleSpec {
        id: "PP201",
        family: FAMILY,
        title: "MyPy strict mode",
        requires: &["PP200"],
        docs: "Must have `strict = true` in the mypy config. MyPy is best with strict or nearly strict configuration. If you are happy with the strictness of your settings already, ignore this check.",
        guide: Some("style"),
        needs: PYPROJECT,
        kind: RuleKind::Predicate(pp201),
    },
    RuleSpec {
        id: "PP202",
        family: FAMILY,
        title: "MyPy show error codes",
        requires: &["PP200"],
        docs: "Must have `show_error_codes = true`. This will print helpful error codes for users that clarify why something fails if you need to skip it.",
        guide: Some("style"),
        needs: PYPROJECT,
        kind: RuleKind::Predicate(pp202),
    },
    RuleSpec {
        id: "PP203",
        family: FAMILY,
        title: "MyPy warn unreachable",
        requires: &["PP200"],
        docs: "Must have `warn_unreachable = true` to pass this check. There are occasionally false positives, so it's okay to ignore this check. But try it first - it can catch real bugs too.",
        guide: Some("style"),
        needs: PYPROJECT,
        kind: RuleKind::Predicate(pp203),
    },
    RuleSpec {
        id: "PP204",
        family: FAMILY,
        title: "MyPy enables ignore-without-code",
        requires: &["PP200"],
        docs: "Must have `\"ignore-without-code\"` in `enable_error_code = [...]`. This will force all skips in your project to include the error code, which makes them more readable, and avoids skipping something unintended.",
        guide: Some("style"),
        needs: PYPROJECT,
        kind: RuleKind::Predicate(pp204),
    },
    RuleSpec {
        id: "PP205",
        family: FAMILY,
        title: "MyPy enables redundant-expr",
        requires: &["PP200"],
        docs: "Must have `\"redundant-expr\"` in `enable_error_code = [...]`. This helps catch useless lines of code, like checking the same condition twice.",
        guide: Some("style"),
        needs: PYPROJECT,
        kind: RuleKind::Predicate(pp205),
    },
    RuleSpec {
        id: "PP206",
        family: FAMILY,
        title: "MyPy enables truthy-bool",
        requires: &["PP200"],
        docs: "Must have `\"truthy-bool\"` in `enable_error_code = []`. This catches mistakes in using a value as truthy if it cannot be falsey.",
        guide: Some("style"),
        needs: PYPROJECT,
        kind: RuleKind::Predicate(pp206),
    },
];

#[cfg(test)]
mod tests {
    use crate::checks::check;
    use repo_review_adapters::FakeFs;
    use repo_review_model::CheckOutcome;

    #[test]
    fn strict_configuration_passes_everything() {
        let fs = FakeFs::new().with_file(
            "pyproject.toml",
            r#"
[tool.mypy]
strict = true
show_error_codes = true
warn_unreachable = true
enable_error_code = ["ignore-without-code", "redundant-expr", "truthy-bool"]
"#,
        );
        for id in ["PP200", "PP201", "PP202", "PP203", "PP204", "PP205", "PP206"] {
            assert!(check(id, &fs).is_pass(), "{id}");
        }
    }

    #[test]
    fn flags_must_be_literally_true() {
        let fs = FakeFs::new().with_file(
            "pyproject.toml",
            "[tool.mypy]\nstrict = \"yes\"\nenable_error_code = \"truthy-bool\"\n",
        );
        assert!(check("PP200", &fs).is_pass());
        assert_eq!(check("PP201", &fs), CheckOutcome::Fail);
        assert_eq!(check("PP206", &fs), CheckOutcome::Fail);
    }

    #[test]
    fn pp200_needs_the_table() {
        let fs = FakeFs::new().with_file("pyproject.toml", "[tool.ruff]\n");
        assert_eq!(check("PP200", &fs), CheckOutcome::Fail);
    }
}

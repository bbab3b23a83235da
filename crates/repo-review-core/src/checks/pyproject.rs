// SPDX-License-Identifier: Apache-2.0

use repo_review_model::CheckOutcome;
use serde_json::Value;

use super::{RuleKind, RuleSpec};
use crate::constraint::has_upper_cap;
use crate::error::ConfigParseError;
use crate::fixtures::{FixtureName, Fixtures};
use crate::lookup;
use crate::pytest::PytestDialect;

const FAMILY: &str = "pyproject";

fn pp002(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let complete = fixtures.pyproject()?.is_some_and(|pyproject| {
        lookup::path(pyproject, &["build-system", "requires"]).is_some_and(Value::is_array)
            && lookup::str_at(pyproject, &["build-system", "build-backend"]).is_some()
    });
    Ok(complete.into())
}

fn pp003(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let Some(requires) = fixtures
        .pyproject()?
        .and_then(|pyproject| lookup::path(pyproject, &["build-system", "requires"]))
        .and_then(Value::as_array)
    else {
        return Ok(CheckOutcome::Fail);
    };
    let pulls_wheel = requires
        .iter()
        .filter_map(Value::as_str)
        .any(|requirement| requirement.trim_start().starts_with("wheel"));
    Ok((!pulls_wheel).into())
}

fn pp004(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(match fixtures.requires_python()? {
        None => CheckOutcome::NotApplicable,
        Some(constraint) => (!has_upper_cap(constraint)).into(),
    })
}

fn pp301(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok((fixtures.pytest()?.dialect != PytestDialect::NotFound).into())
}

/// Leading major version of a `minversion` value written as text or number.
fn major_version(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v.trunc() as u64)),
        Value::String(text) => text
            .trim()
            .split('.')
            .next()
            .and_then(|major| major.parse().ok()),
        _ => None,
    }
}

fn pp302(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let recent = fixtures
        .pytest()?
        .get("minversion")
        .and_then(major_version)
        .is_some_and(|major| major >= 6);
    Ok(recent.into())
}

fn pp303(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(fixtures.pytest()?.contains("testpaths").into())
}

fn pp304(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let pytest = fixtures.pytest()?;
    Ok((pytest.contains("log_level") || pytest.contains("log_cli_level")).into())
}

fn pp305(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(fixtures.pytest()?.contains("xfail_strict").into())
}

fn has_addopt(fixtures: &Fixtures<'_>, flag: &str) -> Result<bool, ConfigParseError> {
    Ok(fixtures
        .pytest()?
        .list_option("addopts")
        .iter()
        .any(|option| option == flag))
}

fn pp306(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(has_addopt(fixtures, "--strict-config")?.into())
}

fn pp307(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(has_addopt(fixtures, "--strict-markers")?.into())
}

fn pp308(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let summary = fixtures
        .pytest()?
        .list_option("addopts")
        .iter()
        .any(|option| option.starts_with("-r"));
    Ok(summary.into())
}

fn pp309(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(fixtures.pytest()?.contains("filterwarnings").into())
}

const PYTEST: &[FixtureName] = &[FixtureName::Pytest];

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "PP002",
        family: FAMILY,
        title: "Has a proper build-system table",
        requires: &["PY001"],
        docs: "Must have `build-system.requires` *and* `build-system.build-backend`. Both should be present in all modern packages.",
        guide: Some("packaging-simple"),
        needs: &[FixtureName::Pyproject],
        kind: RuleKind::Predicate(pp002),
    },
    RuleSpec {
        id: "PP003",
        family: FAMILY,
        title: "Does not list wheel as a build-dep",
        requires: &["PY001"],
        docs: "Do not include `\"wheel\"` in your `build-system.requires`, setuptools does this via PEP 517 already. Setuptools will also only require this for actual wheel builds, and might have version limits.",
        guide: Some("packaging-classic"),
        needs: &[FixtureName::Pyproject],
        kind: RuleKind::Predicate(pp003),
    },
    RuleSpec {
        id: "PP004",
        family: FAMILY,
        title: "Does not upper cap Python requires",
        requires: &["PY001"],
        docs: "You should never upper cap your Python requirement. This is rarely correct, and can break the resolver when installing old versions of your package.",
        guide: Some("packaging-simple"),
        needs: &[FixtureName::RequiresPython],
        kind: RuleKind::Predicate(pp004),
    },
    RuleSpec {
        id: "PP301",
        family: FAMILY,
        title: "Has pytest in pyproject",
        requires: &["PY001"],
        docs: "Must have a `[tool.pytest]` (or `[tool.pytest.ini_options]`) configuration section in pyproject.toml, or a `pytest.toml` file. If you must have it somewhere else (such as to support `pytest<6`), ignore this check.",
        guide: Some("pytest"),
        needs: PYTEST,
        kind: RuleKind::Predicate(pp301),
    },
    RuleSpec {
        id: "PP302",
        family: FAMILY,
        title: "Sets a minimum pytest to at least 6",
        requires: &["PP301"],
        docs: "Must have a `minversion=`, and must be at least 6 (first version to support `pyproject.toml` configuration).",
        guide: Some("pytest"),
        needs: PYTEST,
        kind: RuleKind::Predicate(pp302),
    },
    RuleSpec {
        id: "PP303",
        family: FAMILY,
        title: "Sets the test paths",
        requires: &["PP301"],
        docs: "The `testpaths` setting should be set to a reasonable default.",
        guide: Some("pytest"),
        needs: PYTEST,
        kind: RuleKind::Predicate(pp303),
    },
    RuleSpec {
        id: "PP304",
        family: FAMILY,
        title: "Sets the log level in pytest",
        requires: &["PP301"],
        docs: "`log_level` should be set. This will allow logs to be displayed on failures.",
        guide: Some("pytest"),
        needs: PYTEST,
        kind: RuleKind::Predicate(pp304),
    },
    RuleSpec {
        id: "PP305",
        family: FAMILY,
        title: "Specifies xfail_strict",
        requires: &["PP301"],
        docs: "`xfail_strict` should be set. You can manually specify if a check should be strict when setting each xfail.",
        guide: Some("pytest"),
        needs: PYTEST,
        kind: RuleKind::Predicate(pp305),
    },
    RuleSpec {
        id: "PP306",
        family: FAMILY,
        title: "Specifies strict config",
        requires: &["PP301"],
        docs: "`--strict-config` should be in `addopts = [...]`. This forces an error if a config setting is misspelled.",
        guide: Some("pytest"),
        needs: PYTEST,
        kind: RuleKind::Predicate(pp306),
    },
    RuleSpec {
        id: "PP307",
        family: FAMILY,
        title: "Specifies strict markers",
        requires: &["PP301"],
        docs: "`--strict-markers` should be in `addopts = [...]`. This forces all markers to be specified in config, avoiding misspellings.",
        guide: Some("pytest"),
        needs: PYTEST,
        kind: RuleKind::Predicate(pp307),
    },
    RuleSpec {
        id: "PP308",
        family: FAMILY,
        title: "Specifies useful pytest summary",
        requires: &["PP301"],
        docs: "An explicit summary flag like `-ra` should be in `addopts = [...]` (print summary of all fails/errors).",
        guide: Some("pytest"),
        needs: PYTEST,
        kind: RuleKind::Predicate(pp308),
    },
    RuleSpec {
        id: "PP309",
        family: FAMILY,
        title: "Filter warnings specified",
        requires: &["PP301"],
        docs: "`filterwarnings` must be set (probably to at least `[\"error\"]`). Python will hide important warnings otherwise, like deprecations.",
        guide: Some("pytest"),
        needs: PYTEST,
        kind: RuleKind::Predicate(pp309),
    },
];

#[cfg(test)]
mod tests {
    use super::major_version;
    use crate::checks::check;
    use repo_review_adapters::FakeFs;
    use repo_review_model::CheckOutcome;
    use serde_json::json;

    fn with_pyproject(text: &str) -> FakeFs {
        FakeFs::new().with_file("pyproject.toml", text)
    }

    #[test]
    fn pp002_needs_requires_and_backend() {
        let complete = with_pyproject(
            "[build-system]\nrequires = [\"hatchling\"]\nbuild-backend = \"hatchling.build\"\n",
        );
        assert!(check("PP002", &complete).is_pass());
        let partial = with_pyproject("[build-system]\nrequires = [\"hatchling\"]\n");
        assert_eq!(check("PP002", &partial), CheckOutcome::Fail);
    }

    #[test]
    fn pp003_rejects_wheel() {
        let wheel = with_pyproject("[build-system]\nrequires = [\"setuptools\", \"wheel>=0.40\"]\n");
        assert!(!check("PP003", &wheel).is_pass());
        let clean = with_pyproject("[build-system]\nrequires = [\"setuptools\"]\n");
        assert!(check("PP003", &clean).is_pass());
        assert!(!check("PP003", &with_pyproject("[project]\n")).is_pass());
    }

    #[test]
    fn pp004_flags_capped_constraints_only() {
        let capped = with_pyproject("[project]\nrequires-python = \">=3.9,<4\"\n");
        assert!(!check("PP004", &capped).is_pass());
        let open = with_pyproject("[project]\nrequires-python = \">=3.9\"\n");
        assert!(check("PP004", &open).is_pass());
        assert!(check("PP004", &with_pyproject("")).is_not_applicable());
    }

    #[test]
    fn pytest_rules_read_the_legacy_table() {
        let fs = with_pyproject(
            r#"
[tool.pytest.ini_options]
minversion = "6.0"
testpaths = ["tests"]
log_cli_level = "INFO"
xfail_strict = true
addopts = "-ra --strict-config --strict-markers"
filterwarnings = ["error"]
"#,
        );
        for id in [
            "PP301", "PP302", "PP303", "PP304", "PP305", "PP306", "PP307", "PP308", "PP309",
        ] {
            assert!(check(id, &fs).is_pass(), "{id}");
        }
    }

    #[test]
    fn pytest_rules_fail_on_an_empty_table() {
        let fs = with_pyproject("[tool.pytest]\n");
        assert!(check("PP301", &fs).is_pass());
        for id in ["PP302", "PP303", "PP304", "PP305", "PP306", "PP307", "PP308", "PP309"] {
            assert_eq!(check(id, &fs), CheckOutcome::Fail, "{id}");
        }
    }

    #[test]
    fn pp301_fails_without_any_pytest_config() {
        assert_eq!(check("PP301", &with_pyproject("[project]\n")), CheckOutcome::Fail);
    }

    #[test]
    fn minversion_accepts_text_and_numbers() {
        assert_eq!(major_version(&json!("7.2")), Some(7));
        assert_eq!(major_version(&json!(6)), Some(6));
        assert_eq!(major_version(&json!(5.4)), Some(5));
        assert_eq!(major_version(&json!("latest")), None);
        assert_eq!(major_version(&json!(true)), None);
    }
}

// SPDX-License-Identifier: Apache-2.0

use repo_review_model::CheckOutcome;
use serde_json::Value;

use super::{RuleKind, RuleSpec};
use crate::error::ConfigParseError;
use crate::fixtures::{FixtureName, Fixtures};
use crate::lookup;
use crate::script::ScriptInfo;

const FAMILY: &str = "noxfile";
const GUIDE: Option<&str> = Some("tasks");
const NOXFILE: &[FixtureName] = &[FixtureName::Noxfile];

fn with_noxfile(
    fixtures: &Fixtures<'_>,
    check: impl FnOnce(&ScriptInfo) -> bool,
) -> Result<CheckOutcome, ConfigParseError> {
    Ok(match fixtures.noxfile()? {
        Some(noxfile) => check(noxfile).into(),
        None => CheckOutcome::NotApplicable,
    })
}

fn nox101(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    with_noxfile(fixtures, |noxfile| noxfile.assigns_attribute("nox.needs_version"))
}

fn nox102(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    with_noxfile(fixtures, |noxfile| {
        noxfile.assigns_attribute("nox.options.default_venv_backend")
    })
}

fn nox103(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    with_noxfile(fixtures, |noxfile| {
        !noxfile.assigns_attribute("nox.options.sessions")
    })
}

fn nox201(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    with_noxfile(fixtures, |noxfile| {
        lookup::path(noxfile.script(), &["dependencies"]).is_some_and(Value::is_array)
    })
}

fn nox202(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    with_noxfile(fixtures, |noxfile| !noxfile.shebang().is_empty())
}

fn nox203(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    with_noxfile(fixtures, ScriptInfo::has_main_guard)
}

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "NOX101",
        family: FAMILY,
        title: "Sets minimum nox version",
        requires: &["PY007"],
        docs: "Set a minimum nox version:\n\n```python\nnox.needs_version = \"2025.10.14\"\n```",
        guide: GUIDE,
        needs: NOXFILE,
        kind: RuleKind::Predicate(nox101),
    },
    RuleSpec {
        id: "NOX102",
        family: FAMILY,
        title: "Sets venv backend",
        requires: &["PY007"],
        docs: "The default venv backend should be set, ideally to `uv|virtualenv`:\n\n```python\nnox.options.default_venv_backend = \"uv|virtualenv\"\n```",
        guide: GUIDE,
        needs: NOXFILE,
        kind: RuleKind::Predicate(nox102),
    },
    RuleSpec {
        id: "NOX103",
        family: FAMILY,
        title: "Set default per session instead of session list",
        requires: &["PY007"],
        docs: "You should use `default=` in each session instead of setting a global list.",
        guide: GUIDE,
        needs: NOXFILE,
        kind: RuleKind::Predicate(nox103),
    },
    RuleSpec {
        id: "NOX201",
        family: FAMILY,
        title: "Set a script block with dependencies in your noxfile",
        requires: &["PY007"],
        docs: "You should have a script block with nox in it, for example:\n\n```toml\n# /// script\n# dependencies = [\"nox\"]\n# ///\n```",
        guide: GUIDE,
        needs: NOXFILE,
        kind: RuleKind::Predicate(nox201),
    },
    RuleSpec {
        id: "NOX202",
        family: FAMILY,
        title: "Has a shebang line",
        requires: &["PY007"],
        docs: "You should have a shebang line at the top of your noxfile.py, for example:\n\n```python\n#!/usr/bin/env -S uv run --script\n```",
        guide: GUIDE,
        needs: NOXFILE,
        kind: RuleKind::Predicate(nox202),
    },
    RuleSpec {
        id: "NOX203",
        family: FAMILY,
        title: "Provide a main block to run nox",
        requires: &["PY007"],
        docs: "You should have a main block at the bottom of your noxfile.py, for example:\n\n```python\nif __name__ == \"__main__\":\n    nox.main()\n```",
        guide: GUIDE,
        needs: NOXFILE,
        kind: RuleKind::Predicate(nox203),
    },
];

// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use repo_review_model::FamilyDescriptor;
use serde_json::Value;

use crate::constraint::resolve_version_constraint;
use crate::lookup;
use crate::ruff::{rule_selection, RECOMMENDED_GROUPS};

/// Display name and ordering for every family, highest priority first.
pub const FAMILIES: &[(&str, &str, i32)] = &[
    ("general", "General", -3),
    ("pyproject", "PyProject", -2),
    ("github", "GitHub Actions", 0),
    ("pre-commit", "Pre-commit", 0),
    ("mypy", "MyPy", 0),
    ("ruff", "Ruff", 0),
    ("docs", "Documentation", 0),
    ("setupcfg", "setup.cfg", 0),
    ("noxfile", "Nox", 0),
];

fn general_description(pyproject: Option<&Value>) -> String {
    let backend = pyproject
        .and_then(|tree| lookup::str_at(tree, &["build-system", "build-backend"]))
        .unwrap_or("MISSING");
    let mut lines = vec![format!("- Detected build backend: `{backend}`")];
    if let Some(expression) = pyproject.and_then(|tree| lookup::str_at(tree, &["project", "license"])) {
        lines.push(format!("- SPDX license expression: `{expression}`"));
    } else {
        let licenses = pyproject
            .map(|tree| lookup::str_list(tree, &["project", "classifiers"]))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|classifier| classifier.strip_prefix("License :: "))
            .map(|license| license.strip_prefix("OSI Approved :: ").unwrap_or(license))
            .collect::<Vec<_>>();
        if !licenses.is_empty() {
            lines.push(format!("- Detected license(s): {}", licenses.join(", ")));
        }
    }
    lines.join("\n")
}

fn ruff_description(ruff: &Value) -> String {
    let selected = rule_selection(ruff);
    let missing = RECOMMENDED_GROUPS
        .iter()
        .filter(|code| !selected.contains(**code))
        .map(|code| format!("`{code}`"))
        .collect::<Vec<_>>();
    if missing.is_empty() {
        "- All recommended rule groups selected".to_string()
    } else {
        format!("- Missing recommended rule groups: {}", missing.join(", "))
    }
}

/// Family metadata for a report, with descriptions derived from the repository.
pub fn describe_families(
    pyproject: Option<&Value>,
    ruff: Option<&Value>,
    setupcfg: Option<&Value>,
) -> BTreeMap<&'static str, FamilyDescriptor> {
    let constraint = resolve_version_constraint(pyproject, setupcfg);
    FAMILIES
        .iter()
        .map(|&(id, name, order)| {
            let description = match id {
                "general" => Some(general_description(pyproject)),
                "pyproject" => constraint
                    .as_deref()
                    .map(|constraint| format!("- Python requires: `{constraint}`")),
                "ruff" => ruff.map(ruff_description),
                _ => None,
            };
            (
                id,
                FamilyDescriptor {
                    name: name.to_string(),
                    order,
                    description,
                },
            )
        })
        .collect()
}

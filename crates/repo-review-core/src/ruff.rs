// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::path::Path;

use repo_review_adapters::Fs;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ConfigParseError;
use crate::locate::locate;
use crate::lookup;

/// Dedicated Ruff config files, highest priority first.
pub const RUFF_CONFIG_FILES: [&str; 2] = [".ruff.toml", "ruff.toml"];

/// Built-in Ruff linters: rule-group prefix and linter name.
pub const RUFF_LINTERS: &[(&str, &str)] = &[
    ("A", "flake8-builtins"),
    ("AIR", "Airflow"),
    ("ANN", "flake8-annotations"),
    ("ARG", "flake8-unused-arguments"),
    ("ASYNC", "flake8-async"),
    ("B", "flake8-bugbear"),
    ("BLE", "flake8-blind-except"),
    ("C4", "flake8-comprehensions"),
    ("C90", "mccabe"),
    ("COM", "flake8-commas"),
    ("CPY", "flake8-copyright"),
    ("D", "pydocstyle"),
    ("DJ", "flake8-django"),
    ("DOC", "pydoclint"),
    ("DTZ", "flake8-datetimez"),
    ("E", "pycodestyle errors"),
    ("EM", "flake8-errmsg"),
    ("ERA", "eradicate"),
    ("EXE", "flake8-executable"),
    ("F", "Pyflakes"),
    ("FA", "flake8-future-annotations"),
    ("FAST", "FastAPI"),
    ("FBT", "flake8-boolean-trap"),
    ("FIX", "flake8-fixme"),
    ("FLY", "flynt"),
    ("FURB", "refurb"),
    ("G", "flake8-logging-format"),
    ("I", "isort"),
    ("ICN", "flake8-import-conventions"),
    ("INP", "flake8-no-pep420"),
    ("INT", "flake8-gettext"),
    ("ISC", "flake8-implicit-str-concat"),
    ("LOG", "flake8-logging"),
    ("N", "pep8-naming"),
    ("NPY", "NumPy-specific rules"),
    ("PD", "pandas-vet"),
    ("PERF", "Perflint"),
    ("PGH", "pygrep-hooks"),
    ("PIE", "flake8-pie"),
    ("PL", "Pylint"),
    ("PT", "flake8-pytest-style"),
    ("PTH", "flake8-use-pathlib"),
    ("PYI", "flake8-pyi"),
    ("Q", "flake8-quotes"),
    ("RET", "flake8-return"),
    ("RSE", "flake8-raise"),
    ("RUF", "Ruff-specific rules"),
    ("S", "flake8-bandit"),
    ("SIM", "flake8-simplify"),
    ("SLF", "flake8-self"),
    ("SLOT", "flake8-slots"),
    ("T10", "flake8-debugger"),
    ("T20", "flake8-print"),
    ("TC", "flake8-type-checking"),
    ("TD", "flake8-todos"),
    ("TID", "flake8-tidy-imports"),
    ("TRY", "tryceratops"),
    ("UP", "pyupgrade"),
    ("W", "pycodestyle warnings"),
    ("YTT", "flake8-2020"),
];

/// Groups that only matter when the matching library is used.
pub const LIBRARY_GROUPS: &[&str] = &["AIR", "ASYNC", "DJ", "FAST", "INT", "NPY", "PD"];

/// Groups that are opinionated enough to be opt-in.
pub const SPECIALTY_GROUPS: &[&str] = &[
    "A", "ANN", "C90", "COM", "CPY", "D", "DOC", "ERA", "FBT", "FIX", "INP", "N", "S", "SLF",
    "TD", "TID",
];

/// Groups recommended by the development guide.
pub const RECOMMENDED_GROUPS: &[&str] = &[
    "ARG", "B", "C4", "DTZ", "EM", "EXE", "FA", "FLY", "G", "I", "ICN", "ISC", "LOG", "NPY",
    "PERF", "PGH", "PIE", "PL", "PT", "PTH", "PYI", "RET", "RUF", "SIM", "SLOT", "T20", "TC",
    "UP", "YTT",
];

/// Right-biased deep merge; recursion happens only when both sides are tables.
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged: Map<String, Value> = base.clone();
            for (key, value) in overlay {
                let next = match merged.get(key) {
                    Some(existing) => merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Effective Ruff configuration for a repository.
///
/// A dedicated file wins over `tool.ruff`; it is layered over `tool.ruff`
/// only when it declares `extend = "pyproject.toml"`.
pub fn resolve_lint_config(
    pyproject: Option<&Value>,
    fs: &dyn Fs,
    root: &Path,
) -> Result<Option<Value>, ConfigParseError> {
    let in_manifest = pyproject.and_then(|tree| lookup::path(tree, &["tool", "ruff"]));
    for file in RUFF_CONFIG_FILES {
        let Some(contents) = locate(fs, root, file)? else {
            continue;
        };
        if lookup::str_at(&contents, &["extend"]) == Some("pyproject.toml") {
            debug!(file, "ruff config extends pyproject.toml");
            let base = in_manifest.cloned().unwrap_or_else(|| Value::Object(Map::new()));
            return Ok(Some(merge(&base, &contents)));
        }
        return Ok(Some(contents));
    }
    Ok(in_manifest.cloned())
}

fn collect_codes(table: &Value, out: &mut BTreeSet<String>) {
    for key in ["select", "extend-select"] {
        for code in lookup::str_list(table, &[key]) {
            out.insert(code.to_string());
        }
    }
}

/// Selected rule-group codes across the `lint` table and the flat legacy layout.
///
/// `ALL` is replaced by every built-in linter prefix.
pub fn rule_selection(lint: &Value) -> BTreeSet<String> {
    let mut selected = BTreeSet::new();
    if let Some(nested) = lookup::path(lint, &["lint"]) {
        collect_codes(nested, &mut selected);
    }
    collect_codes(lint, &mut selected);
    if selected.remove("ALL") {
        selected.extend(RUFF_LINTERS.iter().map(|(code, _)| (*code).to_string()));
    }
    selected
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuffRuleReport {
    pub selected: Vec<(&'static str, &'static str)>,
    pub library: Vec<(&'static str, &'static str)>,
    pub specialized: Vec<(&'static str, &'static str)>,
    pub unselected: Vec<(&'static str, &'static str)>,
}

/// Buckets the built-in linters by selection state.
///
/// Pyflakes and pycodestyle are on by default and never listed.
pub fn ruff_rule_report(selected: &BTreeSet<String>) -> RuffRuleReport {
    let mut report = RuffRuleReport::default();
    for &(code, name) in RUFF_LINTERS {
        if matches!(code, "F" | "E" | "W") {
            continue;
        }
        let bucket = if selected.contains(code) {
            &mut report.selected
        } else if LIBRARY_GROUPS.contains(&code) {
            &mut report.library
        } else if SPECIALTY_GROUPS.contains(&code) {
            &mut report.specialized
        } else {
            &mut report.unselected
        };
        bucket.push((code, name));
    }
    report
}

pub fn render_rule_lines(rows: &[(&str, &str)]) -> String {
    rows.iter()
        .map(|(code, name)| format!("  {:<10} # {name}", format!("\"{code}\",")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_review_adapters::FakeFs;
    use serde_json::json;

    const ROOT: &str = "/repo";

    #[test]
    fn merge_is_right_biased_and_recursive() {
        let base = json!({"line-length": 88, "lint": {"select": ["B"], "ignore": ["E1"]}});
        let overlay = json!({"lint": {"select": ["I"]}, "src": ["src"]});
        assert_eq!(
            merge(&base, &overlay),
            json!({
                "line-length": 88,
                "lint": {"select": ["I"], "ignore": ["E1"]},
                "src": ["src"]
            })
        );
    }

    #[test]
    fn merge_replaces_non_table_with_table() {
        let merged = merge(&json!({"lint": 3}), &json!({"lint": {"select": []}}));
        assert_eq!(merged, json!({"lint": {"select": []}}));
    }

    #[test]
    fn dedicated_file_wins_verbatim() {
        let pyproject = json!({"tool": {"ruff": {"line-length": 100}}});
        let fs = FakeFs::new().with_file("ruff.toml", "[lint]\nselect = [\"B\"]\n");
        let resolved = resolve_lint_config(Some(&pyproject), &fs, Path::new(ROOT))
            .expect("resolve")
            .expect("present");
        assert_eq!(resolved, json!({"lint": {"select": ["B"]}}));
    }

    #[test]
    fn dot_ruff_toml_takes_priority() {
        let fs = FakeFs::new()
            .with_file(".ruff.toml", "line-length = 1\n")
            .with_file("ruff.toml", "line-length = 2\n");
        let resolved = resolve_lint_config(None, &fs, Path::new(ROOT))
            .expect("resolve")
            .expect("present");
        assert_eq!(resolved["line-length"], json!(1));
    }

    #[test]
    fn extend_layers_over_pyproject() {
        let pyproject = json!({"tool": {"ruff": {"line-length": 100, "lint": {"select": ["B"]}}}});
        let fs = FakeFs::new().with_file(
            "ruff.toml",
            "extend = \"pyproject.toml\"\n[lint]\nextend-select = [\"I\"]\n",
        );
        let resolved = resolve_lint_config(Some(&pyproject), &fs, Path::new(ROOT))
            .expect("resolve")
            .expect("present");
        assert_eq!(
            resolved,
            json!({
                "extend": "pyproject.toml",
                "line-length": 100,
                "lint": {"select": ["B"], "extend-select": ["I"]}
            })
        );
    }

    #[test]
    fn falls_back_to_pyproject_then_none() {
        let pyproject = json!({"tool": {"ruff": {"src": ["src"]}}});
        let fs = FakeFs::new();
        let resolved = resolve_lint_config(Some(&pyproject), &fs, Path::new(ROOT)).expect("resolve");
        assert_eq!(resolved, Some(json!({"src": ["src"]})));
        let missing = resolve_lint_config(Some(&json!({})), &fs, Path::new(ROOT)).expect("resolve");
        assert_eq!(missing, None);
    }

    #[test]
    fn selection_unions_all_layouts() {
        let lint = json!({
            "select": ["E"],
            "extend-select": ["UP"],
            "lint": {"select": ["B"], "extend-select": ["I"]}
        });
        let selected = rule_selection(&lint);
        assert_eq!(
            selected.into_iter().collect::<Vec<_>>(),
            vec!["B", "E", "I", "UP"]
        );
    }

    #[test]
    fn all_expands_to_every_linter() {
        let selected = rule_selection(&json!({"lint": {"select": ["ALL"]}}));
        assert_eq!(selected.len(), RUFF_LINTERS.len());
        assert!(selected.contains("B"));
        assert!(selected.contains("YTT"));
        assert!(!selected.contains("ALL"));
    }

    #[test]
    fn report_buckets_unselected_groups() {
        let selected = rule_selection(&json!({"lint": {"extend-select": ["B", "I"]}}));
        let report = ruff_rule_report(&selected);
        assert_eq!(report.selected, vec![("B", "flake8-bugbear"), ("I", "isort")]);
        assert!(report.library.contains(&("NPY", "NumPy-specific rules")));
        assert!(report.specialized.contains(&("D", "pydocstyle")));
        assert!(report.unselected.contains(&("UP", "pyupgrade")));
        assert!(!report.unselected.iter().any(|(code, _)| *code == "F"));
    }

    #[test]
    fn rule_lines_are_copy_paste_ready() {
        let text = render_rule_lines(&[("UP", "pyupgrade")]);
        assert_eq!(text, "  \"UP\",      # pyupgrade");
    }
}

// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use repo_review_adapters::RealFs;
use repo_review_core::ruff::{render_rule_lines, rule_selection, ruff_rule_report};
use repo_review_core::{
    all_rules, exit_code_for_report, explain_output, list_output, render_json, render_text,
    run_review, Fixtures, ReviewSettings, EXIT_CONFIG_ERROR,
};
use tracing::debug;

use crate::cli::{FormatArg, ReviewArgs};

/// Failure surfaced to the user on stderr with a dedicated exit code.
#[derive(Debug)]
pub(crate) struct CommandError {
    pub message: String,
    pub code: i32,
}

impl CommandError {
    fn new(message: impl Into<String>, code: i32) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

fn require_directory(path: &Path) -> Result<(), CommandError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(CommandError::new(
            format!("{} is not a directory", path.display()),
            1,
        ))
    }
}

pub(crate) fn run_review_command(args: ReviewArgs) -> Result<(String, i32), CommandError> {
    require_directory(&args.path)?;
    let overrides = ReviewSettings {
        select: args.select,
        ignore: args.ignore,
    };
    debug!(?overrides, "command-line selection");
    let report = run_review(&RealFs, &args.path, &overrides)
        .map_err(|err| CommandError::new(err.to_string(), EXIT_CONFIG_ERROR))?;
    let rendered = match args.format {
        FormatArg::Text => render_text(&report),
        FormatArg::Json => render_json(&report).map_err(|err| CommandError::new(err, 1))?,
    };
    Ok((rendered, exit_code_for_report(&report)))
}

pub(crate) fn run_list() -> Result<(String, i32), CommandError> {
    let rules = all_rules().collect::<Vec<_>>();
    Ok((list_output(&rules), 0))
}

pub(crate) fn run_explain(rule_id: &str) -> Result<(String, i32), CommandError> {
    let rendered = explain_output(rule_id).map_err(|err| CommandError::new(err, 1))?;
    Ok((rendered, 0))
}

fn section(title: &str, rows: &[(&str, &str)]) -> String {
    if rows.is_empty() {
        format!("{title}:\n  (none)")
    } else {
        format!("{title}:\n{}", render_rule_lines(rows))
    }
}

/// Lists the built-in Ruff rule groups by selection state.
///
/// Exits 1 when the repository has no Ruff configuration and 2 when the
/// configuration selects nothing.
pub(crate) fn run_ruff_rules(path: &Path) -> Result<(String, i32), CommandError> {
    require_directory(path)?;
    let fixtures = Fixtures::new(&RealFs, path);
    let ruff = fixtures
        .ruff()
        .map_err(|err| CommandError::new(err.to_string(), EXIT_CONFIG_ERROR))?
        .ok_or_else(|| {
            CommandError::new(
                "could not find a ruff config (.ruff.toml, ruff.toml, or pyproject.toml)",
                1,
            )
        })?;
    let selected = rule_selection(ruff);
    if selected.is_empty() {
        return Err(CommandError::new("no rules selected", 2));
    }
    let report = ruff_rule_report(&selected);
    let mut blocks = vec![
        section("Selected", &report.selected),
        section("Library specific", &report.library),
        section("Specialized", &report.specialized),
    ];
    if !report.unselected.is_empty() {
        blocks.push(section(
            "Unselected (copy and paste ready)",
            &report.unselected,
        ));
    }
    Ok((blocks.join("\n\n"), 0))
}

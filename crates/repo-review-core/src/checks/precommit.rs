// SPDX-License-Identifier: Apache-2.0

use repo_review_model::CheckOutcome;
use serde_json::Value;

use super::{RepoSpec, RuleKind, RuleSpec};
use crate::error::ConfigParseError;
use crate::fixtures::{FixtureName, Fixtures};
use crate::lookup;

const FAMILY: &str = "pre-commit";
const GUIDE: Option<&str> = Some("style");
const PRECOMMIT: &[FixtureName] = &[FixtureName::Precommit];

const RUFF_PRE_COMMIT: &str = "https://github.com/astral-sh/ruff-pre-commit";

/// The configured `repos` entry for a repository URL, matched case-insensitively.
fn find_repo<'a>(precommit: &'a Value, url: &str) -> Option<&'a Value> {
    lookup::tables(precommit, &["repos"]).find(|item| {
        lookup::str_at(item, &["repo"]).is_some_and(|repo| repo.eq_ignore_ascii_case(url))
    })
}

fn hook_id(hook: &Value) -> Option<&str> {
    lookup::str_at(hook, &["id"])
}

fn pc191(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let Some(repo) = fixtures
        .precommit()?
        .and_then(|precommit| find_repo(precommit, RUFF_PRE_COMMIT))
    else {
        return Ok(CheckOutcome::Fail);
    };
    let fixing_hook = lookup::tables(repo, &["hooks"]).find(|hook| {
        matches!(hook_id(hook), Some("ruff" | "ruff-check"))
            && lookup::str_list(hook, &["args"]).contains(&"--fix")
    });
    let Some(hook) = fixing_hook else {
        return Ok(CheckOutcome::NotApplicable);
    };
    if lookup::str_list(hook, &["args"]).contains(&"--show-fixes") {
        return Ok(CheckOutcome::Pass);
    }
    let configured = fixtures
        .ruff()?
        .and_then(|ruff| lookup::bool_at(ruff, &["show-fixes"]))
        .unwrap_or(false);
    Ok(if configured {
        CheckOutcome::Pass
    } else {
        CheckOutcome::from_message("If `--fix` is present, `--show-fixes` must be too")
    })
}

fn pc192(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let Some(repo) = fixtures
        .precommit()?
        .and_then(|precommit| find_repo(precommit, RUFF_PRE_COMMIT))
    else {
        return Ok(CheckOutcome::NotApplicable);
    };
    let ids = lookup::tables(repo, &["hooks"])
        .filter_map(hook_id)
        .collect::<Vec<_>>();
    Ok(if ids.contains(&"ruff") {
        CheckOutcome::from_message(
            "Use `ruff-check` instead of `ruff` as the hook id in `.pre-commit-config.yaml`",
        )
    } else if ids.contains(&"ruff-check") {
        CheckOutcome::Pass
    } else {
        CheckOutcome::NotApplicable
    })
}

fn has_ci_key(fixtures: &Fixtures<'_>, key: &str) -> Result<CheckOutcome, ConfigParseError> {
    Ok(fixtures
        .precommit()?
        .is_some_and(|precommit| lookup::has(precommit, &["ci", key]))
        .into())
}

fn pc901(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    has_ci_key(fixtures, "autoupdate_commit_msg")
}

fn pc902(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    has_ci_key(fixtures, "autofix_commit_msg")
}

fn pc903(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    has_ci_key(fixtures, "autoupdate_schedule")
}

const fn repo_rule(
    id: &'static str,
    title: &'static str,
    requires: &'static [&'static str],
    spec: RepoSpec,
) -> RuleSpec {
    RuleSpec {
        id,
        family: FAMILY,
        title,
        requires,
        docs: "",
        guide: GUIDE,
        needs: PRECOMMIT,
        kind: RuleKind::PreCommitRepo(spec),
    }
}

pub const RULES: &[RuleSpec] = &[
    repo_rule(
        "PC100",
        "Has pre-commit-hooks",
        &["PY006"],
        RepoSpec {
            repos: &["https://github.com/pre-commit/pre-commit-hooks"],
            renamed: &[],
            ids: &[],
        },
    ),
    repo_rule(
        "PC110",
        "Uses black or ruff-format",
        &["PY006"],
        RepoSpec {
            repos: &[
                "https://github.com/psf/black-pre-commit-mirror",
                RUFF_PRE_COMMIT,
            ],
            renamed: &[(
                "https://github.com/psf/black",
                "https://github.com/psf/black-pre-commit-mirror",
            )],
            ids: &[(RUFF_PRE_COMMIT, "ruff-format")],
        },
    ),
    repo_rule(
        "PC111",
        "Uses blacken-docs",
        &["PY006", "PC110"],
        RepoSpec {
            repos: &["https://github.com/adamchainz/blacken-docs"],
            renamed: &[(
                "https://github.com/asottile/blacken-docs",
                "https://github.com/adamchainz/blacken-docs",
            )],
            ids: &[],
        },
    ),
    repo_rule(
        "PC140",
        "Uses a type checker",
        &["PY006"],
        RepoSpec {
            repos: &["https://github.com/pre-commit/mirrors-mypy"],
            renamed: &[],
            ids: &[],
        },
    ),
    repo_rule(
        "PC160",
        "Uses a spell checker",
        &["PY006"],
        RepoSpec {
            repos: &[
                "https://github.com/codespell-project/codespell",
                "https://github.com/crate-ci/typos",
            ],
            renamed: &[],
            ids: &[],
        },
    ),
    repo_rule(
        "PC170",
        "Uses PyGrep hooks (only needed if rST present)",
        &["PY006"],
        RepoSpec {
            repos: &["https://github.com/pre-commit/pygrep-hooks"],
            renamed: &[],
            ids: &[],
        },
    ),
    repo_rule(
        "PC180",
        "Uses a markdown formatter",
        &["PY006"],
        RepoSpec {
            repos: &[
                "https://github.com/rbubley/mirrors-prettier",
                "https://github.com/hukkin/mdformat",
                "https://github.com/rvben/rumdl-pre-commit",
                "https://github.com/davidanson/markdownlint-cli2",
            ],
            renamed: &[
                (
                    "https://github.com/pre-commit/mirrors-prettier",
                    "https://github.com/rbubley/mirrors-prettier",
                ),
                (
                    "https://github.com/executablebooks/mdformat",
                    "https://github.com/hukkin/mdformat",
                ),
            ],
            ids: &[],
        },
    ),
    repo_rule(
        "PC190",
        "Uses Ruff",
        &["PY006"],
        RepoSpec {
            repos: &[RUFF_PRE_COMMIT],
            renamed: &[(
                "https://github.com/charliermarsh/ruff-pre-commit",
                RUFF_PRE_COMMIT,
            )],
            ids: &[],
        },
    ),
    RuleSpec {
        id: "PC191",
        family: FAMILY,
        title: "Ruff show fixes if fixes enabled",
        requires: &["PC190"],
        docs: "If `--fix` is present, `--show-fixes` must be too.",
        guide: GUIDE,
        needs: &[FixtureName::Precommit, FixtureName::Ruff],
        kind: RuleKind::Predicate(pc191),
    },
    RuleSpec {
        id: "PC192",
        family: FAMILY,
        title: "Ruff uses `ruff-check` instead of `ruff` (legacy)",
        requires: &["PC190"],
        docs: "Use `ruff-check` instead of `ruff` for the Ruff linting hook id. The legacy `ruff` id is an alias kept for compatibility.",
        guide: GUIDE,
        needs: PRECOMMIT,
        kind: RuleKind::Predicate(pc192),
    },
    RuleSpec {
        id: "PC901",
        family: FAMILY,
        title: "Custom pre-commit CI update message",
        requires: &["PY006"],
        docs: "Should have something like this in `.pre-commit-config.yaml`:\n\n```yaml\nci:\n  autoupdate_commit_msg: 'chore: update pre-commit hooks'\n```",
        guide: GUIDE,
        needs: PRECOMMIT,
        kind: RuleKind::Predicate(pc901),
    },
    RuleSpec {
        id: "PC902",
        family: FAMILY,
        title: "Custom pre-commit CI autofix message",
        requires: &["PY006"],
        docs: "Should have something like this in `.pre-commit-config.yaml`:\n\n```yaml\nci:\n  autofix_commit_msg: \"style: pre-commit fixes\"\n```",
        guide: GUIDE,
        needs: PRECOMMIT,
        kind: RuleKind::Predicate(pc902),
    },
    RuleSpec {
        id: "PC903",
        family: FAMILY,
        title: "Specified pre-commit CI schedule",
        requires: &["PY006"],
        docs: "Should set some schedule for pre-commit CI updates, for example `autoupdate_schedule: \"monthly\"` under `ci:` in `.pre-commit-config.yaml`.",
        guide: GUIDE,
        needs: PRECOMMIT,
        kind: RuleKind::Predicate(pc903),
    },
];

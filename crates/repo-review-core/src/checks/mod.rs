// SPDX-License-Identifier: Apache-2.0

//! Static rule catalog.
//!
//! Every rule is plain data: identity, prerequisites, the fixtures it reads
//! and a [`RuleKind`] saying how it is evaluated.

use std::borrow::Cow;

use repo_review_model::CheckOutcome;

use crate::error::ConfigParseError;
use crate::fixtures::{FixtureName, Fixtures};
use crate::lookup;
use crate::ruff::rule_selection;

pub mod general;
pub mod github;
pub mod mypy;
pub mod noxfile;
pub mod precommit;
pub mod pyproject;
pub mod readthedocs;
pub mod ruff;
pub mod setupcfg;

pub const GUIDE_BASE_URL: &str = "https://learn.scientific-python.org/development/guides";

pub type CheckFn = fn(&Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError>;

/// Repositories that satisfy a pre-commit rule.
///
/// Repository URLs are stored lower-cased; configured URLs are lower-cased
/// before comparison.
#[derive(Debug, Clone, Copy)]
pub struct RepoSpec {
    pub repos: &'static [&'static str],
    /// Deprecated URL to current URL.
    pub renamed: &'static [(&'static str, &'static str)],
    /// Repository URL to the hook id it must enable.
    pub ids: &'static [(&'static str, &'static str)],
}

impl RepoSpec {
    fn required_hook(&self, repo: &str) -> Option<&'static str> {
        self.ids
            .iter()
            .find(|(candidate, _)| *candidate == repo)
            .map(|(_, hook)| *hook)
    }

    fn renamed_to(&self, repo: &str) -> Option<&'static str> {
        self.renamed
            .iter()
            .find(|(old, _)| *old == repo)
            .map(|(_, new)| *new)
    }

    pub fn describe(&self) -> String {
        let mut parts = self
            .repos
            .iter()
            .map(|repo| match self.required_hook(repo) {
                Some(hook) => format!("`{repo}` (with `{hook}` hook)"),
                None => format!("`{repo}`"),
            })
            .collect::<Vec<_>>();
        parts.sort();
        match parts.as_slice() {
            [] => "...".to_string(),
            [only] => only.clone(),
            _ => format!("one of {}", parts.join(", ")),
        }
    }

    pub fn evaluate(&self, precommit: Option<&serde_json::Value>) -> CheckOutcome {
        let Some(precommit) = precommit else {
            return CheckOutcome::Fail;
        };
        let mut missing_hook = None;
        for item in lookup::tables(precommit, &["repos"]) {
            let repo = lookup::str_at(item, &["repo"])
                .unwrap_or_default()
                .to_lowercase();
            if repo.is_empty() {
                continue;
            }
            if self.repos.iter().any(|known| *known == repo) {
                match self.required_hook(&repo) {
                    Some(hook) => {
                        let enabled = lookup::tables(item, &["hooks"])
                            .any(|entry| lookup::str_at(entry, &["id"]) == Some(hook));
                        if enabled {
                            return CheckOutcome::Pass;
                        }
                        missing_hook = Some((repo.clone(), hook));
                    }
                    None => return CheckOutcome::Pass,
                }
            }
            if let Some(current) = self.renamed_to(&repo) {
                return CheckOutcome::from_message(format!(
                    "Use `{current}` instead of `{repo}` in `.pre-commit-config.yaml`"
                ));
            }
        }
        match missing_hook {
            Some((repo, hook)) => CheckOutcome::from_message(format!(
                "`{repo}` is configured but the `{hook}` hook is not enabled in `.pre-commit-config.yaml`"
            )),
            None => CheckOutcome::Fail,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum RuleKind {
    Predicate(CheckFn),
    PreCommitRepo(RepoSpec),
    /// Passes when the Ruff rule group `code` is selected.
    RuffSelect {
        code: &'static str,
        name: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub id: &'static str,
    pub family: &'static str,
    pub title: &'static str,
    pub requires: &'static [&'static str],
    pub docs: &'static str,
    /// Page of the development guide, when one covers the rule.
    pub guide: Option<&'static str>,
    pub needs: &'static [FixtureName],
    pub kind: RuleKind,
}

impl RuleSpec {
    pub fn url(&self) -> Option<String> {
        self.guide
            .map(|page| format!("{GUIDE_BASE_URL}/{page}/#{}", self.id.to_lowercase()))
    }

    /// Help text; generated for rule kinds whose docs follow from their data.
    pub fn help(&self) -> Cow<'static, str> {
        if !self.docs.is_empty() {
            return Cow::Borrowed(self.docs);
        }
        match self.kind {
            RuleKind::Predicate(_) => Cow::Borrowed(self.title),
            RuleKind::PreCommitRepo(spec) => Cow::Owned(format!(
                "Must have {} in `.pre-commit-config.yaml`",
                spec.describe()
            )),
            RuleKind::RuffSelect { code, name } => Cow::Owned(format!(
                "Must select the {name} `{code}` checks. Recommended:\n\n```toml\n[tool.ruff.lint]\nextend-select = [\n  \"{code}\",  # {name}\n]\n```"
            )),
        }
    }

    pub fn evaluate(&self, fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
        for name in self.needs {
            fixtures.load(*name)?;
        }
        match self.kind {
            RuleKind::Predicate(check) => check(fixtures),
            RuleKind::PreCommitRepo(spec) => Ok(spec.evaluate(fixtures.precommit()?)),
            RuleKind::RuffSelect { code, .. } => Ok(CheckOutcome::from_bool(
                fixtures
                    .ruff()?
                    .is_some_and(|ruff| rule_selection(ruff).contains(code)),
            )),
        }
    }
}

/// Catalog slices in report order.
pub const CATALOG: &[&[RuleSpec]] = &[
    general::RULES,
    pyproject::RULES,
    mypy::RULES,
    ruff::RULES,
    precommit::RULES,
    github::RULES,
    readthedocs::RULES,
    setupcfg::RULES,
    noxfile::RULES,
];

pub fn all_rules() -> impl Iterator<Item = &'static RuleSpec> {
    CATALOG.iter().flat_map(|family| family.iter())
}

pub fn find_rule(id: &str) -> Option<&'static RuleSpec> {
    all_rules().find(|rule| rule.id == id)
}

/// Evaluates one rule against an in-memory repository, ignoring prerequisites.
#[cfg(test)]
pub(crate) fn check(id: &str, fs: &repo_review_adapters::FakeFs) -> CheckOutcome {
    let rule = find_rule(id).expect("rule exists");
    let fixtures = Fixtures::new(fs, std::path::Path::new("/repo"));
    rule.evaluate(&fixtures).expect("fixtures load")
}

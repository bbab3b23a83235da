// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use repo_review_adapters::Fs;
use repo_review_model::{
    CheckOutcome, FamilyId, ReviewReport, ReviewSummary, RuleId, RuleResult, RuleStatus,
};
use tracing::{debug, info, info_span};

use crate::checks::{all_rules, find_rule, RuleKind, RuleSpec};
use crate::error::ConfigParseError;
use crate::families::{describe_families, FAMILIES};
use crate::fixtures::Fixtures;
use crate::ruff::RUFF_LINTERS;
use crate::settings::ReviewSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    Registry(Vec<String>),
    Config(ConfigParseError),
}

impl fmt::Display for ReviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(errors) => write!(f, "invalid rule registry: {}", errors.join("; ")),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ReviewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Registry(_) => None,
            Self::Config(err) => Some(err),
        }
    }
}

impl From<ConfigParseError> for ReviewError {
    fn from(err: ConfigParseError) -> Self {
        Self::Config(err)
    }
}

fn prerequisite_cycles(rules: &[&RuleSpec]) -> Vec<String> {
    fn visit<'r>(
        id: &'r str,
        edges: &BTreeMap<&'r str, &'r [&'r str]>,
        stack: &mut Vec<&'r str>,
        done: &mut BTreeSet<&'r str>,
        errors: &mut Vec<String>,
    ) {
        if done.contains(id) {
            return;
        }
        if let Some(start) = stack.iter().position(|seen| *seen == id) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(id);
            errors.push(format!("prerequisite cycle {}", cycle.join(" -> ")));
            return;
        }
        stack.push(id);
        for &next in edges.get(id).copied().unwrap_or_default() {
            visit(next, edges, stack, done, errors);
        }
        stack.pop();
        done.insert(id);
    }

    let edges = rules
        .iter()
        .map(|rule| (rule.id, rule.requires))
        .collect::<BTreeMap<_, _>>();
    let mut errors = Vec::new();
    let mut done = BTreeSet::new();
    for rule in rules {
        visit(rule.id, &edges, &mut Vec::new(), &mut done, &mut errors);
    }
    errors
}

/// Structural problems in a rule set; empty when the set is usable.
pub fn validate_registry(rules: &[&RuleSpec]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = BTreeSet::new();
    let known = rules.iter().map(|rule| rule.id).collect::<BTreeSet<_>>();
    let families = FAMILIES.iter().map(|(id, _, _)| *id).collect::<BTreeSet<_>>();

    for rule in rules {
        if !seen.insert(rule.id) {
            errors.push(format!("duplicate rule id `{}`", rule.id));
        }
        if let Err(err) = RuleId::parse(rule.id) {
            errors.push(err);
        }
        if !families.contains(rule.family) {
            errors.push(format!("{}: unknown family `{}`", rule.id, rule.family));
        }
        for requirement in rule.requires {
            if !known.contains(requirement) {
                errors.push(format!(
                    "{} requires unknown rule {}",
                    rule.id, requirement
                ));
            }
        }
        if let RuleKind::RuffSelect { code, .. } = rule.kind {
            if !RUFF_LINTERS.iter().any(|(known, _)| *known == code) {
                errors.push(format!("{}: unknown Ruff rule group `{code}`", rule.id));
            }
        }
    }
    errors.extend(prerequisite_cycles(rules));
    errors
}

pub fn select_rules(settings: &ReviewSettings) -> Vec<&'static RuleSpec> {
    all_rules().filter(|rule| settings.is_selected(rule)).collect()
}

struct ReviewPass<'a> {
    fixtures: Fixtures<'a>,
    selected: BTreeSet<&'static str>,
    results: BTreeMap<&'static str, RuleResult>,
}

impl ReviewPass<'_> {
    fn resolve(&mut self, rule: &'static RuleSpec) -> Result<RuleStatus, ReviewError> {
        if let Some(done) = self.results.get(rule.id) {
            return Ok(done.status);
        }
        let mut unmet = Vec::new();
        for requirement in rule.requires {
            if !self.selected.contains(requirement) {
                continue;
            }
            let Some(prerequisite) = find_rule(requirement) else {
                continue;
            };
            if self.resolve(prerequisite)? != RuleStatus::Pass {
                unmet.push(*requirement);
            }
        }

        let (status, message, skip_reason) = if unmet.is_empty() {
            match rule.evaluate(&self.fixtures)? {
                CheckOutcome::Pass => (RuleStatus::Pass, None, None),
                CheckOutcome::Fail => (RuleStatus::Fail, Some(rule.help().into_owned()), None),
                CheckOutcome::Message(text) => (RuleStatus::Fail, Some(text), None),
                CheckOutcome::NotApplicable => (
                    RuleStatus::Skip,
                    None,
                    Some("Not applicable to this repository".to_string()),
                ),
            }
        } else {
            debug!(rule = rule.id, requires = ?unmet, "rule skipped");
            (
                RuleStatus::Skip,
                None,
                Some(format!("Requires {}", unmet.join(", "))),
            )
        };

        let result = RuleResult {
            id: RuleId::parse(rule.id).map_err(|err| ReviewError::Registry(vec![err]))?,
            family: FamilyId::parse(rule.family)
                .map_err(|err| ReviewError::Registry(vec![err]))?,
            title: rule.title.to_string(),
            status,
            message,
            skip_reason,
            url: rule.url(),
        };
        self.results.insert(rule.id, result);
        Ok(status)
    }
}

/// Reviews one repository.
///
/// `[tool.repo-review]` in `pyproject.toml` is layered under `overrides`.
/// Prerequisites that are not selected count as satisfied. The first
/// malformed configuration source aborts the pass.
pub fn run_review(
    fs: &dyn Fs,
    root: &Path,
    overrides: &ReviewSettings,
) -> Result<ReviewReport, ReviewError> {
    let _span = info_span!("review", root = %root.display()).entered();
    let catalog = all_rules().collect::<Vec<_>>();
    let errors = validate_registry(&catalog);
    if !errors.is_empty() {
        return Err(ReviewError::Registry(errors));
    }

    let fixtures = Fixtures::new(fs, root);
    let settings = ReviewSettings::from_pyproject(fixtures.pyproject()?).overridden_by(overrides);
    let selected = select_rules(&settings);
    let mut pass = ReviewPass {
        fixtures,
        selected: selected.iter().map(|rule| rule.id).collect(),
        results: BTreeMap::new(),
    };
    for &rule in &selected {
        pass.resolve(rule)?;
    }

    let results = selected
        .iter()
        .filter_map(|rule| pass.results.remove(rule.id))
        .collect::<Vec<_>>();
    let reported = results
        .iter()
        .map(|row| row.family.as_str())
        .collect::<BTreeSet<_>>();
    let mut families = BTreeMap::new();
    for (id, descriptor) in describe_families(
        pass.fixtures.pyproject()?,
        pass.fixtures.ruff()?,
        pass.fixtures.setupcfg()?,
    ) {
        if reported.contains(id) {
            let family = FamilyId::parse(id).map_err(|err| ReviewError::Registry(vec![err]))?;
            families.insert(family, descriptor);
        }
    }

    let summary = ReviewSummary::from_results(&results);
    info!(
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped,
        "review complete"
    );
    Ok(ReviewReport {
        repo_root: root.display().to_string(),
        families,
        results,
        summary,
    })
}

pub fn list_output(rules: &[&RuleSpec]) -> String {
    rules
        .iter()
        .map(|rule| format!("{}\t{}\t{}", rule.id, rule.family, rule.title))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn explain_output(rule_id: &str) -> Result<String, String> {
    let rule = find_rule(rule_id).ok_or_else(|| format!("unknown rule id `{rule_id}`"))?;
    Ok(format!(
        "id: {}\nfamily: {}\ntitle: {}\nrequires: {}\nurl: {}\ndocs:\n{}",
        rule.id,
        rule.family,
        rule.title,
        rule.requires.join(","),
        rule.url().unwrap_or_default(),
        rule.help()
    ))
}

fn status_label(status: RuleStatus) -> &'static str {
    match status {
        RuleStatus::Pass => "PASS",
        RuleStatus::Fail => "FAIL",
        RuleStatus::Skip => "SKIP",
    }
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_text_summary(report: &ReviewReport) -> String {
    format!(
        "summary: passed={} failed={} skipped={} total={}",
        report.summary.passed, report.summary.failed, report.summary.skipped, report.summary.total
    )
}

/// Human-readable report grouped by family in display order.
pub fn render_text(report: &ReviewReport) -> String {
    let mut ordered = report.families.iter().collect::<Vec<_>>();
    ordered.sort_by(|(a_id, a), (b_id, b)| a.order.cmp(&b.order).then(a_id.cmp(b_id)));

    let mut lines = vec![format!("repo-review: {}", report.repo_root)];
    for (family, descriptor) in ordered {
        lines.push(String::new());
        lines.push(descriptor.name.clone());
        if let Some(description) = &descriptor.description {
            lines.push(indent(description, "  "));
        }
        for row in report.results.iter().filter(|row| row.family == *family) {
            let mut line = format!("  {} {} {}", status_label(row.status), row.id, row.title);
            if let Some(reason) = &row.skip_reason {
                line.push_str(&format!(" ({reason})"));
            }
            lines.push(line);
            if let Some(message) = &row.message {
                lines.push(indent(message, "       "));
            }
        }
    }
    lines.push(String::new());
    lines.push(render_text_summary(report));
    lines.join("\n")
}

pub fn render_json(report: &ReviewReport) -> Result<String, String> {
    serde_json::to_string_pretty(report).map_err(|err| err.to_string())
}

pub fn exit_code_for_report(report: &ReviewReport) -> i32 {
    if report.summary.failed > 0 {
        2
    } else {
        0
    }
}

/// Exit code for a pass that could not produce a report.
pub const EXIT_CONFIG_ERROR: i32 = 3;

#[cfg(test)]
mod tests {
    use super::*;
    use repo_review_adapters::FakeFs;

    fn always(_: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
        Ok(CheckOutcome::Pass)
    }

    const fn stub(id: &'static str, requires: &'static [&'static str]) -> RuleSpec {
        RuleSpec {
            id,
            family: "general",
            title: "stub",
            requires,
            docs: "stub",
            guide: None,
            needs: &[],
            kind: RuleKind::Predicate(always),
        }
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = all_rules().collect::<Vec<_>>();
        assert_eq!(validate_registry(&catalog), Vec::<String>::new());
    }

    #[test]
    fn validate_registry_returns_lints_for_duplicates_and_unknowns() {
        const A: RuleSpec = stub("XX001", &["XX009"]);
        const B: RuleSpec = stub("XX001", &[]);
        let errors = validate_registry(&[&A, &B]);
        assert!(errors.contains(&"duplicate rule id `XX001`".to_string()));
        assert!(errors.contains(&"XX001 requires unknown rule XX009".to_string()));
    }

    #[test]
    fn validate_registry_finds_cycles() {
        const A: RuleSpec = stub("XX001", &["XX002"]);
        const B: RuleSpec = stub("XX002", &["XX001"]);
        let errors = validate_registry(&[&A, &B]);
        assert!(errors.iter().any(|err| err.starts_with("prerequisite cycle")));
    }

    #[test]
    fn failed_prerequisite_skips_dependents() {
        let fs = FakeFs::new();
        let report = run_review(&fs, Path::new("/repo"), &ReviewSettings::default())
            .expect("review");
        let pp002 = report
            .results
            .iter()
            .find(|row| row.id.as_str() == "PP002")
            .expect("PP002");
        assert_eq!(pp002.status, RuleStatus::Skip);
        assert_eq!(pp002.skip_reason.as_deref(), Some("Requires PY001"));
        let py001 = report
            .results
            .iter()
            .find(|row| row.id.as_str() == "PY001")
            .expect("PY001");
        assert_eq!(py001.status, RuleStatus::Fail);
        assert!(py001.message.is_some());
        assert_eq!(exit_code_for_report(&report), 2);
    }

    #[test]
    fn deselected_prerequisites_count_as_satisfied() {
        let fs = FakeFs::new().with_file(
            "pyproject.toml",
            "[build-system]\nrequires = [\"hatchling\"]\nbuild-backend = \"hatchling.build\"\n",
        );
        let settings = ReviewSettings {
            select: vec!["PP002".to_string()],
            ignore: Vec::new(),
        };
        let report = run_review(&fs, Path::new("/repo"), &settings).expect("review");
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].status, RuleStatus::Pass);
        assert_eq!(exit_code_for_report(&report), 0);
        assert_eq!(report.families.len(), 1);
    }

    #[test]
    fn pyproject_settings_apply_without_overrides() {
        let fs = FakeFs::new().with_file(
            "pyproject.toml",
            "[tool.repo-review]\nselect = [\"docs\"]\n",
        );
        let report = run_review(&fs, Path::new("/repo"), &ReviewSettings::default())
            .expect("review");
        assert!(report.results.iter().all(|row| row.family.as_str() == "docs"));
        assert_eq!(report.summary.total, 5);
    }

    #[test]
    fn malformed_config_aborts_the_pass() {
        let fs = FakeFs::new().with_file("pyproject.toml", "[project\n");
        let err = run_review(&fs, Path::new("/repo"), &ReviewSettings::default())
            .expect_err("malformed");
        assert!(matches!(err, ReviewError::Config(ConfigParseError::Syntax { .. })));
    }

    #[test]
    fn text_rendering_groups_by_family() {
        let fs = FakeFs::new().with_file("pyproject.toml", "[project]\nname = \"demo\"\n");
        let report = run_review(&fs, Path::new("/repo"), &ReviewSettings::default())
            .expect("review");
        let text = render_text(&report);
        assert!(text.starts_with("repo-review: /repo\n\nGeneral\n"));
        assert!(text.contains("  PASS PY001 Has a pyproject.toml"));
        assert!(text.contains("  SKIP RTD101 You have to set the RTD version number to 2 (Requires RTD100)"));
        assert!(text.ends_with(&render_text_summary(&report)));
        let general = text.find("General").expect("general");
        let docs = text.find("Documentation").expect("docs");
        assert!(general < docs);
    }

    #[test]
    fn json_rendering_round_trips() {
        let report = run_review(&FakeFs::new(), Path::new("/repo"), &ReviewSettings::default())
            .expect("review");
        let json = render_json(&report).expect("json");
        let back: ReviewReport = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, report);
    }

    #[test]
    fn explain_and_list_outputs() {
        let explained = explain_output("PP302").expect("explain");
        assert!(explained.starts_with("id: PP302\nfamily: pyproject\n"));
        assert!(explained.contains("requires: PP301"));
        assert!(explain_output("ZZ999").is_err());
        let listed = list_output(&select_rules(&ReviewSettings::default()));
        assert!(listed.contains("PY001\tgeneral\tHas a pyproject.toml"));
    }
}

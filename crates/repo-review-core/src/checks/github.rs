// SPDX-License-Identifier: Apache-2.0

use repo_review_model::CheckOutcome;
use serde_json::Value;

use super::{RuleKind, RuleSpec};
use crate::error::ConfigParseError;
use crate::fixtures::{FixtureName, Fixtures};
use crate::lookup;

const FAMILY: &str = "github";
const GUIDE: Option<&str> = Some("gha-basic");
const WORKFLOWS: &[FixtureName] = &[FixtureName::Workflows];
const DEPENDABOT: &[FixtureName] = &[FixtureName::Dependabot];

fn gh100(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok((!fixtures.workflows()?.is_empty()).into())
}

fn gh101(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(fixtures
        .workflows()?
        .values()
        .all(|workflow| lookup::has(workflow, &["name"]))
        .into())
}

fn gh102(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(fixtures
        .workflows()?
        .values()
        .any(|workflow| lookup::has(workflow, &["concurrency"]))
        .into())
}

/// YAML 1.1 readers turn an unquoted `on` key into boolean true.
fn triggers(workflow: &Value) -> Option<&Value> {
    lookup::path(workflow, &["on"]).or_else(|| lookup::path(workflow, &["true"]))
}

fn has_trigger(triggers: &Value, event: &str) -> bool {
    match triggers {
        Value::Object(events) => events.contains_key(event),
        Value::Array(events) => events.iter().any(|item| item.as_str() == Some(event)),
        Value::String(only) => only == event,
        _ => false,
    }
}

fn gh103(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(fixtures
        .workflows()?
        .values()
        .filter_map(triggers)
        .any(|on| has_trigger(on, "workflow_dispatch"))
        .into())
}

fn gh200(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let configured = fixtures
        .dependabot()?
        .and_then(Value::as_object)
        .is_some_and(|config| !config.is_empty());
    Ok(configured.into())
}

fn actions_updates(dependabot: &Value) -> impl Iterator<Item = &Value> {
    lookup::tables(dependabot, &["updates"]).filter(|update| {
        lookup::str_at(update, &["package-ecosystem"]) == Some("github-actions")
    })
}

fn gh210(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    Ok(fixtures
        .dependabot()?
        .is_some_and(|dependabot| actions_updates(dependabot).next().is_some())
        .into())
}

fn gh211(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let Some(dependabot) = fixtures.dependabot()? else {
        return Ok(CheckOutcome::Pass);
    };
    let pins_core_majors = actions_updates(dependabot).any(|update| {
        lookup::tables(update, &["ignore"]).any(|ignore| {
            lookup::str_at(ignore, &["dependency-name"])
                .is_some_and(|name| name.contains("actions/*"))
        })
    });
    Ok((!pins_core_majors).into())
}

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "GH100",
        family: FAMILY,
        title: "Has GitHub Actions config",
        requires: &[],
        docs: "All projects should have GitHub Actions config for this series of checks. If there are no `.yml` files in `.github/workflows`, the remaining checks will be skipped.",
        guide: GUIDE,
        needs: WORKFLOWS,
        kind: RuleKind::Predicate(gh100),
    },
    RuleSpec {
        id: "GH101",
        family: FAMILY,
        title: "Has nice names",
        requires: &["GH100"],
        docs: "All workflows should have a nice readable `name:` field to pass this check. Feel free to ignore if you are happy with the filenames as names.",
        guide: GUIDE,
        needs: WORKFLOWS,
        kind: RuleKind::Predicate(gh101),
    },
    RuleSpec {
        id: "GH102",
        family: FAMILY,
        title: "Auto-cancel on repeated PRs",
        requires: &["GH100"],
        docs: "At least one workflow should auto-cancel.\n\n```yaml\nconcurrency:\n  group: ${{ github.workflow }}-${{ github.head_ref }}\n  cancel-in-progress: true\n```",
        guide: GUIDE,
        needs: WORKFLOWS,
        kind: RuleKind::Predicate(gh102),
    },
    RuleSpec {
        id: "GH103",
        family: FAMILY,
        title: "At least one workflow with manual dispatch trigger",
        requires: &["GH100"],
        docs: "At least one workflow should have manual dispatch to allow easy triggering from the web.\n\n```yaml\non:\n  workflow_dispatch:\n```",
        guide: GUIDE,
        needs: WORKFLOWS,
        kind: RuleKind::Predicate(gh103),
    },
    RuleSpec {
        id: "GH200",
        family: FAMILY,
        title: "Maintained by Dependabot",
        requires: &[],
        docs: "All projects should have a `.github/dependabot.yml` file to support at least GitHub Actions regular updates.",
        guide: GUIDE,
        needs: DEPENDABOT,
        kind: RuleKind::Predicate(gh200),
    },
    RuleSpec {
        id: "GH210",
        family: FAMILY,
        title: "Maintains the GitHub action versions with Dependabot",
        requires: &["GH200"],
        docs: "All projects should maintain the GH Actions with dependabot.\n\n```yaml\nversion: 2\nupdates:\n  - package-ecosystem: \"github-actions\"\n    directory: \"/\"\n    schedule:\n      interval: \"weekly\"\n```",
        guide: GUIDE,
        needs: DEPENDABOT,
        kind: RuleKind::Predicate(gh210),
    },
    RuleSpec {
        id: "GH211",
        family: FAMILY,
        title: "Do not pin core actions as major versions",
        requires: &["GH200", "GH210"],
        docs: "Projects should not pin major versions for official actions. Dependabot respects the tag style you are already using.",
        guide: GUIDE,
        needs: DEPENDABOT,
        kind: RuleKind::Predicate(gh211),
    },
];

#[cfg(test)]
mod tests {
    use super::has_trigger;
    use crate::checks::check;
    use crate::fixtures::DEPENDABOT_CONFIG;
    use repo_review_adapters::FakeFs;
    use repo_review_model::CheckOutcome;
    use serde_json::json;

    const CI: &str = r#"
name: CI
on:
  workflow_dispatch:
  pull_request:
concurrency:
  group: ${{ github.workflow }}-${{ github.head_ref }}
  cancel-in-progress: true
jobs: {}
"#;

    #[test]
    fn workflow_rules_pass_on_a_complete_workflow() {
        let fs = FakeFs::new().with_file(".github/workflows/ci.yml", CI);
        for id in ["GH100", "GH101", "GH102", "GH103"] {
            assert!(check(id, &fs).is_pass(), "{id}");
        }
    }

    #[test]
    fn every_workflow_needs_a_name() {
        let fs = FakeFs::new()
            .with_file(".github/workflows/ci.yml", CI)
            .with_file(".github/workflows/cd.yaml", "on: push\njobs: {}\n");
        assert_eq!(check("GH101", &fs), CheckOutcome::Fail);
        assert!(check("GH102", &fs).is_pass());
    }

    #[test]
    fn no_workflows_fails_gh100() {
        assert_eq!(check("GH100", &FakeFs::new()), CheckOutcome::Fail);
    }

    #[test]
    fn triggers_may_be_tables_lists_or_strings() {
        assert!(has_trigger(&json!({"workflow_dispatch": null}), "workflow_dispatch"));
        assert!(has_trigger(&json!(["push", "workflow_dispatch"]), "workflow_dispatch"));
        assert!(has_trigger(&json!("workflow_dispatch"), "workflow_dispatch"));
        assert!(!has_trigger(&json!("push"), "workflow_dispatch"));
    }

    #[test]
    fn dependabot_rules() {
        let fs = FakeFs::new().with_file(
            DEPENDABOT_CONFIG,
            r#"
version: 2
updates:
  - package-ecosystem: "github-actions"
    directory: "/"
    schedule:
      interval: "weekly"
"#,
        );
        for id in ["GH200", "GH210", "GH211"] {
            assert!(check(id, &fs).is_pass(), "{id}");
        }
        assert_eq!(check("GH200", &FakeFs::new()), CheckOutcome::Fail);
    }

    #[test]
    fn pinning_core_actions_fails_gh211() {
        let fs = FakeFs::new().with_file(
            DEPENDABOT_CONFIG,
            r#"
version: 2
updates:
  - package-ecosystem: "github-actions"
    directory: "/"
    ignore:
      - dependency-name: "actions/*"
        update-types: ["version-update:semver-minor"]
"#,
        );
        assert_eq!(check("GH211", &fs), CheckOutcome::Fail);
    }
}

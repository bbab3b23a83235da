// SPDX-License-Identifier: Apache-2.0

use repo_review_model::CheckOutcome;

use super::{RuleKind, RuleSpec};
use crate::error::ConfigParseError;
use crate::fixtures::{FixtureName, Fixtures};
use crate::lookup;

fn scfg001(fixtures: &Fixtures<'_>) -> Result<CheckOutcome, ConfigParseError> {
    let Some(setupcfg) = fixtures.setupcfg()? else {
        return Ok(CheckOutcome::NotApplicable);
    };
    let invalid = ["metadata", "options"]
        .iter()
        .filter_map(|&section| Some((section, lookup::table(setupcfg, &[section])?)))
        .flat_map(|(section, options)| {
            let mut dashed = options
                .keys()
                .filter(|name| name.contains('-'))
                .collect::<Vec<_>>();
            dashed.sort();
            dashed
                .into_iter()
                .map(move |name| format!("{section}.{name}"))
        })
        .collect::<Vec<_>>();
    if invalid.is_empty() {
        return Ok(CheckOutcome::from_message(""));
    }
    Ok(CheckOutcome::from_message(format!(
        "Invalid setup.cfg options found, only underscores allowed: {}",
        invalid.join(", ")
    )))
}

pub const RULES: &[RuleSpec] = &[RuleSpec {
    id: "SCFG001",
    family: "setupcfg",
    title: "Avoid deprecated setup.cfg names",
    requires: &[],
    docs: "setuptools only accepts underscores in `setup.cfg` option names; dashed names such as `description-file` are deprecated.",
    guide: Some("packaging-classic"),
    needs: &[FixtureName::Setupcfg],
    kind: RuleKind::Predicate(scfg001),
}];

#[cfg(test)]
mod tests {
    use crate::checks::check;
    use repo_review_adapters::FakeFs;

    #[test]
    fn dashed_names_are_listed() {
        let fs = FakeFs::new().with_file(
            "setup.cfg",
            "[metadata]\nname = demo\ndescription-file = README.md\n\n[options]\npython-requires = >=3.8\n\n[flake8]\nmax-line-length = 88\n",
        );
        assert_eq!(
            check("SCFG001", &fs).message(),
            Some(
                "Invalid setup.cfg options found, only underscores allowed: metadata.description-file, options.python-requires"
            )
        );
    }

    #[test]
    fn underscores_pass_and_absence_is_not_applicable() {
        let fs = FakeFs::new().with_file("setup.cfg", "[metadata]\nlong_description = x\n");
        assert!(check("SCFG001", &fs).is_pass());
        assert!(check("SCFG001", &FakeFs::new()).is_not_applicable());
    }

    #[test]
    fn dashed_default_options_are_reported_per_section() {
        let fs = FakeFs::new().with_file(
            "setup.cfg",
            "[DEFAULT]\ndescription-file = README\n\n[metadata]\nname = demo\n",
        );
        assert_eq!(
            check("SCFG001", &fs).message(),
            Some("Invalid setup.cfg options found, only underscores allowed: metadata.description-file")
        );
    }
}

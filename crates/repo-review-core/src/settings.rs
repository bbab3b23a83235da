// SPDX-License-Identifier: Apache-2.0

use serde_json::Value;

use crate::checks::RuleSpec;
use crate::lookup;

pub const SETTINGS_TABLE: [&str; 2] = ["tool", "repo-review"];

/// Which rules a review runs.
///
/// Entries are rule ids (`PP302`), id prefixes (`PP3`), `*` globs (`RF1*`)
/// or family names (`pre-commit`). An empty `select` means every rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewSettings {
    pub select: Vec<String>,
    pub ignore: Vec<String>,
}

impl ReviewSettings {
    /// Reads `[tool.repo-review]`; ill-typed entries are dropped.
    pub fn from_pyproject(pyproject: Option<&Value>) -> Self {
        let read = |key: &str| {
            pyproject
                .map(|tree| lookup::str_list(tree, &[SETTINGS_TABLE[0], SETTINGS_TABLE[1], key]))
                .unwrap_or_default()
                .into_iter()
                .map(str::to_string)
                .collect()
        };
        Self {
            select: read("select"),
            ignore: read("ignore"),
        }
    }

    /// Replaces each list that `overrides` sets.
    pub fn overridden_by(self, overrides: &ReviewSettings) -> Self {
        let pick = |base: Vec<String>, layer: &Vec<String>| {
            if layer.is_empty() {
                base
            } else {
                layer.clone()
            }
        };
        Self {
            select: pick(self.select, &overrides.select),
            ignore: pick(self.ignore, &overrides.ignore),
        }
    }

    pub fn is_selected(&self, rule: &RuleSpec) -> bool {
        let selected = self.select.is_empty()
            || self.select.iter().any(|entry| selector_matches(entry, rule));
        selected && !self.ignore.iter().any(|entry| selector_matches(entry, rule))
    }
}

pub fn selector_matches(selector: &str, rule: &RuleSpec) -> bool {
    let selector = selector.trim();
    if selector.is_empty() {
        return false;
    }
    if selector == rule.family {
        return true;
    }
    if selector.contains('*') {
        return wildcard_matches(selector, rule.id);
    }
    rule.id.starts_with(selector)
}

fn wildcard_matches(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == value;
    }
    let mut cursor = 0usize;
    for (idx, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if idx == 0 {
            if !value.starts_with(part) {
                return false;
            }
            cursor = part.len();
            continue;
        }
        if idx == parts.len() - 1 && !pattern.ends_with('*') {
            return value.len() >= cursor + part.len() && value.ends_with(part);
        }
        match value[cursor..].find(part) {
            Some(pos) => cursor += pos + part.len(),
            None => return false,
        }
    }
    true
}

// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use repo_review_adapters::Fs;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ConfigParseError;
use crate::locate::locate;
use crate::lookup;

/// Dedicated pytest config files, highest priority first.
pub const PYTEST_CONFIG_FILES: [&str; 2] = ["pytest.toml", ".pytest.toml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PytestDialect {
    /// `[pytest]` in `pytest.toml` or `.pytest.toml`.
    PytestToml,
    /// `[tool.pytest]` without an `ini_options` table.
    Modern,
    /// `[tool.pytest.ini_options]`.
    Legacy,
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PytestConfig {
    pub dialect: PytestDialect,
    pub settings: Map<String, Value>,
}

impl PytestConfig {
    pub fn not_found() -> Self {
        Self {
            dialect: PytestDialect::NotFound,
            settings: Map::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.settings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.settings.contains_key(name)
    }

    /// A list-valued option such as `addopts`.
    ///
    /// Only the ini-style legacy table may spell a list as one
    /// whitespace-separated string.
    pub fn list_option(&self, name: &str) -> Vec<String> {
        match (self.settings.get(name), self.dialect) {
            (Some(Value::Array(items)), _) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            (Some(Value::String(text)), PytestDialect::Legacy) => {
                text.split_whitespace().map(str::to_string).collect()
            }
            _ => Vec::new(),
        }
    }
}

pub fn resolve_pytest_config(
    pyproject: Option<&Value>,
    fs: &dyn Fs,
    root: &Path,
) -> Result<PytestConfig, ConfigParseError> {
    for file in PYTEST_CONFIG_FILES {
        if let Some(contents) = locate(fs, root, file)? {
            debug!(file, "pytest configured in dedicated file");
            return Ok(PytestConfig {
                dialect: PytestDialect::PytestToml,
                settings: lookup::table(&contents, &["pytest"])
                    .cloned()
                    .unwrap_or_default(),
            });
        }
    }

    let Some(section) = pyproject.and_then(|tree| lookup::table(tree, &["tool", "pytest"])) else {
        return Ok(PytestConfig::not_found());
    };
    match section.get("ini_options") {
        Some(Value::Object(ini_options)) => Ok(PytestConfig {
            dialect: PytestDialect::Legacy,
            settings: ini_options.clone(),
        }),
        _ => Ok(PytestConfig {
            dialect: PytestDialect::Modern,
            settings: section.clone(),
        }),
    }
}

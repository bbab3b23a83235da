// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use repo_review_adapters::Fs;
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::error::{ConfigFormat, ConfigParseError};
use crate::setupcfg::parse_ini;

pub const WORKFLOWS_DIR: &str = ".github/workflows";

fn syntax_error(path: &str, format: ConfigFormat, detail: String) -> ConfigParseError {
    warn!(path, format = format.as_str(), %detail, "configuration file failed to parse");
    ConfigParseError::Syntax {
        path: PathBuf::from(path),
        format,
        detail,
    }
}

/// Converts a YAML tree into the shared JSON-shaped tree.
///
/// Non-string mapping keys are stringified and tags are dropped.
pub fn yaml_to_value(yaml: serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(flag) => Value::Bool(flag),
        serde_yaml::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Value::from(int)
            } else if let Some(uint) = number.as_u64() {
                Value::from(uint)
            } else {
                number
                    .as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(text) => Value::String(text),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_value).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut out = Map::new();
            for (key, value) in mapping {
                out.insert(yaml_key(key), yaml_to_value(value));
            }
            Value::Object(out)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match yaml_to_value(key) {
        Value::String(text) => text,
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

pub fn parse_text(path: &str, text: &str) -> Result<Value, ConfigParseError> {
    let format = ConfigFormat::for_path(path).ok_or_else(|| ConfigParseError::Unsupported {
        path: PathBuf::from(path),
    })?;
    match format {
        ConfigFormat::Toml => {
            toml::from_str::<Value>(text).map_err(|err| syntax_error(path, format, err.to_string()))
        }
        ConfigFormat::Yaml => serde_yaml::from_str::<serde_yaml::Value>(text)
            .map(yaml_to_value)
            .map_err(|err| syntax_error(path, format, err.to_string())),
        ConfigFormat::Ini => {
            parse_ini(text).map_err(|err| syntax_error(path, format, err.to_string()))
        }
    }
}

/// Reads and parses one configuration file relative to `root`.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn locate(fs: &dyn Fs, root: &Path, path: &str) -> Result<Option<Value>, ConfigParseError> {
    let relative = Path::new(path);
    if !fs.is_file(root, relative) {
        return Ok(None);
    }
    let text = fs.read_text(root, relative)?;
    let tree = parse_text(path, &text)?;
    debug!(path, "located configuration file");
    Ok(Some(tree))
}

/// First present candidate wins; later candidates are not read.
pub fn locate_first(
    fs: &dyn Fs,
    root: &Path,
    candidates: &[&'static str],
) -> Result<Option<(&'static str, Value)>, ConfigParseError> {
    for &candidate in candidates {
        if let Some(tree) = locate(fs, root, candidate)? {
            return Ok(Some((candidate, tree)));
        }
    }
    Ok(None)
}

pub fn locate_setup_cfg(fs: &dyn Fs, root: &Path) -> Result<Option<Value>, ConfigParseError> {
    locate(fs, root, "setup.cfg")
}

/// Every `.yml`/`.yaml` workflow keyed by file stem.
pub fn locate_workflows(
    fs: &dyn Fs,
    root: &Path,
) -> Result<BTreeMap<String, Value>, ConfigParseError> {
    let mut out = BTreeMap::new();
    for entry in fs.list_dir(root, Path::new(WORKFLOWS_DIR))? {
        if entry.is_dir {
            continue;
        }
        let Some(stem) = entry
            .name
            .strip_suffix(".yml")
            .or_else(|| entry.name.strip_suffix(".yaml"))
        else {
            continue;
        };
        let path = format!("{WORKFLOWS_DIR}/{}", entry.name);
        if let Some(tree) = locate(fs, root, &path)? {
            out.insert(stem.to_string(), tree);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_review_adapters::FakeFs;
    use serde_json::json;

    const ROOT: &str = "/repo";

    #[test]
    fn missing_file_is_none() {
        let fs = FakeFs::new();
        let found = locate(&fs, Path::new(ROOT), "ruff.toml").expect("locate");
        assert_eq!(found, None);
    }

    #[test]
    fn parses_toml_and_yaml() {
        let fs = FakeFs::new()
            .with_file("ruff.toml", "line-length = 100\n[lint]\nselect = [\"B\"]\n")
            .with_file(".readthedocs.yml", "version: 2\nbuild:\n  os: ubuntu-22.04\n");
        let ruff = locate(&fs, Path::new(ROOT), "ruff.toml")
            .expect("locate")
            .expect("present");
        assert_eq!(ruff, json!({"line-length": 100, "lint": {"select": ["B"]}}));
        let rtd = locate(&fs, Path::new(ROOT), ".readthedocs.yml")
            .expect("locate")
            .expect("present");
        assert_eq!(rtd, json!({"version": 2, "build": {"os": "ubuntu-22.04"}}));
    }

    #[test]
    fn malformed_file_is_an_error_naming_the_path() {
        let fs = FakeFs::new().with_file("pyproject.toml", "[project\nname = 1\n");
        let err = locate(&fs, Path::new(ROOT), "pyproject.toml").expect_err("malformed");
        match err {
            ConfigParseError::Syntax { path, format, .. } => {
                assert_eq!(path, PathBuf::from("pyproject.toml"));
                assert_eq!(format, ConfigFormat::Toml);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn yaml_keys_are_stringified() {
        let fs = FakeFs::new().with_file(
            ".github/dependabot.yml",
            "2: two\ntrue: yes-key\non:\n  workflow_dispatch:\n",
        );
        let tree = locate(&fs, Path::new(ROOT), ".github/dependabot.yml")
            .expect("locate")
            .expect("present");
        assert_eq!(tree["2"], json!("two"));
        assert_eq!(tree["true"], json!("yes-key"));
        assert_eq!(tree["on"], json!({"workflow_dispatch": null}));
    }

    #[test]
    fn yaml_tags_are_unwrapped() {
        let fs = FakeFs::new().with_file("a.yaml", "value: !custom {a: 1}\n");
        let tree = locate(&fs, Path::new(ROOT), "a.yaml")
            .expect("locate")
            .expect("present");
        assert_eq!(tree, json!({"value": {"a": 1}}));
    }

    #[test]
    fn first_present_candidate_wins() {
        let fs = FakeFs::new()
            .with_file(".readthedocs.yml", "version: 1\n")
            .with_file(".readthedocs.yaml", "version: 2\n");
        let (path, tree) = locate_first(
            &fs,
            Path::new(ROOT),
            &[".readthedocs.yaml", ".readthedocs.yml"],
        )
        .expect("locate")
        .expect("present");
        assert_eq!(path, ".readthedocs.yaml");
        assert_eq!(tree["version"], json!(2));
    }

    #[test]
    fn workflows_are_keyed_by_stem() {
        let fs = FakeFs::new()
            .with_file(".github/workflows/ci.yml", "name: CI\n")
            .with_file(".github/workflows/cd.yaml", "name: CD\n")
            .with_file(".github/workflows/README.md", "# docs\n");
        let workflows = locate_workflows(&fs, Path::new(ROOT)).expect("workflows");
        assert_eq!(workflows.keys().collect::<Vec<_>>(), vec!["cd", "ci"]);
    }

    #[test]
    fn no_workflow_dir_is_empty() {
        let workflows = locate_workflows(&FakeFs::new(), Path::new(ROOT)).expect("workflows");
        assert!(workflows.is_empty());
    }
}

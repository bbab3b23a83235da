// SPDX-License-Identifier: Apache-2.0

//! Minimal INI reader with `configparser` semantics for `setup.cfg`.
//!
//! Produces a two-level tree: section name to option name to string value.
//! Option names are lower-cased; section names keep their case. Options of
//! `[DEFAULT]` are folded into every other section and the `DEFAULT` section
//! itself is not kept.

use serde_json::{Map, Value};

pub const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniError {
    pub line: usize,
    pub detail: String,
}

impl std::fmt::Display for IniError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.detail)
    }
}

impl std::error::Error for IniError {}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with('#') || trimmed.starts_with(';')
}

fn split_option(line: &str) -> Option<(&str, &str)> {
    let index = line.find(['=', ':'])?;
    Some((line[..index].trim(), line[index + 1..].trim()))
}

pub fn parse_ini(text: &str) -> Result<Value, IniError> {
    let mut sections = Map::new();
    let mut current: Option<(String, Map<String, Value>)> = None;
    let mut last_option: Option<String> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }

        let indented = raw.starts_with([' ', '\t']);
        if indented {
            if let (Some((_, options)), Some(name)) = (current.as_mut(), last_option.as_ref()) {
                if let Some(Value::String(value)) = options.get_mut(name) {
                    if !value.is_empty() {
                        value.push('\n');
                    }
                    value.push_str(trimmed);
                    continue;
                }
            }
        }

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let name = trimmed[1..trimmed.len() - 1].trim().to_string();
            if let Some((done, options)) = current.take() {
                sections.insert(done, Value::Object(options));
            }
            if sections.contains_key(&name) {
                return Err(IniError {
                    line: line_no,
                    detail: format!("section `{name}` already exists"),
                });
            }
            current = Some((name, Map::new()));
            last_option = None;
            continue;
        }

        let Some((_, options)) = current.as_mut() else {
            return Err(IniError {
                line: line_no,
                detail: "file contains no section headers".to_string(),
            });
        };
        let Some((key, value)) = split_option(trimmed) else {
            return Err(IniError {
                line: line_no,
                detail: format!("option `{trimmed}` has no value"),
            });
        };
        let key = key.to_lowercase();
        if options.contains_key(&key) {
            return Err(IniError {
                line: line_no,
                detail: format!("option `{key}` already exists"),
            });
        }
        options.insert(key.clone(), Value::String(value.to_string()));
        last_option = Some(key);
    }

    if let Some((done, options)) = current.take() {
        sections.insert(done, Value::Object(options));
    }
    if let Some(Value::Object(defaults)) = sections.remove(DEFAULT_SECTION) {
        for options in sections.values_mut().filter_map(Value::as_object_mut) {
            for (key, value) in &defaults {
                if !options.contains_key(key) {
                    options.insert(key.clone(), value.clone());
                }
            }
        }
    }
    Ok(Value::Object(sections))
}

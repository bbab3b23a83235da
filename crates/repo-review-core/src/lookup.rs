// SPDX-License-Identifier: Apache-2.0

//! Typed accessors over config trees. Ill-typed values read as absent.

use serde_json::{Map, Value};

pub fn path<'a>(tree: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(tree, |node, key| node.get(*key))
}

pub fn table<'a>(tree: &'a Value, keys: &[&str]) -> Option<&'a Map<String, Value>> {
    path(tree, keys).and_then(Value::as_object)
}

pub fn str_at<'a>(tree: &'a Value, keys: &[&str]) -> Option<&'a str> {
    path(tree, keys).and_then(Value::as_str)
}

pub fn bool_at(tree: &Value, keys: &[&str]) -> Option<bool> {
    path(tree, keys).and_then(Value::as_bool)
}

pub fn has(tree: &Value, keys: &[&str]) -> bool {
    path(tree, keys).is_some()
}

/// String members of a sequence; non-string members are skipped.
pub fn str_list<'a>(tree: &'a Value, keys: &[&str]) -> Vec<&'a str> {
    path(tree, keys)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

pub fn tables<'a>(tree: &'a Value, keys: &[&str]) -> impl Iterator<Item = &'a Value> {
    path(tree, keys)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|item| item.is_object())
}

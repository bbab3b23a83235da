// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

fn is_lower_kebab(input: &str) -> bool {
    !input.is_empty()
        && !input.starts_with('-')
        && !input.ends_with('-')
        && input
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn is_canonical_rule_id(raw: &str) -> bool {
    let prefix_len = raw.chars().take_while(char::is_ascii_uppercase).count();
    let digits = &raw[prefix_len..];
    prefix_len > 0 && digits.len() == 3 && digits.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn parse(value: &str) -> Result<Self, String> {
        let raw = value.trim();
        if raw.is_empty() {
            return Err("rule id cannot be empty".to_string());
        }
        if !is_canonical_rule_id(raw) {
            return Err(format!(
                "invalid rule id `{raw}`: expected an uppercase prefix and three digits"
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Uppercase letter prefix of the id, `PP` for `PP302`.
    pub fn prefix(&self) -> &str {
        self.0.trim_end_matches(|c: char| c.is_ascii_digit())
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyId(String);

impl FamilyId {
    pub fn parse(value: &str) -> Result<Self, String> {
        let raw = value.trim();
        if raw.is_empty() {
            return Err("family id cannot be empty".to_string());
        }
        if !is_lower_kebab(raw) {
            return Err(format!(
                "invalid family id `{raw}`: expected lowercase kebab-case"
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state result of a single rule check.
///
/// `Message` is a failure carrying remediation text. Build it through
/// [`CheckOutcome::from_message`] so an empty message reads as a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass,
    Fail,
    NotApplicable,
    Message(String),
}

impl CheckOutcome {
    pub fn from_bool(passed: bool) -> Self {
        if passed {
            Self::Pass
        } else {
            Self::Fail
        }
    }

    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            Self::Pass
        } else {
            Self::Message(message)
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, Self::NotApplicable)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Message(text) => Some(text),
            _ => None,
        }
    }
}

impl From<bool> for CheckOutcome {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<Option<bool>> for CheckOutcome {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::NotApplicable, Self::from_bool)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Pass,
    Fail,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub id: RuleId,
    pub family: FamilyId,
    pub title: String,
    pub status: RuleStatus,
    pub message: Option<String>,
    pub skip_reason: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyDescriptor {
    pub name: String,
    pub order: i32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub total: u64,
}

impl ReviewSummary {
    pub fn from_results(results: &[RuleResult]) -> Self {
        let count = |status: RuleStatus| {
            results.iter().filter(|row| row.status == status).count() as u64
        };
        Self {
            passed: count(RuleStatus::Pass),
            failed: count(RuleStatus::Fail),
            skipped: count(RuleStatus::Skip),
            total: results.len() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub repo_root: String,
    pub families: BTreeMap<FamilyId, FamilyDescriptor>,
    pub results: Vec<RuleResult>,
    pub summary: ReviewSummary,
}

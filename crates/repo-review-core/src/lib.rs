// SPDX-License-Identifier: Apache-2.0

//! Best-practice review of Python project repositories.
//!
//! Configuration sources are located and parsed into [`serde_json::Value`]
//! trees, exposed to rules through a lazily computed [`Fixtures`] bag, and
//! evaluated by [`run_review`] against the static rule catalog in [`checks`].

#![forbid(unsafe_code)]

pub mod checks;
pub mod constraint;
pub mod error;
pub mod families;
pub mod fixtures;
pub mod locate;
pub mod lookup;
pub mod pytest;
pub mod ruff;
pub mod runner;
pub mod script;
pub mod settings;
pub mod setupcfg;

pub use checks::{all_rules, find_rule, RuleKind, RuleSpec};
pub use error::{ConfigFormat, ConfigParseError, ScriptError};
pub use families::describe_families;
pub use fixtures::{FixtureName, Fixtures};
pub use runner::{
    exit_code_for_report, explain_output, list_output, render_json, render_text,
    render_text_summary, run_review, select_rules, validate_registry, ReviewError,
    EXIT_CONFIG_ERROR,
};
pub use settings::ReviewSettings;

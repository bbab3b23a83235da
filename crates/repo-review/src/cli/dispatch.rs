// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};

use crate::cli::{Cli, Command};
use crate::commands::{run_explain, run_list, run_review_command, run_ruff_rules, CommandError};

fn emit(result: Result<(String, i32), CommandError>, label: &str) -> i32 {
    match result {
        Ok((rendered, code)) => {
            if !rendered.is_empty() {
                let _ = writeln!(io::stdout(), "{rendered}");
            }
            code
        }
        Err(err) => {
            let _ = writeln!(io::stderr(), "repo-review {label} failed: {}", err.message);
            err.code
        }
    }
}

pub(crate) fn run_cli(cli: Cli) -> i32 {
    match cli.command {
        None => emit(run_review_command(cli.review), "review"),
        Some(Command::List) => emit(run_list(), "list"),
        Some(Command::Explain { rule_id }) => emit(run_explain(&rule_id), "explain"),
        Some(Command::RuffRules { path }) => emit(run_ruff_rules(&path), "ruff-rules"),
    }
}

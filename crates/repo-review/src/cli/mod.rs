// SPDX-License-Identifier: Apache-2.0

mod dispatch;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub(crate) fn run() -> i32 {
    let cli = Cli::parse();
    dispatch::run_cli(cli)
}

#[derive(Parser, Debug)]
#[command(name = "repo-review", version, disable_help_subcommand = true)]
#[command(about = "Review a Python project repository against packaging best practices")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(flatten)]
    pub review: ReviewArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone)]
pub struct ReviewArgs {
    /// Repository root to review.
    #[arg(default_value = ".")]
    pub path: PathBuf,
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    pub format: FormatArg,
    /// Rule ids, id prefixes or family names to run; replaces `[tool.repo-review] select`.
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,
    /// Rule ids, id prefixes or family names to skip; replaces `[tool.repo-review] ignore`.
    #[arg(long, value_delimiter = ',')]
    pub ignore: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every rule in the catalog.
    List,
    /// Show the metadata and documentation of one rule.
    Explain { rule_id: String },
    /// Show which Ruff rule groups a repository selects.
    RuffRules {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_reviews_the_current_directory() {
        let cli = Cli::try_parse_from(["repo-review"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.review.path, PathBuf::from("."));
        assert_eq!(cli.review.format, FormatArg::Text);
    }

    #[test]
    fn selectors_accept_commas_and_repetition() {
        let cli = Cli::try_parse_from([
            "repo-review",
            "proj",
            "--select",
            "PP,RF1",
            "--select",
            "general",
            "--ignore=PY004",
            "--format",
            "json",
        ])
        .expect("parse");
        assert_eq!(cli.review.select, vec!["PP", "RF1", "general"]);
        assert_eq!(cli.review.ignore, vec!["PY004"]);
        assert_eq!(cli.review.format, FormatArg::Json);
        assert_eq!(cli.review.path, PathBuf::from("proj"));
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["repo-review", "explain", "PP302"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Explain { ref rule_id }) if rule_id == "PP302"));
        let cli = Cli::try_parse_from(["repo-review", "ruff-rules"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::RuffRules { ref path }) if path == &PathBuf::from(".")));
    }
}

// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod cli;
mod commands;

use std::env;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

// Logs go to stderr so stdout stays a clean report.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("REPO_REVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    if env_bool("REPO_REVIEW_LOG_JSON", false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() {
    init_tracing();
    std::process::exit(cli::run());
}

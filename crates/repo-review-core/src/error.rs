// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::PathBuf;

use repo_review_adapters::AdapterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Ini,
}

impl ConfigFormat {
    pub fn for_path(path: &str) -> Option<Self> {
        let (_, extension) = path.rsplit_once('.')?;
        match extension {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "cfg" | "ini" => Some(Self::Ini),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Yaml => "yaml",
            Self::Ini => "ini",
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    Grammar { detail: String },
    Syntax { line: usize, column: usize },
    MultipleBlocks { kind: String },
    Metadata { detail: String },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grammar { detail } => write!(f, "python grammar unavailable: {detail}"),
            Self::Syntax { line, column } => {
                write!(f, "python syntax error at line {line}, column {column}")
            }
            Self::MultipleBlocks { kind } => write!(f, "multiple {kind} blocks found"),
            Self::Metadata { detail } => write!(f, "invalid script metadata block: {detail}"),
        }
    }
}

impl std::error::Error for ScriptError {}

/// A configuration source that exists but cannot be used.
///
/// Absence is never reported through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigParseError {
    Io {
        path: PathBuf,
        detail: String,
    },
    Syntax {
        path: PathBuf,
        format: ConfigFormat,
        detail: String,
    },
    Unsupported {
        path: PathBuf,
    },
    Script {
        path: PathBuf,
        source: ScriptError,
    },
}

impl ConfigParseError {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Io { path, .. }
            | Self::Syntax { path, .. }
            | Self::Unsupported { path }
            | Self::Script { path, .. } => path,
        }
    }
}

impl From<AdapterError> for ConfigParseError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Io { path, detail, .. } => Self::Io { path, detail },
            AdapterError::PathViolation { path, detail } => Self::Io { path, detail },
        }
    }
}

impl fmt::Display for ConfigParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, detail } => write!(f, "cannot read {}: {detail}", path.display()),
            Self::Syntax {
                path,
                format,
                detail,
            } => write!(f, "malformed {format} in {}: {detail}", path.display()),
            Self::Unsupported { path } => {
                write!(f, "no parser for configuration file {}", path.display())
            }
            Self::Script { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for ConfigParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Script { source, .. } => Some(source),
            _ => None,
        }
    }
}

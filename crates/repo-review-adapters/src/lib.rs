// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    PathViolation {
        path: PathBuf,
        detail: String,
    },
    Io {
        op: &'static str,
        path: PathBuf,
        detail: String,
    },
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PathViolation { path, detail } => {
                write!(f, "path violation: {} ({detail})", path.display())
            }
            Self::Io { op, path, detail } => {
                write!(f, "io error: {op} {} ({detail})", path.display())
            }
        }
    }
}

impl std::error::Error for AdapterError {}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read-only view of a repository checkout.
///
/// Every path is relative to `repo_root`. Implementations never write.
pub trait Fs {
    fn read_text(&self, repo_root: &Path, path: &Path) -> Result<String, AdapterError>;
    fn is_file(&self, repo_root: &Path, path: &Path) -> bool;
    fn is_dir(&self, repo_root: &Path, path: &Path) -> bool;
    /// Children of a directory sorted by name; a missing directory lists as empty.
    fn list_dir(&self, repo_root: &Path, path: &Path) -> Result<Vec<DirEntry>, AdapterError>;
}

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn join_under_root(repo_root: &Path, path: &Path) -> Result<PathBuf, AdapterError> {
    if path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(AdapterError::PathViolation {
            path: path.to_path_buf(),
            detail: "paths must stay inside the repository root".to_string(),
        });
    }
    Ok(repo_root.join(path))
}

#[derive(Debug, Default)]
pub struct RealFs;

impl Fs for RealFs {
    fn read_text(&self, repo_root: &Path, path: &Path) -> Result<String, AdapterError> {
        let target = join_under_root(repo_root, path)?;
        let text = fs::read_to_string(&target).map_err(|err| AdapterError::Io {
            op: "read_to_string",
            path: target,
            detail: err.to_string(),
        })?;
        Ok(normalize_line_endings(&text))
    }

    fn is_file(&self, repo_root: &Path, path: &Path) -> bool {
        join_under_root(repo_root, path).is_ok_and(|target| target.is_file())
    }

    fn is_dir(&self, repo_root: &Path, path: &Path) -> bool {
        join_under_root(repo_root, path).is_ok_and(|target| target.is_dir())
    }

    fn list_dir(&self, repo_root: &Path, path: &Path) -> Result<Vec<DirEntry>, AdapterError> {
        let target = join_under_root(repo_root, path)?;
        if !target.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&target).map_err(|err| AdapterError::Io {
            op: "read_dir",
            path: target.clone(),
            detail: err.to_string(),
        })?;
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| AdapterError::Io {
                op: "read_dir_entry",
                path: target.clone(),
                detail: err.to_string(),
            })?;
            out.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.path().is_dir(),
            });
        }
        out.sort();
        Ok(out)
    }
}

/// In-memory repository used by tests and benches.
#[derive(Debug, Default, Clone)]
pub struct FakeFs {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.insert_dir_chain(parent);
        }
        self.files.insert(path, text.into());
        self
    }

    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.insert_dir_chain(&path);
        self
    }

    fn insert_dir_chain(&mut self, dir: &Path) {
        let mut current = Some(dir);
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(dir.to_path_buf());
            current = dir.parent();
        }
    }
}

impl Fs for FakeFs {
    fn read_text(&self, repo_root: &Path, path: &Path) -> Result<String, AdapterError> {
        let relative = join_under_root(repo_root, path)?;
        self.files
            .get(path)
            .map(|text| normalize_line_endings(text))
            .ok_or(AdapterError::Io {
                op: "read_text",
                path: relative,
                detail: "file not present in FakeFs".to_string(),
            })
    }

    fn is_file(&self, repo_root: &Path, path: &Path) -> bool {
        join_under_root(repo_root, path).is_ok() && self.files.contains_key(path)
    }

    fn is_dir(&self, repo_root: &Path, path: &Path) -> bool {
        join_under_root(repo_root, path).is_ok()
            && (path.as_os_str().is_empty() || self.dirs.contains(path))
    }

    fn list_dir(&self, repo_root: &Path, path: &Path) -> Result<Vec<DirEntry>, AdapterError> {
        join_under_root(repo_root, path)?;
        let children = |candidate: &Path| candidate.parent() == Some(path);
        let mut out = BTreeSet::new();
        for file in self.files.keys().filter(|file| children(file)) {
            if let Some(name) = file.file_name() {
                out.insert(DirEntry {
                    name: name.to_string_lossy().into_owned(),
                    is_dir: false,
                });
            }
        }
        for dir in self.dirs.iter().filter(|dir| children(dir)) {
            if let Some(name) = dir.file_name() {
                out.insert(DirEntry {
                    name: name.to_string_lossy().into_owned(),
                    is_dir: true,
                });
            }
        }
        Ok(out.into_iter().collect())
    }
}

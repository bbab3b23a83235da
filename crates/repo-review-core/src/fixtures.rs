// SPDX-License-Identifier: Apache-2.0

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use repo_review_adapters::{DirEntry, Fs};
use serde_json::Value;
use tracing::debug;

use crate::constraint::resolve_version_constraint;
use crate::error::ConfigParseError;
use crate::locate::{locate, locate_first, locate_setup_cfg, locate_workflows};
use crate::pytest::{resolve_pytest_config, PytestConfig};
use crate::ruff::resolve_lint_config;
use crate::script::{analyze_script, ScriptInfo};

pub const NOXFILE: &str = "noxfile.py";
pub const PRECOMMIT_CONFIG: &str = ".pre-commit-config.yaml";
pub const READTHEDOCS_FILES: [&str; 2] = [".readthedocs.yaml", ".readthedocs.yml"];
pub const DEPENDABOT_CONFIG: &str = ".github/dependabot.yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FixtureName {
    Root,
    Pyproject,
    Ruff,
    Pytest,
    Precommit,
    Readthedocs,
    Workflows,
    Dependabot,
    Setupcfg,
    Noxfile,
    RequiresPython,
}

impl FixtureName {
    pub const ALL: [FixtureName; 11] = [
        Self::Root,
        Self::Pyproject,
        Self::Ruff,
        Self::Pytest,
        Self::Precommit,
        Self::Readthedocs,
        Self::Workflows,
        Self::Dependabot,
        Self::Setupcfg,
        Self::Noxfile,
        Self::RequiresPython,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Pyproject => "pyproject",
            Self::Ruff => "ruff",
            Self::Pytest => "pytest",
            Self::Precommit => "precommit",
            Self::Readthedocs => "readthedocs",
            Self::Workflows => "workflows",
            Self::Dependabot => "dependabot",
            Self::Setupcfg => "setupcfg",
            Self::Noxfile => "noxfile",
            Self::RequiresPython => "requires_python",
        }
    }
}

impl std::fmt::Display for FixtureName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type Cached<T> = OnceCell<Result<T, ConfigParseError>>;

fn cached<'s, T>(
    cell: &'s Cached<T>,
    name: FixtureName,
    load: impl FnOnce() -> Result<T, ConfigParseError>,
) -> Result<&'s T, ConfigParseError> {
    cell.get_or_init(|| {
        let loaded = load();
        debug!(fixture = name.as_str(), ok = loaded.is_ok(), "fixture computed");
        loaded
    })
    .as_ref()
    .map_err(Clone::clone)
}

/// Lazily computed, memoized inputs for one review pass over one repository.
///
/// Each fixture is computed at most once; errors are memoized too, so a
/// malformed file is reported identically to every rule that needs it.
pub struct Fixtures<'a> {
    fs: &'a dyn Fs,
    root: &'a Path,
    root_entries: Cached<Vec<DirEntry>>,
    pyproject: Cached<Option<Value>>,
    ruff: Cached<Option<Value>>,
    pytest: Cached<PytestConfig>,
    precommit: Cached<Option<Value>>,
    readthedocs: Cached<Option<Value>>,
    workflows: Cached<BTreeMap<String, Value>>,
    dependabot: Cached<Option<Value>>,
    setupcfg: Cached<Option<Value>>,
    noxfile: Cached<Option<ScriptInfo>>,
    requires_python: Cached<Option<String>>,
}

impl<'a> Fixtures<'a> {
    pub fn new(fs: &'a dyn Fs, root: &'a Path) -> Self {
        Self {
            fs,
            root,
            root_entries: OnceCell::new(),
            pyproject: OnceCell::new(),
            ruff: OnceCell::new(),
            pytest: OnceCell::new(),
            precommit: OnceCell::new(),
            readthedocs: OnceCell::new(),
            workflows: OnceCell::new(),
            dependabot: OnceCell::new(),
            setupcfg: OnceCell::new(),
            noxfile: OnceCell::new(),
            requires_python: OnceCell::new(),
        }
    }

    pub fn fs(&self) -> &'a dyn Fs {
        self.fs
    }

    pub fn root(&self) -> &'a Path {
        self.root
    }

    pub fn is_file(&self, path: &str) -> bool {
        self.fs.is_file(self.root, Path::new(path))
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.fs.is_dir(self.root, Path::new(path))
    }

    pub fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, ConfigParseError> {
        Ok(self.fs.list_dir(self.root, Path::new(path))?)
    }

    /// Forces computation of one fixture.
    pub fn load(&self, name: FixtureName) -> Result<(), ConfigParseError> {
        match name {
            FixtureName::Root => self.root_entries().map(drop),
            FixtureName::Pyproject => self.pyproject().map(drop),
            FixtureName::Ruff => self.ruff().map(drop),
            FixtureName::Pytest => self.pytest().map(drop),
            FixtureName::Precommit => self.precommit().map(drop),
            FixtureName::Readthedocs => self.readthedocs().map(drop),
            FixtureName::Workflows => self.workflows().map(drop),
            FixtureName::Dependabot => self.dependabot().map(drop),
            FixtureName::Setupcfg => self.setupcfg().map(drop),
            FixtureName::Noxfile => self.noxfile().map(drop),
            FixtureName::RequiresPython => self.requires_python().map(drop),
        }
    }

    /// Top-level entries of the repository.
    pub fn root_entries(&self) -> Result<&[DirEntry], ConfigParseError> {
        cached(&self.root_entries, FixtureName::Root, || self.list_dir(""))
            .map(Vec::as_slice)
    }

    pub fn pyproject(&self) -> Result<Option<&Value>, ConfigParseError> {
        cached(&self.pyproject, FixtureName::Pyproject, || {
            locate(self.fs, self.root, "pyproject.toml")
        })
        .map(Option::as_ref)
    }

    /// Effective Ruff configuration from `.ruff.toml`, `ruff.toml` or `tool.ruff`.
    pub fn ruff(&self) -> Result<Option<&Value>, ConfigParseError> {
        cached(&self.ruff, FixtureName::Ruff, || {
            resolve_lint_config(self.pyproject()?, self.fs, self.root)
        })
        .map(Option::as_ref)
    }

    pub fn pytest(&self) -> Result<&PytestConfig, ConfigParseError> {
        cached(&self.pytest, FixtureName::Pytest, || {
            resolve_pytest_config(self.pyproject()?, self.fs, self.root)
        })
    }

    pub fn precommit(&self) -> Result<Option<&Value>, ConfigParseError> {
        cached(&self.precommit, FixtureName::Precommit, || {
            locate(self.fs, self.root, PRECOMMIT_CONFIG)
        })
        .map(Option::as_ref)
    }

    pub fn readthedocs(&self) -> Result<Option<&Value>, ConfigParseError> {
        cached(&self.readthedocs, FixtureName::Readthedocs, || {
            Ok(locate_first(self.fs, self.root, &READTHEDOCS_FILES)?.map(|(_, tree)| tree))
        })
        .map(Option::as_ref)
    }

    pub fn workflows(&self) -> Result<&BTreeMap<String, Value>, ConfigParseError> {
        cached(&self.workflows, FixtureName::Workflows, || {
            locate_workflows(self.fs, self.root)
        })
    }

    pub fn dependabot(&self) -> Result<Option<&Value>, ConfigParseError> {
        cached(&self.dependabot, FixtureName::Dependabot, || {
            locate(self.fs, self.root, DEPENDABOT_CONFIG)
        })
        .map(Option::as_ref)
    }

    pub fn setupcfg(&self) -> Result<Option<&Value>, ConfigParseError> {
        cached(&self.setupcfg, FixtureName::Setupcfg, || {
            locate_setup_cfg(self.fs, self.root)
        })
        .map(Option::as_ref)
    }

    /// Parsed `noxfile.py`, `None` when the repository has none.
    pub fn noxfile(&self) -> Result<Option<&ScriptInfo>, ConfigParseError> {
        cached(&self.noxfile, FixtureName::Noxfile, || {
            if !self.is_file(NOXFILE) {
                return Ok(None);
            }
            let text = self.fs.read_text(self.root, Path::new(NOXFILE))?;
            analyze_script(&text)
                .map(Some)
                .map_err(|source| ConfigParseError::Script {
                    path: PathBuf::from(NOXFILE),
                    source,
                })
        })
        .map(Option::as_ref)
    }

    pub fn requires_python(&self) -> Result<Option<&str>, ConfigParseError> {
        cached(&self.requires_python, FixtureName::RequiresPython, || {
            Ok(resolve_version_constraint(self.pyproject()?, self.setupcfg()?))
        })
        .map(Option::as_deref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_review_adapters::FakeFs;
    use serde_json::json;

    const ROOT: &str = "/repo";

    #[test]
    fn fixture_names_are_stable() {
        let names = FixtureName::ALL.map(FixtureName::as_str);
        assert_eq!(
            names,
            [
                "root",
                "pyproject",
                "ruff",
                "pytest",
                "precommit",
                "readthedocs",
                "workflows",
                "dependabot",
                "setupcfg",
                "noxfile",
                "requires_python"
            ]
        );
    }

    #[test]
    fn absent_files_are_none() {
        let fs = FakeFs::new();
        let fixtures = Fixtures::new(&fs, Path::new(ROOT));
        assert_eq!(fixtures.pyproject().expect("pyproject"), None);
        assert_eq!(fixtures.ruff().expect("ruff"), None);
        assert_eq!(fixtures.precommit().expect("precommit"), None);
        assert!(fixtures.noxfile().expect("noxfile").is_none());
        assert!(fixtures.workflows().expect("workflows").is_empty());
        assert_eq!(fixtures.requires_python().expect("constraint"), None);
    }

    #[test]
    fn derived_fixtures_share_the_manifest() {
        let fs = FakeFs::new()
            .with_file(
                "pyproject.toml",
                "[project]\nrequires-python = \">=3.10\"\n[tool.ruff]\nsrc = [\"src\"]\n",
            )
            .with_file("setup.cfg", "[options]\npython_requires = >=3.7\n");
        let fixtures = Fixtures::new(&fs, Path::new(ROOT));
        assert_eq!(fixtures.ruff().expect("ruff"), Some(&json!({"src": ["src"]})));
        assert_eq!(fixtures.requires_python().expect("constraint"), Some(">=3.10"));
    }

    #[test]
    fn parse_errors_are_memoized_and_repeated() {
        let fs = FakeFs::new().with_file("pyproject.toml", "[project\n");
        let fixtures = Fixtures::new(&fs, Path::new(ROOT));
        let first = fixtures.pyproject().expect_err("malformed");
        let second = fixtures.ruff().expect_err("depends on pyproject");
        assert_eq!(first, second);
    }

    #[test]
    fn noxfile_errors_name_the_script() {
        let fs = FakeFs::new().with_file(NOXFILE, "def broken(:\n");
        let fixtures = Fixtures::new(&fs, Path::new(ROOT));
        let err = fixtures.noxfile().expect_err("syntax error");
        assert_eq!(err.path(), &PathBuf::from(NOXFILE));
        assert!(fixtures.load(FixtureName::Noxfile).is_err());
    }

    #[test]
    fn readthedocs_accepts_both_extensions() {
        let fs = FakeFs::new().with_file(".readthedocs.yml", "version: 2\n");
        let fixtures = Fixtures::new(&fs, Path::new(ROOT));
        assert_eq!(
            fixtures.readthedocs().expect("rtd"),
            Some(&json!({"version": 2}))
        );
    }
}

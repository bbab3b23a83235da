// SPDX-License-Identifier: Apache-2.0

use serde_json::Value;

use crate::lookup;

/// The declared `requires-python` constraint, wherever it lives.
///
/// PEP 621 metadata wins over Poetry, which wins over `setup.cfg`. An empty
/// declared constraint is still a declaration.
pub fn resolve_version_constraint(
    pyproject: Option<&Value>,
    setupcfg: Option<&Value>,
) -> Option<String> {
    let from_project =
        || pyproject.and_then(|tree| lookup::str_at(tree, &["project", "requires-python"]));
    let from_poetry = || {
        let python = pyproject.and_then(|tree| {
            lookup::path(tree, &["tool", "poetry", "dependencies", "python"])
        })?;
        python
            .as_str()
            .or_else(|| lookup::str_at(python, &["version"]))
    };
    let from_setupcfg =
        || setupcfg.and_then(|tree| lookup::str_at(tree, &["options", "python_requires"]));

    from_project()
        .or_else(from_poetry)
        .or_else(from_setupcfg)
        .map(str::to_string)
}

/// True when the constraint caps the Python version from above.
pub fn has_upper_cap(constraint: &str) -> bool {
    constraint.contains('^') || constraint.contains("~=") || constraint.contains('<')
}

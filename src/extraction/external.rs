//! Classification of paths that belong to external libraries.
//!
//! Purely syntactic: a path is external when one of its segments is a known
//! marker for system libraries, virtual environments, dependency caches or
//! build output. Nothing is looked up on disk. External files that match no
//! marker slip through as project files; the classifier only has to keep a
//! bounded traversal out of the standard library and dependency trees.

use std::path::{Component, Path, PathBuf};

/// Directory names that mark a dependency tree, environment, cache or build output.
const EXTERNAL_SEGMENTS: &[&str] = &[
    "site-packages",
    "dist-packages",
    "venv",
    ".venv",
    "env",
    ".env",
    "virtualenv",
    ".virtualenvs",
    "__pycache__",
    "node_modules",
    ".tox",
    ".nox",
    ".mypy_cache",
    ".pytest_cache",
    ".eggs",
    "build",
    "dist",
];

/// Absolute prefixes of system-wide library installs.
const SYSTEM_PREFIXES: &[&str] = &["/usr/lib", "/usr/lib64", "/usr/local/lib", "/opt/homebrew/lib"];

pub fn is_external(path: &Path) -> bool {
    let normalized = normalize_path(path);

    if SYSTEM_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        return true;
    }

    let segments: Vec<&str> = normalized
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();

    let has_marker = segments.iter().any(|segment| {
        EXTERNAL_SEGMENTS.contains(segment) || segment.ends_with(".egg-info")
    });

    // `lib/python3.12` on unix installs, `Lib/...` on Windows ones
    let has_interpreter_lib = segments.windows(2).any(|pair| {
        matches!(pair[0], "lib" | "Lib") && pair[1].to_ascii_lowercase().starts_with("python")
    });

    has_marker || has_interpreter_lib
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// True when `path` lies strictly below `root` after normalization.
pub fn is_strict_descendant(path: &Path, root: &Path) -> bool {
    let path = normalize_path(path);
    let root = normalize_path(root);
    path != root && path.starts_with(&root)
}

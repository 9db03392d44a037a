use crate::core::Language;
use crate::extraction::external::is_external;
use anyhow::Result;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into when looking for project sources.
const EXCLUDED_DIRS: &[&str] = &[
    "__pycache__",
    "venv",
    "env",
    ".venv",
    ".env",
    "site-packages",
    "dist-packages",
    "lib",
    "Lib",
    "node_modules",
    "build",
    "dist",
    ".git",
    ".github",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    "egg-info",
];

pub struct FileWalker {
    root: PathBuf,
    languages: Vec<Language>,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            languages: vec![Language::Python],
        }
    }

    pub fn with_languages(mut self, languages: Vec<Language>) -> Self {
        self.languages = languages;
        self
    }

    /// All project source files below the root, sorted by path.
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded_dir(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::debug!("Skipping directory entry: {}", err);
                    continue;
                }
            };
            let path = entry.path();

            if entry.file_type().is_file() && self.should_process(path) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || EXCLUDED_DIRS.contains(&name.as_ref())
    }

    fn should_process(&self, path: &Path) -> bool {
        let lang = Language::from_path(path);
        self.languages.contains(&lang) && path.starts_with(&self.root) && !is_external(path)
    }
}

pub fn find_project_files(root: &Path, languages: Vec<Language>) -> Result<Vec<PathBuf>> {
    FileWalker::new(root.to_path_buf())
        .with_languages(languages)
        .walk()
}

/// Breadth-first search below `root` for a file called `file_name`.
///
/// Deliberately incomplete: at most `dir_limit` directories are scanned, in
/// breadth-first order with entries sorted by name. Directories that look
/// external, hidden ones and `__pycache__` are never entered.
pub fn find_module_file(root: &Path, file_name: &str, dir_limit: usize) -> Option<PathBuf> {
    let mut queue = VecDeque::from([root.to_path_buf()]);
    let mut scanned = 0;

    while let Some(dir) = queue.pop_front() {
        if scanned >= dir_limit {
            log::debug!(
                "Project search for {} stopped after {} directories",
                file_name,
                dir_limit
            );
            return None;
        }
        scanned += 1;

        let mut entries: Vec<PathBuf> = match std::fs::read_dir(&dir) {
            Ok(read_dir) => read_dir.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(err) => {
                log::debug!("Cannot scan {}: {}", dir.display(), err);
                continue;
            }
        };
        entries.sort();

        if let Some(found) = entries
            .iter()
            .find(|p| p.is_file() && p.file_name().is_some_and(|n| n == file_name))
        {
            return Some(found.clone());
        }

        queue.extend(entries.into_iter().filter(|p| p.is_dir() && is_searchable_dir(p)));
    }

    None
}

fn is_searchable_dir(path: &Path) -> bool {
    let hidden_or_cache = path
        .file_name()
        .map(|n| {
            let name = n.to_string_lossy();
            name.starts_with('.') || name == "__pycache__"
        })
        .unwrap_or(true);
    !hidden_or_cache && !is_external(path)
}

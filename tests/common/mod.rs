// Test utility module for codegrapher integration tests
#![allow(dead_code)]

use codegrapher::CodeObject;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway project tree on disk.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp project"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write a file, creating parent directories as needed.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    pub fn with_file(self, relative: &str, contents: &str) -> Self {
        self.write(relative, contents);
        self
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// `count` simple assignment lines, each costing three tokens.
pub fn assignments(count: usize, indent: &str) -> String {
    (0..count)
        .map(|i| format!("{indent}v{i} = {i}\n"))
        .collect()
}

pub fn names(objects: &[CodeObject]) -> Vec<&str> {
    objects.iter().map(|o| o.name.as_str()).collect()
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::extraction::{
    ExtractOptions, DEFAULT_TOKEN_LIMIT, MAX_IMPORT_DEPTH, PROJECT_SEARCH_DIR_LIMIT,
};

pub fn default_token_limit() -> usize {
    DEFAULT_TOKEN_LIMIT
}

pub fn default_max_import_depth() -> usize {
    MAX_IMPORT_DEPTH
}

pub fn default_search_dir_limit() -> usize {
    PROJECT_SEARCH_DIR_LIMIT
}

pub fn default_max_additional_files() -> usize {
    5
}

/// Root configuration structure, read from `.codegrapher.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GrapherConfig {
    /// Token budget shared by the target and everything it pulls in
    #[serde(default = "default_token_limit")]
    pub token_limit: usize,

    /// Longest import chain followed from the target file
    #[serde(default = "default_max_import_depth")]
    pub max_import_depth: usize,

    /// Directories scanned by the project-wide module search
    #[serde(default = "default_search_dir_limit")]
    pub search_dir_limit: usize,

    /// Cap on related files attached to a bundle
    #[serde(default = "default_max_additional_files")]
    pub max_additional_files: usize,

    /// Extra module search roots tried after the project root
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

impl Default for GrapherConfig {
    fn default() -> Self {
        Self {
            token_limit: default_token_limit(),
            max_import_depth: default_max_import_depth(),
            search_dir_limit: default_search_dir_limit(),
            max_additional_files: default_max_additional_files(),
            search_paths: Vec::new(),
        }
    }
}

impl GrapherConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.token_limit == 0 {
            return Err("token_limit must be a positive integer".to_string());
        }
        if self.search_dir_limit == 0 {
            return Err("search_dir_limit must be a positive integer".to_string());
        }
        Ok(())
    }

    pub fn to_options(&self) -> ExtractOptions {
        ExtractOptions {
            token_limit: self.token_limit,
            target_object: None,
            search_paths: self.search_paths.clone(),
            max_depth: self.max_import_depth,
            search_dir_limit: self.search_dir_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_engine_constants() {
        let options = GrapherConfig::default().to_options();
        assert_eq!(options, ExtractOptions::default());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let config = GrapherConfig {
            token_limit: 0,
            ..GrapherConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(GrapherConfig::default().validate().is_ok());
    }
}

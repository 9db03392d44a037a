//! Token-budgeted extraction of a target file and the code it imports.
//!
//! ```ignore
//! use codegrapher::extraction::extract;
//!
//! let result = extract(Path::new("/repo/app/views.py"), Path::new("/repo"), 8000)?;
//! assert!(result.token_count <= result.token_limit);
//! ```

pub mod budget;
pub mod external;
pub mod resolver;
pub mod symbols;
pub mod tokens;

pub use budget::{prioritize, BudgetOutcome};
pub use external::is_external;
pub use resolver::{
    ExtractionState, ImportResolver, ResolverSettings, MAX_IMPORT_DEPTH, PROJECT_SEARCH_DIR_LIMIT,
};
pub use tokens::count_tokens;

use crate::core::{ExtractionError, ExtractionResult, Result};
use crate::parser::{parse_file, parser_for_path};
use external::normalize_path;
use std::path::{Path, PathBuf};

pub const DEFAULT_TOKEN_LIMIT: usize = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub token_limit: usize,
    /// Extract one declaration instead of the whole target file.
    pub target_object: Option<String>,
    pub search_paths: Vec<PathBuf>,
    pub max_depth: usize,
    pub search_dir_limit: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            token_limit: DEFAULT_TOKEN_LIMIT,
            target_object: None,
            search_paths: Vec::new(),
            max_depth: MAX_IMPORT_DEPTH,
            search_dir_limit: PROJECT_SEARCH_DIR_LIMIT,
        }
    }
}

impl ExtractOptions {
    pub fn new(token_limit: usize) -> Self {
        Self {
            token_limit,
            ..Self::default()
        }
    }

    pub fn with_target_object(mut self, name: impl Into<String>) -> Self {
        self.target_object = Some(name.into());
        self
    }

    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }
}

/// Extract the whole target file plus its in-project references.
pub fn extract(target: &Path, project_root: &Path, token_limit: usize) -> Result<ExtractionResult> {
    extract_with(target, project_root, &ExtractOptions::new(token_limit))
}

pub fn extract_with(
    target: &Path,
    project_root: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionResult> {
    let target = absolute(target);
    let project_root = absolute(project_root);

    let parser = parser_for_path(&target).ok_or_else(|| {
        ExtractionError::parse_failed(&target, "no parser available for this file type")
    })?;
    let (unit, source) = parse_file(parser.as_ref(), &target)?;

    let main_object = match &options.target_object {
        Some(name) => symbols::extract_symbol(&unit, &source, name, &target)
            .ok_or_else(|| ExtractionError::target_not_found(name, &target))?,
        None => symbols::extract_module(&unit, &source, &target),
    };

    let mut state = ExtractionState::new();
    state.mark_target(&target);

    let settings = ResolverSettings {
        project_root: project_root.clone(),
        search_paths: options.search_paths.iter().map(|p| absolute(p)).collect(),
        max_depth: options.max_depth,
        search_dir_limit: options.search_dir_limit,
    };
    ImportResolver::new(parser.as_ref(), settings).resolve(&unit, &target, &mut state);
    state.retain_project_references(&project_root);

    log::debug!(
        "Visited {} files, collected {} references for {}",
        state.visited_files.len(),
        state.referenced_objects.len(),
        target.display()
    );

    let main_tokens = count_tokens(&main_object.source_text);
    let total_tokens = main_tokens
        + state
            .referenced_objects
            .iter()
            .map(|object| count_tokens(&object.source_text))
            .sum::<usize>();

    if total_tokens <= options.token_limit {
        return Ok(ExtractionResult {
            main_object,
            referenced_objects: state.referenced_objects,
            token_count: total_tokens,
            token_limit: options.token_limit,
            truncated: false,
        });
    }

    log::info!(
        "{} tokens exceed the limit of {}; prioritizing references",
        total_tokens,
        options.token_limit
    );
    let outcome = prioritize(&main_object, state.referenced_objects, options.token_limit);

    Ok(ExtractionResult {
        main_object,
        referenced_objects: outcome.kept,
        token_count: outcome.token_count,
        token_limit: options.token_limit,
        truncated: outcome.truncated,
    })
}

fn absolute(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize_path(&absolute)
}

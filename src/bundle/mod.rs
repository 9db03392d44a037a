//! Packs an extraction result into a single LLM-ready bundle.
//!
//! On top of the target and its references, a bundle carries the project
//! README and a handful of related source files, all sharing one token
//! budget. Paths in the bundle are relative to the project root.

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::config::GrapherConfig;
use crate::core::{CodeObject, Language, ObjectKind};
use crate::extraction::external::normalize_path;
use crate::extraction::{count_tokens, extract_with};
use crate::io::{find_project_files, read_file};
use crate::parser::{parse_file, parser_for_path, PythonParser, UnitParser};

const README_NAMES: &[&str] = &["README.md", "README.txt", "README", "readme.md", "Readme.md"];
const README_DOCSTRING: &str = "Project documentation";
const SAME_DIRECTORY_RELEVANCE: u32 = 3;
const IMPORT_NAME_RELEVANCE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    Target,
    Readme,
    RelatedByDirectory,
    RelatedByImport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BundleFile {
    pub file_path: String,
    pub code: String,
    #[serde(rename = "type")]
    pub role: FileRole,
    pub docstring: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReferencedFile {
    pub file_path: String,
    pub object_name: String,
    pub object_type: ObjectKind,
    pub code: String,
    pub docstring: String,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CodeBundle {
    pub target_file: BundleFile,
    pub referenced_files: Vec<ReferencedFile>,
    pub additional_files: Vec<BundleFile>,
    pub total_files: usize,
    pub token_count: usize,
    pub token_limit: usize,
}

/// A related file that has been read and sized but not yet admitted.
#[derive(Debug, Clone)]
struct Candidate {
    file: BundleFile,
    relevance: u32,
    tokens: usize,
}

/// Validate the target, extract it and assemble the bundle.
///
/// `root` defaults to the target's directory. A relative target is taken
/// relative to the root when one is given.
pub fn build_bundle(target: &Path, root: Option<&Path>, config: &GrapherConfig) -> Result<CodeBundle> {
    let (target, root) = resolve_locations(target, root)?;

    if !target.is_file() {
        bail!("Target file does not exist: {}", target.display());
    }
    if target.extension().and_then(|e| e.to_str()) != Some("py") {
        bail!(
            "The target file must be a Python file (.py): {}",
            target.display()
        );
    }

    let options = config.to_options();
    let result = extract_with(&target, &root, &options)
        .with_context(|| format!("Failed to extract code graph for {}", target.display()))?;

    let mut current_tokens = count_tokens(&result.main_object.source_text);
    let target_file = BundleFile {
        file_path: relative_display(&target, &root),
        code: result.main_object.source_text.clone(),
        role: FileRole::Target,
        docstring: result.main_object.doc_comment.clone(),
    };

    let readmes = read_readmes(&root);
    current_tokens += readmes.iter().map(|(_, tokens)| tokens).sum::<usize>();

    let mut included: HashSet<PathBuf> = HashSet::from([target.clone()]);
    included.extend(result.referenced_objects.iter().map(|o| o.file_path.clone()));

    let mut references: Vec<(&CodeObject, usize)> = result
        .referenced_objects
        .iter()
        .map(|object| (object, count_tokens(&object.source_text)))
        .collect();
    references.sort_by_key(|(_, tokens)| *tokens);

    let mut referenced_files = Vec::new();
    for (object, tokens) in references {
        if current_tokens + tokens <= options.token_limit {
            current_tokens += tokens;
            referenced_files.push(ReferencedFile {
                file_path: relative_display(&object.file_path, &root),
                object_name: object.name.clone(),
                object_type: object.kind,
                code: object.source_text.clone(),
                docstring: object.doc_comment.clone(),
                truncated: object.truncated,
            });
        }
    }

    let import_names = target_import_names(&target);
    let candidates = related_candidates(
        &target,
        &root,
        &included,
        &import_names,
        config.max_additional_files,
    )?;

    let mut additional_files: Vec<BundleFile> = readmes.into_iter().map(|(file, _)| file).collect();
    for candidate in candidates {
        if current_tokens + candidate.tokens <= options.token_limit {
            current_tokens += candidate.tokens;
            additional_files.push(candidate.file);
        }
    }

    log::info!(
        "Bundle for {}: {} referenced, {} additional, {} tokens",
        target.display(),
        referenced_files.len(),
        additional_files.len(),
        current_tokens
    );

    Ok(CodeBundle {
        target_file,
        total_files: 1 + referenced_files.len() + additional_files.len(),
        referenced_files,
        additional_files,
        token_count: current_tokens,
        token_limit: options.token_limit,
    })
}

/// The first README variant present in the root directory.
pub fn find_readme_files(root: &Path) -> Vec<PathBuf> {
    README_NAMES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
        .into_iter()
        .collect()
}

/// Every project Python file below `root`, sorted.
pub fn find_source_files(root: &Path) -> Result<Vec<PathBuf>> {
    find_project_files(root, vec![Language::Python])
        .with_context(|| format!("Failed to list source files under {}", root.display()))
}

/// Absolute target and root. A relative target is taken relative to `root`
/// when one is given, and `root` defaults to the target's directory.
pub fn resolve_locations(target: &Path, root: Option<&Path>) -> Result<(PathBuf, PathBuf)> {
    let root = root.map(absolute).transpose()?;
    let target = match &root {
        Some(root) if target.is_relative() => root.join(target),
        _ => target.to_path_buf(),
    };
    let target = absolute(&target)?;
    let root = match root {
        Some(root) => root,
        None => target
            .parent()
            .map(Path::to_path_buf)
            .with_context(|| format!("{} has no parent directory", target.display()))?,
    };
    Ok((target, root))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    Ok(normalize_path(&absolute))
}

fn relative_display(path: &Path, root: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn read_readmes(root: &Path) -> Vec<(BundleFile, usize)> {
    find_readme_files(root)
        .into_iter()
        .filter_map(|path| match read_file(&path) {
            Ok(code) => {
                let tokens = count_tokens(&code);
                let file = BundleFile {
                    file_path: relative_display(&path, root),
                    code,
                    role: FileRole::Readme,
                    docstring: README_DOCSTRING.to_string(),
                };
                Some((file, tokens))
            }
            Err(e) => {
                log::warn!("{:#}", e);
                None
            }
        })
        .collect()
}

/// First segments of every module the target imports.
fn target_import_names(target: &Path) -> BTreeSet<String> {
    let Some(parser) = parser_for_path(target) else {
        return BTreeSet::new();
    };
    match parse_file(parser.as_ref(), target) {
        Ok((unit, _)) => unit
            .imports
            .iter()
            .map(|import| import.root_name().to_string())
            .filter(|name| !name.is_empty())
            .collect(),
        Err(e) => {
            log::debug!("Cannot collect import names: {}", e);
            BTreeSet::new()
        }
    }
}

fn relevance(path: &Path, target_dir: Option<&Path>, import_names: &BTreeSet<String>) -> u32 {
    let mut score = 0;
    if path.parent() == target_dir {
        score += SAME_DIRECTORY_RELEVANCE;
    }
    let stem = path.file_stem().map(|s| s.to_string_lossy());
    if stem.is_some_and(|stem| import_names.contains(&*stem)) {
        score += IMPORT_NAME_RELEVANCE;
    }
    score
}

/// Related files in walk order, capped at `limit` readable ones, then
/// ordered by relevance (stable, highest first).
fn related_candidates(
    target: &Path,
    root: &Path,
    included: &HashSet<PathBuf>,
    import_names: &BTreeSet<String>,
    limit: usize,
) -> Result<Vec<Candidate>> {
    let target_dir = target.parent();
    let scored: Vec<(PathBuf, u32)> = find_source_files(root)?
        .into_iter()
        .filter(|path| !included.contains(path))
        .map(|path| {
            let score = relevance(&path, target_dir, import_names);
            (path, score)
        })
        .filter(|(_, score)| *score > 0)
        .collect();

    let parser = PythonParser::new();
    let loaded: Vec<Option<Candidate>> = scored
        .par_iter()
        .map(|(path, score)| load_candidate(&parser, path, root, *score, target_dir))
        .collect();

    let mut candidates: Vec<Candidate> = loaded.into_iter().flatten().take(limit).collect();
    candidates.sort_by(|a, b| b.relevance.cmp(&a.relevance));
    Ok(candidates)
}

fn load_candidate(
    parser: &dyn UnitParser,
    path: &Path,
    root: &Path,
    relevance: u32,
    target_dir: Option<&Path>,
) -> Option<Candidate> {
    let code = match read_file(path) {
        Ok(code) => code,
        Err(e) => {
            log::warn!("{:#}", e);
            return None;
        }
    };
    let docstring = parser
        .parse(&code, path)
        .map(|unit| unit.doc_comment)
        .unwrap_or_default();
    let role = if path.parent() == target_dir {
        FileRole::RelatedByDirectory
    } else {
        FileRole::RelatedByImport
    };

    Some(Candidate {
        tokens: count_tokens(&code),
        relevance,
        file: BundleFile {
            file_path: relative_display(path, root),
            code,
            role,
            docstring,
        },
    })
}

//! Bounded, cycle-safe import resolution.
//!
//! Starting from the target unit, every import is mapped to a file (same
//! directory, then the language's own module resolution, then a capped search
//! of the project tree). Declarations of resolved project files become
//! referenced objects and their own imports are followed in turn.
//!
//! The walk uses an explicit stack of frames instead of recursion. Each frame
//! carries the set of files on its import chain as a persistent set, so cycle
//! detection stays path-sensitive while sibling branches share structure.
//!
//! Nothing in here fails: unreadable or unparseable files, unresolvable
//! imports and guard hits only prune the walk.

use super::external::{is_external, is_strict_descendant, normalize_path};
use super::symbols::{extract_symbol, extract_top_level};
use crate::core::{CodeObject, ImportStatement, ImportTarget, ReferenceKind, SourceUnit};
use crate::io::walker::find_module_file;
use crate::parser::{parse_file, UnitParser};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Maximum number of import hops between the target and a referenced file.
pub const MAX_IMPORT_DEPTH: usize = 5;

/// Directories scanned by the project-tree fallback before it gives up.
pub const PROJECT_SEARCH_DIR_LIMIT: usize = 10;

/// Traversal state of one top-level extraction call.
///
/// Created fresh for every call and dropped with it.
#[derive(Debug, Default)]
pub struct ExtractionState {
    /// Files whose declarations have all been extracted already.
    pub visited_files: BTreeSet<PathBuf>,
    /// References in the order they were discovered.
    pub referenced_objects: Vec<CodeObject>,
    /// Import edges that pointed back into their own chain.
    pub cycle_hits: usize,
    /// Files whose imports have been queued for traversal.
    expanded_files: HashSet<PathBuf>,
    /// `(file, start line)` of every declaration in `referenced_objects`.
    extracted: HashSet<(PathBuf, usize)>,
    /// `(file, name)` of every declaration in `referenced_objects`.
    extracted_names: HashSet<(PathBuf, String)>,
}

impl ExtractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the target so that imports pointing back at it are skipped.
    pub fn mark_target(&mut self, path: &Path) {
        self.visited_files.insert(path.to_path_buf());
        self.expanded_files.insert(path.to_path_buf());
    }

    /// Same-named declarations in one file (`if`/`else` variants) are kept
    /// apart by their start line.
    fn push_reference(&mut self, object: CodeObject) {
        if self
            .extracted
            .insert((object.file_path.clone(), object.start_line))
        {
            self.extracted_names
                .insert((object.file_path.clone(), object.name.clone()));
            self.referenced_objects.push(object);
        }
    }

    fn already_extracted(&self, path: &Path, name: &str) -> bool {
        self.extracted_names
            .contains(&(path.to_path_buf(), name.to_string()))
    }

    /// Drop references that are external or outside the project root.
    pub fn retain_project_references(&mut self, project_root: &Path) {
        let before = self.referenced_objects.len();
        self.referenced_objects.retain(|object| {
            !is_external(&object.file_path) && is_strict_descendant(&object.file_path, project_root)
        });
        let dropped = before - self.referenced_objects.len();
        if dropped > 0 {
            log::debug!("Dropped {} references outside {}", dropped, project_root.display());
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub project_root: PathBuf,
    /// Extra roots handed to the language's module resolution after the project root.
    pub search_paths: Vec<PathBuf>,
    pub max_depth: usize,
    pub search_dir_limit: usize,
}

impl ResolverSettings {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            search_paths: Vec::new(),
            max_depth: MAX_IMPORT_DEPTH,
            search_dir_limit: PROJECT_SEARCH_DIR_LIMIT,
        }
    }
}

struct Frame {
    path: PathBuf,
    imports: Vec<ImportStatement>,
    next: usize,
    depth: usize,
    /// Files on the import chain leading to this frame, excluding itself.
    call_stack: im::HashSet<PathBuf>,
}

pub struct ImportResolver<'a> {
    parser: &'a dyn UnitParser,
    settings: ResolverSettings,
    search_roots: Vec<PathBuf>,
}

impl<'a> ImportResolver<'a> {
    pub fn new(parser: &'a dyn UnitParser, settings: ResolverSettings) -> Self {
        let search_roots = std::iter::once(settings.project_root.clone())
            .chain(settings.search_paths.iter().cloned())
            .collect();
        Self {
            parser,
            settings,
            search_roots,
        }
    }

    /// Walk the imports of `unit` (stored at `path`), accumulating references
    /// into `state`.
    pub fn resolve(&self, unit: &SourceUnit, path: &Path, state: &mut ExtractionState) {
        let mut stack: Vec<Frame> = Vec::new();
        state.expanded_files.insert(path.to_path_buf());
        self.enter(
            &mut stack,
            path.to_path_buf(),
            unit.imports.clone(),
            0,
            im::HashSet::new(),
        );

        while let Some(frame) = stack.last_mut() {
            let Some(import) = frame.imports.get(frame.next).cloned() else {
                stack.pop();
                continue;
            };
            frame.next += 1;

            let child_depth = frame.depth + 1;
            let importer = frame.path.clone();
            let chain = frame.call_stack.update(importer.clone());

            if let Some((child_path, child_unit)) =
                self.process_import(&import, &importer, &chain, child_depth, state)
            {
                self.enter(&mut stack, child_path, child_unit.imports, child_depth, chain);
            }
        }
    }

    fn enter(
        &self,
        stack: &mut Vec<Frame>,
        path: PathBuf,
        imports: Vec<ImportStatement>,
        depth: usize,
        call_stack: im::HashSet<PathBuf>,
    ) {
        stack.push(Frame {
            path,
            imports,
            next: 0,
            depth,
            call_stack,
        });
    }

    /// Handle one import edge. `chain` holds every file from the target down
    /// to `importer`, inclusive. Returns the resolved file and its unit when
    /// its own imports still need to be followed.
    fn process_import(
        &self,
        import: &ImportStatement,
        importer: &Path,
        chain: &im::HashSet<PathBuf>,
        depth: usize,
        state: &mut ExtractionState,
    ) -> Option<(PathBuf, SourceUnit)> {
        let Some((path, reference_kind)) = self.resolve_path(import, importer) else {
            log::debug!("Could not resolve import {}", import.module);
            return None;
        };

        if is_external(&path) {
            log::debug!("Skipping external library: {}", path.display());
            return None;
        }
        if !is_strict_descendant(&path, &self.settings.project_root) {
            log::debug!("Skipping file outside project root: {}", path.display());
            return None;
        }
        if chain.contains(&path) {
            log::warn!(
                "Import cycle detected for {}. Stopping import resolution.",
                path.display()
            );
            state.cycle_hits += 1;
            return None;
        }
        if state.visited_files.contains(&path) {
            return None;
        }
        if let ImportTarget::Symbol(name) = &import.target {
            if state.already_extracted(&path, name) {
                return None;
            }
        }
        if depth > self.settings.max_depth {
            log::warn!(
                "Maximum import depth reached ({}) when processing {}. Stopping import resolution.",
                self.settings.max_depth,
                importer.display()
            );
            return None;
        }

        let (unit, source) = match parse_file(self.parser, &path) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("{err}");
                return None;
            }
        };

        match &import.target {
            ImportTarget::Module => {
                state.visited_files.insert(path.clone());
                for object in extract_top_level(&unit, &source, &path) {
                    state.push_reference(object.with_reference_kind(reference_kind));
                }
            }
            ImportTarget::Symbol(name) => match extract_symbol(&unit, &source, name, &path) {
                Some(object) => state.push_reference(object.with_reference_kind(reference_kind)),
                None => log::debug!("{} not found in {}", name, path.display()),
            },
        }

        if state.expanded_files.insert(path.clone()) {
            Some((path, unit))
        } else {
            None
        }
    }

    /// Map an import to a file: same directory, language resolution, then the
    /// capped project-tree search.
    fn resolve_path(
        &self,
        import: &ImportStatement,
        importer: &Path,
    ) -> Option<(PathBuf, ReferenceKind)> {
        let importing_dir = importer.parent().unwrap_or(Path::new(""));
        let file_name = self.parser.module_file_name(import.base_name());

        let local = importing_dir.join(&file_name);
        if local.is_file() {
            return Some((normalize_path(&local), ReferenceKind::Import));
        }

        if let Some(found) = self
            .parser
            .resolve_module(import, importing_dir, &self.search_roots)
        {
            return Some((normalize_path(&found), ReferenceKind::Import));
        }

        find_module_file(
            &self.settings.project_root,
            &file_name,
            self.settings.search_dir_limit,
        )
        .map(|found| (normalize_path(&found), ReferenceKind::ProjectImport))
    }
}

//! Slicing declarations out of a parsed unit.

use crate::core::{CodeObject, Declaration, ObjectKind, ReferenceKind, SourceUnit};
use std::path::Path;

/// First declaration named `name` in a pre-order walk of the declaration
/// tree. Duplicate names at different depths resolve to whichever comes first.
pub fn find_declaration<'a>(declarations: &'a [Declaration], name: &str) -> Option<&'a Declaration> {
    declarations.iter().find_map(|declaration| {
        if declaration.name == name {
            Some(declaration)
        } else {
            find_declaration(&declaration.children, name)
        }
    })
}

/// The full source lines a declaration spans.
pub fn declaration_source(source: &str, declaration: &Declaration) -> String {
    let first = declaration.start_line.saturating_sub(1);
    let count = declaration.end_line.saturating_sub(first);
    source
        .lines()
        .skip(first)
        .take(count)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract one declaration by name, or `None` when the unit has no such declaration.
pub fn extract_symbol(
    unit: &SourceUnit,
    source: &str,
    name: &str,
    path: &Path,
) -> Option<CodeObject> {
    find_declaration(&unit.declarations, name).map(|declaration| {
        CodeObject::from_declaration(
            declaration,
            declaration_source(source, declaration),
            path,
            unit.language,
        )
    })
}

/// Every top-level declaration of a unit, in source order.
pub fn extract_top_level(unit: &SourceUnit, source: &str, path: &Path) -> Vec<CodeObject> {
    unit.declarations
        .iter()
        .map(|declaration| {
            CodeObject::from_declaration(
                declaration,
                declaration_source(source, declaration),
                path,
                unit.language,
            )
        })
        .collect()
}

/// The whole file as a single module object named after its stem.
pub fn extract_module(unit: &SourceUnit, source: &str, path: &Path) -> CodeObject {
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    CodeObject {
        name,
        file_path: path.to_path_buf(),
        start_line: 1,
        kind: ObjectKind::Module,
        source_text: source.to_string(),
        doc_comment: unit.doc_comment.clone(),
        reference_kind: ReferenceKind::None,
        truncated: false,
        signature: String::new(),
        language: unit.language,
    }
}

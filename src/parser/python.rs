//! Tree-sitter parser integration for Python
//!
//! Turns a Python module into a [`SourceUnit`]: class and function
//! declarations with line spans, signatures and docstrings, plus every
//! `import` / `from ... import` statement.

use super::UnitParser;
use crate::core::{
    Declaration, DeclarationKind, ExtractionError, ImportStatement, ImportTarget, Language, Result,
    SourceUnit,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

#[derive(Debug, Default, Clone, Copy)]
pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Self {
        Self
    }
}

impl UnitParser for PythonParser {
    fn language(&self) -> Language {
        Language::Python
    }

    fn parse(&self, source: &str, path: &Path) -> Result<SourceUnit> {
        let tree = parse_tree(source).map_err(|message| ExtractionError::parse_failed(path, message))?;
        let root = tree.root_node();

        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(ExtractionError::parse_failed(
                path,
                format!("invalid syntax near line {line}"),
            ));
        }

        Ok(SourceUnit {
            language: Language::Python,
            doc_comment: docstring_of(root, source),
            declarations: collect_declarations(root, source),
            imports: collect_imports(root, source),
        })
    }

    fn resolve_module(
        &self,
        import: &ImportStatement,
        importing_dir: &Path,
        search_roots: &[PathBuf],
    ) -> Option<PathBuf> {
        let relative: PathBuf = import.module.split('.').collect();

        let anchors = if import.level > 0 {
            let mut anchor = importing_dir.to_path_buf();
            for _ in 1..import.level {
                anchor = anchor.parent()?.to_path_buf();
            }
            vec![anchor]
        } else {
            search_roots.to_vec()
        };

        anchors.iter().find_map(|anchor| {
            let base = anchor.join(&relative);
            [base.with_extension("py"), base.join("__init__.py")]
                .into_iter()
                .find(|candidate| candidate.is_file())
        })
    }

    fn module_file_name(&self, base_name: &str) -> String {
        format!("{base_name}.py")
    }
}

fn parse_tree(source: &str) -> std::result::Result<Tree, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| format!("failed to load Python grammar: {e}"))?;
    parser
        .parse(source, None)
        .ok_or_else(|| "parser produced no syntax tree".to_string())
}

/// Get text for a tree-sitter node
fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error_line)
}

/// Declarations reachable from `node` without crossing another declaration.
fn collect_declarations(node: Node, source: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "class_definition" | "function_definition" => {
                declarations.extend(declaration_from(child, source));
            }
            "decorated_definition" => {
                if let Some(definition) = child.child_by_field_name("definition") {
                    declarations.extend(declaration_from(definition, source));
                }
            }
            _ => declarations.extend(collect_declarations(child, source)),
        }
    }

    declarations
}

fn declaration_from(node: Node, source: &str) -> Option<Declaration> {
    let kind = match node.kind() {
        "class_definition" => DeclarationKind::Class,
        "function_definition" => DeclarationKind::Function,
        _ => return None,
    };
    let name = node_text(&node.child_by_field_name("name")?, source).to_string();
    let body = node.child_by_field_name("body");

    let signature = match body {
        Some(body) => source[node.start_byte()..body.start_byte()].trim().to_string(),
        None => node_text(&node, source)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string(),
    };

    let start_line = node.start_position().row + 1;
    let end = node.end_position();
    // A node ending at column zero stops before that row's first byte.
    let end_line = if end.column == 0 && end.row + 1 > start_line {
        end.row
    } else {
        end.row + 1
    };

    Some(Declaration {
        name,
        kind,
        start_line,
        end_line,
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        signature,
        doc_comment: body.map(|b| docstring_of(b, source)).unwrap_or_default(),
        children: body
            .map(|b| collect_declarations(b, source))
            .unwrap_or_default(),
    })
}

/// Docstring of a module or block: its first statement, when that is a string.
fn docstring_of(node: Node, source: &str) -> String {
    let mut cursor = node.walk();
    let first_statement = node
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");

    first_statement
        .filter(|stmt| stmt.kind() == "expression_statement")
        .and_then(|stmt| stmt.named_child(0))
        .filter(|expr| expr.kind() == "string")
        .map(|literal| clean_docstring(node_text(&literal, source)))
        .unwrap_or_default()
}

/// Strip quotes and prefixes from a string literal and normalize its
/// indentation the way Python's `inspect.cleandoc` does.
pub fn clean_docstring(literal: &str) -> String {
    let unprefixed = literal.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let inner = ["\"\"\"", "'''", "\"", "'"]
        .iter()
        .find_map(|quote| {
            unprefixed
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        })
        .unwrap_or(unprefixed);

    let expanded = inner.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();
    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };

    let margin = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = std::iter::once(first.trim_start())
        .chain(rest.iter().map(|line| line.get(margin..).unwrap_or("")))
        .collect();

    while cleaned.last().is_some_and(|line| line.trim().is_empty()) {
        cleaned.pop();
    }
    let leading_blank = cleaned
        .iter()
        .take_while(|line| line.trim().is_empty())
        .count();

    cleaned[leading_blank..].join("\n")
}

/// Every import in the unit, breadth-first so module-level imports come first.
fn collect_imports(root: Node, source: &str) -> Vec<ImportStatement> {
    let mut imports = Vec::new();
    let mut queue = VecDeque::from([root]);

    while let Some(node) = queue.pop_front() {
        match node.kind() {
            "import_statement" => imports.extend(plain_imports(node, source)),
            "import_from_statement" => imports.extend(from_imports(node, source)),
            _ => {
                let mut cursor = node.walk();
                queue.extend(node.named_children(&mut cursor));
            }
        }
    }

    imports
}

/// Name bound by a `dotted_name` or the original name of an `aliased_import`.
fn imported_name<'a>(node: Node, source: &'a str) -> Option<&'a str> {
    match node.kind() {
        "aliased_import" => node
            .child_by_field_name("name")
            .map(|name| node_text(&name, source)),
        "dotted_name" => Some(node_text(&node, source)),
        _ => None,
    }
}

/// `import a.b, c as d`
fn plain_imports(node: Node, source: &str) -> Vec<ImportStatement> {
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .filter_map(|name| imported_name(name, source))
        .map(ImportStatement::module)
        .collect()
}

/// `from m import x, y`, `from .m import x`, `from m import *`
fn from_imports(node: Node, source: &str) -> Vec<ImportStatement> {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return Vec::new();
    };

    let (module, level) = match module_node.kind() {
        "relative_import" => {
            let mut cursor = module_node.walk();
            let children: Vec<Node> = module_node.named_children(&mut cursor).collect();
            let level = children
                .iter()
                .find(|child| child.kind() == "import_prefix")
                .map(|prefix| node_text(prefix, source).matches('.').count())
                .unwrap_or(0);
            let module = children
                .iter()
                .find(|child| child.kind() == "dotted_name")
                .map(|name| node_text(name, source))
                .unwrap_or_default();
            (module, level)
        }
        _ => (node_text(&module_node, source), 0),
    };

    // `from . import x` names no module to resolve.
    if module.is_empty() {
        return Vec::new();
    }

    let mut cursor = node.walk();
    let is_wildcard = node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import");
    if is_wildcard {
        return vec![ImportStatement::module(module).with_level(level)];
    }

    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .filter_map(|name| imported_name(name, source))
        .map(|name| ImportStatement {
            module: module.to_string(),
            level,
            target: ImportTarget::Symbol(name.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> SourceUnit {
        PythonParser::new()
            .parse(source, Path::new("test.py"))
            .expect("valid python")
    }

    #[test]
    fn test_top_level_declarations_in_order() {
        let unit = parse(indoc! {r#"
            """Geometry helpers."""

            class Shape:
                """Base shape."""

                def area(self):
                    return 0

            def unit_square():
                return Shape()
        "#});

        assert_eq!(unit.doc_comment, "Geometry helpers.");
        let names: Vec<&str> = unit.declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Shape", "unit_square"]);

        let shape = &unit.declarations[0];
        assert_eq!(shape.kind, DeclarationKind::Class);
        assert_eq!(shape.start_line, 3);
        assert_eq!(shape.end_line, 7);
        assert_eq!(shape.doc_comment, "Base shape.");
        assert_eq!(shape.signature, "class Shape:");
        assert_eq!(shape.children.len(), 1);
        assert_eq!(shape.children[0].name, "area");
        assert_eq!(shape.children[0].kind, DeclarationKind::Function);

        let square = &unit.declarations[1];
        assert_eq!(square.start_line, 9);
        assert_eq!(square.end_line, 10);
    }

    #[test]
    fn test_async_and_decorated_functions() {
        let unit = parse(indoc! {"
            import functools

            @functools.cache
            def cached(x):
                return x

            async def fetch(url: str) -> bytes:
                return b''
        "});

        let cached = &unit.declarations[0];
        assert_eq!(cached.name, "cached");
        assert_eq!(cached.start_line, 4, "span starts at the def line");

        let fetch = &unit.declarations[1];
        assert_eq!(fetch.kind, DeclarationKind::Function);
        assert_eq!(fetch.signature, "async def fetch(url: str) -> bytes:");
    }

    #[test]
    fn test_conditional_definitions_are_top_level() {
        let unit = parse(indoc! {"
            import sys

            if sys.platform == 'win32':
                def sep():
                    return '\\\\'
            else:
                def sep():
                    return '/'
        "});
        assert_eq!(unit.declarations.len(), 2);
        assert!(unit.declarations.iter().all(|d| d.name == "sep"));
    }

    #[test]
    fn test_multiline_signature() {
        let unit = parse(indoc! {"
            def combine(
                left,
                right,
            ):
                return left + right
        "});
        assert_eq!(
            unit.declarations[0].signature,
            "def combine(\n    left,\n    right,\n):"
        );
    }

    #[test]
    fn test_docstring_cleanup() {
        let unit = parse(indoc! {r#"
            def explain():
                """
                Summary line.

                    Indented detail.
                """
                pass
        "#});
        assert_eq!(
            unit.declarations[0].doc_comment,
            "Summary line.\n\n    Indented detail."
        );
    }

    #[test]
    fn test_clean_docstring_prefixes_and_quotes() {
        assert_eq!(clean_docstring(r#"r"""raw \d""""#), r"raw \d");
        assert_eq!(clean_docstring("'single'"), "single");
        assert_eq!(clean_docstring("''''''"), "");
    }

    #[test]
    fn test_non_string_first_statement_has_no_docstring() {
        let unit = parse(indoc! {"
            # leading comment
            x = 'not a docstring'

            def f():
                # comment first
                return 1
        "});
        assert_eq!(unit.doc_comment, "");
        assert_eq!(unit.declarations[0].doc_comment, "");
    }

    #[test]
    fn test_import_forms() {
        let unit = parse(indoc! {"
            import os.path, json as j
            from models import User, Group as G
            from .helpers import slugify
            from ..core import *
            from . import sibling
            from __future__ import annotations
        "});

        assert_eq!(
            unit.imports,
            vec![
                ImportStatement::module("os.path"),
                ImportStatement::module("json"),
                ImportStatement::symbol("models", "User"),
                ImportStatement::symbol("models", "Group"),
                ImportStatement::symbol("helpers", "slugify").with_level(1),
                ImportStatement::module("core").with_level(2),
            ]
        );
    }

    #[test]
    fn test_nested_imports_follow_module_level_ones() {
        let unit = parse(indoc! {"
            def lazy():
                import heavy
                return heavy

            import light
        "});
        let modules: Vec<&str> = unit.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["light", "heavy"]);
    }

    #[test]
    fn test_syntax_error_is_parse_failure() {
        let err = PythonParser::new()
            .parse("def broken(:\n    pass\n", Path::new("bad.py"))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::ParseFailed { .. }));
    }

    #[test]
    fn test_resolve_module_prefers_file_over_package() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("pkg/sub")).unwrap();
        std::fs::write(root.join("pkg/__init__.py"), "").unwrap();
        std::fs::write(root.join("pkg/sub/__init__.py"), "").unwrap();
        std::fs::write(root.join("pkg/tools.py"), "").unwrap();

        let parser = PythonParser::new();
        let roots = vec![root.to_path_buf()];

        let tools = parser.resolve_module(&ImportStatement::module("pkg.tools"), root, &roots);
        assert_eq!(tools, Some(root.join("pkg/tools.py")));

        let sub = parser.resolve_module(&ImportStatement::module("pkg.sub"), root, &roots);
        assert_eq!(sub, Some(root.join("pkg/sub/__init__.py")));

        let missing = parser.resolve_module(&ImportStatement::module("nope"), root, &roots);
        assert_eq!(missing, None);
    }

    #[test]
    fn test_resolve_relative_module() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("app/views")).unwrap();
        std::fs::write(root.join("app/core.py"), "").unwrap();

        let parser = PythonParser::new();
        let import = ImportStatement::module("core").with_level(2);
        let resolved = parser.resolve_module(&import, &root.join("app/views"), &[]);
        assert_eq!(resolved, Some(root.join("app/core.py")));
    }
}

//! Pluggable unit parsers.
//!
//! The extraction engine only needs a unit's named, positioned declarations,
//! its doc comment and its import statements. Each supported grammar provides
//! that through [`UnitParser`], together with the host language's own module
//! resolution rules.

pub mod python;

use crate::core::{ExtractionError, ImportStatement, Language, Result, SourceUnit};
use std::path::{Path, PathBuf};

pub use python::PythonParser;

pub trait UnitParser: Send + Sync {
    fn language(&self) -> Language;

    /// Parse source text into a unit. `path` is only used for error messages.
    fn parse(&self, source: &str, path: &Path) -> Result<SourceUnit>;

    /// Resolve an import the way the host language would, trying each search
    /// root in order. Returns the first existing file.
    fn resolve_module(
        &self,
        import: &ImportStatement,
        importing_dir: &Path,
        search_roots: &[PathBuf],
    ) -> Option<PathBuf>;

    /// File name a module with the given base name is stored under.
    fn module_file_name(&self, base_name: &str) -> String;
}

pub fn get_parser(language: Language) -> Option<Box<dyn UnitParser>> {
    type ParserFactory = fn() -> Box<dyn UnitParser>;

    static PARSER_MAP: &[(Language, ParserFactory)] =
        &[(Language::Python, || Box::new(PythonParser::new()))];

    PARSER_MAP
        .iter()
        .find(|(lang, _)| *lang == language)
        .map(|(_, factory)| factory())
}

pub fn parser_for_path(path: &Path) -> Option<Box<dyn UnitParser>> {
    get_parser(Language::from_path(path))
}

/// Read and parse a file, returning the unit together with its source text.
pub fn parse_file(parser: &dyn UnitParser, path: &Path) -> Result<(SourceUnit, String)> {
    let source = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => {
            ExtractionError::parse_failed(path, format!("file is not valid UTF-8: {e}"))
        }
        _ => ExtractionError::not_readable(path, e),
    })?;
    let unit = parser.parse(&source, path)?;
    Ok((unit, source))
}

/// Infer where an indentation-delimited block ends when a grammar only
/// reports start positions.
///
/// `start_line` is 1-based. The block runs until the line before the next
/// non-blank line indented no deeper than the opening line; trailing blank
/// lines are not part of it. Returns a 1-based inclusive line number.
pub fn block_end_line(lines: &[&str], start_line: usize) -> usize {
    let Some(opening) = start_line.checked_sub(1).and_then(|i| lines.get(i)) else {
        return start_line;
    };
    let base_indent = indentation(opening);

    let mut end = start_line;
    for (offset, line) in lines.iter().enumerate().skip(start_line) {
        if line.trim().is_empty() {
            continue;
        }
        if indentation(line) <= base_indent {
            break;
        }
        end = offset + 1;
    }
    end
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

//! Data model shared by the parser, the extraction engine and the tool glue.

pub mod errors;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use errors::{ExtractionError, Result};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    #[default]
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        static EXTENSION_MAP: &[(&[&str], Language)] = &[(&["py", "pyw"], Language::Python)];

        EXTENSION_MAP
            .iter()
            .find(|(exts, _)| exts.contains(&ext))
            .map(|(_, lang)| *lang)
            .unwrap_or(Language::Unknown)
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Prefix of a single-line comment in this language.
    pub fn line_comment(&self) -> &'static str {
        match self {
            Language::Python => "#",
            Language::Unknown => "//",
        }
    }

    /// Stand-in for a declaration whose body did not fit the token budget.
    pub fn truncated_stub(&self, signature: &str, doc_comment: &str) -> String {
        let marker = format!(
            "    {} ... code truncated due to token limit",
            self.line_comment()
        );
        match (self, doc_comment.is_empty()) {
            (_, true) => format!("{signature}\n{marker}"),
            (Language::Python, false) => {
                format!("{signature}\n    \"\"\"{doc_comment}\"\"\"\n{marker}")
            }
            (Language::Unknown, false) => {
                let doc = doc_comment
                    .lines()
                    .map(|line| format!("    {} {}", self.line_comment(), line))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("{signature}\n{doc}\n{marker}")
            }
        }
    }

    /// Stand-in for an object that has no signature to keep.
    pub fn truncated_placeholder(&self, name: &str) -> String {
        format!("{} {} (truncated due to token limit)", self.line_comment(), name)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let display_str = match self {
            Language::Python => "Python",
            Language::Unknown => "Unknown",
        };
        write!(f, "{display_str}")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Class,
    Function,
}

/// A named, position-bounded class-like or function-like construct.
///
/// Lines are 1-based and `end_line` is inclusive. `children` holds the
/// declarations nested directly inside this one's body, in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub start_line: usize,
    pub end_line: usize,
    pub start_byte: usize,
    pub end_byte: usize,
    pub signature: String,
    pub doc_comment: String,
    pub children: Vec<Declaration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportTarget {
    /// Every top-level declaration of the module (`import m`, `from m import *`).
    Module,
    /// One named declaration (`from m import name`).
    Symbol(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportStatement {
    /// Dotted module path without leading dots.
    pub module: String,
    /// Number of leading dots of a relative import, 0 for absolute imports.
    pub level: usize,
    pub target: ImportTarget,
}

impl ImportStatement {
    pub fn module(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            level: 0,
            target: ImportTarget::Module,
        }
    }

    pub fn symbol(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            level: 0,
            target: ImportTarget::Symbol(name.into()),
        }
    }

    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    /// Last dotted segment, used for same-directory and project-tree lookups.
    pub fn base_name(&self) -> &str {
        self.module.rsplit('.').next().unwrap_or(&self.module)
    }

    /// First dotted segment, the name the importing code binds.
    pub fn root_name(&self) -> &str {
        self.module.split('.').next().unwrap_or(&self.module)
    }
}

/// The parsed form of one source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceUnit {
    pub language: Language,
    pub doc_comment: String,
    pub declarations: Vec<Declaration>,
    pub imports: Vec<ImportStatement>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Class,
    Function,
    Module,
}

impl From<DeclarationKind> for ObjectKind {
    fn from(kind: DeclarationKind) -> Self {
        match kind {
            DeclarationKind::Class => ObjectKind::Class,
            DeclarationKind::Function => ObjectKind::Function,
        }
    }
}

impl ObjectKind {
    /// Budget priority rank: lower ranks are considered first.
    pub fn priority_rank(&self) -> u8 {
        match self {
            ObjectKind::Class => 0,
            ObjectKind::Function | ObjectKind::Module => 1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    #[default]
    None,
    /// Found next to the importing file or through language module resolution.
    Import,
    /// Found by the bounded project-tree search.
    ProjectImport,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeObject {
    pub name: String,
    pub file_path: PathBuf,
    /// First line of the declaration, 1-based.
    #[serde(default)]
    pub start_line: usize,
    pub kind: ObjectKind,
    pub source_text: String,
    pub doc_comment: String,
    #[serde(default)]
    pub reference_kind: ReferenceKind,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
    #[serde(default)]
    pub language: Language,
}

impl CodeObject {
    pub fn from_declaration(
        declaration: &Declaration,
        source_text: String,
        file_path: &Path,
        language: Language,
    ) -> Self {
        Self {
            name: declaration.name.clone(),
            file_path: file_path.to_path_buf(),
            start_line: declaration.start_line,
            kind: declaration.kind.into(),
            source_text,
            doc_comment: declaration.doc_comment.clone(),
            reference_kind: ReferenceKind::None,
            truncated: false,
            signature: declaration.signature.clone(),
            language,
        }
    }

    pub fn with_reference_kind(mut self, reference_kind: ReferenceKind) -> Self {
        self.reference_kind = reference_kind;
        self
    }

    /// Signature-and-doc stand-in used when the full text does not fit.
    pub fn truncated_text(&self) -> String {
        match self.kind {
            ObjectKind::Class | ObjectKind::Function if !self.signature.is_empty() => self
                .language
                .truncated_stub(&self.signature, &self.doc_comment),
            _ => self.language.truncated_placeholder(&self.name),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionResult {
    pub main_object: CodeObject,
    pub referenced_objects: Vec<CodeObject>,
    pub token_count: usize,
    pub token_limit: usize,
    pub truncated: bool,
}

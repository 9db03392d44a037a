// Export modules for library usage
pub mod bundle;
pub mod cli;
pub mod config;
pub mod core;
pub mod extraction;
pub mod io;
pub mod parser;
pub mod server;

// Re-export commonly used types
pub use crate::core::{
    CodeObject, Declaration, DeclarationKind, ExtractionError, ExtractionResult, ImportStatement,
    ImportTarget, Language, ObjectKind, ReferenceKind, SourceUnit,
};

pub use crate::extraction::{count_tokens, extract, extract_with, ExtractOptions};

pub use crate::parser::{get_parser, PythonParser, UnitParser};

pub use crate::bundle::{build_bundle, CodeBundle};

pub use crate::config::GrapherConfig;

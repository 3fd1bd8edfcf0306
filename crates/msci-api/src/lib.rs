use std::fs;
use std::path::Path;

use msci_compiler::{compile, CompileOptions, CompileOutput, ObjectLibrary};
use msci_core::GameVersion;
use msci_parser::SyntaxTable;
use thiserror::Error;

pub use msci_compiler::{CompiledScript, DEFAULT_INDENT_WIDTH};
pub use msci_core::{ErrorArray, ErrorToken, ScriptCommand};

/// A coded failure outside the script itself: unreadable inputs or a
/// compiler fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub fn load_syntax_table(path: &Path) -> Result<SyntaxTable, ApiError> {
    let source = fs::read_to_string(path).map_err(|error| {
        ApiError::new(
            "API_SYNTAX_TABLE_READ",
            format!("failed to read syntax table {}: {}", path.display(), error),
        )
    })?;
    SyntaxTable::from_json(&source).map_err(|error| {
        ApiError::new(
            "API_SYNTAX_TABLE_INVALID",
            format!("{}: {}", path.display(), error),
        )
    })
}

pub fn load_object_library(path: &Path) -> Result<ObjectLibrary, ApiError> {
    let source = fs::read_to_string(path).map_err(|error| {
        ApiError::new(
            "API_OBJECT_LIBRARY_READ",
            format!("failed to read object library {}: {}", path.display(), error),
        )
    })?;
    ObjectLibrary::from_json(&source).map_err(|error| {
        ApiError::new(
            "API_OBJECT_LIBRARY_INVALID",
            format!("{}: {}", path.display(), error),
        )
    })
}

/// Compiles a whole script file. Script diagnostics stay in the output.
pub fn compile_script(
    source: &str,
    table: &SyntaxTable,
    options: &CompileOptions,
) -> Result<CompileOutput, ApiError> {
    let lines = source_lines(source);
    compile(&lines, table, options).map_err(|fault| {
        tracing::error!(%fault, "compiler fault");
        ApiError::new("API_COMPILER_FAULT", fault.to_string())
    })
}

/// Re-indents a whole script file, keeping a trailing newline if present.
pub fn format_source(
    source: &str,
    table: &SyntaxTable,
    version: GameVersion,
    indent_width: usize,
) -> String {
    let lines = source_lines(source);
    let mut formatted =
        msci_compiler::format_script(&lines, table, version, indent_width).join("\n");
    if source.ends_with('\n') {
        formatted.push('\n');
    }
    formatted
}

fn source_lines(source: &str) -> Vec<&str> {
    source.lines().collect()
}

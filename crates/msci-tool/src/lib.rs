mod case;
mod runner;
mod source;

pub use case::{ExpectedCommand, ExpectedError, TestCase, DEFAULT_SCRIPT_FILE, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{read_case_script, read_test_case};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MsciToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("Script \"{script}\" not found under {path}.")]
    ScriptMissing { path: PathBuf, script: String },
    #[error("Compile error: {0}")]
    Api(#[from] msci_api::ApiError),
    #[error("Diagnostics differ. expected={expected} actual={actual}")]
    ErrorMismatch { expected: String, actual: String },
    #[error("Expected {expected} standard commands, actual {actual}.")]
    StandardCountMismatch { expected: usize, actual: usize },
    #[error("No standard command at index {index}.")]
    CommandMissing { index: u16 },
    #[error("Command mismatch at index {index}. expected={expected} actual={actual}")]
    CommandMismatch {
        index: u16,
        expected: String,
        actual: String,
    },
    #[error("Rendering differs at line {line}. expected={expected:?} actual={actual:?}")]
    RenderingMismatch {
        line: usize,
        expected: Option<String>,
        actual: Option<String>,
    },
    #[error("Failed to serialize for diff: {0}")]
    Serialize(serde_json::Error),
}

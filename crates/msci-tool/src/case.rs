use msci_compiler::ObjectLibrary;
use msci_core::GameVersion;
use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "msci-tool-case.v1";
pub const DEFAULT_SCRIPT_FILE: &str = "script.msci";

/// Expectations for compiling one fixture script. Empty or absent fields
/// are not checked, except `expectedErrors`, which must match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default = "default_script")]
    pub script: String,
    #[serde(default)]
    pub game_version: GameVersion,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub object_library: Option<ObjectLibrary>,
    #[serde(default)]
    pub expected_errors: Vec<ExpectedError>,
    #[serde(default)]
    pub expected_standard_count: Option<usize>,
    #[serde(default)]
    pub expected_commands: Vec<ExpectedCommand>,
    #[serde(default)]
    pub expected_rendering: Option<Vec<String>>,
}

fn default_script() -> String {
    DEFAULT_SCRIPT_FILE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExpectedError {
    pub line: usize,
    pub code: String,
}

/// A standard command by engine index. `destination` is the jump target of
/// a branch or hidden jump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedCommand {
    pub index: u16,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<u16>,
}

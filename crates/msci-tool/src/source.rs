use std::fs;
use std::path::Path;

use crate::{MsciToolError, TestCase, TESTCASE_SCHEMA_V1};

/// Reads the script a case names, relative to the case directory.
pub fn read_case_script(case_dir: &Path, case: &TestCase) -> Result<String, MsciToolError> {
    let path = case_dir.join(&case.script);
    if !path.is_file() {
        return Err(MsciToolError::ScriptMissing {
            path: case_dir.to_path_buf(),
            script: case.script.clone(),
        });
    }
    fs::read_to_string(&path).map_err(|source| MsciToolError::ReadFile { path, source })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, MsciToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| MsciToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase =
        serde_json::from_str(&raw).map_err(|source| MsciToolError::ParseCase {
            path: case_path.to_path_buf(),
            source,
        })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(MsciToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod source_tests {
    use super::*;

    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("msci-tool-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        let parent = path.parent().expect("path should have parent");
        fs::create_dir_all(parent).expect("parent dir should be created");
        fs::write(path, content).expect("file should be written");
    }

    fn bare_case() -> TestCase {
        serde_json::from_str(r#"{"schemaVersion":"msci-tool-case.v1"}"#).expect("case should parse")
    }

    #[test]
    fn read_case_script_reads_the_named_file() {
        let root = temp_dir("scripts");
        write_file(&root.join("script.msci"), "$a = 1");
        write_file(&root.join("sub").join("other.msci"), "$b = 1");

        let mut case = bare_case();
        assert_eq!(read_case_script(&root, &case).expect("script should load"), "$a = 1");
        case.script = "sub/other.msci".to_string();
        assert_eq!(read_case_script(&root, &case).expect("script should load"), "$b = 1");
    }

    #[test]
    fn read_case_script_reports_missing_script() {
        let root = temp_dir("missing-script");
        write_file(&root.join("ignore.txt"), "skip");

        let error = read_case_script(&root, &bare_case()).expect_err("missing script");
        assert!(matches!(error, MsciToolError::ScriptMissing { .. }));
    }

    #[test]
    fn read_test_case_parses_valid_json() {
        let root = temp_dir("case-ok");
        let case_path = root.join("testcase.json");
        write_file(
            &case_path,
            r#"{
  "schemaVersion":"msci-tool-case.v1",
  "expectedStandardCount":3
}"#,
        );

        let parsed = read_test_case(&case_path).expect("case should parse");
        assert_eq!(parsed.schema_version, TESTCASE_SCHEMA_V1);
        assert_eq!(parsed.expected_standard_count, Some(3));
    }

    #[test]
    fn read_test_case_reports_read_error() {
        let root = temp_dir("case-read-error");
        let error =
            read_test_case(&root.join("missing.json")).expect_err("missing case should fail");
        assert!(matches!(error, MsciToolError::ReadFile { .. }));
    }

    #[test]
    fn read_test_case_reports_parse_and_schema_errors() {
        let root = temp_dir("case-errors");

        let bad_json_path = root.join("bad.json");
        write_file(&bad_json_path, "{");
        let parse_error = read_test_case(&bad_json_path).expect_err("parse should fail");
        assert!(matches!(parse_error, MsciToolError::ParseCase { .. }));

        let bad_schema_path = root.join("bad-schema.json");
        write_file(&bad_schema_path, r#"{"schemaVersion":"v0"}"#);
        let schema_error = read_test_case(&bad_schema_path).expect_err("schema should fail");
        assert!(matches!(
            schema_error,
            MsciToolError::InvalidSchemaVersion { .. }
        ));
    }
}

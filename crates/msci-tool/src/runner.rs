use std::path::Path;

use msci_api::compile_script;
use msci_compiler::CompileOptions;
use msci_core::ScriptCommand;
use msci_parser::SyntaxTable;

use crate::source::{read_case_script, read_test_case};
use crate::{ExpectedCommand, ExpectedError, MsciToolError, TestCase};

/// What a compile actually produced, in the shape of [`TestCase`]
/// expectations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub errors: Vec<ExpectedError>,
    pub standard_count: usize,
    pub commands: Vec<ExpectedCommand>,
    pub rendering: Vec<String>,
}

pub fn run_case(case_dir: &Path, case: &TestCase) -> Result<RunReport, MsciToolError> {
    let source = read_case_script(case_dir, case)?;

    let options = CompileOptions {
        game_version: case.game_version,
        arguments: case.arguments.clone(),
        object_library: case.object_library.clone(),
        ..CompileOptions::default()
    };
    let output = compile_script(&source, &SyntaxTable::builtin(), &options)?;

    Ok(RunReport {
        errors: output
            .errors
            .iter()
            .map(|error| ExpectedError {
                line: error.line,
                code: error.code.clone(),
            })
            .collect(),
        standard_count: output.standard_count,
        commands: output.standard_commands().filter_map(observe).collect(),
        rendering: output.render(),
    })
}

fn observe(command: &ScriptCommand) -> Option<ExpectedCommand> {
    let destination = command.jump_destination.or_else(|| {
        command
            .return_value
            .filter(|value| value.conditional.is_jump())
            .map(|value| value.destination)
    });
    Some(ExpectedCommand {
        index: command.index?,
        text: command.text.clone(),
        destination,
    })
}

pub fn assert_case(case_dir: &Path, case_path: &Path) -> Result<(), MsciToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(case_dir, &case)?;

    let mut expected_errors = case.expected_errors.clone();
    expected_errors.sort();
    let mut actual_errors = report.errors.clone();
    actual_errors.sort();
    if expected_errors != actual_errors {
        return Err(MsciToolError::ErrorMismatch {
            expected: serde_json::to_string(&expected_errors).map_err(MsciToolError::Serialize)?,
            actual: serde_json::to_string(&actual_errors).map_err(MsciToolError::Serialize)?,
        });
    }

    if let Some(expected) = case.expected_standard_count {
        if expected != report.standard_count {
            return Err(MsciToolError::StandardCountMismatch {
                expected,
                actual: report.standard_count,
            });
        }
    }

    for expected in &case.expected_commands {
        let actual = report
            .commands
            .iter()
            .find(|command| command.index == expected.index)
            .ok_or(MsciToolError::CommandMissing {
                index: expected.index,
            })?;
        let destination_matches =
            expected.destination.is_none() || expected.destination == actual.destination;
        if expected.text != actual.text || !destination_matches {
            return Err(MsciToolError::CommandMismatch {
                index: expected.index,
                expected: serde_json::to_string(expected).map_err(MsciToolError::Serialize)?,
                actual: serde_json::to_string(actual).map_err(MsciToolError::Serialize)?,
            });
        }
    }

    if let Some(expected) = &case.expected_rendering {
        let lines = expected.len().max(report.rendering.len());
        for line in 0..lines {
            let want = expected.get(line);
            let got = report.rendering.get(line);
            if want != got {
                return Err(MsciToolError::RenderingMismatch {
                    line: line + 1,
                    expected: want.cloned(),
                    actual: got.cloned(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod runner_tests {
    use super::*;

    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::TESTCASE_SCHEMA_V1;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("msci-tool-runner-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        let parent = path.parent().expect("path should have parent");
        fs::create_dir_all(parent).expect("parent dir should be created");
        fs::write(path, content).expect("file should be written");
    }

    fn simple_case() -> TestCase {
        serde_json::from_str(&format!(r#"{{"schemaVersion":"{}"}}"#, TESTCASE_SCHEMA_V1))
            .expect("case")
    }

    fn case_dir(name: &str, script: &str, case_json: &str) -> std::path::PathBuf {
        let root = temp_dir(name);
        write_file(&root.join("script.msci"), script);
        write_file(&root.join("testcase.json"), case_json);
        root
    }

    #[test]
    fn run_case_reports_commands_and_destinations() {
        let root = case_dir("if", "if $a == 1\n  $b = 2\nend\n", "{}");
        let report = run_case(&root, &simple_case()).expect("run should pass");
        assert!(report.errors.is_empty());
        assert_eq!(report.standard_count, 2);
        assert_eq!(report.commands[0].destination, Some(2));
        assert_eq!(report.commands[1].text, "$b = 2");
        assert_eq!(report.commands[1].destination, None);
        assert_eq!(report.rendering, vec!["if $a == 1", "  $b = 2", "end"]);
    }

    #[test]
    fn run_case_reports_missing_script() {
        let root = case_dir("missing", "$a = 1", "{}");
        let mut case = simple_case();
        case.script = "other.msci".to_string();
        let error = run_case(&root, &case).expect_err("missing script should fail");
        assert!(matches!(error, MsciToolError::ScriptMissing { .. }));
    }

    #[test]
    fn assert_case_passes_with_matching_expectations() {
        let root = case_dir(
            "pass",
            "while $a\n  dec $a =\nend\n",
            r#"{
  "schemaVersion":"msci-tool-case.v1",
  "expectedStandardCount":3,
  "expectedCommands":[
    {"index":0,"text":"while $a","destination":3},
    {"index":2,"text":"","destination":0}
  ]
}"#,
        );
        assert_case(&root, &root.join("testcase.json")).expect("case should pass");
    }

    #[test]
    fn assert_case_reports_error_and_count_mismatches() {
        let errors = case_dir(
            "errors",
            "else\nend\n",
            r#"{"schemaVersion":"msci-tool-case.v1","expectedErrors":[]}"#,
        );
        let error = assert_case(&errors, &errors.join("testcase.json"))
            .expect_err("diagnostics should differ");
        assert!(matches!(error, MsciToolError::ErrorMismatch { .. }));

        let count = case_dir(
            "count",
            "$a = 1\n",
            r#"{"schemaVersion":"msci-tool-case.v1","expectedStandardCount":5}"#,
        );
        let error =
            assert_case(&count, &count.join("testcase.json")).expect_err("count should differ");
        assert!(matches!(
            error,
            MsciToolError::StandardCountMismatch {
                expected: 5,
                actual: 1
            }
        ));
    }

    #[test]
    fn assert_case_reports_command_and_rendering_mismatches() {
        let command = case_dir(
            "command",
            "$a = 1\n",
            r#"{"schemaVersion":"msci-tool-case.v1","expectedCommands":[{"index":0,"text":"$a = 2"}]}"#,
        );
        let error = assert_case(&command, &command.join("testcase.json"))
            .expect_err("text should differ");
        assert!(matches!(error, MsciToolError::CommandMismatch { index: 0, .. }));

        let missing = case_dir(
            "command-missing",
            "$a = 1\n",
            r#"{"schemaVersion":"msci-tool-case.v1","expectedCommands":[{"index":4,"text":"x"}]}"#,
        );
        let error = assert_case(&missing, &missing.join("testcase.json"))
            .expect_err("index should be missing");
        assert!(matches!(error, MsciToolError::CommandMissing { index: 4 }));

        let rendering = case_dir(
            "rendering",
            "$a = 1\n",
            r#"{"schemaVersion":"msci-tool-case.v1","expectedRendering":["$a = 1","$b = 2"]}"#,
        );
        let error = assert_case(&rendering, &rendering.join("testcase.json"))
            .expect_err("rendering should differ");
        assert!(matches!(
            error,
            MsciToolError::RenderingMismatch { line: 2, .. }
        ));
    }
}

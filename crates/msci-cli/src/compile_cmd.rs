use std::path::Path;

use msci_api::{compile_script, load_object_library, ApiError, DEFAULT_INDENT_WIDTH};
use msci_compiler::{CompileOptions, CompileOutput};
use serde::Serialize;

use crate::{load_sources, load_table, map_cli_output_json, CompileArgs};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScriptReport<'a> {
    script: &'a str,
    successful: bool,
    #[serde(flatten)]
    output: &'a CompileOutput,
}

/// Exit code is 1 when any script has diagnostics.
pub(crate) fn run_compile(args: CompileArgs) -> Result<i32, ApiError> {
    let table = load_table(args.syntax.as_deref())?;
    let object_library = args
        .objects
        .as_deref()
        .map(|path| load_object_library(Path::new(path)))
        .transpose()?;
    let options = CompileOptions {
        game_version: args.game_version,
        arguments: args.arguments,
        indent_width: DEFAULT_INDENT_WIDTH,
        object_library,
    };
    let scripts = load_sources(args.script.as_deref(), args.scripts_dir.as_deref())?;

    let mut failed = false;
    for (name, source) in &scripts {
        let output = compile_script(source, &table, &options)?;
        failed |= !output.is_successful();
        if args.json {
            emit_json(name, &output)?;
        } else {
            emit_output(name, &output);
        }
    }
    Ok(i32::from(failed))
}

fn emit_output(name: &str, output: &CompileOutput) {
    println!("SCRIPT:{}", name);
    if output.is_successful() {
        println!("RESULT:OK");
    } else {
        println!("RESULT:ERROR");
    }
    println!("STANDARD_COUNT:{}", output.standard_count);
    for error in &output.errors {
        println!("ERROR:{}:{}:{}", error.line, error.code, error.message);
    }
}

fn emit_json(name: &str, output: &CompileOutput) -> Result<(), ApiError> {
    let report = ScriptReport {
        script: name,
        successful: output.is_successful(),
        output,
    };
    let payload = serde_json::to_string(&report).map_err(map_cli_output_json)?;
    println!("{}", payload);
    Ok(())
}

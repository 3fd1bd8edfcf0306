use std::ffi::OsString;
use std::path::Path;

use clap::Parser;
use msci_api::{load_syntax_table, ApiError};
use msci_parser::SyntaxTable;
use tracing_subscriber::EnvFilter;

mod cli_args;
mod compile_cmd;
mod error_map;
mod format_cmd;
mod source_loader;

#[cfg(test)]
mod cli_test_support;

pub(crate) use cli_args::{Cli, CompileArgs, FormatArgs, Mode};
pub(crate) use error_map::{
    emit_error, map_cli_output_json, map_cli_script_write, map_cli_source_path,
    map_cli_source_read, map_cli_source_scan,
};
pub(crate) use source_loader::{load_sources, resolve_script_file};

pub const LOG_ENV_VAR: &str = "MSCI_LOG";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_tracing();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<i32, ApiError> {
    match cli.command {
        Mode::Compile(args) => compile_cmd::run_compile(args),
        Mode::Format(args) => format_cmd::run_format(args),
    }
}

pub(crate) fn load_table(syntax: Option<&str>) -> Result<SyntaxTable, ApiError> {
    match syntax {
        Some(path) => load_syntax_table(Path::new(path)),
        None => Ok(SyntaxTable::builtin()),
    }
}

use msci_api::ApiError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> ApiError {
    ApiError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: ApiError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).expect("string json")
    );
    1
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> ApiError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> ApiError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> ApiError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_script_write(error: std::io::Error) -> ApiError {
    map_error("CLI_SCRIPT_WRITE", error)
}

pub(crate) fn map_cli_output_json(error: serde_json::Error) -> ApiError {
    map_error("CLI_OUTPUT_JSON", error)
}

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use msci_api::ApiError;
use walkdir::WalkDir;

use crate::{map_cli_source_path, map_cli_source_read, map_cli_source_scan};

pub(crate) const SCRIPT_EXTENSION: &str = ".msci";

/// Scripts to compile keyed by display name: the file name for a single
/// script, the path relative to the directory otherwise.
pub(crate) fn load_sources(
    script: Option<&str>,
    scripts_dir: Option<&str>,
) -> Result<BTreeMap<String, String>, ApiError> {
    match (script, scripts_dir) {
        (Some(script), _) => {
            let path = resolve_script_file(script)?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| script.to_string());
            let content = fs::read_to_string(&path).map_err(map_cli_source_read)?;
            Ok(BTreeMap::from([(name, content)]))
        }
        (None, Some(scripts_dir)) => {
            let root = resolve_scripts_dir(scripts_dir)?;
            read_scripts_from_dir(&root)
        }
        (None, None) => Err(ApiError::new(
            "CLI_SOURCE_MISSING",
            "either --script or --scripts-dir is required",
        )),
    }
}

fn absolute_path(raw: &str) -> Result<PathBuf, ApiError> {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()
        .map_err(map_cli_source_path)?
        .join(path))
}

pub(crate) fn resolve_script_file(script: &str) -> Result<PathBuf, ApiError> {
    let absolute = absolute_path(script)?;

    if !absolute.exists() {
        return Err(ApiError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("script does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_file() {
        return Err(ApiError::new(
            "CLI_SOURCE_NOT_FILE",
            format!("script is not a file: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

pub(crate) fn resolve_scripts_dir(scripts_dir: &str) -> Result<PathBuf, ApiError> {
    let absolute = absolute_path(scripts_dir)?;

    if !absolute.exists() {
        return Err(ApiError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("scripts-dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(ApiError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("scripts-dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

pub(crate) fn read_scripts_from_dir(
    scripts_dir: &Path,
) -> Result<BTreeMap<String, String>, ApiError> {
    let mut scripts = BTreeMap::new();

    for entry in WalkDir::new(scripts_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !path.to_string_lossy().ends_with(SCRIPT_EXTENSION) {
            continue;
        }

        let relative = path
            .strip_prefix(scripts_dir)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(path).map_err(map_cli_source_read)?;
        scripts.insert(relative, content);
    }

    if scripts.is_empty() {
        return Err(ApiError::new(
            "CLI_SOURCE_EMPTY",
            format!("No {} files under {}", SCRIPT_EXTENSION, scripts_dir.display()),
        ));
    }

    tracing::debug!(count = scripts.len(), dir = %scripts_dir.display(), "scripts loaded");
    Ok(scripts)
}

#[cfg(test)]
mod source_loader_tests {
    use super::*;
    use crate::cli_test_support::*;

    #[test]
    fn resolve_scripts_dir_validates_existence_and_directory() {
        let missing = temp_path("missing-dir");
        let missing_err = resolve_scripts_dir(missing.to_string_lossy().as_ref())
            .expect_err("missing path should fail");
        assert_eq!(missing_err.code, "CLI_SOURCE_NOT_FOUND");

        let file_path = temp_path("plain-file");
        write_file(&file_path, "x");
        let file_err = resolve_scripts_dir(file_path.to_string_lossy().as_ref())
            .expect_err("file path should fail");
        assert_eq!(file_err.code, "CLI_SOURCE_NOT_DIR");
    }

    #[test]
    fn resolve_script_file_rejects_directories() {
        let root = temp_path("script-is-dir");
        fs::create_dir_all(&root).expect("root should be created");
        let error = resolve_script_file(root.to_string_lossy().as_ref())
            .expect_err("directory should fail");
        assert_eq!(error.code, "CLI_SOURCE_NOT_FILE");
    }

    #[test]
    fn read_scripts_from_dir_filters_script_extension() {
        let root = temp_path("scripts-dir");
        write_file(&root.join("main.msci"), "$a = 1");
        write_file(&root.join("lib").join("util.msci"), "$b = 2");
        write_file(&root.join("notes.txt"), "ignored");

        let scripts = read_scripts_from_dir(&root).expect("scan should pass");
        assert_eq!(scripts.len(), 2);
        assert!(scripts.contains_key("main.msci"));
        assert!(scripts.contains_key("lib/util.msci"));
    }

    #[test]
    fn read_scripts_from_dir_errors_when_no_scripts() {
        let root = temp_path("empty-scripts-dir");
        write_file(&root.join("readme.txt"), "not source");

        let error = read_scripts_from_dir(&root).expect_err("empty source set should fail");
        assert_eq!(error.code, "CLI_SOURCE_EMPTY");
    }

    #[test]
    fn load_sources_keys_single_script_by_file_name() {
        let root = temp_path("single-script");
        let script = root.join("hello.msci");
        write_file(&script, "$a = 1\n");

        let scripts =
            load_sources(Some(script.to_string_lossy().as_ref()), None).expect("load");
        assert_eq!(scripts.get("hello.msci").map(String::as_str), Some("$a = 1\n"));
    }
}

use std::path::PathBuf;

use walkdir::WalkDir;

pub const TESTCASE_FILE: &str = "testcase.json";

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn cases_root() -> PathBuf {
    workspace_root().join("testdata").join("cases")
}

pub fn case_dir(name: &str) -> PathBuf {
    cases_root().join(name)
}

pub fn testcase_path(name: &str) -> PathBuf {
    case_dir(name).join(TESTCASE_FILE)
}

/// Names of fixture directories holding a testcase, sorted.
pub fn case_names() -> Vec<String> {
    let mut names = WalkDir::new(cases_root())
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| entry.path().join(TESTCASE_FILE).is_file())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_root_points_to_workspace() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }

    #[test]
    fn cases_root_points_to_fixture_directory() {
        assert!(cases_root().is_dir());
    }

    #[test]
    fn case_dir_joins_name() {
        assert!(case_dir("if-else-chain").is_dir());
    }

    #[test]
    fn testcase_path_joins_default_filename() {
        let path = testcase_path("if-else-chain");
        assert!(path.ends_with("testcase.json"));
    }

    #[test]
    fn case_names_lists_fixtures_in_order() {
        let names = case_names();
        assert!(names.contains(&"if-else-chain".to_string()));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}

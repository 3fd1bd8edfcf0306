use msci_test_example::{case_dir, case_names, testcase_path};
use msci_tool::assert_case;

#[test]
fn every_fixture_case_passes() {
    let names = case_names();
    assert!(!names.is_empty(), "no fixture cases found");

    let failures = names
        .iter()
        .filter_map(|name| {
            assert_case(&case_dir(name), &testcase_path(name))
                .err()
                .map(|error| format!("{}: {}", name, error))
        })
        .collect::<Vec<_>>();
    assert!(failures.is_empty(), "failing cases:\n{}", failures.join("\n"));
}

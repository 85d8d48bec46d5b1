//! JSON case tests.
//!
//! Discovers and runs every case under `tests/fixtures`. Time is paused, so
//! the built-in slow scenarios cost nothing while their delays still count.
#![cfg_attr(
    test,
    allow(
        clippy::tests_outside_test_module,
        reason = "Allow for integration tests"
    )
)]

use futures::stream::{self, StreamExt as _};
use integration_tests::{CaseRunner, VerificationResult, discover_cases, load_case};
use mirage_deps::tracing;
use std::path::{Path, PathBuf};

/// Run a single case
///
/// # Errors
/// Returns an error if case loading or setup fails
async fn run_case(case_path: PathBuf) -> Result<VerificationResult, String> {
    let case_name = case_name(&case_path);
    let case = load_case(&case_path)
        .map_err(|error| format!("Failed to load case {case_name}: {error}"))?;
    let runner = CaseRunner::new(case)
        .map_err(|error| format!("Failed to create runner for {case_name}: {error}"))?;
    Ok(runner.run().await)
}

fn case_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or_else(|| "unknown".to_owned(), ToString::to_string)
}

/// Run all cases in the fixtures directory
///
/// # Panics
/// Panics if any case fails verification
#[tokio::test(start_paused = true)]
async fn test_all_cases() {
    let cases_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures");
    let cases = discover_cases(&cases_root).unwrap_or_default();
    assert!(!cases.is_empty(), "no cases under {}", cases_root.display());

    let results: Vec<(String, Result<VerificationResult, String>)> = stream::iter(cases)
        .map(|case_path| async move { (case_name(&case_path), run_case(case_path).await) })
        .buffer_unordered(8)
        .collect()
        .await;

    let mut failures_with_details = vec![];
    let mut passed = vec![];

    for (case_name, result) in results {
        match result {
            Ok(verification) if verification.passed() => passed.push(case_name),
            Ok(verification) => failures_with_details.push((case_name, verification)),
            Err(error) => {
                let mut error_result = VerificationResult::new();
                error_result.fail(error);
                failures_with_details.push((case_name, error_result));
            }
        }
    }

    tracing::info!("{} passed", passed.len());
    let report: Vec<String> = failures_with_details
        .iter()
        .map(|(case_name, verification)| {
            format!("{case_name}:\n  - {}", verification.failures().join("\n  - "))
        })
        .collect();

    assert!(
        failures_with_details.is_empty(),
        "{} case(s) failed\n{}",
        failures_with_details.len(),
        report.join("\n")
    );
}

//! Case loading and discovery

use mirage_core::{Error, Result};
use mirage_deps::serde_json::from_str;
use mirage_engine::fixture::discover_fixtures;
use std::fs;
use std::path::{Path, PathBuf};

use super::case::TestCase;

/// Load a test case from a JSON file
///
/// # Errors
/// Returns error if file reading or parsing fails
pub fn load_case(path: &Path) -> Result<TestCase> {
    let content = fs::read_to_string(path)
        .map_err(|err| Error::Other(format!("Failed to read case {}: {err}", path.display())))?;
    from_str(&content)
        .map_err(|err| Error::Other(format!("Failed to parse case {}: {err}", path.display())))
}

/// Every `*.json` case below `dir`, in path order
///
/// # Errors
/// Returns error if directory reading fails
pub fn discover_cases(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut cases = discover_fixtures(dir)?;
    cases.sort();
    Ok(cases)
}

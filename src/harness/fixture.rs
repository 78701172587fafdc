//! Fixture discovery.
//!
//! A fixture is a pair of files in the fixture directory: a golden file
//! `<name>.<golden_ext>` holding the expected stdout, and a source file
//! `<name>.<source_ext>` fed to the program under test. Discovery is
//! non-recursive and sorted by file name so runs are reproducible.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Errors that abort loading entirely. These are infrastructure failures:
/// nothing has been compared yet, so no per-case report is produced.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("cannot read fixture directory '{}': {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("golden file '{}' has no matching source file '{}'", golden.display(), missing.display())]
    SourceMissing { golden: PathBuf, missing: PathBuf },

    #[error("cannot read golden file '{}': {source}", path.display())]
    GoldenRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single golden-file test case. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct TestCase {
    /// Case name, derived from the golden file stem.
    pub name: String,
    /// Input handed to the program under test.
    pub source_path: PathBuf,
    /// The golden file this case was built from.
    pub expected_path: PathBuf,
    /// Expected stdout, exact bytes as read from the golden file.
    pub expected_output: String,
    /// Per-case timeout override; `None` uses the run-wide default.
    pub timeout: Option<Duration>,
}

/// Discover test cases in `dir`.
///
/// One case per `<name>.<golden_ext>` file, sorted lexicographically by file
/// name. `filter` restricts the result to cases whose name contains the
/// given substring.
pub fn load_fixtures(
    dir: &Path,
    golden_ext: &str,
    source_ext: &str,
    filter: Option<&str>,
) -> Result<Vec<TestCase>, FixtureError> {
    let read_err = |source| FixtureError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut golden_paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == golden_ext) {
            golden_paths.push(path);
        }
    }

    // Directory listing order is platform-dependent; sort for reproducible
    // runs and stable reports.
    golden_paths.sort();

    let mut cases = Vec::new();
    for golden in golden_paths {
        let name = golden
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        if let Some(pattern) = filter {
            if !name.contains(pattern) {
                continue;
            }
        }

        let source_path = golden.with_extension(source_ext);
        if !source_path.exists() {
            return Err(FixtureError::SourceMissing {
                golden,
                missing: source_path,
            });
        }

        let expected_output =
            fs::read_to_string(&golden).map_err(|source| FixtureError::GoldenRead {
                path: golden.clone(),
                source,
            })?;

        cases.push(TestCase {
            name,
            source_path,
            expected_path: golden,
            expected_output,
            timeout: None,
        });
    }

    tracing::debug!(count = cases.len(), dir = %dir.display(), "collected fixtures");
    Ok(cases)
}

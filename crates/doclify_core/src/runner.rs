//! Parallel checking of many files.

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::checker::{CheckOptions, check_markdown};
use crate::error::DoclifyError;
use crate::result::FileResult;

/// Successful results plus per-file failures that did not abort the run.
pub type CheckFilesResult = (Vec<FileResult>, Vec<(PathBuf, DoclifyError)>);

/// Checks every file, in parallel.
///
/// Each document is a pure function of its content and options, so files are
/// simply fanned out over the rayon pool. Unreadable files are collected as
/// failures rather than aborting the whole run.
pub fn check_files(paths: &[PathBuf], options: &CheckOptions) -> CheckFilesResult {
    let results: Vec<Result<FileResult, (PathBuf, DoclifyError)>> = paths
        .par_iter()
        .map(|path| {
            let content = std::fs::read_to_string(path).map_err(|e| {
                (
                    path.clone(),
                    DoclifyError::file(format!("Failed to read {}: {}", path.display(), e)),
                )
            })?;

            let file_options = CheckOptions {
                file_path: Some(path.display().to_string()),
                ..options.clone()
            };
            let report = check_markdown(&content, &file_options);
            debug!(
                "Checked {}: {} errors, {} warnings",
                path.display(),
                report.summary.errors,
                report.summary.warnings
            );
            Ok(FileResult::new(path.clone(), report))
        })
        .collect();

    let mut successes = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(file_result) => successes.push(file_result),
            Err((path, error)) => {
                warn!("Failed to check {}: {}", path.display(), error);
                failures.push((path, error));
            }
        }
    }

    (successes, failures)
}

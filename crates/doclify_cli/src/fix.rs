//! Applies auto-fixes to files and reports what changed.

use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};
use tracing::debug;

use doclify_core::{auto_fix_formatting, auto_fix_insecure_links};

/// Summary of applied fixes.
pub struct FixSummary {
    pub total_changes: usize,
    pub files_fixed: usize,
    pub changes_by_file: Vec<(PathBuf, usize)>,
    pub ambiguous_urls: Vec<(PathBuf, String)>,
}

/// Outcome of fixing a single document in memory.
struct FileFix {
    content: String,
    modified: bool,
    change_count: usize,
    ambiguous: Vec<String>,
}

/// Insecure-link upgrades run first, then the formatting passes, matching
/// the order a human would apply them: content edits before layout edits.
fn fix_content(content: &str) -> FileFix {
    let link_outcome = auto_fix_insecure_links(content);
    let format_outcome = auto_fix_formatting(&link_outcome.content);

    FileFix {
        modified: format_outcome.content != content,
        content: format_outcome.content,
        change_count: link_outcome.changes.len() + format_outcome.changes.len(),
        ambiguous: link_outcome.ambiguous,
    }
}

/// Fixes every file, writing results back unless `dry_run` is set.
pub fn apply_fixes(paths: &[PathBuf], dry_run: bool) -> Result<FixSummary> {
    let mut summary = FixSummary {
        total_changes: 0,
        files_fixed: 0,
        changes_by_file: Vec::new(),
        ambiguous_urls: Vec::new(),
    };

    for path in paths {
        let content = std::fs::read_to_string(path).into_diagnostic()?;
        let fix = fix_content(&content);

        for url in &fix.ambiguous {
            summary.ambiguous_urls.push((path.clone(), url.clone()));
        }

        if !fix.modified {
            continue;
        }

        if !dry_run {
            write_fixed(path, &fix.content)?;
        }
        debug!(
            "{} {}: {} changes",
            if dry_run { "Would fix" } else { "Fixed" },
            path.display(),
            fix.change_count
        );

        summary.total_changes += fix.change_count;
        summary.files_fixed += 1;
        summary.changes_by_file.push((path.clone(), fix.change_count));
    }

    Ok(summary)
}

fn write_fixed(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).into_diagnostic()
}

/// Outputs the fix summary.
pub fn output_fix_summary(summary: &FixSummary, dry_run: bool) {
    if summary.total_changes == 0 {
        println!("No fixable issues found.");
    } else if dry_run {
        println!(
            "\nWould fix {} issues in {} files:",
            summary.total_changes, summary.files_fixed
        );
        for (path, count) in &summary.changes_by_file {
            println!("  {}: {} fixes", path.display(), count);
        }
        println!("\nRun without --dry-run to apply fixes.");
    } else {
        println!(
            "\nFixed {} issues in {} files:",
            summary.total_changes, summary.files_fixed
        );
        for (path, count) in &summary.changes_by_file {
            println!("  {}: {} fixes", path.display(), count);
        }
    }

    if !summary.ambiguous_urls.is_empty() {
        println!(
            "\nLeft {} http:// URLs untouched (localhost or custom port):",
            summary.ambiguous_urls.len()
        );
        for (path, url) in &summary.ambiguous_urls {
            println!("  {}: {}", path.display(), url);
        }
    }
}

//! Text output formatter

use doclify_core::{FileResult, Finding, Severity};

pub fn output_text(results: &[FileResult], strict: bool) {
    for result in results {
        let report = &result.report;
        if report.errors.is_empty() && report.warnings.is_empty() {
            continue;
        }

        println!("\n{}:", result.path.display());
        for finding in report.errors.iter().chain(report.warnings.iter()) {
            print_finding(finding);
        }
    }

    let total_files = results.len();
    let total_errors: usize = results.iter().map(|r| r.report.summary.errors).sum();
    let total_warnings: usize = results.iter().map(|r| r.report.summary.warnings).sum();
    let passed = results.iter().filter(|r| r.report.passes(strict)).count();

    println!();
    println!(
        "Checked {} files, found {} errors and {} warnings ({} passed, strict: {})",
        total_files,
        total_errors,
        total_warnings,
        passed,
        if strict { "on" } else { "off" }
    );
}

fn print_finding(finding: &Finding) {
    let severity = match finding.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    match finding.line {
        Some(line) => println!(
            "  {}: {} [{}]: {}",
            line, severity, finding.code, finding.message
        ),
        None => println!("  -: {} [{}]: {}", severity, finding.code, finding.message),
    }
}

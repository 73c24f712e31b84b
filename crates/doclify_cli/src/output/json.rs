//! JSON output formatter

use miette::{IntoDiagnostic, Result};

use doclify_core::FileResult;

pub fn output_json(results: &[FileResult], strict: bool) -> Result<()> {
    let files: Vec<_> = results
        .iter()
        .map(|result| {
            let pass = result.report.passes(strict);
            serde_json::json!({
                "file": result.path.display().to_string(),
                "pass": pass,
                "healthScore": result.health_score,
                "findings": {
                    "errors": result.report.errors,
                    "warnings": result.report.warnings,
                },
                "summary": {
                    "errors": result.report.summary.errors,
                    "warnings": result.report.summary.warnings,
                    "status": if pass { "PASS" } else { "FAIL" },
                },
            })
        })
        .collect();

    let total_errors: usize = results.iter().map(|r| r.report.summary.errors).sum();
    let total_warnings: usize = results.iter().map(|r| r.report.summary.warnings).sum();
    let pass = results.iter().all(|r| r.report.passes(strict));

    let output = serde_json::json!({
        "version": "0.2",
        "strict": strict,
        "pass": pass,
        "files": files,
        "summary": {
            "filesChecked": results.len(),
            "errors": total_errors,
            "warnings": total_warnings,
        },
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}

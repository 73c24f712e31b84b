//! Output formatting module

mod json;
mod sarif;
mod text;

use miette::Result;

use doclify_core::FileResult;

use crate::cli::OutputFormat;

/// Renders results in the requested format and returns whether the gate
/// failed (errors anywhere, or warnings in strict mode).
pub fn output_results(results: &[FileResult], format: OutputFormat, strict: bool) -> Result<bool> {
    let gate_failed = results.iter().any(|r| !r.report.passes(strict));

    match format {
        OutputFormat::Sarif => sarif::output_sarif(results)?,
        OutputFormat::Json => json::output_json(results, strict)?,
        OutputFormat::Text => text::output_text(results, strict),
    }

    Ok(gate_failed)
}

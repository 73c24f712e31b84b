//! SARIF output formatter

use miette::{IntoDiagnostic, Result};

use doclify_core::FileResult;

pub fn output_sarif(results: &[FileResult]) -> Result<()> {
    let sarif_output = doclify_core::generate_sarif(results).into_diagnostic()?;
    println!("{}", sarif_output);
    Ok(())
}

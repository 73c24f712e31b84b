//! Rules command implementation

use miette::Result;

use doclify_core::{RULE_CATALOG, Severity};

/// Renders the built-in rule catalog.
pub fn run_list() -> Result<()> {
    println!("{:<34} {:<9} {}", "RULE", "SEVERITY", "DESCRIPTION");
    for rule in RULE_CATALOG {
        let severity = match rule.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!("{:<34} {:<9} {}", rule.id, severity, rule.description);
    }
    Ok(())
}

//! User-supplied rules loaded from a JSON file.
//!
//! Validation and pattern compilation happen here, at load time; the
//! evaluator assumes every rule it receives is valid.

use std::fs;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::error::DoclifyError;
use crate::finding::Severity;

/// A compiled custom rule, consumed by the evaluator like a built-in
/// pattern rule.
#[derive(Debug, Clone)]
pub struct CustomRule {
    /// Rule identifier used in findings and suppression directives.
    pub id: String,
    /// Declared severity; wins over any catalog default.
    pub severity: Severity,
    /// Compiled pattern, tested per line against the stripped view.
    pub pattern: Regex,
    /// Message attached to every finding this rule produces.
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    id: Option<String>,
    pattern: Option<String>,
    message: Option<String>,
    severity: Option<String>,
    flags: Option<String>,
}

/// Loads and validates custom rules from a JSON file.
///
/// The file shape is `{ "rules": [ { "id", "pattern", "message",
/// "severity"?, "flags"? } ] }`. Patterns are case-insensitive unless the
/// optional `flags` string omits `i`.
pub fn load_custom_rules(path: impl AsRef<Path>) -> Result<Vec<CustomRule>, DoclifyError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|e| DoclifyError::rules(format!("Rules file not found: {}: {}", path.display(), e)))?;

    let parsed: RulesFile = serde_json::from_str(&raw).map_err(|e| {
        DoclifyError::rules(format!("Invalid JSON in rules file ({}): {}", path.display(), e))
    })?;

    let rules = parsed
        .rules
        .into_iter()
        .enumerate()
        .map(|(index, rule)| validate_rule(rule, index))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Loaded {} custom rules from {}", rules.len(), path.display());
    Ok(rules)
}

fn validate_rule(rule: RawRule, index: usize) -> Result<CustomRule, DoclifyError> {
    let id = rule
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| DoclifyError::rules(format!("Rule at index {}: missing \"id\"", index)))?;

    let pattern = rule
        .pattern
        .filter(|p| !p.is_empty())
        .ok_or_else(|| DoclifyError::rules(format!("Rule \"{}\": missing \"pattern\"", id)))?;

    let message = rule
        .message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| DoclifyError::rules(format!("Rule \"{}\": missing \"message\"", id)))?;

    let severity = match rule.severity.as_deref() {
        None | Some("warning") => Severity::Warning,
        Some("error") => Severity::Error,
        Some(other) => {
            return Err(DoclifyError::rules(format!(
                "Rule \"{}\": severity must be \"error\" or \"warning\", got \"{}\"",
                id, other
            )));
        }
    };

    // Default flags are "gi"; global matching is implicit in Rust, so only
    // case-insensitivity is honored.
    let case_insensitive = rule.flags.as_deref().is_none_or(|flags| flags.contains('i'));

    let compiled = RegexBuilder::new(&pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| DoclifyError::rules(format!("Rule \"{}\": invalid regex pattern: {}", id, e)))?;

    Ok(CustomRule {
        id,
        severity,
        pattern: compiled,
        message,
    })
}

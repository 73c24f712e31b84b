//! Finding types produced by the rule evaluator.

use serde::{Deserialize, Serialize};

/// Severity level for findings.
///
/// The gate is strictly two-valued: fatal conditions (unreadable files,
/// bad arguments) are CLI concerns and never appear as findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - fails the gate.
    Error,
    /// Warning - fails the gate only in strict mode.
    Warning,
}

/// One reported issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// The rule that produced this finding.
    pub code: String,

    /// Severity level.
    pub severity: Severity,

    /// Human-readable message.
    pub message: String,

    /// 1-based line number in the original content, if the finding is
    /// tied to a line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    /// Source file identifier, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Error/warning counts for a single document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of errors.
    pub errors: usize,
    /// Number of warnings.
    pub warnings: usize,
}

/// Result of checking a single document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckReport {
    /// Findings with error severity.
    pub errors: Vec<Finding>,
    /// Findings with warning severity.
    pub warnings: Vec<Finding>,
    /// Counts matching the two lists above.
    pub summary: Summary,
}

impl CheckReport {
    /// Creates an empty report.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a report from finding lists, recomputing the summary.
    pub fn new(errors: Vec<Finding>, warnings: Vec<Finding>) -> Self {
        let summary = Summary {
            errors: errors.len(),
            warnings: warnings.len(),
        };
        Self {
            errors,
            warnings,
            summary,
        }
    }

    /// Appends a finding to the bucket matching its severity.
    ///
    /// Used by callers merging collaborator findings (e.g. dead-link checks)
    /// into an existing report.
    pub fn push(&mut self, finding: Finding) {
        match finding.severity {
            Severity::Error => self.errors.push(finding),
            Severity::Warning => self.warnings.push(finding),
        }
        self.summary.errors = self.errors.len();
        self.summary.warnings = self.warnings.len();
    }

    /// Drops findings whose rule id appears in `ignored`, recomputing
    /// the summary.
    pub fn retain_not_ignored(&mut self, ignored: &std::collections::HashSet<String>) {
        if ignored.is_empty() {
            return;
        }
        self.errors.retain(|f| !ignored.contains(&f.code));
        self.warnings.retain(|f| !ignored.contains(&f.code));
        self.summary.errors = self.errors.len();
        self.summary.warnings = self.warnings.len();
    }

    /// Returns true if any error-severity finding is present.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns whether the document passes the gate.
    ///
    /// Strict mode promotes warnings to failures; this is caller policy,
    /// not part of rule evaluation.
    pub fn passes(&self, strict: bool) -> bool {
        self.errors.is_empty() && (!strict || self.warnings.is_empty())
    }
}

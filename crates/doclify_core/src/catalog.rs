//! Static rule catalog and the single finding construction point.

use crate::finding::{Finding, Severity};

/// A built-in rule description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Rule identifier, as used in findings and suppression directives.
    pub id: &'static str,
    /// Default severity when no override is supplied.
    pub severity: Severity,
    /// Human description, rendered by `doclify rules list`.
    pub description: &'static str,
}

/// All built-in rules, in evaluation order.
pub const RULE_CATALOG: &[Rule] = &[
    Rule {
        id: "frontmatter",
        severity: Severity::Warning,
        description: "Require YAML frontmatter block (requires --check-frontmatter)",
    },
    Rule {
        id: "single-h1",
        severity: Severity::Error,
        description: "Exactly one H1 heading per file",
    },
    Rule {
        id: "heading-hierarchy",
        severity: Severity::Warning,
        description: "No skipped heading levels (H2 -> H4)",
    },
    Rule {
        id: "duplicate-heading",
        severity: Severity::Warning,
        description: "No duplicate headings within the same section scope",
    },
    Rule {
        id: "line-length",
        severity: Severity::Warning,
        description: "Max line length (default: 160 chars)",
    },
    Rule {
        id: "placeholder",
        severity: Severity::Warning,
        description: "No TODO/FIXME/WIP/TBD markers",
    },
    Rule {
        id: "insecure-link",
        severity: Severity::Warning,
        description: "No http:// links (use https://)",
    },
    Rule {
        id: "empty-link",
        severity: Severity::Warning,
        description: "No empty link text or URL",
    },
    Rule {
        id: "img-alt",
        severity: Severity::Warning,
        description: "Images must have alt text",
    },
    Rule {
        id: "no-trailing-spaces",
        severity: Severity::Warning,
        description: "No trailing whitespace at end of line",
    },
    Rule {
        id: "no-multiple-blanks",
        severity: Severity::Warning,
        description: "No consecutive blank lines",
    },
    Rule {
        id: "single-trailing-newline",
        severity: Severity::Warning,
        description: "Files end with exactly one trailing newline",
    },
    Rule {
        id: "no-missing-space-atx",
        severity: Severity::Warning,
        description: "Space required after # in ATX headings",
    },
    Rule {
        id: "heading-start-left",
        severity: Severity::Warning,
        description: "Headings start at the beginning of the line",
    },
    Rule {
        id: "no-trailing-punctuation-heading",
        severity: Severity::Warning,
        description: "No trailing punctuation in heading text",
    },
    Rule {
        id: "blanks-around-headings",
        severity: Severity::Warning,
        description: "Headings surrounded by blank lines",
    },
    Rule {
        id: "blanks-around-lists",
        severity: Severity::Warning,
        description: "Lists surrounded by blank lines",
    },
    Rule {
        id: "blanks-around-fences",
        severity: Severity::Warning,
        description: "Fenced code blocks surrounded by blank lines",
    },
    Rule {
        id: "fenced-code-language",
        severity: Severity::Warning,
        description: "Fenced code blocks declare a language",
    },
    Rule {
        id: "no-bare-urls",
        severity: Severity::Warning,
        description: "No bare URLs (wrap in <> or a markdown link)",
    },
    Rule {
        id: "no-reversed-links",
        severity: Severity::Warning,
        description: "No reversed link syntax (text)[url]",
    },
    Rule {
        id: "no-space-in-emphasis",
        severity: Severity::Warning,
        description: "No spaces inside emphasis markers",
    },
    Rule {
        id: "no-space-in-links",
        severity: Severity::Warning,
        description: "No spaces inside link text or URL delimiters",
    },
    Rule {
        id: "no-inline-html",
        severity: Severity::Warning,
        description: "No inline HTML (requires --check-inline-html)",
    },
    Rule {
        id: "no-empty-sections",
        severity: Severity::Warning,
        description: "No headings without content",
    },
    Rule {
        id: "no-duplicate-links",
        severity: Severity::Warning,
        description: "No duplicate link URLs per document",
    },
    Rule {
        id: "list-marker-consistency",
        severity: Severity::Warning,
        description: "Consistent bullet list markers",
    },
    Rule {
        id: "link-title-style",
        severity: Severity::Warning,
        description: "Consistent link title quote style",
    },
    Rule {
        id: "dead-link",
        severity: Severity::Error,
        description: "No broken links (requires --check-links)",
    },
];

/// Returns the catalog default severity for a rule id.
pub fn default_severity(rule_id: &str) -> Option<Severity> {
    RULE_CATALOG
        .iter()
        .find(|rule| rule.id == rule_id)
        .map(|rule| rule.severity)
}

/// Constructs a finding with consistent severity resolution.
///
/// Resolution order: explicit override (custom rules) > catalog default >
/// `Warning` fallback for ids the catalog does not know.
pub fn normalize_finding(
    rule_id: &str,
    message: impl Into<String>,
    line: Option<u32>,
    source: Option<&str>,
    severity_override: Option<Severity>,
) -> Finding {
    let severity = severity_override
        .or_else(|| default_severity(rule_id))
        .unwrap_or(Severity::Warning);

    Finding {
        code: rule_id.to_string(),
        severity,
        message: message.into(),
        line,
        source: source.map(|s| s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for rule in RULE_CATALOG {
            assert!(seen.insert(rule.id), "duplicate rule id: {}", rule.id);
        }
    }

    #[test]
    fn severity_resolution_order() {
        // Explicit override wins over the catalog default.
        let f = normalize_finding("single-h1", "msg", Some(1), None, Some(Severity::Warning));
        assert_eq!(f.severity, Severity::Warning);

        // Catalog default.
        let f = normalize_finding("single-h1", "msg", Some(1), None, None);
        assert_eq!(f.severity, Severity::Error);

        // Unknown rules fall back to warning.
        let f = normalize_finding("my-custom-rule", "msg", None, None, None);
        assert_eq!(f.severity, Severity::Warning);
    }

    #[test]
    fn finding_carries_line_and_source() {
        let f = normalize_finding("line-length", "msg", Some(12), Some("docs/a.md"), None);
        assert_eq!(f.line, Some(12));
        assert_eq!(f.source.as_deref(), Some("docs/a.md"));
    }

    #[test]
    fn dead_link_defaults_to_error() {
        assert_eq!(default_severity("dead-link"), Some(Severity::Error));
    }
}

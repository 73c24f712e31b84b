//! Inline suppression directives.
//!
//! Directives are HTML comments scanned on the fence-stripped view, so
//! occurrences inside code fences are inert:
//!
//! ```markdown
//! <!-- doclify-disable-next-line placeholder -->
//! <!-- doclify-disable line-length insecure-link -->
//! <!-- doclify-enable -->
//! <!-- doclify-disable-file -->
//! ```
//!
//! An empty rule list (or a literal `*`) means "all rules".

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::finding::Finding;

/// Sentinel stored in suppression sets for "all rules".
const ALL_RULES: &str = "*";

static DIRECTIVE_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*doclify-(disable-next-line|disable-file|disable|enable)\s*(.*?)\s*-->")
        .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive {
    /// Suppresses the following line only.
    NextLine(Option<Vec<String>>),
    /// Opens a block disable (depth-counted per rule).
    Disable(Option<Vec<String>>),
    /// Closes a block disable.
    Enable(Option<Vec<String>>),
    /// Whole-document directive, resolved separately by [`file_directive`].
    DisableFile,
}

/// Parses the first directive on a line, if any.
///
/// Alternation order in the pattern makes `disable-next-line` win over
/// `disable` on the same comment, which is the documented precedence.
fn parse_directive(line: &str) -> Option<Directive> {
    let caps = DIRECTIVE_RX.captures(line)?;
    let rules = parse_rule_ids(&caps[2]);
    match &caps[1] {
        "disable-next-line" => Some(Directive::NextLine(rules)),
        "disable-file" => Some(Directive::DisableFile),
        "disable" => Some(Directive::Disable(rules)),
        "enable" => Some(Directive::Enable(rules)),
        _ => None,
    }
}

/// Splits a directive argument list. `None` means "all rules".
fn parse_rule_ids(raw: &str) -> Option<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == ALL_RULES {
        return None;
    }
    Some(trimmed.split_whitespace().map(|s| s.to_string()).collect())
}

/// Per-line map of suppressed rule ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionMap {
    by_line: HashMap<u32, HashSet<String>>,
}

impl SuppressionMap {
    fn add(&mut self, line: u32, rules: &Option<Vec<String>>) {
        let set = self.by_line.entry(line).or_default();
        match rules {
            None => {
                set.insert(ALL_RULES.to_string());
            }
            Some(ids) => {
                for id in ids {
                    set.insert(id.clone());
                }
            }
        }
    }

    fn add_active(&mut self, line: u32, active: &HashMap<String, u32>) {
        let set = self.by_line.entry(line).or_default();
        for id in active.keys() {
            set.insert(id.clone());
        }
    }

    /// Returns the suppressed rule ids for a line, if any.
    pub fn rules_for(&self, line: u32) -> Option<&HashSet<String>> {
        self.by_line.get(&line)
    }

    /// Returns true if the finding is suppressed by this map.
    ///
    /// Findings without a line number are never line-suppressed.
    pub fn suppresses(&self, finding: &Finding) -> bool {
        let Some(line) = finding.line else {
            return false;
        };
        self.by_line
            .get(&line)
            .is_some_and(|set| set.contains(ALL_RULES) || set.contains(&finding.code))
    }
}

/// Builds the suppression map from fence-stripped lines.
///
/// Block disables are depth-counted per rule id so nested `disable`
/// directives need matching `enable`s, with one exception: an `enable` with
/// no arguments clears every active disable regardless of depth, so an
/// explicit re-enable-all always wins.
pub fn build_suppression_map(lines: &[&str]) -> SuppressionMap {
    let mut map = SuppressionMap::default();
    // Rule id (or "*") -> nest depth. Only alive during this scan.
    let mut active: HashMap<String, u32> = HashMap::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_num = idx as u32 + 1;

        match parse_directive(line) {
            Some(Directive::NextLine(rules)) => {
                map.add(line_num + 1, &rules);
                // The directive line itself still receives active block
                // suppressions below.
            }
            Some(Directive::Disable(rules)) => {
                match rules {
                    None => *active.entry(ALL_RULES.to_string()).or_insert(0) += 1,
                    Some(ids) => {
                        for id in ids {
                            *active.entry(id).or_insert(0) += 1;
                        }
                    }
                }
                continue;
            }
            Some(Directive::Enable(rules)) => {
                match rules {
                    None => active.clear(),
                    Some(ids) => {
                        for id in ids {
                            if let Some(count) = active.get_mut(&id) {
                                if *count <= 1 {
                                    active.remove(&id);
                                } else {
                                    *count -= 1;
                                }
                            }
                        }
                    }
                }
                continue;
            }
            Some(Directive::DisableFile) => continue,
            None => {}
        }

        if !active.is_empty() {
            map.add_active(line_num, &active);
        }
    }

    map
}

/// Whole-document suppression, applied after the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileDirective {
    /// `doclify-disable-file` with no arguments: short-circuit to an empty
    /// report.
    DisableAll,
    /// `doclify-disable-file rule ...`: drop findings for these rules
    /// regardless of line.
    DisableRules(HashSet<String>),
}

/// Finds the first `disable-file` directive in the stripped content.
pub fn file_directive(stripped_content: &str) -> Option<FileDirective> {
    for caps in DIRECTIVE_RX.captures_iter(stripped_content) {
        if &caps[1] != "disable-file" {
            continue;
        }
        return Some(match parse_rule_ids(&caps[2]) {
            None => FileDirective::DisableAll,
            Some(ids) => FileDirective::DisableRules(ids.into_iter().collect()),
        });
    }
    None
}

//! Mechanical repair of a safe subset of findings.
//!
//! Two independent entry points: [`auto_fix_formatting`] rewrites structural
//! and stylistic defects in two passes, [`auto_fix_insecure_links`] upgrades
//! `http://` URLs. Both preserve all non-target bytes, re-run the fence
//! tracker so code regions stay untouched, and never fail on malformed
//! input; the worst case is "no changes".

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::checker::{clean_url, frontmatter_close_index, is_blank};
use crate::fence::{FenceEvent, FenceTracker, inline_code_spans};

static TRAILING_WS_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+$").unwrap());
static ATX_FIX_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*#{1,6})([^#\s])").unwrap());
static HEADING_INDENT_FIX_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]+(#{1,6}\s.*)$").unwrap());
static HEADING_PUNCT_FIX_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6}\s+.*?)[.,:;!]+$").unwrap());
static REVERSED_LINK_FIX_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]+)\)\[([^\]]+)\]").unwrap());
static STRONG_FIX_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\s*([^*]*?)\s*\*\*").unwrap());
static EM_FIX_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\s*([^*\s][^*]*?)\s*\*").unwrap());
static LINK_FIX_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*([^\]]*?)\s*\]\(\s*([^)]*?)\s*\)").unwrap());
static LIST_MARKER_PREFIX_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+").unwrap());
static BARE_URL_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bhttps?://[^\s<>]+").unwrap());
static HTTP_TOKEN_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bhttp://\S+").unwrap());
static HEADING_LINE_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s").unwrap());
static LIST_ITEM_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([-*+]|\d+[.)])\s+").unwrap());

/// One applied formatting substitution or structural edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatChange {
    /// The rule this change repairs.
    pub rule: String,
    /// 1-based line number in the content the pass operated on.
    pub line: u32,
}

/// One `http://` to `https://` upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkChange {
    /// Original URL token.
    pub from: String,
    /// Rewritten URL token.
    pub to: String,
}

/// Result of [`auto_fix_formatting`].
#[derive(Debug, Clone)]
pub struct FormatOutcome {
    /// The rewritten content.
    pub content: String,
    /// Whether the content differs from the input.
    pub modified: bool,
    /// Audit record of applied changes.
    pub changes: Vec<FormatChange>,
}

/// Result of [`auto_fix_insecure_links`].
#[derive(Debug, Clone)]
pub struct LinkFixOutcome {
    /// The rewritten content.
    pub content: String,
    /// Whether the content differs from the input.
    pub modified: bool,
    /// Audit record of applied upgrades.
    pub changes: Vec<LinkChange>,
    /// URLs left alone because an upgrade could change behavior
    /// (localhost, loopback addresses, explicit non-default ports).
    pub ambiguous: Vec<String>,
}

/// Applies structural and stylistic formatting fixes.
pub fn auto_fix_formatting(content: &str) -> FormatOutcome {
    if content.is_empty() {
        return FormatOutcome {
            content: String::new(),
            modified: false,
            changes: Vec::new(),
        };
    }

    let mut changes = Vec::new();
    let pass1 = line_fix_pass(content, &mut changes);
    let fixed = structural_fix_pass(&pass1, &mut changes);

    FormatOutcome {
        modified: fixed != content,
        content: fixed,
        changes,
    }
}

/// Pass 1: line-local regex substitutions, skipping code regions.
fn line_fix_pass(content: &str, changes: &mut Vec<FormatChange>) -> String {
    let mut tracker = FenceTracker::new();
    let fixed: Vec<String> = content
        .split('\n')
        .enumerate()
        .map(|(idx, line)| {
            if tracker.observe(line).in_code() {
                line.to_string()
            } else {
                fix_line(line, idx as u32 + 1, changes)
            }
        })
        .collect();
    fixed.join("\n")
}

fn push_change(changes: &mut Vec<FormatChange>, rule: &str, line: u32) {
    changes.push(FormatChange {
        rule: rule.to_string(),
        line,
    });
}

fn fix_line(line: &str, line_num: u32, changes: &mut Vec<FormatChange>) -> String {
    let mut current = line.to_string();

    if TRAILING_WS_RX.is_match(&current) {
        current = TRAILING_WS_RX.replace(&current, "").into_owned();
        push_change(changes, "no-trailing-spaces", line_num);
    }

    if let Some(replaced) = replace_once(&ATX_FIX_RX, &current, "$1 $2") {
        current = replaced;
        push_change(changes, "no-missing-space-atx", line_num);
    }

    if let Some(replaced) = replace_once(&HEADING_INDENT_FIX_RX, &current, "$1") {
        current = replaced;
        push_change(changes, "heading-start-left", line_num);
    }

    if let Some(replaced) = replace_once(&HEADING_PUNCT_FIX_RX, &current, "$1") {
        current = replaced;
        push_change(changes, "no-trailing-punctuation-heading", line_num);
    }

    let reversed_count = REVERSED_LINK_FIX_RX.find_iter(&current).count();
    if reversed_count > 0 {
        current = REVERSED_LINK_FIX_RX
            .replace_all(&current, "[$1]($2)")
            .into_owned();
        for _ in 0..reversed_count {
            push_change(changes, "no-reversed-links", line_num);
        }
    }

    current = fix_emphasis_spaces(&current, line_num, changes);
    current = fix_link_spaces(&current, line_num, changes);
    current = wrap_bare_urls(&current, line_num, changes);

    current
}

/// Applies `rx` once; returns the new line only when it actually changed.
fn replace_once(rx: &Regex, line: &str, replacement: &str) -> Option<String> {
    if !rx.is_match(line) {
        return None;
    }
    let replaced = rx.replace(line, replacement).into_owned();
    (replaced != line).then_some(replaced)
}

/// Collapses whitespace just inside `**...**` and `*...*` delimiters.
///
/// The single-star pass runs on the text after any leading list marker, so
/// bullets never read as emphasis openers.
fn fix_emphasis_spaces(line: &str, line_num: u32, changes: &mut Vec<FormatChange>) -> String {
    let mut fixed = 0usize;

    let strong = STRONG_FIX_RX.replace_all(line, |caps: &regex::Captures| {
        let rebuilt = format!("**{}**", &caps[1]);
        if rebuilt != caps[0] {
            fixed += 1;
        }
        rebuilt
    });

    let (prefix, rest) = match LIST_MARKER_PREFIX_RX.find(&strong) {
        Some(m) => strong.split_at(m.end()),
        None => ("", strong.as_ref()),
    };
    let em = EM_FIX_RX.replace_all(rest, |caps: &regex::Captures| {
        let rebuilt = format!("*{}*", &caps[1]);
        if rebuilt != caps[0] {
            fixed += 1;
        }
        rebuilt
    });

    for _ in 0..fixed {
        push_change(changes, "no-space-in-emphasis", line_num);
    }
    format!("{}{}", prefix, em)
}

/// Collapses whitespace just inside `[...](...)` delimiters.
fn fix_link_spaces(line: &str, line_num: u32, changes: &mut Vec<FormatChange>) -> String {
    let mut fixed = 0usize;
    let result = LINK_FIX_RX.replace_all(line, |caps: &regex::Captures| {
        let rebuilt = format!("[{}]({})", &caps[1], &caps[2]);
        if rebuilt != caps[0] {
            fixed += 1;
        }
        rebuilt
    });
    for _ in 0..fixed {
        push_change(changes, "no-space-in-links", line_num);
    }
    result.into_owned()
}

/// Wraps bare URLs in angle brackets, leaving linked and autolinked URLs,
/// inline code spans, and trailing punctuation alone.
fn wrap_bare_urls(line: &str, line_num: u32, changes: &mut Vec<FormatChange>) -> String {
    let spans = inline_code_spans(line);
    let mut out = String::new();
    let mut last = 0usize;

    for m in BARE_URL_RX.find_iter(line) {
        if spans.iter().any(|s| s.contains(&m.start())) {
            continue;
        }
        let before = &line[..m.start()];
        if before.ends_with('<') || before.ends_with('[') || before.ends_with("](") {
            continue;
        }

        let token = m.as_str();
        let url = clean_url(token);
        out.push_str(&line[last..m.start()]);
        out.push('<');
        out.push_str(url);
        out.push('>');
        out.push_str(&token[url.len()..]);
        last = m.end();

        push_change(changes, "no-bare-urls", line_num);
    }

    if last == 0 {
        return line.to_string();
    }
    out.push_str(&line[last..]);
    out
}

/// Pass 2: blank-line structure. Fence classification is recomputed here
/// because pass-1 edits can change which lines look like fences.
fn structural_fix_pass(content: &str, changes: &mut Vec<FormatChange>) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut tracker = FenceTracker::new();
    let events: Vec<FenceEvent> = lines.iter().map(|l| tracker.observe(l)).collect();
    let fm_close = frontmatter_close_index(&lines);

    let heading_at = |i: usize| events[i] == FenceEvent::Outside && HEADING_LINE_RX.is_match(lines[i]);
    let list_at = |i: usize| events[i] == FenceEvent::Outside && LIST_ITEM_RX.is_match(lines[i]);
    let blank_at = |i: usize| events[i] == FenceEvent::Outside && is_blank(lines[i]);

    let mut out: Vec<&str> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let line_num = i as u32 + 1;

        if blank_at(i) && out.last().is_some_and(|prev| is_blank(prev)) {
            push_change(changes, "no-multiple-blanks", line_num);
            continue;
        }

        let starts_block = events[i] == FenceEvent::Opened
            || heading_at(i)
            || (list_at(i) && !(i > 0 && list_at(i - 1)));

        let after_frontmatter = fm_close.is_some_and(|close| i == close + 1);
        if starts_block
            && !out.is_empty()
            && !out.last().is_some_and(|prev| is_blank(prev))
            && !after_frontmatter
        {
            let rule = if events[i] == FenceEvent::Opened {
                "blanks-around-fences"
            } else if heading_at(i) {
                "blanks-around-headings"
            } else {
                "blanks-around-lists"
            };
            out.push("");
            push_change(changes, rule, line_num);
        }

        out.push(line);

        let ends_block = events[i] == FenceEvent::Closed
            || heading_at(i)
            || (list_at(i) && !(i + 1 < lines.len() && list_at(i + 1)));
        if ends_block && i + 1 < lines.len() && !blank_at(i + 1) && events[i + 1] == FenceEvent::Outside
        {
            let rule = if events[i] == FenceEvent::Closed {
                "blanks-around-fences"
            } else if heading_at(i) {
                "blanks-around-headings"
            } else {
                "blanks-around-lists"
            };
            out.push("");
            push_change(changes, rule, line_num);
        }
    }

    let joined = out.join("\n");
    let normalized = format!("{}\n", joined.trim_end_matches('\n'));
    if normalized != joined {
        push_change(changes, "single-trailing-newline", out.len() as u32);
    }
    normalized
}

/// Upgrades `http://` links to `https://` outside code regions.
///
/// URLs whose upgrade could change runtime behavior are reported in
/// `ambiguous` instead of being rewritten.
pub fn auto_fix_insecure_links(content: &str) -> LinkFixOutcome {
    let mut changes = Vec::new();
    let mut ambiguous = Vec::new();
    let mut tracker = FenceTracker::new();

    let fixed_lines: Vec<String> = content
        .split('\n')
        .map(|line| {
            if tracker.observe(line).in_code() {
                line.to_string()
            } else {
                fix_insecure_line(line, &mut changes, &mut ambiguous)
            }
        })
        .collect();

    let fixed = fixed_lines.join("\n");
    LinkFixOutcome {
        modified: fixed != content,
        content: fixed,
        changes,
        ambiguous,
    }
}

fn fix_insecure_line(
    line: &str,
    changes: &mut Vec<LinkChange>,
    ambiguous: &mut Vec<String>,
) -> String {
    let spans = inline_code_spans(line);
    let mut out = String::new();
    let mut last = 0usize;

    for m in HTTP_TOKEN_RX.find_iter(line) {
        if spans.iter().any(|s| s.contains(&m.start())) {
            continue;
        }
        let raw = m.as_str();
        let cleaned = clean_url(raw);
        if is_ambiguous_http_url(cleaned) {
            ambiguous.push(cleaned.to_string());
            continue;
        }

        let replaced = raw.replacen("http://", "https://", 1);
        changes.push(LinkChange {
            from: raw.to_string(),
            to: replaced.clone(),
        });
        out.push_str(&line[last..m.start()]);
        out.push_str(&replaced);
        last = m.end();
    }

    if last == 0 {
        return line.to_string();
    }
    out.push_str(&line[last..]);
    out
}

/// True when upgrading the URL to https could change behavior: localhost and
/// loopback hosts, explicit non-default ports, or anything that does not
/// parse as an authority.
fn is_ambiguous_http_url(url: &str) -> bool {
    let Some(rest) = url.strip_prefix("http://") else {
        return true;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    if authority.is_empty() {
        return true;
    }

    let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
        match bracketed.find(']') {
            Some(end) => {
                let host = bracketed[..end].to_string();
                let port = bracketed[end + 1..].strip_prefix(':').map(str::to_string);
                (host, port)
            }
            None => return true,
        }
    } else if let Some((h, p)) = authority.rsplit_once(':') {
        // Raw IPv6 (or a second colon) is not a parseable host:port split.
        if h.contains(':') || p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
        (h.to_string(), Some(p.to_string()))
    } else {
        (authority.to_string(), None)
    };

    if port.is_some_and(|p| p != "80") {
        return true;
    }

    matches!(
        host.to_ascii_lowercase().as_str(),
        "localhost" | "127.0.0.1" | "::1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rules_applied(changes: &[FormatChange]) -> Vec<&str> {
        changes.iter().map(|c| c.rule.as_str()).collect()
    }

    #[test]
    fn trims_trailing_whitespace() {
        let outcome = auto_fix_formatting("# T\n\ntext  \n");
        assert_eq!(outcome.content, "# T\n\ntext\n");
        assert!(outcome.modified);
        assert!(rules_applied(&outcome.changes).contains(&"no-trailing-spaces"));
    }

    #[test]
    fn repairs_heading_shape() {
        let outcome = auto_fix_formatting("# T\n\n  ##Setup:\n\nbody\n");
        assert_eq!(outcome.content, "# T\n\n## Setup\n\nbody\n");
        let rules = rules_applied(&outcome.changes);
        assert!(rules.contains(&"no-missing-space-atx"));
        assert!(rules.contains(&"heading-start-left"));
        assert!(rules.contains(&"no-trailing-punctuation-heading"));
    }

    #[test]
    fn rewrites_reversed_links() {
        let outcome = auto_fix_formatting("# T\n\n(docs)[https://a.test]\n");
        assert_eq!(outcome.content, "# T\n\n[docs](https://a.test)\n");
    }

    #[test]
    fn collapses_spaces_in_emphasis_and_links() {
        let outcome = auto_fix_formatting("# T\n\n** bold ** and [ x ]( https://a.test )\n");
        assert_eq!(outcome.content, "# T\n\n**bold** and [x](https://a.test)\n");
        let rules = rules_applied(&outcome.changes);
        assert!(rules.contains(&"no-space-in-emphasis"));
        assert!(rules.contains(&"no-space-in-links"));
    }

    #[test]
    fn keeps_list_bullets_intact() {
        let outcome = auto_fix_formatting("# T\n\n- item *one*\n- item two\n");
        assert_eq!(outcome.content, "# T\n\n- item *one*\n- item two\n");
        assert!(!outcome.modified);
    }

    #[test]
    fn wraps_bare_urls_outside_code_and_links() {
        let outcome =
            auto_fix_formatting("# T\n\nsee https://a.test, or `https://code.test` or [x](https://b.test)\n");
        assert_eq!(
            outcome.content,
            "# T\n\nsee <https://a.test>, or `https://code.test` or [x](https://b.test)\n"
        );
    }

    #[test]
    fn inserts_blanks_around_headings_and_drops_blank_runs() {
        let outcome = auto_fix_formatting("# T\ntext\n\n\nmore\n## Next\nbody\n");
        assert_eq!(outcome.content, "# T\n\ntext\n\nmore\n\n## Next\n\nbody\n");
    }

    #[test]
    fn inserts_blanks_around_lists_and_fences() {
        let outcome = auto_fix_formatting("# T\n\nintro\n- a\n- b\noutro\n```rust\ncode\n```\ntail\n");
        assert_eq!(
            outcome.content,
            "# T\n\nintro\n\n- a\n- b\n\noutro\n\n```rust\ncode\n```\n\ntail\n"
        );
    }

    #[test]
    fn heading_after_frontmatter_close_needs_no_blank() {
        let outcome = auto_fix_formatting("---\ntitle: T\n---\n# Title\n\nbody\n");
        assert_eq!(outcome.content, "---\ntitle: T\n---\n# Title\n\nbody\n");
        assert!(!outcome.modified);
    }

    #[test]
    fn normalizes_trailing_newline() {
        let outcome = auto_fix_formatting("# T\n\ntext");
        assert_eq!(outcome.content, "# T\n\ntext\n");
        assert!(rules_applied(&outcome.changes).contains(&"single-trailing-newline"));
    }

    #[test]
    fn fenced_code_is_never_touched() {
        let content = "# T\n\n```text\ntrailing  \n##NotAHeading\nhttp://example.com\n```\n";
        let outcome = auto_fix_formatting(content);
        assert_eq!(outcome.content, content);
        assert!(!outcome.modified);
    }

    #[test]
    fn formatting_fix_is_idempotent() {
        let messy = "  ## Title:\ntext  \n\n\n- a\n- b\nhttp://x.test/page and more\n# Other\n";
        let once = auto_fix_formatting(messy);
        let twice = auto_fix_formatting(&once.content);
        assert_eq!(once.content, twice.content);
        assert!(!twice.modified);
    }

    #[test]
    fn empty_content_is_left_alone() {
        let outcome = auto_fix_formatting("");
        assert_eq!(outcome.content, "");
        assert!(!outcome.modified);
        assert!(outcome.changes.is_empty());
    }

    #[test]
    fn upgrades_plain_http_links() {
        let outcome = auto_fix_insecure_links("Visit http://example.com for docs.\n");
        assert_eq!(outcome.content, "Visit https://example.com for docs.\n");
        assert!(outcome.modified);
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].from, "http://example.com");
        assert_eq!(outcome.changes[0].to, "https://example.com");
        assert!(outcome.ambiguous.is_empty());
    }

    #[test]
    fn skips_ambiguous_local_urls() {
        let outcome =
            auto_fix_insecure_links("Visit http://localhost:3000/x and http://example.com");
        assert_eq!(outcome.content, "Visit http://localhost:3000/x and https://example.com");
        assert_eq!(outcome.ambiguous, vec!["http://localhost:3000/x".to_string()]);
        assert_eq!(outcome.changes.len(), 1);
    }

    #[test]
    fn link_upgrade_skips_code_regions() {
        let content = "```\nhttp://in-fence.test\n```\nUse `http://in-span.test` here\n";
        let outcome = auto_fix_insecure_links(content);
        assert_eq!(outcome.content, content);
        assert!(!outcome.modified);
    }

    #[test]
    fn trailing_punctuation_stays_outside_the_upgrade() {
        let outcome = auto_fix_insecure_links("See http://example.com/page.\n");
        assert_eq!(outcome.content, "See https://example.com/page.\n");
        assert_eq!(outcome.changes[0].from, "http://example.com/page.");
    }

    #[test]
    fn ambiguity_rules() {
        assert!(is_ambiguous_http_url("http://localhost"));
        assert!(is_ambiguous_http_url("http://127.0.0.1/health"));
        assert!(is_ambiguous_http_url("http://[::1]:8080"));
        assert!(is_ambiguous_http_url("http://::1"));
        assert!(is_ambiguous_http_url("http://example.com:8080"));
        assert!(is_ambiguous_http_url("http://"));
        // Explicit default port is not ambiguous.
        assert!(!is_ambiguous_http_url("http://example.com:80"));
        assert!(!is_ambiguous_http_url("http://example.com/path"));
    }
}

//! The rule evaluator.
//!
//! Runs the full ordered set of structural, content and style checks over a
//! single document. Rules are best-effort heuristic matches over raw lines
//! and the fence-stripped view; malformed Markdown degrades to "no finding",
//! never to an error.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::normalize_finding;
use crate::custom::CustomRule;
use crate::fence::{strip_fenced_blocks, strip_inline_code};
use crate::finding::{CheckReport, Finding, Severity};
use crate::suppress::{FileDirective, build_suppression_map, file_directive};

/// Options for a single `check_markdown` run.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Maximum line length for the `line-length` rule.
    pub max_line_length: usize,
    /// Source file identifier attached to findings.
    pub file_path: Option<String>,
    /// Opt-in: require a YAML frontmatter block.
    pub check_frontmatter: bool,
    /// Opt-in: flag inline HTML tags.
    pub check_inline_html: bool,
    /// User-supplied pattern rules, pre-compiled by the loader.
    pub custom_rules: Vec<CustomRule>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            max_line_length: 160,
            file_path: None,
            check_frontmatter: false,
            check_inline_html: false,
            custom_rules: Vec::new(),
        }
    }
}

static H1_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#\s").unwrap());
static HEADING_LEVEL_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s").unwrap());
static HEADING_TEXT_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap());
static TRAILING_WS_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+$").unwrap());
static ATX_NO_SPACE_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}[^#\s]").unwrap());
static HEADING_INDENT_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \t]+#{1,6}\s").unwrap());
static HEADING_PUNCT_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s+.*?([.,:;!])\s*$").unwrap());
static FENCE_LINE_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(`{3,}|~{3,})").unwrap());
static FENCE_NO_LANG_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(`{3,}|~{3,})\s*$").unwrap());

static INLINE_INSECURE_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\(http://[^)]+\)").unwrap());
static INSECURE_URL_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((http://[^)]+)\)").unwrap());
static REF_DEF_INSECURE_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[^\]]*\]:\s*(http://\S+)").unwrap());
static BARE_INSECURE_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bhttp://\S+").unwrap());

static EMPTY_TEXT_LINK_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\]\([^)]+\)").unwrap());
static EMPTY_URL_LINK_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]+\]\(\s*\)").unwrap());
static IMG_NO_ALT_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[\]\([^)]+\)").unwrap());

static REF_DEF_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[[^\]]+\]:\s*(\S+)").unwrap());
static BARE_URL_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bhttps?://[^\s<>]+").unwrap());
static REVERSED_LINK_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]+)\)\[([^\]]+)\]").unwrap());
static STRONG_SPACE_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\s[^*]*\*\*|\*\*[^*]*\s\*\*").unwrap());
static STRONG_SPAN_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*[^*]*\*\*").unwrap());
static EM_SPACE_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\s[^*]*\*|\*[^*]*\s\*").unwrap());
static LINK_SPACE_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[\s+[^\]]*\]\([^)]*\)|\[[^\]]*\s\]\([^)]*\)|\[[^\]]+\]\(\s+[^)]*\)|\[[^\]]+\]\([^)]*\s\)",
    )
    .unwrap()
});
static HTML_TAG_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(\s[^>]*)?/?>").unwrap());
static INLINE_LINK_URL_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\(\s*([^)\s]+)").unwrap());
static LIST_MARKER_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*([-*+])\s+").unwrap());
static LIST_ITEM_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([-*+]|\d+[.)])\s+").unwrap());
static LINK_TITLE_QUOTE_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\]\([^)\s]+\s+(["'])"#).unwrap());

static PLACEHOLDER_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)\bTODO\b").unwrap(),
            "TODO marker found — remove before publishing",
        ),
        (
            Regex::new(r"(?i)\bFIXME\b").unwrap(),
            "FIXME marker found — remove before publishing",
        ),
        (
            Regex::new(r"(?i)\bHACK\b").unwrap(),
            "HACK marker found — remove before publishing",
        ),
        (
            Regex::new(r"(?i)\bTBD\b").unwrap(),
            "TBD (to be determined) marker found",
        ),
        (
            Regex::new(r"(?i)\bWIP\b").unwrap(),
            "WIP (work in progress) marker found",
        ),
        (
            Regex::new(r"(?i)\bCHANGEME\b").unwrap(),
            "CHANGEME marker found — update before publishing",
        ),
        (
            Regex::new(r"(?i)\bPLACEHOLDER\b").unwrap(),
            "PLACEHOLDER marker found — replace with actual content",
        ),
        (
            Regex::new(r"(?i)\[insert\s+here\]").unwrap(),
            "\"[insert here]\" placeholder found",
        ),
        (
            Regex::new(r"(?i)lorem ipsum").unwrap(),
            "Lorem ipsum placeholder text found",
        ),
        (
            Regex::new(r"(?i)\bxxx\b").unwrap(),
            "\"xxx\" placeholder found",
        ),
    ]
});

/// Findings accumulator, bucketed by severity.
struct Sink<'a> {
    errors: Vec<Finding>,
    warnings: Vec<Finding>,
    source: Option<&'a str>,
}

impl<'a> Sink<'a> {
    fn new(source: Option<&'a str>) -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            source,
        }
    }

    fn emit(&mut self, rule: &str, message: impl Into<String>, line: Option<u32>) {
        self.emit_with(rule, message, line, None);
    }

    fn emit_with(
        &mut self,
        rule: &str,
        message: impl Into<String>,
        line: Option<u32>,
        severity: Option<Severity>,
    ) {
        let finding = normalize_finding(rule, message, line, self.source, severity);
        match finding.severity {
            Severity::Error => self.errors.push(finding),
            Severity::Warning => self.warnings.push(finding),
        }
    }
}

/// Checks a Markdown document and returns bucketed findings.
pub fn check_markdown(content: &str, options: &CheckOptions) -> CheckReport {
    let stripped = strip_fenced_blocks(content);

    // Whole-file suppression short-circuits before any rule runs.
    let file_dir = file_directive(&stripped);
    if matches!(file_dir, Some(FileDirective::DisableAll)) {
        return CheckReport::empty();
    }

    let lines: Vec<&str> = stripped.split('\n').collect();
    let raw_lines: Vec<&str> = content.split('\n').collect();
    let clean_lines: Vec<String> = lines.iter().map(|l| strip_inline_code(l)).collect();
    let fm_close = frontmatter_close_index(&raw_lines);

    let suppressions = build_suppression_map(&lines);
    let mut sink = Sink::new(options.file_path.as_deref());

    check_frontmatter(content, options, &mut sink);
    check_single_h1(&lines, &mut sink);
    check_heading_hierarchy(&lines, &mut sink);
    check_duplicate_headings(&lines, &mut sink);
    check_line_length(&raw_lines, options.max_line_length, &mut sink);
    check_pattern_rules(&clean_lines, &options.custom_rules, &mut sink);
    check_insecure_links(&clean_lines, &mut sink);
    check_empty_links(&clean_lines, &mut sink);
    check_img_alt(&clean_lines, &mut sink);
    check_line_hygiene(content, &raw_lines, &mut sink);
    check_heading_style(&lines, &mut sink);
    check_blanks_around_headings(&lines, fm_close, &mut sink);
    check_blanks_around_lists(&lines, fm_close, &mut sink);
    check_fences(&raw_lines, fm_close, &mut sink);
    check_bare_urls(&clean_lines, &mut sink);
    check_reversed_links(&lines, &mut sink);
    check_emphasis_and_link_spaces(&lines, &mut sink);
    if options.check_inline_html {
        check_inline_html(&clean_lines, &mut sink);
    }
    check_empty_sections(&raw_lines, &mut sink);
    check_duplicate_links(&clean_lines, &mut sink);
    check_list_marker_consistency(&raw_lines, &mut sink);
    check_link_title_style(&lines, &mut sink);

    let file_rules = match file_dir {
        Some(FileDirective::DisableRules(rules)) => rules,
        _ => HashSet::new(),
    };
    let keep = |f: &Finding| !suppressions.suppresses(f) && !file_rules.contains(&f.code);

    let mut errors = sink.errors;
    let mut warnings = sink.warnings;
    errors.retain(keep);
    warnings.retain(keep);

    CheckReport::new(errors, warnings)
}

/// Index of the `---` line closing a leading frontmatter block, if any.
pub(crate) fn frontmatter_close_index(raw_lines: &[&str]) -> Option<usize> {
    if raw_lines.first() != Some(&"---") {
        return None;
    }
    raw_lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim_end() == "---")
        .map(|(idx, _)| idx)
}

pub(crate) fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Strips a trailing punctuation run from a URL token captured with `\S+`.
pub(crate) fn clean_url(url: &str) -> &str {
    url.trim_end_matches([')', ',', '.', ';', '!', '?'])
}

fn check_frontmatter(content: &str, options: &CheckOptions, sink: &mut Sink) {
    if options.check_frontmatter && !content.starts_with("---\n") {
        sink.emit(
            "frontmatter",
            "Missing frontmatter block at the beginning of the file.",
            Some(1),
        );
    }
}

fn check_single_h1(lines: &[&str], sink: &mut Sink) {
    let h1_lines: Vec<u32> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| H1_RX.is_match(line))
        .map(|(idx, _)| idx as u32 + 1)
        .collect();

    match h1_lines.len() {
        0 => sink.emit("single-h1", "Missing H1 heading.", Some(1)),
        1 => {}
        n => {
            let list = h1_lines
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            sink.emit(
                "single-h1",
                format!("Found {} H1 headings (expected 1) at lines {}.", n, list),
                Some(h1_lines[0]),
            );
        }
    }
}

fn check_heading_hierarchy(lines: &[&str], sink: &mut Sink) {
    let mut prev_level = 0usize;
    for (idx, line) in lines.iter().enumerate() {
        let Some(caps) = HEADING_LEVEL_RX.captures(line) else {
            continue;
        };
        let level = caps[1].len();
        if prev_level > 0 && level > prev_level + 1 {
            sink.emit(
                "heading-hierarchy",
                format!(
                    "Heading level skipped: H{} → H{} (expected H{}).",
                    prev_level,
                    level,
                    prev_level + 1
                ),
                Some(idx as u32 + 1),
            );
        }
        prev_level = level;
    }
}

fn check_duplicate_headings(lines: &[&str], sink: &mut Sink) {
    let mut seen: HashMap<String, u32> = HashMap::new();
    // Indices 1-6 hold the normalized text of the nearest heading at that
    // depth; setting depth d clears everything deeper.
    let mut parent_chain: [String; 7] = Default::default();

    for (idx, line) in lines.iter().enumerate() {
        let Some(caps) = HEADING_TEXT_RX.captures(line) else {
            continue;
        };
        let level = caps[1].len();
        let display_text = caps[2].trim();
        let text = display_text.to_lowercase();

        parent_chain[level] = text.clone();
        for slot in parent_chain.iter_mut().skip(level + 1) {
            slot.clear();
        }

        // H1-H2 are globally unique; deeper headings only conflict within
        // the same parent-chain scope.
        let key = if level <= 2 {
            format!("{}:{}", level, text)
        } else {
            let scope = parent_chain[1..level].join("|");
            format!("{}|{}:{}", scope, level, text)
        };

        let line_num = idx as u32 + 1;
        if let Some(first) = seen.get(&key) {
            sink.emit(
                "duplicate-heading",
                format!("Duplicate heading \"{}\" (also at line {}).", display_text, first),
                Some(line_num),
            );
        } else {
            seen.insert(key, line_num);
        }
    }
}

fn check_line_length(raw_lines: &[&str], max_line_length: usize, sink: &mut Sink) {
    for (idx, line) in raw_lines.iter().enumerate() {
        let length = line.chars().count();
        if length > max_line_length {
            sink.emit(
                "line-length",
                format!("Line exceeds {} characters ({}).", max_line_length, length),
                Some(idx as u32 + 1),
            );
        }
    }
}

/// Built-in placeholder markers and user rules share one evaluation loop over
/// the inline-code-stripped lines.
fn check_pattern_rules(clean_lines: &[String], custom_rules: &[CustomRule], sink: &mut Sink) {
    for (idx, line) in clean_lines.iter().enumerate() {
        let line_num = idx as u32 + 1;

        for (pattern, message) in PLACEHOLDER_PATTERNS.iter() {
            for _ in pattern.find_iter(line) {
                sink.emit("placeholder", *message, Some(line_num));
            }
        }

        for rule in custom_rules {
            if rule.pattern.is_match(line) {
                sink.emit_with(&rule.id, rule.message.clone(), Some(line_num), Some(rule.severity));
            }
        }
    }
}

fn check_insecure_links(clean_lines: &[String], sink: &mut Sink) {
    for (idx, line) in clean_lines.iter().enumerate() {
        let line_num = idx as u32 + 1;

        // Inline links first; their presence disables bare-URL scanning for
        // the line so the same URL is not counted twice.
        let mut found_inline = false;
        for m in INLINE_INSECURE_RX.find_iter(line) {
            found_inline = true;
            let url = INSECURE_URL_RX
                .captures(m.as_str())
                .map(|caps| caps[1].to_string())
                .unwrap_or_default();
            sink.emit(
                "insecure-link",
                format!("Insecure link found: {} — use https:// instead", url),
                Some(line_num),
            );
        }

        let ref_caps = REF_DEF_INSECURE_RX.captures(line);
        if let Some(caps) = &ref_caps {
            sink.emit(
                "insecure-link",
                format!("Insecure link found: {} — use https:// instead", &caps[1]),
                Some(line_num),
            );
        }

        if !found_inline && ref_caps.is_none() {
            for m in BARE_INSECURE_RX.find_iter(line) {
                sink.emit(
                    "insecure-link",
                    format!("Insecure link found: {} — use https:// instead", m.as_str()),
                    Some(line_num),
                );
            }
        }
    }
}

/// True if the match at `start` is image syntax (`![`). Stands in for the
/// lookbehind the source regexes used.
fn preceded_by_bang(line: &str, start: usize) -> bool {
    start > 0 && line.as_bytes()[start - 1] == b'!'
}

fn check_empty_links(clean_lines: &[String], sink: &mut Sink) {
    for (idx, line) in clean_lines.iter().enumerate() {
        let line_num = idx as u32 + 1;

        if EMPTY_TEXT_LINK_RX
            .find_iter(line)
            .any(|m| !preceded_by_bang(line, m.start()))
        {
            sink.emit("empty-link", "Link has empty text: [](url).", Some(line_num));
        }

        if EMPTY_URL_LINK_RX
            .find_iter(line)
            .any(|m| !preceded_by_bang(line, m.start()))
        {
            sink.emit("empty-link", "Link has empty URL: [text]().", Some(line_num));
        }
    }
}

fn check_img_alt(clean_lines: &[String], sink: &mut Sink) {
    for (idx, line) in clean_lines.iter().enumerate() {
        if IMG_NO_ALT_RX.is_match(line) {
            sink.emit(
                "img-alt",
                "Image missing alt text: ![](url).",
                Some(idx as u32 + 1),
            );
        }
    }
}

/// Whole-line hygiene on the raw view: trailing whitespace, blank runs and
/// the trailing-newline contract.
fn check_line_hygiene(content: &str, raw_lines: &[&str], sink: &mut Sink) {
    let mut prev_blank = false;
    for (idx, line) in raw_lines.iter().enumerate() {
        let line_num = idx as u32 + 1;

        if TRAILING_WS_RX.is_match(line) {
            sink.emit(
                "no-trailing-spaces",
                "Trailing whitespace found at end of line.",
                Some(line_num),
            );
        }

        let blank = is_blank(line);
        if blank && prev_blank {
            sink.emit(
                "no-multiple-blanks",
                "Multiple consecutive blank lines.",
                Some(line_num),
            );
        }
        prev_blank = blank;
    }

    if !content.is_empty() {
        let last_line = raw_lines.len() as u32;
        if !content.ends_with('\n') {
            sink.emit(
                "single-trailing-newline",
                "Missing trailing newline at end of file.",
                Some(last_line),
            );
        } else if content.ends_with("\n\n") {
            sink.emit(
                "single-trailing-newline",
                "Multiple trailing newlines at end of file.",
                Some(last_line),
            );
        }
    }
}

fn check_heading_style(lines: &[&str], sink: &mut Sink) {
    for (idx, line) in lines.iter().enumerate() {
        let line_num = idx as u32 + 1;

        if ATX_NO_SPACE_RX.is_match(line) {
            sink.emit(
                "no-missing-space-atx",
                "Missing space after # in heading.",
                Some(line_num),
            );
        }

        if HEADING_INDENT_RX.is_match(line) {
            sink.emit(
                "heading-start-left",
                "Heading has leading whitespace.",
                Some(line_num),
            );
        }

        if let Some(caps) = HEADING_PUNCT_RX.captures(line) {
            sink.emit(
                "no-trailing-punctuation-heading",
                format!("Heading ends with punctuation \"{}\".", &caps[1]),
                Some(line_num),
            );
        }
    }
}

fn check_blanks_around_headings(lines: &[&str], fm_close: Option<usize>, sink: &mut Sink) {
    for (idx, line) in lines.iter().enumerate() {
        if !HEADING_LEVEL_RX.is_match(line) {
            continue;
        }
        let line_num = idx as u32 + 1;

        let after_frontmatter = fm_close.is_some_and(|close| idx == close + 1);
        if idx > 0 && !is_blank(lines[idx - 1]) && !after_frontmatter {
            sink.emit(
                "blanks-around-headings",
                "Heading is not preceded by a blank line.",
                Some(line_num),
            );
        }
        if idx + 1 < lines.len() && !is_blank(lines[idx + 1]) {
            sink.emit(
                "blanks-around-headings",
                "Heading is not followed by a blank line.",
                Some(line_num),
            );
        }
    }
}

fn check_blanks_around_lists(lines: &[&str], fm_close: Option<usize>, sink: &mut Sink) {
    let mut idx = 0;
    while idx < lines.len() {
        if !LIST_ITEM_RX.is_match(lines[idx]) {
            idx += 1;
            continue;
        }

        // Extent of this contiguous run of list items.
        let start = idx;
        let mut end = idx;
        while end + 1 < lines.len() && LIST_ITEM_RX.is_match(lines[end + 1]) {
            end += 1;
        }

        let after_frontmatter = fm_close.is_some_and(|close| start == close + 1);
        if start > 0 && !is_blank(lines[start - 1]) && !after_frontmatter {
            sink.emit(
                "blanks-around-lists",
                "List is not preceded by a blank line.",
                Some(start as u32 + 1),
            );
        }
        if end + 1 < lines.len() && !is_blank(lines[end + 1]) {
            sink.emit(
                "blanks-around-lists",
                "List is not followed by a blank line.",
                Some(end as u32 + 1),
            );
        }

        idx = end + 1;
    }
}

/// Blank lines around fences plus the opening-fence language requirement.
///
/// Fence lines are classified by counting: an even number of fence lines
/// above means this one opens a block.
fn check_fences(raw_lines: &[&str], fm_close: Option<usize>, sink: &mut Sink) {
    let mut fence_count = 0usize;
    for (idx, line) in raw_lines.iter().enumerate() {
        if !FENCE_LINE_RX.is_match(line) {
            continue;
        }
        let line_num = idx as u32 + 1;
        let opening = fence_count % 2 == 0;
        fence_count += 1;

        if opening {
            if FENCE_NO_LANG_RX.is_match(line) {
                sink.emit(
                    "fenced-code-language",
                    "Fenced code block is missing a language.",
                    Some(line_num),
                );
            }
            let after_frontmatter = fm_close.is_some_and(|close| idx == close + 1);
            if idx > 0 && !is_blank(raw_lines[idx - 1]) && !after_frontmatter {
                sink.emit(
                    "blanks-around-fences",
                    "Fenced code block is not preceded by a blank line.",
                    Some(line_num),
                );
            }
        } else if idx + 1 < raw_lines.len() && !is_blank(raw_lines[idx + 1]) {
            sink.emit(
                "blanks-around-fences",
                "Fenced code block is not followed by a blank line.",
                Some(line_num),
            );
        }
    }
}

fn check_bare_urls(clean_lines: &[String], sink: &mut Sink) {
    for (idx, line) in clean_lines.iter().enumerate() {
        // Reference definitions are the one place a naked URL belongs.
        if REF_DEF_RX.is_match(line) {
            continue;
        }
        for m in BARE_URL_RX.find_iter(line) {
            let before = &line[..m.start()];
            if before.ends_with('<') || before.ends_with("](") || before.ends_with('[') {
                continue;
            }
            sink.emit(
                "no-bare-urls",
                format!(
                    "Bare URL found: {} — wrap it in <> or a markdown link.",
                    clean_url(m.as_str())
                ),
                Some(idx as u32 + 1),
            );
        }
    }
}

fn check_reversed_links(lines: &[&str], sink: &mut Sink) {
    for (idx, line) in lines.iter().enumerate() {
        for m in REVERSED_LINK_RX.find_iter(line) {
            sink.emit(
                "no-reversed-links",
                format!("Reversed link syntax: {} — use [text](url).", m.as_str()),
                Some(idx as u32 + 1),
            );
        }
    }
}

fn check_emphasis_and_link_spaces(lines: &[&str], sink: &mut Sink) {
    for (idx, line) in lines.iter().enumerate() {
        let line_num = idx as u32 + 1;

        let strong_hit = STRONG_SPACE_RX.is_match(line);
        // For single-star emphasis, remove the leading list marker and any
        // well-formed strong spans first; both use the same `*` character.
        let without_marker = LIST_MARKER_RX
            .find(line)
            .map(|m| &line[m.end()..])
            .unwrap_or(line);
        let without_strong = STRONG_SPAN_RX.replace_all(without_marker, "");
        if strong_hit || EM_SPACE_RX.is_match(&without_strong) {
            sink.emit(
                "no-space-in-emphasis",
                "Spaces inside emphasis markers.",
                Some(line_num),
            );
        }

        if LINK_SPACE_RX.is_match(line) {
            sink.emit(
                "no-space-in-links",
                "Spaces inside link text or URL.",
                Some(line_num),
            );
        }
    }
}

fn check_inline_html(clean_lines: &[String], sink: &mut Sink) {
    for (idx, line) in clean_lines.iter().enumerate() {
        for m in HTML_TAG_RX.find_iter(line) {
            sink.emit(
                "no-inline-html",
                format!("Inline HTML found: {}", m.as_str()),
                Some(idx as u32 + 1),
            );
        }
    }
}

fn check_empty_sections(raw_lines: &[&str], sink: &mut Sink) {
    let headings: Vec<(usize, usize, String)> = raw_lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            HEADING_TEXT_RX
                .captures(line)
                .map(|caps| (idx, caps[1].len(), caps[2].trim().to_string()))
        })
        .collect();

    for (pos, (idx, level, text)) in headings.iter().enumerate() {
        let Some((next_idx, next_level, _)) = headings.get(pos + 1) else {
            continue;
        };
        // A deeper subsection heading counts as content for this section.
        if next_level > level {
            continue;
        }
        let body_is_blank = raw_lines[idx + 1..*next_idx].iter().all(|l| is_blank(l));
        if body_is_blank {
            sink.emit(
                "no-empty-sections",
                format!("Section \"{}\" has no content.", text),
                Some(*idx as u32 + 1),
            );
        }
    }
}

fn check_duplicate_links(clean_lines: &[String], sink: &mut Sink) {
    let mut seen: HashMap<String, u32> = HashMap::new();

    for (idx, line) in clean_lines.iter().enumerate() {
        let line_num = idx as u32 + 1;

        let inline = INLINE_LINK_URL_RX
            .captures_iter(line)
            .map(|caps| caps[1].to_string());
        let reference = REF_DEF_RX.captures(line).map(|caps| caps[1].to_string());

        for url in inline.chain(reference) {
            // Query strings and fragments do not distinguish link targets.
            let key = url
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string();
            if key.is_empty() {
                continue;
            }
            if let Some(first) = seen.get(&key) {
                sink.emit(
                    "no-duplicate-links",
                    format!("Duplicate link URL \"{}\" (also at line {}).", key, first),
                    Some(line_num),
                );
            } else {
                seen.insert(key, line_num);
            }
        }
    }
}

/// Majority vote over bullet markers: tally first, then flag every line that
/// disagrees with the dominant marker. Ties resolve to the marker that first
/// reached the maximum count.
fn check_list_marker_consistency(raw_lines: &[&str], sink: &mut Sink) {
    let mut counts: Vec<(char, usize)> = Vec::new();
    let mut marker_lines: Vec<(u32, char)> = Vec::new();

    for (idx, line) in raw_lines.iter().enumerate() {
        let Some(caps) = LIST_MARKER_RX.captures(line) else {
            continue;
        };
        let marker = caps[1].chars().next().unwrap_or('-');
        marker_lines.push((idx as u32 + 1, marker));
        match counts.iter_mut().find(|(c, _)| *c == marker) {
            Some((_, count)) => *count += 1,
            None => counts.push((marker, 1)),
        }
    }

    let Some(&(dominant, _)) = counts
        .iter()
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
    else {
        return;
    };

    for (line_num, marker) in marker_lines {
        if marker != dominant {
            sink.emit(
                "list-marker-consistency",
                format!(
                    "List marker \"{}\" differs from dominant style \"{}\".",
                    marker, dominant
                ),
                Some(line_num),
            );
        }
    }
}

/// Same majority-vote shape as list markers, applied to the quote character
/// in link titles.
fn check_link_title_style(lines: &[&str], sink: &mut Sink) {
    let mut counts: Vec<(char, usize)> = Vec::new();
    let mut quote_lines: Vec<(u32, char)> = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        for caps in LINK_TITLE_QUOTE_RX.captures_iter(line) {
            let quote = caps[1].chars().next().unwrap_or('"');
            quote_lines.push((idx as u32 + 1, quote));
            match counts.iter_mut().find(|(c, _)| *c == quote) {
                Some((_, count)) => *count += 1,
                None => counts.push((quote, 1)),
            }
        }
    }

    let Some(&(dominant, _)) = counts
        .iter()
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
    else {
        return;
    };

    for (line_num, quote) in quote_lines {
        if quote != dominant {
            sink.emit(
                "link-title-style",
                format!(
                    "Link title quote {} differs from dominant style {}.",
                    quote, dominant
                ),
                Some(line_num),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn codes(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.code.as_str()).collect()
    }

    fn warnings_for(content: &str, rule: &str) -> Vec<Finding> {
        let report = check_markdown(content, &CheckOptions::default());
        report
            .warnings
            .into_iter()
            .filter(|f| f.code == rule)
            .collect()
    }

    #[test]
    fn clean_document_passes() {
        let content = "# Title\n\nSome prose here.\n";
        let report = check_markdown(content, &CheckOptions::default());
        assert_eq!(report.summary.errors, 0);
        assert_eq!(report.summary.warnings, 0);
    }

    #[test]
    fn missing_h1_is_an_error_at_line_1() {
        let report = check_markdown("plain text\n", &CheckOptions::default());
        assert_eq!(codes(&report.errors), vec!["single-h1"]);
        assert_eq!(report.errors[0].line, Some(1));
        assert_eq!(report.errors[0].message, "Missing H1 heading.");
    }

    #[test]
    fn multiple_h1s_aggregate_into_one_error() {
        let content = "---\ntitle: T\n---\n# First\nContent\n# Second\nMore\n# Third";
        let report = check_markdown(content, &CheckOptions::default());
        let h1_errors: Vec<_> = report
            .errors
            .iter()
            .filter(|f| f.code == "single-h1")
            .collect();
        assert_eq!(h1_errors.len(), 1);
        assert_eq!(h1_errors[0].line, Some(4));
        assert_eq!(
            h1_errors[0].message,
            "Found 3 H1 headings (expected 1) at lines 4, 6, 8."
        );
    }

    #[test]
    fn heading_hierarchy_flags_skips_only() {
        let content = "# A\n\n### Deep\n\n## Back up\n\n### Fine\n";
        let hits = warnings_for(content, "heading-hierarchy");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(3));
    }

    #[test]
    fn duplicate_headings_are_scoped_by_parent() {
        // Same H3 text under two different H2 parents is fine.
        let content = "# Doc\n\n## Install\n\n### Steps\n\n## Upgrade\n\n### Steps\n";
        assert!(warnings_for(content, "duplicate-heading").is_empty());

        // Under the same H2 parent it conflicts.
        let content = "# Doc\n\n## Install\n\n### Steps\n\nBody\n\n### Steps\n";
        let hits = warnings_for(content, "duplicate-heading");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(9));
        assert!(hits[0].message.contains("also at line 5"));
    }

    #[test]
    fn duplicate_h2_is_global() {
        let content = "# Doc\n\n## Usage\n\nBody\n\n## Usage\n";
        let hits = warnings_for(content, "duplicate-heading");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn duplicate_heading_normalizes_case_and_whitespace() {
        let content = "# Doc\n\n## Usage  \n\nBody\n\n## usage\n";
        assert_eq!(warnings_for(content, "duplicate-heading").len(), 1);
    }

    #[test]
    fn line_length_respects_configuration() {
        let long = "x".repeat(50);
        let content = format!("# T\n\n{}\n", long);
        let options = CheckOptions {
            max_line_length: 40,
            ..Default::default()
        };
        let report = check_markdown(&content, &options);
        let hits: Vec<_> = report
            .warnings
            .iter()
            .filter(|f| f.code == "line-length")
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(3));
        assert_eq!(hits[0].message, "Line exceeds 40 characters (50).");
    }

    #[test]
    fn placeholders_fire_per_occurrence() {
        let content = "# T\n\nTODO first and TODO second, also FIXME.\n";
        let hits = warnings_for(content, "placeholder");
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn placeholder_in_inline_code_is_ignored() {
        let content = "# T\n\nUse `TODO` as the literal marker name.\n";
        assert!(warnings_for(content, "placeholder").is_empty());
    }

    #[test]
    fn placeholder_inside_fence_is_ignored() {
        let content = "# T\n```\nTODO inside\n```\nTODO outside";
        let hits = warnings_for(content, "placeholder");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(5));
    }

    #[test]
    fn insecure_inline_link_wins_over_bare_scan() {
        let content = "# T\n\nSee [docs](http://example.com/a) and more.\n";
        let hits = warnings_for(content, "insecure-link");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].message.contains("http://example.com/a"));
    }

    #[test]
    fn insecure_reference_definition_is_flagged() {
        let content = "# T\n\n[ref]: http://example.com/page\n";
        let hits = warnings_for(content, "insecure-link");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].message.contains("http://example.com/page"));
    }

    #[test]
    fn insecure_bare_urls_each_get_a_finding() {
        let content = "# T\n\nhttp://one.test and http://two.test\n";
        let hits = warnings_for(content, "insecure-link");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn empty_link_text_and_url_are_distinct_findings() {
        let content = "# T\n\n[](https://a.test) and [click]()\n";
        let hits = warnings_for(content, "empty-link");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn image_syntax_is_not_an_empty_link() {
        let content = "# T\n\n![](https://img.test/x.png)\n";
        assert!(warnings_for(content, "empty-link").is_empty());
        assert_eq!(warnings_for(content, "img-alt").len(), 1);
    }

    #[test]
    fn trailing_whitespace_and_blank_runs() {
        let content = "# T\n\ntext  \n\n\n\nmore\n";
        assert_eq!(warnings_for(content, "no-trailing-spaces").len(), 1);
        // First blank is allowed; the 2nd and 3rd in the run are flagged.
        assert_eq!(warnings_for(content, "no-multiple-blanks").len(), 2);
    }

    #[test]
    fn trailing_newline_contract() {
        assert_eq!(
            warnings_for("# T\n\ntext", "single-trailing-newline")[0].message,
            "Missing trailing newline at end of file."
        );
        assert_eq!(
            warnings_for("# T\n\ntext\n\n", "single-trailing-newline")[0].message,
            "Multiple trailing newlines at end of file."
        );
        assert!(warnings_for("# T\n\ntext\n", "single-trailing-newline").is_empty());
    }

    #[test]
    fn empty_content_skips_trailing_newline_rule() {
        assert!(warnings_for("", "single-trailing-newline").is_empty());
    }

    #[test]
    fn heading_style_rules() {
        let content = "# T\n\n##Tight\n\n  ## Indented\n\n## Trailing:\n";
        assert_eq!(warnings_for(content, "no-missing-space-atx").len(), 1);
        assert_eq!(warnings_for(content, "heading-start-left").len(), 1);
        let punct = warnings_for(content, "no-trailing-punctuation-heading");
        assert_eq!(punct.len(), 1);
        assert!(punct[0].message.contains(':'));
    }

    #[test]
    fn blanks_around_headings() {
        let content = "# T\n\nintro\n## Tight\nbody\n";
        let hits = warnings_for(content, "blanks-around-headings");
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|f| f.line == Some(4)));
    }

    #[test]
    fn heading_after_frontmatter_close_is_exempt() {
        let content = "---\ntitle: T\n---\n# Title\n\nbody\n";
        assert!(warnings_for(content, "blanks-around-headings").is_empty());
    }

    #[test]
    fn blanks_around_lists_flags_run_boundaries() {
        let content = "# T\n\nintro\n- one\n- two\noutro\n";
        let hits = warnings_for(content, "blanks-around-lists");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].line, Some(4));
        assert_eq!(hits[1].line, Some(5));
    }

    #[test]
    fn fence_rules_use_even_count_classification() {
        let content = "# T\nx\n```\ncode\n```\ny\n";
        let blanks = warnings_for(content, "blanks-around-fences");
        assert_eq!(blanks.len(), 2);
        assert_eq!(blanks[0].line, Some(3));
        assert_eq!(blanks[1].line, Some(5));
        let lang = warnings_for(content, "fenced-code-language");
        assert_eq!(lang.len(), 1);
        assert_eq!(lang[0].line, Some(3));
    }

    #[test]
    fn fence_with_language_is_not_flagged_for_language() {
        let content = "# T\n\n```rust\ncode\n```\n";
        assert!(warnings_for(content, "fenced-code-language").is_empty());
    }

    #[test]
    fn bare_urls_are_flagged_outside_link_syntax() {
        let content = "# T\n\nVisit https://a.test now\n\n<https://b.test>\n\n[x](https://c.test)\n";
        let hits = warnings_for(content, "no-bare-urls");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(3));
    }

    #[test]
    fn bare_url_in_reference_definition_is_allowed() {
        let content = "# T\n\n[ref]: https://a.test/path\n";
        assert!(warnings_for(content, "no-bare-urls").is_empty());
    }

    #[test]
    fn url_in_parentheses_is_still_bare() {
        // `(` alone is prose parenthesis, not link syntax; only `](` counts.
        let content = "# T\n\nsee (https://a.test) for details\n";
        assert_eq!(warnings_for(content, "no-bare-urls").len(), 1);
    }

    #[test]
    fn reversed_links_are_flagged() {
        let content = "# T\n\n(click here)[https://a.test]\n";
        let hits = warnings_for(content, "no-reversed-links");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn spaces_inside_emphasis_and_links() {
        let content = "# T\n\n** bold ** and [ text ](https://a.test)\n";
        assert_eq!(warnings_for(content, "no-space-in-emphasis").len(), 1);
        assert_eq!(warnings_for(content, "no-space-in-links").len(), 1);
    }

    #[test]
    fn list_bullets_do_not_trip_emphasis_check() {
        let content = "# T\n\n- item one\n- item *two*\n";
        assert!(warnings_for(content, "no-space-in-emphasis").is_empty());
    }

    #[test]
    fn inline_html_is_opt_in() {
        let content = "# T\n\nA <div class=\"x\"> here\n";
        assert!(warnings_for(content, "no-inline-html").is_empty());

        let options = CheckOptions {
            check_inline_html: true,
            ..Default::default()
        };
        let report = check_markdown(content, &options);
        let hits: Vec<_> = report
            .warnings
            .iter()
            .filter(|f| f.code == "no-inline-html")
            .collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn html_comments_and_autolinks_are_not_html_tags() {
        let content = "# T\n\n<!-- note -->\n\n<https://a.test>\n";
        let options = CheckOptions {
            check_inline_html: true,
            ..Default::default()
        };
        let report = check_markdown(content, &options);
        assert!(report.warnings.iter().all(|f| f.code != "no-inline-html"));
    }

    #[test]
    fn empty_section_before_same_depth_heading() {
        let content = "# T\n\n## Empty\n\n## Next\n\nbody\n";
        let hits = warnings_for(content, "no-empty-sections");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(3));
        assert!(hits[0].message.contains("Empty"));
    }

    #[test]
    fn deeper_subsection_counts_as_content() {
        let content = "# T\n\n## Parent\n\n### Child\n\nbody\n\n## Next\n\nmore\n";
        assert!(warnings_for(content, "no-empty-sections").is_empty());
    }

    #[test]
    fn duplicate_urls_ignore_query_and_fragment() {
        let content =
            "# T\n\n[a](https://a.test/p?x=1)\n\n[b](https://a.test/p#frag)\n";
        let hits = warnings_for(content, "no-duplicate-links");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(5));
        assert!(hits[0].message.contains("also at line 3"));
    }

    #[test]
    fn list_marker_majority_vote() {
        let content = "# T\n\n- a\n- b\n- c\n* d\n";
        let hits = warnings_for(content, "list-marker-consistency");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(6));
        assert!(hits[0].message.contains('*'));
    }

    #[test]
    fn list_marker_tie_breaks_to_first_seen_max() {
        let content = "# T\n\n* a\n- b\n* c\n- d\n";
        let hits = warnings_for(content, "list-marker-consistency");
        // `*` reaches the max first, so both `-` lines lose the vote.
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|f| f.message.contains("\"-\"")));
    }

    #[test]
    fn link_title_quote_majority_vote() {
        let content =
            "# T\n\n[a](https://a.test \"one\")\n[b](https://b.test \"two\")\n[c](https://c.test 'three')\n";
        let hits = warnings_for(content, "link-title-style");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(5));
    }

    #[test]
    fn custom_rule_severity_routes_bucket() {
        let rule = CustomRule {
            id: "no-internal".to_string(),
            severity: Severity::Error,
            pattern: Regex::new(r"internal\.corp").unwrap(),
            message: "Internal hostname".to_string(),
        };
        let options = CheckOptions {
            custom_rules: vec![rule],
            ..Default::default()
        };
        let report = check_markdown("# T\n\nhost internal.corp here\n", &options);
        let hits: Vec<_> = report
            .errors
            .iter()
            .filter(|f| f.code == "no-internal")
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(3));
    }

    #[test]
    fn custom_rule_in_code_is_ignored() {
        let rule = CustomRule {
            id: "no-internal".to_string(),
            severity: Severity::Warning,
            pattern: Regex::new(r"internal\.corp").unwrap(),
            message: "Internal hostname".to_string(),
        };
        let options = CheckOptions {
            custom_rules: vec![rule],
            ..Default::default()
        };
        let report = check_markdown("# T\n\n```\ninternal.corp\n```\n", &options);
        assert!(report.warnings.iter().all(|f| f.code != "no-internal"));
    }

    #[test]
    fn findings_carry_the_source_path() {
        let options = CheckOptions {
            file_path: Some("docs/readme.md".to_string()),
            ..Default::default()
        };
        let report = check_markdown("no heading\n", &options);
        assert_eq!(report.errors[0].source.as_deref(), Some("docs/readme.md"));
    }

    #[test]
    fn disable_file_without_rules_short_circuits() {
        let content = "no heading, TODO everywhere\n<!-- doclify-disable-file -->\n";
        let report = check_markdown(content, &CheckOptions::default());
        assert_eq!(report.summary.errors, 0);
        assert_eq!(report.summary.warnings, 0);
    }

    #[test]
    fn disable_file_with_rules_filters_by_rule_id() {
        let content = "<!-- doclify-disable-file placeholder -->\nTODO here\n";
        let report = check_markdown(content, &CheckOptions::default());
        assert!(report.warnings.iter().all(|f| f.code != "placeholder"));
        // Other rules still fire.
        assert!(report.errors.iter().any(|f| f.code == "single-h1"));
    }

    #[test]
    fn disable_file_inside_fence_is_inert() {
        let content = "# T\n\n```\n<!-- doclify-disable-file -->\n```\n\nTODO\n";
        let report = check_markdown(content, &CheckOptions::default());
        assert!(report.warnings.iter().any(|f| f.code == "placeholder"));
    }

    #[test]
    fn next_line_suppression_applies_to_findings() {
        // The directive itself mentions the rule id, which is also a marker
        // word, so filter on the TODO message like a user report would.
        let content = "# T\n\n<!-- doclify-disable-next-line placeholder -->\nTODO once\nTODO twice\n";
        let hits: Vec<Finding> = warnings_for(content, "placeholder")
            .into_iter()
            .filter(|f| f.message.contains("TODO marker"))
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(5));
    }
}

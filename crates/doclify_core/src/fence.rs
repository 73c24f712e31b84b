//! Fenced code block tracking and inline code stripping.
//!
//! Every rule and fixer pass that must ignore code goes through this module,
//! so fence semantics live in exactly one place: a fence opens with three or
//! more backticks or tildes at column 0, and closes only with the same
//! character repeated at least as many times (the CommonMark closing rule).

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static FENCE_OPEN_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(`{3,}|~{3,})").unwrap());
static FENCE_CLOSE_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(`{3,}|~{3,})\s*$").unwrap());
static INLINE_CODE_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`]+`").unwrap());

/// Classification of a line fed to [`FenceTracker::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceEvent {
    /// The line opens a fence (the delimiter line itself).
    Opened,
    /// The line closes the current fence (the delimiter line itself).
    Closed,
    /// The line is inside an open fence.
    Inside,
    /// The line is ordinary prose.
    Outside,
}

impl FenceEvent {
    /// Returns true for delimiter lines and fence interiors alike.
    pub fn in_code(self) -> bool {
        !matches!(self, FenceEvent::Outside)
    }
}

/// Line-by-line fence state machine.
#[derive(Debug, Default)]
pub struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    /// Creates a tracker in the "outside any fence" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next line and returns its classification.
    pub fn observe(&mut self, line: &str) -> FenceEvent {
        match self.open {
            None => {
                if let Some(m) = FENCE_OPEN_RX.captures(line) {
                    let marker = &m[1];
                    // as_bytes()[0] is safe: the marker is at least 3 ASCII chars.
                    self.open = Some((marker.as_bytes()[0] as char, marker.len()));
                    FenceEvent::Opened
                } else {
                    FenceEvent::Outside
                }
            }
            Some((fence_char, fence_len)) => {
                if let Some(m) = FENCE_CLOSE_RX.captures(line) {
                    let marker = &m[1];
                    if marker.as_bytes()[0] as char == fence_char && marker.len() >= fence_len {
                        self.open = None;
                        return FenceEvent::Closed;
                    }
                }
                FenceEvent::Inside
            }
        }
    }
}

/// Replaces every line inside a fenced code block (delimiters included) with
/// an empty string, leaving all other lines untouched.
///
/// Line count is preserved exactly, so findings computed against the stripped
/// view keep original line numbers. An unterminated fence strips to the end
/// of the document.
pub fn strip_fenced_blocks(content: &str) -> String {
    let mut tracker = FenceTracker::new();
    let stripped: Vec<&str> = content
        .split('\n')
        .map(|line| {
            if tracker.observe(line).in_code() {
                ""
            } else {
                line
            }
        })
        .collect();
    stripped.join("\n")
}

/// Removes backtick-delimited inline code spans from a single line.
pub fn strip_inline_code(line: &str) -> String {
    INLINE_CODE_RX.replace_all(line, "").into_owned()
}

/// Byte ranges of inline code spans within a line.
///
/// Used by the fixers to leave code spans untouched while rewriting the rest
/// of the line in place.
pub fn inline_code_spans(line: &str) -> Vec<Range<usize>> {
    INLINE_CODE_RX
        .find_iter(line)
        .map(|m| m.start()..m.end())
        .collect()
}

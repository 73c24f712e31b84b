//! # doclify_links
//!
//! Dead-link detection for Markdown documents.
//!
//! Extracts inline links, reference definitions and bare URLs from the
//! fence-stripped view (so links in code never count), verifies local
//! relative paths on disk and remote URLs over HTTP, and returns plain
//! `dead-link` findings keyed by the same line numbers the core checker
//! uses. The caller merges them into its report.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, StatusCode, Url};
use std::sync::LazyLock;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use doclify_core::{Finding, normalize_finding, strip_fenced_blocks, strip_inline_code};

const LINK_TIMEOUT: Duration = Duration::from_secs(8);
const CONCURRENCY: usize = 5;

static INLINE_LINK_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\(([^)]+)\)").unwrap());
static REF_DEF_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[[^\]]+\]:\s*(\S+)").unwrap());
static BARE_LINK_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bhttps?://\S+").unwrap());

/// Errors from the link checker itself (not from individual URLs).
#[derive(Debug, Error)]
pub enum LinkError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// How a link was written in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// `[text](url)`
    Inline,
    /// `[label]: url`
    Reference,
    /// A naked URL token.
    Bare,
}

/// A link found in a document, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// The link target, trailing punctuation removed.
    pub url: String,
    /// 1-based line number in the original content.
    pub line: u32,
    /// Syntax the link was written in.
    pub kind: LinkKind,
}

/// Options for a dead-link run.
#[derive(Debug, Clone, Default)]
pub struct LinkCheckOptions {
    /// File the content came from; local links resolve relative to its
    /// directory and findings carry it as their source.
    pub source_file: Option<PathBuf>,
    /// URL patterns to skip: a domain (suffix match on the hostname), an
    /// exact URL, or a prefix pattern ending in `*`.
    pub allow_list: Vec<String>,
}

/// Extracts all links from the fence-stripped view of the content.
pub fn extract_links(content: &str) -> Vec<ExtractedLink> {
    let stripped = strip_fenced_blocks(content);
    let mut links = Vec::new();

    for (idx, raw_line) in stripped.split('\n').enumerate() {
        let line = strip_inline_code(raw_line);
        let line_num = idx as u32 + 1;

        for caps in INLINE_LINK_RX.captures_iter(&line) {
            links.push(ExtractedLink {
                url: clean_trailing_punct(caps[1].trim()),
                line: line_num,
                kind: LinkKind::Inline,
            });
        }

        if let Some(caps) = REF_DEF_RX.captures(&line) {
            links.push(ExtractedLink {
                url: clean_trailing_punct(caps[1].trim()),
                line: line_num,
                kind: LinkKind::Reference,
            });
        }

        for m in BARE_LINK_RX.find_iter(&line) {
            links.push(ExtractedLink {
                url: clean_trailing_punct(m.as_str()),
                line: line_num,
                kind: LinkKind::Bare,
            });
        }
    }

    links
}

fn clean_trailing_punct(url: &str) -> String {
    url.trim_end_matches([')', ',', '.', ';', '!', '?']).to_string()
}

fn is_skippable(url: &str) -> bool {
    url.starts_with("mailto:") || url.starts_with("tel:") || url.starts_with('#')
}

/// Matches a URL against the allow-list patterns.
fn is_allow_listed(url: &str, allow_list: &[String]) -> bool {
    if allow_list.is_empty() {
        return false;
    }
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    for pattern in allow_list {
        // Prefix pattern: "https://docs.test/*"
        if pattern.contains('/') && pattern.ends_with('*') {
            if url.starts_with(&pattern[..pattern.len() - 1]) {
                return true;
            }
            continue;
        }
        // Full URL match.
        if pattern.contains('/') {
            if url == pattern {
                return true;
            }
            continue;
        }
        // Domain-only: suffix match on the hostname.
        if let Some(host) = parsed.host_str()
            && (host == pattern || host.ends_with(&format!(".{}", pattern)))
        {
            return true;
        }
    }
    false
}

/// Verifies a relative local link against the filesystem.
fn check_local_url(url: &str, source_file: &Path) -> Option<String> {
    let without_anchor = url.split('#').next().unwrap_or_default();
    if without_anchor.is_empty() {
        return None;
    }

    let base = source_file.parent().unwrap_or_else(|| Path::new("."));
    let target = base.join(without_anchor);
    if target.exists() {
        None
    } else {
        Some("Target not found".to_string())
    }
}

/// Checks a remote URL: HEAD first, falling back to GET when the server
/// rejects HEAD. Returns `None` when the link is alive, otherwise a short
/// failure description.
async fn check_remote_url(client: &Client, url: &str) -> Option<String> {
    let head = client.head(url).send().await;
    match head {
        Ok(response) => {
            let status = response.status();
            if status.as_u16() < 400 {
                return None;
            }
            if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED {
                return match client.get(url).send().await {
                    Ok(get_response) if get_response.status().as_u16() < 400 => None,
                    Ok(get_response) => Some(format!("HTTP {}", get_response.status().as_u16())),
                    Err(e) => Some(describe_request_error(&e)),
                };
            }
            Some(format!("HTTP {}", status.as_u16()))
        }
        Err(e) => Some(describe_request_error(&e)),
    }
}

fn describe_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("Timeout ({}s)", LINK_TIMEOUT.as_secs())
    } else {
        error.to_string()
    }
}

/// Checks every link in the content and returns `dead-link` findings.
///
/// Local links are verified synchronously; remote links are fetched with at
/// most [`CONCURRENCY`] requests in flight. Findings come back sorted by
/// line so merging into a report is deterministic.
pub async fn check_dead_links(
    content: &str,
    options: &LinkCheckOptions,
) -> Result<Vec<Finding>, LinkError> {
    let links = extract_links(content);
    let source = options.source_file.as_ref().map(|p| p.display().to_string());
    let mut findings = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut remote_checks: Vec<ExtractedLink> = Vec::new();

    for link in links {
        if link.url.is_empty() || is_skippable(&link.url) {
            continue;
        }
        // The same URL on the same line is only reported once.
        if !seen.insert(format!("{}:{}", link.line, link.url)) {
            continue;
        }

        if link.url.starts_with("http://") || link.url.starts_with("https://") {
            if is_allow_listed(&link.url, &options.allow_list) {
                debug!("Skipping allow-listed URL: {}", link.url);
                continue;
            }
            remote_checks.push(link);
            continue;
        }

        // Site-absolute paths cannot be resolved without a site root.
        if link.url.starts_with('/') {
            continue;
        }

        if let Some(source_file) = &options.source_file
            && let Some(reason) = check_local_url(&link.url, source_file)
        {
            findings.push(dead_link_finding(&link, &reason, source.as_deref()));
        }
    }

    if !remote_checks.is_empty() {
        let client = Client::builder()
            .timeout(LINK_TIMEOUT)
            .build()?;
        let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
        let mut join_set = JoinSet::new();

        for link in remote_checks {
            let client = client.clone();
            let semaphore = semaphore.clone();
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let reason = check_remote_url(&client, &link.url).await;
                (link, reason)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            if let Ok((link, Some(reason))) = joined {
                findings.push(dead_link_finding(&link, &reason, source.as_deref()));
            }
        }
    }

    findings.sort_by_key(|f| f.line);
    Ok(findings)
}

fn dead_link_finding(link: &ExtractedLink, reason: &str, source: Option<&str>) -> Finding {
    normalize_finding(
        "dead-link",
        format!("Dead link: {} ({})", link.url, reason),
        Some(link.line),
        source,
        None,
    )
}

//! # doclify_core
//!
//! Core checking engine for Doclify, a Markdown document quality gate.
//!
//! This crate provides:
//! - The rule evaluator (`check_markdown`) with the built-in rule catalog
//! - Inline suppression directives (`<!-- doclify-disable ... -->`)
//! - The two-pass auto-fix formatter and the insecure-link upgrader
//! - Configuration loading and file discovery for the CLI
//!
//! ## Example
//!
//! ```rust
//! use doclify_core::{CheckOptions, check_markdown};
//!
//! let report = check_markdown("# Title\n\nSome content.\n", &CheckOptions::default());
//! assert_eq!(report.summary.errors, 0);
//! ```

mod catalog;
mod checker;
mod config;
mod custom;
mod error;
mod fence;
pub mod file_finder;
mod finding;
mod fixer;
pub mod formatters;
mod health;
mod result;
mod runner;
mod suppress;

pub use catalog::{RULE_CATALOG, Rule, default_severity, normalize_finding};
pub use checker::{CheckOptions, check_markdown};
pub use config::DoclifyConfig;
pub use custom::{CustomRule, load_custom_rules};
pub use error::DoclifyError;
pub use fence::{FenceEvent, FenceTracker, strip_fenced_blocks, strip_inline_code};
pub use finding::{CheckReport, Finding, Severity, Summary};
pub use fixer::{
    FormatChange, FormatOutcome, LinkChange, LinkFixOutcome, auto_fix_formatting,
    auto_fix_insecure_links,
};
pub use formatters::generate_sarif;
pub use health::compute_health_score;
pub use result::FileResult;
pub use runner::{CheckFilesResult, check_files};
pub use suppress::{FileDirective, SuppressionMap, build_suppression_map, file_directive};

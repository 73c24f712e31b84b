//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Doclify - Markdown document quality gate
#[derive(Parser)]
#[command(name = "doclify")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check Markdown files
    Check(CheckArgs),

    /// Manage rules
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct CheckArgs {
    /// Files, directories or glob patterns to check
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Treat warnings as failures
    #[arg(long)]
    pub strict: bool,

    /// Apply safe auto-fixes before checking
    #[arg(long)]
    pub fix: bool,

    /// Preview fixes without writing files
    #[arg(long, requires = "fix")]
    pub dry_run: bool,

    /// Maximum line length
    #[arg(long, value_name = "N")]
    pub max_line_length: Option<usize>,

    /// Require a YAML frontmatter block
    #[arg(long)]
    pub check_frontmatter: bool,

    /// Flag inline HTML tags
    #[arg(long)]
    pub check_inline_html: bool,

    /// Verify local and remote links
    #[arg(long)]
    pub check_links: bool,

    /// Custom rules JSON file
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Rule ids to ignore (repeatable)
    #[arg(long, value_name = "RULE")]
    pub ignore: Vec<String>,

    /// URL patterns the link checker skips (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub link_allow: Vec<String>,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List built-in rules
    List,
}

/// Report format for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable console output
    Text,
    /// Machine-readable JSON
    Json,
    /// SARIF 2.1.0
    Sarif,
}

//! Quality gate configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DoclifyError;

/// Configuration for the quality gate.
///
/// Loaded from `.doclify.jsonc` / `.doclify.json`; CLI flags override
/// individual fields after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DoclifyConfig {
    /// Maximum line length for the `line-length` rule.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Treat warnings as failures.
    #[serde(default)]
    pub strict: bool,

    /// Require a YAML frontmatter block.
    #[serde(default)]
    pub check_frontmatter: bool,

    /// Flag inline HTML tags.
    #[serde(default)]
    pub check_inline_html: bool,

    /// Rule ids to drop from every report.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Glob patterns excluded from file discovery.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Path to a custom rules JSON file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<String>,

    /// URL patterns the dead-link checker skips.
    #[serde(default)]
    pub link_allow_list: Vec<String>,

    /// Directory containing the configuration file, used to resolve
    /// relative paths.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

fn default_max_line_length() -> usize {
    160
}

impl DoclifyConfig {
    /// Config file names probed by [`discover`](Self::discover), in order.
    pub const CONFIG_FILES: &'static [&'static str] = &[".doclify.jsonc", ".doclify.json"];

    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            strict: false,
            check_frontmatter: false,
            check_inline_html: false,
            ignore: Vec::new(),
            exclude: Vec::new(),
            rules_file: None,
            link_allow_list: Vec::new(),
            base_dir: None,
        }
    }

    /// Looks for a config file in the given directory.
    pub fn discover(dir: impl AsRef<Path>) -> Option<PathBuf> {
        let dir = dir.as_ref();
        Self::CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DoclifyError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| DoclifyError::config(format!("Failed to read config: {}", e)))?;

        let mut config = Self::from_json(&content)?;
        if let Some(parent) = path.parent() {
            config.base_dir = Some(parent.to_path_buf());
        }
        Ok(config)
    }

    /// Parses configuration from a JSONC string.
    pub fn from_json(json: &str) -> Result<Self, DoclifyError> {
        let value = jsonc_parser::parse_to_serde_value(json, &jsonc_parser::ParseOptions::default())
            .map_err(|e| DoclifyError::config(format!("Invalid JSON: {}", e)))?
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        let config: Self = serde_json::from_value(value)
            .map_err(|e| DoclifyError::config(format!("Invalid config: {}", e)))?;

        if config.max_line_length == 0 {
            return Err(DoclifyError::config(
                "maxLineLength must be a positive integer".to_string(),
            ));
        }
        Ok(config)
    }
}

impl Default for DoclifyConfig {
    fn default() -> Self {
        Self::new()
    }
}

//! Resolves CLI path arguments to the list of Markdown files to check.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::info;
use walkdir::WalkDir;

use crate::error::DoclifyError;

/// Resolves files, directories and glob patterns into Markdown files,
/// honoring exclude patterns.
pub struct FileFinder {
    exclude_globs: Option<GlobSet>,
}

impl FileFinder {
    /// Creates a finder with the given exclude patterns.
    pub fn new(exclude: &[String]) -> Result<Self, DoclifyError> {
        Ok(Self {
            exclude_globs: Self::build_globset(exclude)?,
        })
    }

    fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, DoclifyError> {
        if patterns.is_empty() {
            return Ok(None);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| DoclifyError::config(format!("Invalid glob pattern: {}", e)))?;
            builder.add(glob);
        }

        let globset = builder
            .build()
            .map_err(|e| DoclifyError::config(format!("Failed to build globset: {}", e)))?;
        Ok(Some(globset))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.exclude_globs
            .as_ref()
            .is_some_and(|excludes| excludes.is_match(path))
    }

    /// Expands each target into concrete file paths.
    ///
    /// Plain files are taken as-is, directories become a recursive `*.md`
    /// scan, anything else is treated as a glob matched while walking
    /// `base_dir`. Results are sorted and deduplicated.
    pub fn resolve(&self, targets: &[String], base_dir: &Path) -> Result<Vec<PathBuf>, DoclifyError> {
        let mut files = Vec::new();
        let mut glob_builder = GlobSetBuilder::new();
        let mut has_globs = false;

        for target in targets {
            let path = Path::new(target);
            if path.is_file() {
                if !self.is_excluded(path) {
                    files.push(path.to_path_buf());
                }
            } else if path.is_dir() {
                for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
                    let entry_path = entry.path();
                    if entry_path.is_file()
                        && entry_path.extension().is_some_and(|ext| ext == "md")
                        && !self.is_excluded(entry_path)
                    {
                        files.push(entry_path.to_path_buf());
                    }
                }
            } else {
                let glob = Glob::new(target).map_err(|e| {
                    DoclifyError::config(format!("Invalid pattern '{}': {}", target, e))
                })?;
                glob_builder.add(glob);
                has_globs = true;
            }
        }

        if has_globs {
            let glob_set = glob_builder
                .build()
                .map_err(|e| DoclifyError::config(format!("Failed to build globset: {}", e)))?;

            for entry in WalkDir::new(base_dir).into_iter().filter_map(|e| e.ok()) {
                let path = entry.path();
                if path.is_file() && glob_set.is_match(path) && !self.is_excluded(path) {
                    files.push(path.to_path_buf());
                }
            }
        }

        files.sort();
        files.dedup();

        info!("Discovered {} files to check", files.len());
        Ok(files)
    }
}

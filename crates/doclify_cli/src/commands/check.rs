//! Check command implementation

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};
use tracing::{info, warn};

use doclify_core::{
    CheckOptions, DoclifyConfig, check_files, file_finder::FileFinder, load_custom_rules,
};
use doclify_links::{LinkCheckOptions, check_dead_links};

use crate::cli::{CheckArgs, Cli};
use crate::fix::{apply_fixes, output_fix_summary};
use crate::output::output_results;

pub fn run_check(cli: &Cli, args: &CheckArgs) -> Result<bool> {
    let mut config = if let Some(ref path) = cli.config {
        DoclifyConfig::from_file(path).into_diagnostic()?
    } else {
        find_config()?
    };

    // CLI flags override config values.
    if let Some(max) = args.max_line_length {
        config.max_line_length = max;
    }
    if args.strict {
        config.strict = true;
    }
    if args.check_frontmatter {
        config.check_frontmatter = true;
    }
    if args.check_inline_html {
        config.check_inline_html = true;
    }
    config.ignore.extend(args.ignore.iter().cloned());
    config.link_allow_list.extend(args.link_allow.iter().cloned());

    let rules_path = args.rules.clone().or_else(|| {
        config.rules_file.as_ref().map(|file| match &config.base_dir {
            Some(base) => base.join(file),
            None => PathBuf::from(file),
        })
    });
    let custom_rules = match rules_path {
        Some(path) => load_custom_rules(&path).into_diagnostic()?,
        None => Vec::new(),
    };

    let finder = FileFinder::new(&config.exclude).into_diagnostic()?;
    let files = finder.resolve(&args.paths, Path::new(".")).into_diagnostic()?;

    if args.fix {
        let summary = apply_fixes(&files, args.dry_run)?;
        output_fix_summary(&summary, args.dry_run);
    }

    let options = CheckOptions {
        max_line_length: config.max_line_length,
        file_path: None,
        check_frontmatter: config.check_frontmatter,
        check_inline_html: config.check_inline_html,
        custom_rules,
    };
    let (mut results, failures) = check_files(&files, &options);

    if !failures.is_empty() {
        eprintln!("\n{} file(s) failed to check:", failures.len());
        for (path, error) in &failures {
            eprintln!("  {}: {}", path.display(), error);
        }
    }

    if args.check_links {
        merge_dead_link_findings(&mut results, &config)?;
    }

    let ignored: HashSet<String> = config.ignore.iter().cloned().collect();
    if !ignored.is_empty() {
        for result in &mut results {
            result.report.retain_not_ignored(&ignored);
            result.refresh_health_score();
        }
    }

    let gate_failed = output_results(&results, args.format, config.strict)?;
    Ok(gate_failed || !failures.is_empty())
}

/// Runs the dead-link checker for each file and merges its findings into
/// the per-file reports.
fn merge_dead_link_findings(
    results: &mut [doclify_core::FileResult],
    config: &DoclifyConfig,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;

    for result in results.iter_mut() {
        let content = match std::fs::read_to_string(&result.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping link check for {}: {}", result.path.display(), e);
                continue;
            }
        };

        let link_options = LinkCheckOptions {
            source_file: Some(result.path.clone()),
            allow_list: config.link_allow_list.clone(),
        };
        let findings = runtime
            .block_on(check_dead_links(&content, &link_options))
            .into_diagnostic()?;

        for finding in findings {
            result.report.push(finding);
        }
        result.refresh_health_score();
    }

    Ok(())
}

pub fn find_config() -> Result<DoclifyConfig> {
    if let Some(path) = DoclifyConfig::discover(".") {
        info!("Using config: {}", path.display());
        return DoclifyConfig::from_file(&path).into_diagnostic();
    }

    info!("No config file found, using defaults");
    Ok(DoclifyConfig::new())
}

//! Init command implementation

use std::io::Write;
use std::path::PathBuf;

use miette::{IntoDiagnostic, Result};
use tracing::info;

use doclify_core::DoclifyConfig;

const DEFAULT_CONFIG: &str = r#"{
  // Doclify quality gate configuration
  "maxLineLength": 160,
  "strict": false,
  "ignore": [],
  "exclude": []
}
"#;

/// Writes a default config file, refusing to overwrite without `force`.
pub fn run_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(DoclifyConfig::CONFIG_FILES[0]);

    if config_path.exists() {
        if !force {
            return Err(miette::miette!(
                "Config file already exists. Use --force to overwrite."
            ));
        }
        std::fs::remove_file(&config_path).into_diagnostic()?;
    }

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&config_path)
        .into_diagnostic()?;
    file.write_all(DEFAULT_CONFIG.as_bytes()).into_diagnostic()?;

    info!("Created {}", config_path.display());
    println!("Created {}", config_path.display());
    Ok(())
}

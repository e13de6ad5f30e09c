//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::Path;
use tracing::info;

/// Write a default configuration file
///
/// An existing file is only replaced with `force`.
pub fn cmd_init(config_path: &Path, force: bool) -> Result<Config> {
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    let config = Config::with_path(config_path);
    config.validate()?;
    config.save()?;
    info!("Initialized config at {}", config_path.display());
    Ok(config)
}

pub fn print_init(config: &Config) {
    println!("\n✓ Wrote {}\n", config.paths.config_file.display());
    println!("Next steps:");
    println!(
        "  1. Put job descriptions (.txt) in {}",
        config.data_dir(None).display()
    );
    println!(
        "  2. Export {} (or add it to .env)",
        config.openai.api_key_env
    );
    println!("  3. Run 'jobsift ingest', then 'jobsift ask \"...\"' or 'jobsift chat'");
}

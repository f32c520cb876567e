use std::fs;
use std::path::Path;

use anyhow::Context;
use migoration_core::config::config_template;

/// Create the migrations directory and a configuration template.
///
/// Existing files and directories are left untouched, so running it twice is safe.
pub fn run(config_path: &Path, migrations_dir: &Path) -> anyhow::Result<()> {
    if migrations_dir.is_dir() {
        println!("Migrations directory {} already exists", migrations_dir.display());
    } else {
        fs::create_dir_all(migrations_dir)
            .with_context(|| format!("Failed to create {}", migrations_dir.display()))?;
        println!("Created migrations directory {}", migrations_dir.display());
    }

    if config_path.exists() {
        println!("Configuration file {} already exists", config_path.display());
    } else {
        fs::write(config_path, config_template())
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        println!("Created configuration file {}", config_path.display());
        println!("Set DATABASE_URL or edit database_url before running migrations");
    }

    Ok(())
}

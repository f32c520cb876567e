use anyhow::Context;
use migoration_core::ProjectConfig;
use migoration_orm::{MigrationConfig, MigrationManager};

pub fn run(config: &ProjectConfig, name: &str) -> anyhow::Result<()> {
    let manager = MigrationManager::with_config(MigrationConfig::from(config));
    let created = manager
        .create_migration(name)
        .with_context(|| format!("Failed to create migration '{}'", name))?;

    println!("Created migration {} ({})", created.version, created.name);
    println!("  {}", created.up_path.display());
    println!("  {}", created.down_path.display());
    Ok(())
}

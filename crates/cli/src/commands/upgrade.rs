use anyhow::Context;
use migoration_core::ProjectConfig;
use migoration_orm::{run_upgrade, MigrationRunResult, UpgradeTarget};

pub async fn run(config: &ProjectConfig, target: UpgradeTarget) -> anyhow::Result<()> {
    let result = run_upgrade(config, target)
        .await
        .with_context(|| format!("Upgrade to {} failed", target))?;

    print!("{}", report(&result));
    Ok(())
}

/// Human readable outcome of an upgrade run
pub fn report(result: &MigrationRunResult) -> String {
    let version = result.final_version.as_deref().unwrap_or("base");
    if result.steps_applied == 0 {
        return format!("Database is up to date at version {}\n", version);
    }

    let mut out = format!(
        "Applied {} migration(s) in {}ms\n",
        result.steps_applied, result.execution_time_ms
    );
    for applied in &result.applied {
        out.push_str(&format!("  ✅ {}\n", applied));
    }
    out.push_str(&format!("Current version: {}\n", version));
    out
}

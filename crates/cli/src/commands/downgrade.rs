use anyhow::Context;
use migoration_core::ProjectConfig;
use migoration_orm::{run_downgrade, DowngradeTarget, MigrationRunResult};

pub async fn run(config: &ProjectConfig, target: DowngradeTarget) -> anyhow::Result<()> {
    let result = run_downgrade(config, target)
        .await
        .with_context(|| format!("Downgrade to {} failed", target))?;

    print!("{}", report(&result));
    Ok(())
}

/// Human readable outcome of a downgrade run
pub fn report(result: &MigrationRunResult) -> String {
    if result.steps_applied == 0 {
        return "Nothing to downgrade\n".to_string();
    }

    let mut out = format!(
        "Rolled back {} migration(s) in {}ms\n",
        result.steps_applied, result.execution_time_ms
    );
    for reverted in &result.applied {
        out.push_str(&format!("  ↩️  {}\n", reverted));
    }
    out.push_str(&format!(
        "Current version: {}\n",
        result.final_version.as_deref().unwrap_or("base")
    ));
    out
}

use anyhow::Context;
use migoration_core::ProjectConfig;
use migoration_orm::{run_status, MigrationStatus, MigrationStatusEntry};

pub async fn run(config: &ProjectConfig, json: bool) -> anyhow::Result<()> {
    let entries = run_status(config)
        .await
        .context("Failed to read migration status")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", render(&entries));
    }
    Ok(())
}

/// Plain text status table
pub fn render(entries: &[MigrationStatusEntry]) -> String {
    let mut out = String::from("Migration Status:\n================\n");

    if entries.is_empty() {
        out.push_str("No migrations found\n");
        return out;
    }

    for entry in entries {
        let line = match &entry.status {
            MigrationStatus::Current { applied_at } => format!(
                "  ✅ {} {} (current, applied {})\n",
                entry.version,
                entry.name,
                applied_at.format("%Y-%m-%d %H:%M:%S")
            ),
            MigrationStatus::Applied => format!("  ✅ {} {}\n", entry.version, entry.name),
            MigrationStatus::Pending => format!("  ⏳ {} {}\n", entry.version, entry.name),
        };
        out.push_str(&line);
    }

    let pending = entries
        .iter()
        .filter(|e| e.status == MigrationStatus::Pending)
        .count();
    out.push_str(&format!("\n{} applied, {} pending\n", entries.len() - pending, pending));
    out
}

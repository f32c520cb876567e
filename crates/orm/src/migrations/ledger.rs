//! Version ledger access
//!
//! The ledger is a single table keyed by version. The row with the highest
//! version (by `compare_versions`) is the current state; an empty table means
//! base.

use crate::backends::MigrationStore;
use crate::error::StoreResult;

use super::definitions::{compare_versions, LedgerRecord};

/// SQL text for the version table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSql {
    table: String,
}

impl LedgerSql {
    /// `table` must already be validated as a plain identifier
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into() }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// SQL to create the version table
    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                version VARCHAR(255) PRIMARY KEY,\n    \
                name VARCHAR(255) NOT NULL,\n    \
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP\n\
            );",
            self.table
        )
    }

    /// SQL to read every ledger row
    pub fn select_records_sql(&self) -> String {
        format!("SELECT version, name, applied_at FROM {}", self.table)
    }

    /// SQL to remove a version row
    pub fn delete_version_sql(&self) -> String {
        format!("DELETE FROM {} WHERE version = $1", self.table)
    }

    /// SQL to record a version row
    pub fn insert_version_sql(&self) -> String {
        format!("INSERT INTO {} (version, name) VALUES ($1, $2)", self.table)
    }
}

/// Pick the authoritative current row
pub fn current_record(records: &[LedgerRecord]) -> Option<&LedgerRecord> {
    records
        .iter()
        .max_by(|a, b| compare_versions(&a.version, &b.version))
}

/// Read the ledger and return its current row.
///
/// More than one row is tolerated but logged, since the engine keeps exactly
/// one row at steady state.
pub async fn resolve_current<S: MigrationStore>(store: &mut S) -> StoreResult<Option<LedgerRecord>> {
    let records = store.ledger_records().await?;
    let current = current_record(&records).cloned();

    if let Some(current) = &current {
        for stray in records.iter().filter(|r| r.version != current.version) {
            tracing::warn!(
                "Version table holds superseded row {} ({}); current is {}",
                stray.version,
                stray.name,
                current.version
            );
        }
    }

    Ok(current)
}

/// Current version, `None` at base
pub async fn current_version<S: MigrationStore>(store: &mut S) -> StoreResult<Option<String>> {
    Ok(resolve_current(store).await?.map(|record| record.version))
}

//! Migration System
//!
//! Catalog loading, version tracking, planning and execution of schema
//! migrations.

pub mod definitions;
pub mod ledger;
pub mod manager;
pub mod planner;
pub mod rollback;
pub mod runner;

pub use definitions::*;
pub use ledger::{current_record, current_version, resolve_current, LedgerSql};
pub use manager::{parse_migration_filename, CreatedMigration, MigrationManager};
pub use planner::{plan_downgrade, plan_upgrade};
pub use rollback::MigrationRollback;
pub use runner::{ledger_writes, LedgerWrite, MigrationExecutor, MigrationRunner};

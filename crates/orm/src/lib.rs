//! # migoration-orm: Migration engine
//!
//! Versioned schema migrations for PostgreSQL: the migration catalog read from
//! disk, a single-row version table, an upgrade/downgrade planner and an
//! executor that runs each step inside one transaction.

pub mod backends;
pub mod error;
pub mod migration_runner;
pub mod migrations;

// Re-export core traits and types
pub use backends::{MemoryStore, MigrationStore, PostgresStore, StoreTransaction};
pub use error::*;
pub use migration_runner::*;
pub use migrations::*;

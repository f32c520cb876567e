//! Core Store Traits
//!
//! The engine talks to the relational store only through these traits: one
//! session per run, and one transaction per applied step.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::migrations::definitions::LedgerRecord;

/// A single open session against the store, owned by one run
#[async_trait]
pub trait MigrationStore: Send {
    /// Create the version table if it does not exist yet
    async fn ensure_ledger(&mut self) -> StoreResult<()>;

    /// Every row currently in the version table, in no particular order
    async fn ledger_records(&mut self) -> StoreResult<Vec<LedgerRecord>>;

    /// Begin a transaction for one migration step
    async fn begin<'a>(&'a mut self) -> StoreResult<Box<dyn StoreTransaction + 'a>>;

    /// Release the session
    async fn close(self) -> StoreResult<()>
    where
        Self: Sized;

    /// Backend identifier for logging
    fn backend_name(&self) -> &'static str;
}

/// Transaction covering a statement set and its ledger writes
#[async_trait]
pub trait StoreTransaction: Send {
    /// Execute an opaque, possibly multi-statement script
    async fn execute_script(&mut self, sql: &str) -> StoreResult<()>;

    /// Remove the ledger row for `version`
    async fn delete_version(&mut self, version: &str) -> StoreResult<()>;

    /// Insert a ledger row for `version`
    async fn insert_version(&mut self, version: &str, name: &str) -> StoreResult<()>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

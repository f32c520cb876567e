//! In-memory store
//!
//! Keeps the version table in a map and records every executed script.
//! Transactions buffer their writes and apply them on commit, so a failing step
//! leaves no trace. Handles are cheap clones sharing one state, which lets a
//! caller inspect the store after a run has consumed and closed it.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::core::{MigrationStore, StoreTransaction};
use crate::error::{StoreError, StoreResult};
use crate::migrations::definitions::LedgerRecord;

#[derive(Debug, Default)]
struct MemoryState {
    ledger_created: bool,
    rows: BTreeMap<String, LedgerRecord>,
    executed: Vec<String>,
    fail_patterns: Vec<String>,
    fail_commits: bool,
    closed: bool,
}

#[derive(Debug)]
enum PendingWrite {
    Script(String),
    Delete(String),
    Insert { version: String, name: String },
}

/// Store backed by process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose version table already exists and holds `records`
    pub fn with_ledger(records: Vec<LedgerRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            state.ledger_created = true;
            state.rows = records.into_iter().map(|r| (r.version.clone(), r)).collect();
        }
        store
    }

    /// Make any script containing `pattern` fail to execute
    pub fn fail_on(self, pattern: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.fail_patterns.push(pattern.into());
        }
        self
    }

    /// Make every commit fail
    pub fn fail_commits(self) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.fail_commits = true;
        }
        self
    }

    /// Versions in the version table, ascending by key
    pub fn ledger_versions(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.rows.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Scripts that were committed, in order
    pub fn executed_scripts(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.executed.clone())
            .unwrap_or_default()
    }

    /// Open a new session over the same data after a previous one was closed
    pub fn session(&self) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.closed = false;
        }
        self.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|state| state.closed).unwrap_or(false)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

#[async_trait]
impl MigrationStore for MemoryStore {
    async fn ensure_ledger(&mut self) -> StoreResult<()> {
        let mut state = self.lock()?;
        if state.closed {
            return Err(StoreError::Connection("Connection is closed".to_string()));
        }
        state.ledger_created = true;
        Ok(())
    }

    async fn ledger_records(&mut self) -> StoreResult<Vec<LedgerRecord>> {
        let state = self.lock()?;
        if !state.ledger_created {
            return Err(StoreError::LedgerRead("Version table does not exist".to_string()));
        }
        Ok(state.rows.values().cloned().collect())
    }

    async fn begin<'a>(&'a mut self) -> StoreResult<Box<dyn StoreTransaction + 'a>> {
        if self.lock()?.closed {
            return Err(StoreError::Connection("Connection is closed".to_string()));
        }
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            pending: Vec::new(),
        }))
    }

    async fn close(self) -> StoreResult<()> {
        self.lock()?.closed = true;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Buffered transaction over a `MemoryStore`
#[derive(Debug)]
pub struct MemoryTransaction {
    store: MemoryStore,
    pending: Vec<PendingWrite>,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn execute_script(&mut self, sql: &str) -> StoreResult<()> {
        let failing = self
            .store
            .lock()?
            .fail_patterns
            .iter()
            .find(|pattern| sql.contains(pattern.as_str()))
            .cloned();

        if let Some(pattern) = failing {
            return Err(StoreError::Execution(format!(
                "syntax error at or near \"{}\"",
                pattern
            )));
        }

        self.pending.push(PendingWrite::Script(sql.to_string()));
        Ok(())
    }

    async fn delete_version(&mut self, version: &str) -> StoreResult<()> {
        self.pending.push(PendingWrite::Delete(version.to_string()));
        Ok(())
    }

    async fn insert_version(&mut self, version: &str, name: &str) -> StoreResult<()> {
        self.pending.push(PendingWrite::Insert {
            version: version.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut state = self.store.lock()?;
        if state.fail_commits {
            return Err(StoreError::Transaction("Transaction commit failed".to_string()));
        }
        if !state.ledger_created && self.pending.iter().any(|w| !matches!(w, PendingWrite::Script(_))) {
            return Err(StoreError::LedgerWrite("Version table does not exist".to_string()));
        }

        // Validate against a copy so a rejected commit changes nothing.
        let mut rows = state.rows.clone();
        let mut executed = Vec::new();
        for write in &self.pending {
            match write {
                PendingWrite::Script(sql) => executed.push(sql.clone()),
                PendingWrite::Delete(version) => {
                    rows.remove(version);
                }
                PendingWrite::Insert { version, name } => {
                    if rows.contains_key(version) {
                        return Err(StoreError::LedgerWrite(format!(
                            "duplicate key value violates unique constraint: version '{}'",
                            version
                        )));
                    }
                    rows.insert(
                        version.clone(),
                        LedgerRecord {
                            version: version.clone(),
                            name: name.clone(),
                            applied_at: Utc::now().naive_utc(),
                        },
                    );
                }
            }
        }

        state.rows = rows;
        state.executed.extend(executed);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

//! PostgreSQL Backend Implementation
//!
//! Single-connection store built on sqlx. Scripts are sent with the simple
//! query protocol so a migration file may hold several statements.

use async_trait::async_trait;
use sqlx::{Connection, Executor, PgConnection, Postgres, Row};

use migoration_core::config::mask_password;

use super::core::{MigrationStore, StoreTransaction};
use crate::error::{StoreError, StoreResult};
use crate::migrations::definitions::LedgerRecord;
use crate::migrations::ledger::LedgerSql;

/// PostgreSQL session holding one connection
pub struct PostgresStore {
    conn: PgConnection,
    sql: LedgerSql,
}

impl PostgresStore {
    /// Open a connection. `ledger_table` must already be validated.
    pub async fn connect(database_url: &str, ledger_table: &str) -> StoreResult<Self> {
        tracing::debug!("Connecting to {}", mask_password(database_url));

        let conn = PgConnection::connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            conn,
            sql: LedgerSql::new(ledger_table),
        })
    }
}

#[async_trait]
impl MigrationStore for PostgresStore {
    async fn ensure_ledger(&mut self) -> StoreResult<()> {
        let sql = self.sql.create_table_sql();
        tracing::debug!("{}", sql);

        sqlx::query(&sql)
            .execute(&mut self.conn)
            .await
            .map_err(|e| StoreError::LedgerSetup {
                table: self.sql.table().to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn ledger_records(&mut self) -> StoreResult<Vec<LedgerRecord>> {
        let rows = sqlx::query(&self.sql.select_records_sql())
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| StoreError::LedgerRead(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let version: String = row
                .try_get("version")
                .map_err(|e| StoreError::LedgerRead(format!("Failed to get version: {}", e)))?;
            let name: String = row
                .try_get("name")
                .map_err(|e| StoreError::LedgerRead(format!("Failed to get name: {}", e)))?;
            let applied_at: chrono::NaiveDateTime = row
                .try_get("applied_at")
                .map_err(|e| StoreError::LedgerRead(format!("Failed to get applied_at: {}", e)))?;

            records.push(LedgerRecord {
                version,
                name,
                applied_at,
            });
        }

        Ok(records)
    }

    async fn begin<'a>(&'a mut self) -> StoreResult<Box<dyn StoreTransaction + 'a>> {
        let tx = self
            .conn
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(format!("Failed to start transaction: {}", e)))?;

        Ok(Box::new(PostgresTransaction::new(tx, self.sql.clone())))
    }

    async fn close(self) -> StoreResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to close connection: {}", e)))
    }

    fn backend_name(&self) -> &'static str {
        "postgresql"
    }
}

/// PostgreSQL transaction implementation
pub struct PostgresTransaction<'c> {
    tx: Option<sqlx::Transaction<'c, Postgres>>,
    sql: LedgerSql,
}

impl<'c> PostgresTransaction<'c> {
    pub fn new(tx: sqlx::Transaction<'c, Postgres>, sql: LedgerSql) -> Self {
        Self { tx: Some(tx), sql }
    }

    fn active(&mut self) -> StoreResult<&mut sqlx::Transaction<'c, Postgres>> {
        self.tx
            .as_mut()
            .ok_or_else(|| StoreError::Transaction("Transaction already completed".to_string()))
    }
}

#[async_trait]
impl<'c> StoreTransaction for PostgresTransaction<'c> {
    async fn execute_script(&mut self, sql: &str) -> StoreResult<()> {
        let tx = self.active()?;
        (&mut **tx)
            .execute(sql)
            .await
            .map_err(|e| StoreError::Execution(e.to_string()))?;
        Ok(())
    }

    async fn delete_version(&mut self, version: &str) -> StoreResult<()> {
        let sql = self.sql.delete_version_sql();
        let tx = self.active()?;
        sqlx::query(&sql)
            .bind(version)
            .execute(&mut **tx)
            .await
            .map_err(|e| StoreError::LedgerWrite(format!("Failed to delete version '{}': {}", version, e)))?;
        Ok(())
    }

    async fn insert_version(&mut self, version: &str, name: &str) -> StoreResult<()> {
        let sql = self.sql.insert_version_sql();
        let tx = self.active()?;
        sqlx::query(&sql)
            .bind(version)
            .bind(name)
            .execute(&mut **tx)
            .await
            .map_err(|e| StoreError::LedgerWrite(format!("Failed to insert version '{}': {}", version, e)))?;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| StoreError::Transaction("Transaction already completed".to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Transaction(format!("Transaction commit failed: {}", e)))
    }

    async fn rollback(mut self: Box<Self>) -> StoreResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| StoreError::Transaction("Transaction already completed".to_string()))?;

        tx.rollback()
            .await
            .map_err(|e| StoreError::Transaction(format!("Transaction rollback failed: {}", e)))
    }
}

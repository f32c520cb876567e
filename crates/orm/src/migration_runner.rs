//! Migration runner entry points
//!
//! Each entry point validates the project configuration, opens one store
//! session, runs a single orchestration and always releases the session
//! before returning.

use migoration_core::ProjectConfig;

use crate::backends::{MigrationStore, PostgresStore};
use crate::error::MigrationResult;
use crate::migrations::definitions::{
    DowngradeTarget, MigrationConfig, MigrationRunResult, MigrationStatusEntry, UpgradeTarget,
};
use crate::migrations::manager::MigrationManager;
use crate::migrations::rollback::MigrationRollback;
use crate::migrations::runner::MigrationRunner;

/// Apply pending migrations against the configured PostgreSQL database
pub async fn run_upgrade(config: &ProjectConfig, target: UpgradeTarget) -> MigrationResult<MigrationRunResult> {
    let store = open_store(config).await?;
    upgrade_with(config, store, target).await
}

/// Roll back applied migrations against the configured PostgreSQL database
pub async fn run_downgrade(config: &ProjectConfig, target: DowngradeTarget) -> MigrationResult<MigrationRunResult> {
    let store = open_store(config).await?;
    downgrade_with(config, store, target).await
}

/// Report every migration's state against the configured PostgreSQL database
pub async fn run_status(config: &ProjectConfig) -> MigrationResult<Vec<MigrationStatusEntry>> {
    let store = open_store(config).await?;
    status_with(config, store).await
}

/// Upgrade over an already opened store. The store is closed afterwards.
pub async fn upgrade_with<S: MigrationStore>(
    config: &ProjectConfig,
    store: S,
    target: UpgradeTarget,
) -> MigrationResult<MigrationRunResult> {
    let mut runner = runner_for(config, store);
    let result = runner.upgrade(target).await;
    release(runner).await;
    result
}

/// Downgrade over an already opened store. The store is closed afterwards.
pub async fn downgrade_with<S: MigrationStore>(
    config: &ProjectConfig,
    store: S,
    target: DowngradeTarget,
) -> MigrationResult<MigrationRunResult> {
    let mut runner = runner_for(config, store);
    let result = runner.downgrade(target).await;
    release(runner).await;
    result
}

/// Status over an already opened store. The store is closed afterwards.
pub async fn status_with<S: MigrationStore>(
    config: &ProjectConfig,
    store: S,
) -> MigrationResult<Vec<MigrationStatusEntry>> {
    let mut runner = runner_for(config, store);
    let result = runner.status().await;
    release(runner).await;
    result
}

async fn open_store(config: &ProjectConfig) -> MigrationResult<PostgresStore> {
    config.validate()?;
    config.ensure_migrations_dir()?;
    Ok(PostgresStore::connect(&config.database_url, &config.ledger_table).await?)
}

fn runner_for<S: MigrationStore>(config: &ProjectConfig, store: S) -> MigrationRunner<S> {
    MigrationRunner::new(MigrationManager::with_config(MigrationConfig::from(config)), store)
}

async fn release<S: MigrationStore>(runner: MigrationRunner<S>) {
    if let Err(e) = runner.close().await {
        tracing::warn!("Failed to close database connection: {}", e);
    }
}

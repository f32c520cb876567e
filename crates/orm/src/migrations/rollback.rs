//! Migration Rollback - Handles rolling back applied migrations
//!
//! Steps backwards from the current version, running each down artifact and
//! re-pointing the version table at the migration before it.

use std::time::Instant;

use super::definitions::{DowngradeTarget, MigrationRunResult, RunState};
use super::planner::plan_downgrade;
use super::runner::{describe, MigrationRunner};
use crate::backends::MigrationStore;
use crate::error::MigrationResult;

/// Extension trait for MigrationRunner to add rollback functionality
#[allow(async_fn_in_trait)]
pub trait MigrationRollback {
    /// Roll back applied migrations down to `target`
    async fn downgrade(&mut self, target: DowngradeTarget) -> MigrationResult<MigrationRunResult>;
}

impl<S: MigrationStore> MigrationRollback for MigrationRunner<S> {
    async fn downgrade(&mut self, target: DowngradeTarget) -> MigrationResult<MigrationRunResult> {
        let started = Instant::now();
        let result = downgrade_inner(self, target, started).await;
        if result.is_err() {
            self.transition(RunState::Failed);
        }
        result
    }
}

async fn downgrade_inner<S: MigrationStore>(
    runner: &mut MigrationRunner<S>,
    target: DowngradeTarget,
    started: Instant,
) -> MigrationResult<MigrationRunResult> {
    let (catalog, current) = runner.prepare().await?;
    let current_version = current.as_ref().map(|r| r.version.as_str());

    if current_version.is_none() {
        tracing::info!("Nothing to downgrade, no migrations have been applied");
    }

    let plan = plan_downgrade(&catalog, current_version, target)?;
    tracing::debug!(
        "Rolling back {} migration(s) from {}",
        plan.len(),
        describe(&plan.starting_version)
    );

    runner.execute_plan(plan, started).await
}

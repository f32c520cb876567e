//! Migration Runner - Executes migrations against the database
//!
//! `MigrationExecutor` applies one plan step inside one store transaction.
//! `MigrationRunner` owns a store session and drives the upgrade orchestration;
//! downgrades live in `rollback`.

use std::fs;
use std::time::Instant;

use super::definitions::{
    Catalog, Direction, MigrationPlan, MigrationRunResult, MigrationStatus, MigrationStatusEntry,
    PlanStep, RunState, UpgradeTarget, SQL_EXTENSION,
};
use super::ledger;
use super::manager::MigrationManager;
use super::planner::plan_upgrade;
use crate::backends::MigrationStore;
use crate::error::{ExecError, ExecResult, MigrationError, MigrationResult, PlanError, StoreResult};
use crate::migrations::definitions::LedgerRecord;

/// Ledger mutation produced by a successful step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerWrite {
    Delete { version: String },
    Insert { version: String, name: String },
}

/// Ledger writes that record `step` once its artifact has run.
///
/// Up: drop the superseded row, then insert the step's row. Down: drop the
/// step's row, then insert the row it reverts to (none at base).
pub fn ledger_writes(step: &PlanStep) -> Vec<LedgerWrite> {
    let mut writes = Vec::with_capacity(2);
    match step.direction {
        Direction::Up => {
            if let Some(previous) = &step.previous {
                writes.push(LedgerWrite::Delete {
                    version: previous.version.clone(),
                });
            }
            writes.push(LedgerWrite::Insert {
                version: step.migration.version.clone(),
                name: step.migration.name.clone(),
            });
        }
        Direction::Down => {
            writes.push(LedgerWrite::Delete {
                version: step.migration.version.clone(),
            });
            if let Some(previous) = &step.previous {
                writes.push(LedgerWrite::Insert {
                    version: previous.version.clone(),
                    name: previous.name.clone(),
                });
            }
        }
    }
    writes
}

/// Applies single plan steps
pub struct MigrationExecutor;

impl MigrationExecutor {
    /// Run the step's artifact and update the ledger in one transaction.
    ///
    /// Nothing is committed unless both the script and the ledger writes succeed.
    pub async fn apply<S: MigrationStore>(store: &mut S, step: &PlanStep) -> ExecResult<()> {
        let artifact = step.artifact();
        let path = artifact.display().to_string();

        if artifact.extension().and_then(|ext| ext.to_str()) != Some(SQL_EXTENSION) {
            return Err(ExecError::UnsupportedArtifactType { path });
        }

        let sql = fs::read_to_string(artifact).map_err(|source| ExecError::ArtifactUnreadable {
            path: path.clone(),
            source,
        })?;

        match step.direction {
            Direction::Up => tracing::info!(
                "Applying migration {}, version {}",
                step.migration.name,
                step.migration.version
            ),
            Direction::Down => tracing::info!(
                "Rolling back migration {}, version {}",
                step.migration.name,
                step.migration.version
            ),
        }

        let mut tx = store
            .begin()
            .await
            .map_err(|source| ExecError::ExecutionFailed {
                path: path.clone(),
                source,
            })?;

        if sql.trim().is_empty() {
            tracing::debug!("{} is empty, recording version only", path);
        } else if let Err(source) = tx.execute_script(&sql).await {
            if let Err(e) = tx.rollback().await {
                tracing::warn!("Rollback after failed migration {} also failed: {}", path, e);
            }
            return Err(ExecError::ExecutionFailed { path, source });
        }

        let mut recorded: StoreResult<()> = Ok(());
        for write in ledger_writes(step) {
            recorded = match &write {
                LedgerWrite::Delete { version } => tx.delete_version(version).await,
                LedgerWrite::Insert { version, name } => tx.insert_version(version, name).await,
            };
            if recorded.is_err() {
                break;
            }
        }

        let ledger_version = step.migration.version.clone();
        if let Err(source) = recorded {
            if let Err(e) = tx.rollback().await {
                tracing::warn!("Rollback after failed ledger update also failed: {}", e);
            }
            return Err(ExecError::LedgerWrite {
                version: ledger_version,
                source,
            });
        }

        tx.commit().await.map_err(|source| ExecError::LedgerWrite {
            version: ledger_version,
            source,
        })
    }
}

/// Migration runner that executes migrations against one store session
pub struct MigrationRunner<S> {
    manager: MigrationManager,
    store: S,
    state: RunState,
}

impl<S: MigrationStore> MigrationRunner<S> {
    /// Create a new migration runner
    pub fn new(manager: MigrationManager, store: S) -> Self {
        Self {
            manager,
            store,
            state: RunState::Idle,
        }
    }

    /// Where the last run stopped
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Release the store session
    pub async fn close(self) -> StoreResult<()> {
        self.store.close().await
    }

    /// Apply pending migrations up to `target`
    pub async fn upgrade(&mut self, target: UpgradeTarget) -> MigrationResult<MigrationRunResult> {
        let started = Instant::now();
        let result = self.upgrade_inner(target, started).await;
        if result.is_err() {
            self.transition(RunState::Failed);
        }
        result
    }

    async fn upgrade_inner(
        &mut self,
        target: UpgradeTarget,
        started: Instant,
    ) -> MigrationResult<MigrationRunResult> {
        let (catalog, current) = self.prepare().await?;
        let plan = plan_upgrade(&catalog, current.as_ref().map(|r| r.version.as_str()), target)?;

        if plan.is_empty() {
            tracing::info!("Already at {}, no migrations to apply", describe(&plan.starting_version));
        }

        self.execute_plan(plan, started).await
    }

    /// Status of every catalog migration relative to the ledger
    pub async fn status(&mut self) -> MigrationResult<Vec<MigrationStatusEntry>> {
        let result = self.status_inner().await;
        self.transition(if result.is_ok() { RunState::Done } else { RunState::Failed });
        result
    }

    async fn status_inner(&mut self) -> MigrationResult<Vec<MigrationStatusEntry>> {
        let (catalog, current) = self.prepare().await?;

        let current_index = match &current {
            Some(record) => Some(
                catalog
                    .position(&record.version)
                    .ok_or_else(|| PlanError::VersionNotFound(record.version.clone()))?,
            ),
            None => None,
        };

        Ok(catalog
            .iter()
            .enumerate()
            .map(|(index, migration)| {
                let status = match (current_index, &current) {
                    (Some(ci), Some(record)) if index == ci => MigrationStatus::Current {
                        applied_at: record.applied_at,
                    },
                    (Some(ci), _) if index < ci => MigrationStatus::Applied,
                    _ => MigrationStatus::Pending,
                };
                MigrationStatusEntry {
                    version: migration.version.clone(),
                    name: migration.name.clone(),
                    status,
                }
            })
            .collect())
    }

    /// Ensure the ledger, build the catalog and resolve the current row
    pub(crate) async fn prepare(&mut self) -> MigrationResult<(Catalog, Option<LedgerRecord>)> {
        self.transition(RunState::Idle);

        self.store.ensure_ledger().await?;
        self.transition(RunState::LedgerEnsured);

        let catalog = self.manager.load_catalog()?;
        let current = ledger::resolve_current(&mut self.store).await?;
        self.transition(RunState::VersionResolved);

        tracing::debug!(
            "Resolved current version {} against {} migration(s) on {}",
            describe(&current.as_ref().map(|r| r.version.clone())),
            catalog.len(),
            self.store.backend_name()
        );

        Ok((catalog, current))
    }

    /// Apply every step in order, halting on the first failure
    pub(crate) async fn execute_plan(
        &mut self,
        plan: MigrationPlan,
        started: Instant,
    ) -> MigrationResult<MigrationRunResult> {
        self.transition(RunState::Planned);

        let mut applied = Vec::with_capacity(plan.len());
        for (index, step) in plan.steps.iter().enumerate() {
            self.transition(RunState::Applying(index));

            if let Err(source) = MigrationExecutor::apply(&mut self.store, step).await {
                self.transition(RunState::Failed);
                return Err(MigrationError::StepFailed {
                    direction: plan.direction,
                    step: index + 1,
                    succeeded: applied.len(),
                    version: step.migration.version.clone(),
                    name: step.migration.name.clone(),
                    source,
                });
            }

            applied.push(step.migration.version.clone());
        }

        self.transition(RunState::Done);

        Ok(MigrationRunResult {
            direction: plan.direction,
            steps_applied: applied.len(),
            applied,
            final_version: plan.final_version(),
            execution_time_ms: started.elapsed().as_millis(),
        })
    }

    pub(crate) fn transition(&mut self, next: RunState) {
        tracing::trace!("Migration run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

pub(crate) fn describe(version: &Option<String>) -> String {
    version.clone().unwrap_or_else(|| "base".to_string())
}

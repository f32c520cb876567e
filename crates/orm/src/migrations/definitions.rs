//! Migration Definitions - Core types and structures for migrations
//!
//! Defines the fundamental types used throughout the migration system: the
//! Migration descriptor and its ordering, the Catalog, plan steps, targets and
//! run results.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use migoration_core::config::{ProjectConfig, DEFAULT_MIGRATIONS_DIR};

use crate::error::{CatalogError, CatalogResult, PlanError};

/// Extension every migration artifact must carry
pub const SQL_EXTENSION: &str = "sql";

/// Represents a database migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Migration {
    /// Sortable identifier, normally a `YYYYMMDDhhmmss` timestamp
    pub version: String,
    /// Human-readable name, underscores instead of spaces
    pub name: String,
    /// Forward statement set
    pub up_path: PathBuf,
    /// Reverse statement set, derived by naming convention
    pub down_path: PathBuf,
}

impl Migration {
    pub fn new(
        version: impl Into<String>,
        name: impl Into<String>,
        up_path: impl Into<PathBuf>,
        down_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            version: version.into(),
            name: name.into().replace(' ', "_"),
            up_path: up_path.into(),
            down_path: down_path.into(),
        }
    }

    /// Artifact to execute for the given direction
    pub fn artifact(&self, direction: Direction) -> &Path {
        match direction {
            Direction::Up => &self.up_path,
            Direction::Down => &self.down_path,
        }
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.name)
    }
}

/// Total order over version strings.
///
/// Numeric versions compare by value (ties broken lexicographically, so `01`
/// and `1` stay distinct) and sort before non-numeric ones; non-numeric
/// versions compare lexicographically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (a.parse::<u128>(), b.parse::<u128>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Ordered, duplicate-free list of migrations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    migrations: Vec<Migration>,
}

impl Catalog {
    /// Sort `migrations` by version and reject duplicate versions
    pub fn new(mut migrations: Vec<Migration>) -> CatalogResult<Self> {
        migrations.sort_by(|a, b| compare_versions(&a.version, &b.version));

        for pair in migrations.windows(2) {
            if pair[0].version == pair[1].version {
                return Err(CatalogError::DuplicateVersion {
                    version: pair[0].version.clone(),
                    first: pair[0].up_path.display().to_string(),
                    second: pair[1].up_path.display().to_string(),
                });
            }
        }

        Ok(Self { migrations })
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Migration> {
        self.migrations.get(index)
    }

    /// Index of the migration with this exact version
    pub fn position(&self, version: &str) -> Option<usize> {
        self.migrations.iter().position(|m| m.version == version)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Migration> {
        self.migrations.iter()
    }
}

/// Row of the version table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRecord {
    pub version: String,
    pub name: String,
    pub applied_at: NaiveDateTime,
}

/// Configuration for the migration file system side.
///
/// The version table name is not part of it: the store owns that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Directory where migration files are stored
    pub migrations_dir: PathBuf,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
        }
    }
}

impl From<&ProjectConfig> for MigrationConfig {
    fn from(config: &ProjectConfig) -> Self {
        Self {
            migrations_dir: config.migrations_dir.clone(),
        }
    }
}

/// Migration direction for execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply the migration (run the up artifact)
    Up,
    /// Roll back the migration (run the down artifact)
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "upgrade"),
            Direction::Down => write!(f, "downgrade"),
        }
    }
}

/// How far an upgrade should go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeTarget {
    Head,
    Steps(usize),
}

impl FromStr for UpgradeTarget {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "head" => Ok(UpgradeTarget::Head),
            other => other.parse().map(UpgradeTarget::Steps).map_err(|_| PlanError::InvalidTarget {
                target: s.to_string(),
                expected: "'head' or a non-negative number of steps",
            }),
        }
    }
}

impl fmt::Display for UpgradeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeTarget::Head => write!(f, "head"),
            UpgradeTarget::Steps(n) => write!(f, "{}", n),
        }
    }
}

/// How far a downgrade should go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DowngradeTarget {
    Base,
    Steps(usize),
}

impl FromStr for DowngradeTarget {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "base" => Ok(DowngradeTarget::Base),
            other => other.parse().map(DowngradeTarget::Steps).map_err(|_| PlanError::InvalidTarget {
                target: s.to_string(),
                expected: "'base' or a non-negative number of steps",
            }),
        }
    }
}

impl fmt::Display for DowngradeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DowngradeTarget::Base => write!(f, "base"),
            DowngradeTarget::Steps(n) => write!(f, "{}", n),
        }
    }
}

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub migration: Migration,
    pub direction: Direction,
    /// Up: the row this step supersedes. Down: the row the ledger reverts to.
    pub previous: Option<Migration>,
}

impl PlanStep {
    pub fn artifact(&self) -> &Path {
        self.migration.artifact(self.direction)
    }

    /// Migration the ledger names as current once this step has committed
    pub fn ledger_after(&self) -> Option<&Migration> {
        match self.direction {
            Direction::Up => Some(&self.migration),
            Direction::Down => self.previous.as_ref(),
        }
    }
}

/// Ordered steps computed for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub direction: Direction,
    /// Version the ledger showed when the plan was computed
    pub starting_version: Option<String>,
    pub steps: Vec<PlanStep>,
}

impl MigrationPlan {
    pub fn empty(direction: Direction, starting_version: Option<String>) -> Self {
        Self {
            direction,
            starting_version,
            steps: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Version the ledger shows once every step has been applied
    pub fn final_version(&self) -> Option<String> {
        match self.steps.last() {
            Some(step) => step.ledger_after().map(|m| m.version.clone()),
            None => self.starting_version.clone(),
        }
    }
}

/// Orchestrator progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    LedgerEnsured,
    VersionResolved,
    Planned,
    /// Applying the step at this 0-based plan index
    Applying(usize),
    Done,
    Failed,
}

/// Result of an upgrade or downgrade run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRunResult {
    pub direction: Direction,
    pub steps_applied: usize,
    /// Versions whose artifact ran, in execution order
    pub applied: Vec<String>,
    /// Current version after the run, `None` at base
    pub final_version: Option<String>,
    pub execution_time_ms: u128,
}

/// Migration status relative to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum MigrationStatus {
    /// Not yet applied
    Pending,
    /// Applied and superseded by a later migration
    Applied,
    /// The version recorded in the ledger
    Current { applied_at: NaiveDateTime },
}

/// One line of `status` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatusEntry {
    pub version: String,
    pub name: String,
    #[serde(flatten)]
    pub status: MigrationStatus,
}

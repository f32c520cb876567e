//! Error types for the migration engine
//!
//! Each component owns an error enum; `MigrationError` aggregates them for the
//! orchestrators and carries step context when a plan halts mid-way.

use migoration_core::ConfigError;
use std::io;
use thiserror::Error;

use crate::migrations::definitions::Direction;

/// Result type alias for engine operations
pub type MigrationResult<T> = Result<T, MigrationError>;
pub type CatalogResult<T> = Result<T, CatalogError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type PlanResult<T> = Result<T, PlanError>;
pub type ExecResult<T> = Result<T, ExecError>;

/// Failures while reading or writing the migrations directory
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read migrations directory '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Duplicate migration version '{version}' in '{first}' and '{second}'")]
    DuplicateVersion {
        version: String,
        first: String,
        second: String,
    },

    #[error("Migrations directory '{path}' does not exist")]
    MissingDirectory { path: String },

    #[error("Failed to write migration file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Migration name must not be empty")]
    EmptyName,
}

/// Failures talking to the relational store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Failed to set up version table '{table}': {message}")]
    LedgerSetup { table: String, message: String },

    #[error("Failed to read version table: {0}")]
    LedgerRead(String),

    #[error("Failed to update version table: {0}")]
    LedgerWrite(String),

    #[error("Statement execution failed: {0}")]
    Execution(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Store state lock poisoned: {0}")]
    Poisoned(String),
}

/// Failures while computing a plan
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Current version '{0}' not found in migrations directory")]
    VersionNotFound(String),

    #[error("Invalid target '{target}': expected {expected}")]
    InvalidTarget { target: String, expected: &'static str },
}

/// Failures while applying a single step
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Invalid migration file type '{path}': only .sql files are supported")]
    UnsupportedArtifactType { path: String },

    #[error("Failed to read migration file '{path}': {source}")]
    ArtifactUnreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to execute migration file '{path}': {source}")]
    ExecutionFailed {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to record version '{version}' in version table: {source}")]
    LedgerWrite {
        version: String,
        #[source]
        source: StoreError,
    },
}

/// Top-level engine error
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(
        "{direction} step {step} (version {version}, {name}) failed after {succeeded} successful step(s): {source}"
    )]
    StepFailed {
        direction: Direction,
        /// 1-based position of the failing step in the plan
        step: usize,
        succeeded: usize,
        version: String,
        name: String,
        #[source]
        source: ExecError,
    },
}

impl MigrationError {
    /// Number of steps that were applied before the run stopped
    pub fn steps_succeeded(&self) -> usize {
        match self {
            MigrationError::StepFailed { succeeded, .. } => *succeeded,
            _ => 0,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Execution(err.to_string())
    }
}

//! Migration Manager - File system operations for migrations
//!
//! Builds the Catalog from the migrations directory and scaffolds new
//! migration file pairs.
//!
//! Files follow `<version>_<name parts...>_up.sql` / `_down.sql`. Only up files
//! are enumerated; each down path is derived from its up file and checked when
//! it is executed.

use chrono::Utc;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::definitions::{Catalog, Migration, MigrationConfig, SQL_EXTENSION};
use crate::error::{CatalogError, CatalogResult};

const UP_SUFFIX: &str = "up.sql";
const DOWN_SUFFIX: &str = "down.sql";

/// Paths written by `create_migration`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedMigration {
    pub version: String,
    pub name: String,
    pub up_path: PathBuf,
    pub down_path: PathBuf,
}

/// Migration manager for creating and loading migrations
#[derive(Debug, Clone)]
pub struct MigrationManager {
    config: MigrationConfig,
}

impl MigrationManager {
    /// Create a new migration manager with default configuration
    pub fn new() -> Self {
        Self::with_config(MigrationConfig::default())
    }

    /// Create a new migration manager with custom configuration
    pub fn with_config(config: MigrationConfig) -> Self {
        Self { config }
    }

    /// Read the migrations directory into an ordered Catalog
    pub fn load_catalog(&self) -> CatalogResult<Catalog> {
        let dir = &self.config.migrations_dir;
        let io_error = |source| CatalogError::Io {
            path: dir.display().to_string(),
            source,
        };

        let mut migrations = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;

            if entry.file_type().map_err(io_error)?.is_dir() {
                continue;
            }

            let file_name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!("Skipping migration file with non UTF-8 name {:?}", raw);
                    continue;
                }
            };

            if let Some(migration) = parse_migration_filename(dir, &file_name) {
                migrations.push(migration);
            }
        }

        let catalog = Catalog::new(drop_shadowed(migrations))?;
        tracing::debug!("Loaded {} migration(s) from {}", catalog.len(), dir.display());
        Ok(catalog)
    }

    /// Write a new up/down pair stamped with the current UTC time
    pub fn create_migration(&self, name: &str) -> CatalogResult<CreatedMigration> {
        let version = Utc::now().format("%Y%m%d%H%M%S").to_string();
        self.create_migration_with_version(name, &version)
    }

    /// Write a new up/down pair with an explicit version
    pub fn create_migration_with_version(&self, name: &str, version: &str) -> CatalogResult<CreatedMigration> {
        let name = name.trim().replace(' ', "_");
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }

        let dir = &self.config.migrations_dir;
        if !dir.is_dir() {
            return Err(CatalogError::MissingDirectory {
                path: dir.display().to_string(),
            });
        }

        let stem = format!("{}_{}", version, name);
        let up_path = dir.join(format!("{}_{}", stem, UP_SUFFIX));
        let down_path = dir.join(format!("{}_{}", stem, DOWN_SUFFIX));

        write_file(&up_path, &format!(
            "-- Migration Up: {}\n-- Write your UP migration SQL here\n",
            stem
        ))?;
        write_file(&down_path, &format!(
            "-- Migration Down: {}\n-- Write your DOWN migration SQL here (rollback)\n",
            stem
        ))?;

        tracing::info!("Created migration files {} and {}", up_path.display(), down_path.display());

        Ok(CreatedMigration {
            version: version.to_string(),
            name,
            up_path,
            down_path,
        })
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file(path: &Path, content: &str) -> CatalogResult<()> {
    fs::write(path, content).map_err(|source| CatalogError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Drop non-`.sql` entries that share a version with a `.sql` entry.
///
/// Editor backups such as `1_init_up.sql.bak` would otherwise collide with
/// the real migration. A lone non-`.sql` entry is kept and rejected when it
/// is applied.
fn drop_shadowed(migrations: Vec<Migration>) -> Vec<Migration> {
    let is_sql = |m: &Migration| m.up_path.extension().and_then(|e| e.to_str()) == Some(SQL_EXTENSION);

    let sql_versions: HashSet<String> = migrations
        .iter()
        .filter(|m| is_sql(m))
        .map(|m| m.version.clone())
        .collect();

    migrations
        .into_iter()
        .filter(|m| {
            let shadowed = !is_sql(m) && sql_versions.contains(&m.version);
            if shadowed {
                tracing::warn!(
                    "Skipping '{}', version {} already has a .sql migration",
                    m.up_path.display(),
                    m.version
                );
            }
            !shadowed
        })
        .collect()
}

/// Parse one directory entry into a Migration.
///
/// Returns `None` for down files (they are derived, not listed) and for names
/// with fewer than three `_`-separated parts, which are logged and skipped.
pub fn parse_migration_filename(dir: &Path, file_name: &str) -> Option<Migration> {
    let parts: Vec<&str> = file_name.split('_').collect();
    if parts.len() < 3 {
        tracing::warn!("Skipping invalid migration file '{}'", file_name);
        return None;
    }

    let (last, head) = parts.split_last()?;
    if *last == DOWN_SUFFIX {
        return None;
    }

    let version = head[0];
    let name = head[1..].join("_");
    let down_file = format!("{}_{}", head.join("_"), DOWN_SUFFIX);

    Some(Migration::new(
        version,
        name,
        dir.join(file_name),
        dir.join(down_file),
    ))
}

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::sources::{interpolate, process_env, ConfigSource};
use super::validation::{is_plain_identifier, validate_database_url, ConfigError};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "migoration.yaml";

/// Default ledger table name
pub const DEFAULT_LEDGER_TABLE: &str = "migoration_version";

/// Default migrations directory written by `init`
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// File layout of `migoration.yaml` before interpolation
#[derive(Debug, Deserialize)]
struct RawProjectConfig {
    database_url: Option<String>,
    migration_path: Option<String>,
    ledger_table: Option<String>,
}

/// Project configuration, passed explicitly to the migration engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub database_url: String,
    pub migrations_dir: PathBuf,
    pub ledger_table: String,
    sources: HashMap<String, ConfigSource>,
    /// `${VAR}` placeholders the environment could not resolve
    unresolved: Vec<String>,
}

impl ProjectConfig {
    /// Build a configuration directly, without a file
    pub fn new(database_url: impl Into<String>, migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_url: database_url.into(),
            migrations_dir: migrations_dir.into(),
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
            sources: HashMap::new(),
            unresolved: Vec::new(),
        }
    }

    /// Override the ledger table name
    pub fn with_ledger_table(mut self, table: impl Into<String>) -> Self {
        self.ledger_table = table.into();
        self
    }

    /// Load and validate a configuration file, resolving placeholders from the process environment
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, process_env)
    }

    /// Load and validate a configuration file with a custom environment lookup
    pub fn load_with<F>(path: impl AsRef<Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_yaml_str(&content, &path.display().to_string(), lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML content and expand `${VAR}` placeholders. Does not validate.
    pub fn from_yaml_str<F>(content: &str, origin: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawProjectConfig = serde_yaml::from_str(content)?;
        let mut sources = HashMap::new();
        let mut unresolved = Vec::new();

        let mut resolve = |field: &str, value: Option<String>| -> Option<String> {
            let value = value?;
            let expanded = interpolate(&value, &lookup);
            let source = if expanded.referenced.is_empty() {
                ConfigSource::File(origin.to_string())
            } else {
                ConfigSource::EnvVar(expanded.referenced)
            };
            sources.insert(field.to_string(), source);
            unresolved.extend(expanded.missing);
            Some(expanded.value)
        };

        let database_url = resolve("database_url", raw.database_url).unwrap_or_default();
        let migrations_dir = resolve("migration_path", raw.migration_path).unwrap_or_default();
        let ledger_table = match resolve("ledger_table", raw.ledger_table) {
            Some(table) => table,
            None => {
                sources.insert(
                    "ledger_table".to_string(),
                    ConfigSource::Default(DEFAULT_LEDGER_TABLE.to_string()),
                );
                DEFAULT_LEDGER_TABLE.to_string()
            }
        };

        Ok(Self {
            database_url,
            migrations_dir: PathBuf::from(migrations_dir),
            ledger_table,
            sources,
            unresolved,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.unresolved.is_empty() {
            return Err(ConfigError::validation_failed(format!(
                "unresolved environment variable(s): {}",
                self.unresolved.join(", ")
            )));
        }

        validate_database_url(&self.database_url)?;

        if self.migrations_dir.as_os_str().is_empty() {
            return Err(ConfigError::missing_required(
                "migration_path",
                "Point it at the directory holding *_up.sql / *_down.sql files",
            ));
        }

        if !is_plain_identifier(&self.ledger_table) {
            return Err(ConfigError::invalid_value(
                "ledger_table",
                self.ledger_table.clone(),
                "a plain SQL identifier (letters, digits, underscores)",
            ));
        }

        Ok(())
    }

    /// Require the migrations directory to exist on disk
    pub fn ensure_migrations_dir(&self) -> Result<(), ConfigError> {
        if self.migrations_dir.is_dir() {
            Ok(())
        } else {
            Err(ConfigError::MissingDirectory {
                path: self.migrations_dir.display().to_string(),
            })
        }
    }

    /// Placeholders left empty because their variable was not set
    pub fn unresolved_variables(&self) -> &[String] {
        &self.unresolved
    }

    /// Get configuration source information for debugging
    pub fn config_sources(&self) -> &HashMap<String, ConfigSource> {
        &self.sources
    }
}

/// Template written by `migoration init`
pub fn config_template() -> String {
    format!(
        "# Migoration configuration file\n\
         # ${{ENV_VAR}} placeholders are replaced with environment variables at load time\n\
         database_url: ${{DATABASE_URL}}\n\
         migration_path: {}\n",
        DEFAULT_MIGRATIONS_DIR
    )
}

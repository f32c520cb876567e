//! # migoration-core
//!
//! Configuration and logging foundation shared by the migoration engine and CLI.

pub mod config;
pub mod logging;

pub use config::{ConfigError, ConfigSource, ProjectConfig};
pub use logging::{init_logging, LogFormat, LoggingConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tool name, also used as the default config file stem and ledger table prefix
pub const TOOL_NAME: &str = "migoration";

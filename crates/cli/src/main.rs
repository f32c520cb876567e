mod commands;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use migoration_core::config::{DEFAULT_CONFIG_FILE, DEFAULT_MIGRATIONS_DIR};
use migoration_core::{init_logging, LoggingConfig, ProjectConfig};
use migoration_orm::{DowngradeTarget, UpgradeTarget};

use commands::*;

#[derive(Parser, Debug)]
#[command(name = "migoration")]
#[command(version, about = "Versioned SQL migrations for PostgreSQL")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the migrations directory and a configuration template
    Init,

    /// Create a new pair of up/down migration files
    Create {
        /// Migration name, spaces become underscores
        #[arg(long, short = 'm')]
        name: String,
    },

    /// Apply pending migrations
    Upgrade {
        /// `head` or a number of migrations to apply
        target: UpgradeTarget,
    },

    /// Roll back applied migrations
    Downgrade {
        /// `base` or a number of migrations to roll back
        target: DowngradeTarget,
    },

    /// Show applied and pending migrations
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env().context("Invalid logging configuration")?;
    if cli.verbose {
        logging = logging.verbose();
    }
    init_logging(&logging).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Init => {
            init::run(&cli.config, Path::new(DEFAULT_MIGRATIONS_DIR))?;
        }
        Commands::Create { name } => {
            let config = load_config(&cli.config)?;
            create::run(&config, &name)?;
        }
        Commands::Upgrade { target } => {
            let config = load_config(&cli.config)?;
            upgrade::run(&config, target).await?;
        }
        Commands::Downgrade { target } => {
            let config = load_config(&cli.config)?;
            downgrade::run(&config, target).await?;
        }
        Commands::Status { json } => {
            let config = load_config(&cli.config)?;
            status::run(&config, json).await?;
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let config = ProjectConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::debug!("Configuration sources: {:?}", config.config_sources());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upgrade_targets() {
        let cli = Cli::try_parse_from(["migoration", "upgrade", "head"]).unwrap();
        assert!(matches!(cli.command, Commands::Upgrade { target: UpgradeTarget::Head }));

        let cli = Cli::try_parse_from(["migoration", "upgrade", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Upgrade { target: UpgradeTarget::Steps(3) }));

        assert!(Cli::try_parse_from(["migoration", "upgrade", "base"]).is_err());
        assert!(Cli::try_parse_from(["migoration", "upgrade", "-1"]).is_err());
        assert!(Cli::try_parse_from(["migoration", "upgrade"]).is_err());
    }

    #[test]
    fn test_parse_downgrade_targets() {
        let cli = Cli::try_parse_from(["migoration", "downgrade", "base"]).unwrap();
        assert!(matches!(cli.command, Commands::Downgrade { target: DowngradeTarget::Base }));

        let cli = Cli::try_parse_from(["migoration", "downgrade", "1"]).unwrap();
        assert!(matches!(cli.command, Commands::Downgrade { target: DowngradeTarget::Steps(1) }));

        assert!(Cli::try_parse_from(["migoration", "downgrade", "head"]).is_err());
    }

    #[test]
    fn test_parse_create_and_globals() {
        let cli = Cli::try_parse_from([
            "migoration",
            "create",
            "--name",
            "add users table",
            "--config",
            "deploy/migoration.yaml",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("deploy/migoration.yaml"));
        match cli.command {
            Commands::Create { name } => assert_eq!(name, "add users table"),
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["migoration", "create"]).is_err());
    }

    #[test]
    fn test_parse_status_defaults() {
        let cli = Cli::try_parse_from(["migoration", "status"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Status { json: false }));
    }
}

//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml`, then `SPLITBOOK__*` environment variables, then
//! command line flags.
use config::{Config, ConfigError, Environment, File};
use ledger::EmptySplitPolicy;
use serde::Deserialize;

use crate::cli::Cli;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub data_dir: String,
    pub memory: bool,
}

#[derive(Debug, Deserialize)]
pub struct Ledger {
    pub empty_split: EmptySplitPolicy,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub storage: Storage,
    pub ledger: Ledger,
}

impl Settings {
    pub fn new(cli: &Cli) -> Result<Self, ConfigError> {
        let mut settings: Settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("storage.data_dir", "data")?
            .set_default("storage.memory", false)?
            .set_default("ledger.empty_split", "allow")?
            .add_source(File::with_name(&cli.config).required(false))
            .add_source(Environment::with_prefix("SPLITBOOK").separator("__"))
            .build()?
            .try_deserialize()?;

        if let Some(level) = &cli.log_level {
            settings.app.level = level.clone();
        }
        if let Some(data_dir) = &cli.data_dir {
            settings.storage.data_dir = data_dir.clone();
        }
        if cli.memory {
            settings.storage.memory = true;
        }
        if cli.reject_empty_split {
            settings.ledger.empty_split = EmptySplitPolicy::Reject;
        }

        Ok(settings)
    }
}

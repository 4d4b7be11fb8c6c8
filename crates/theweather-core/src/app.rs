use anyhow::Result;
use std::sync::Arc;

use crate::{Config, Preferences};

/// Application configuration and lifecycle.
pub struct App {
    config: Arc<Config>,
    prefs: Preferences,
}

impl App {
    /// Load (and validate) configuration from the default location.
    pub fn new() -> Result<Self> {
        let (config, _) = Config::load_validated()?;
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: Config) -> Self {
        let prefs = Preferences::new(&config.config_dir);
        Self {
            config: Arc::new(config),
            prefs,
        }
    }

    /// Record the first launch. Returns whether this was the first run.
    pub fn initialize(&mut self) -> Result<bool> {
        let first_run = self.prefs.is_first_run();
        if first_run {
            tracing::info!("First run, config at {}", self.config.config_dir.display());
            self.prefs.mark_first_run_done()?;
        }
        tracing::info!("Application initialized");
        Ok(first_run)
    }

    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down application");
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<Config> {
        self.config.clone()
    }
}

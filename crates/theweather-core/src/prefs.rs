//! Small persisted preference flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const PREFS_FILE: &str = "prefs.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PrefsFile {
    #[serde(default = "default_first_run")]
    is_first_run: bool,
}

fn default_first_run() -> bool {
    true
}

impl Default for PrefsFile {
    fn default() -> Self {
        Self {
            is_first_run: default_first_run(),
        }
    }
}

/// Preference flags stored as `prefs.toml` next to the config file.
#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(PREFS_FILE),
        }
    }

    /// True until [`mark_first_run_done`](Self::mark_first_run_done) is called.
    ///
    /// A missing or unreadable file counts as a first run.
    pub fn is_first_run(&self) -> bool {
        self.read().map(|p| p.is_first_run).unwrap_or(true)
    }

    pub fn mark_first_run_done(&self) -> Result<()> {
        let mut prefs = self.read().unwrap_or_default();
        prefs.is_first_run = false;
        self.write(&prefs)
    }

    fn read(&self) -> Result<PrefsFile> {
        let contents = std::fs::read_to_string(&self.path).context("Failed to read prefs file")?;
        toml::from_str(&contents).context("Failed to parse prefs file")
    }

    fn write(&self, prefs: &PrefsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = toml::to_string_pretty(prefs).context("Failed to serialize prefs")?;
        std::fs::write(&self.path, contents).context("Failed to write prefs file")
    }
}

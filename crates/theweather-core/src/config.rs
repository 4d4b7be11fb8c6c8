use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `weather.api_key`.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

const APP_DIR_NAME: &str = "theweather";
const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const DEFAULT_DATABASE_FILE: &str = "weather_database.sqlite3";

/// One problem found by [`Config::validate`].
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors block startup; warnings are only logged.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined with `; `.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Measurement system requested from the forecast API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Forecast API settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Location used when no device provider is available
    #[serde(default)]
    pub location: LocationConfig,

    /// Local forecast cache
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key (can be set via `OPENWEATHER_API_KEY`)
    pub api_key: String,

    /// API base URL, without the `data/2.5/forecast` path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub units: Units,

    /// Seconds between forced refreshes while polling
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    60
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: "YOUR_OPENWEATHER_API_KEY".to_string(),
            base_url: default_base_url(),
            units: Units::Metric,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl WeatherConfig {
    /// Check if the API key is configured (not a placeholder)
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty() && !self.api_key.starts_with("YOUR_")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,

    /// How long a one-shot location request may take
    #[serde(default = "default_location_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_location_timeout_secs() -> u64 {
    10
}

impl Default for LocationConfig {
    fn default() -> Self {
        // Pune
        Self {
            latitude: 18.5204,
            longitude: 73.8567,
            timeout_secs: default_location_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    /// SQLite file; defaults to the platform data directory
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Keep the cache in memory only (nothing survives a restart)
    #[serde(default)]
    pub in_memory: bool,
}

impl CacheConfig {
    /// Resolve the database file, falling back to `<data_dir>/theweather/`.
    pub fn effective_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
                .join(DEFAULT_DATABASE_FILE)
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            location: LocationConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path.
    ///
    /// A missing file is created with defaults. The API key environment
    /// variable always wins over the file.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let contents =
                std::fs::read_to_string(config_path).context("Failed to read config file")?;
            toml::from_str::<Config>(&contents)
                .map_err(|e| ConfigError::Parse(format!("{}: {}", config_path.display(), e)))?
        } else {
            let mut config = Self::default();
            if let Some(parent) = config_path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(config_path)?;
            config
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.weather.api_key = key;
            }
        }

        Ok(config)
    }

    /// [`load`](Self::load) and reject configurations with errors.
    /// Warnings are logged and returned alongside the config.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.checked()?;
        Ok((config, validation))
    }

    fn checked(&self) -> Result<ValidationResult, ConfigError> {
        let validation = self.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }
        Ok(validation)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if let Some(problem) = base_url_problem(&self.weather.base_url) {
            result.add_error("weather.base_url", problem);
        }

        if !self.weather.has_api_key() {
            result.add_warning(
                "weather.api_key",
                format!("API key not configured - set {} or edit the config", API_KEY_ENV),
            );
        }

        if self.weather.poll_interval_secs == 0 {
            result.add_error(
                "weather.poll_interval_secs",
                "Poll interval must be greater than 0",
            );
        } else if self.weather.poll_interval_secs > 86_400 {
            result.add_warning(
                "weather.poll_interval_secs",
                "Poll interval is more than 24 hours",
            );
        }

        if self.location.timeout_secs == 0 {
            result.add_error(
                "location.timeout_secs",
                "Location timeout must be greater than 0",
            );
        }

        // Out-of-range coordinates are passed through untouched by the
        // forecast crate, so only warn here.
        if !(-90.0..=90.0).contains(&self.location.latitude) {
            result.add_warning("location.latitude", "Latitude is outside -90..90");
        }
        if !(-180.0..=180.0).contains(&self.location.longitude) {
            result.add_warning("location.longitude", "Longitude is outside -180..180");
        }

        if let Some(path) = &self.cache.path {
            if path.is_dir() {
                result.add_error(
                    "cache.path",
                    format!("Path is a directory: {}", path.display()),
                );
            }
        }

        result
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// `<config_dir>/theweather/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("No platform config directory")?;
        Ok(base.join(APP_DIR_NAME).join("config.toml"))
    }
}

fn base_url_problem(raw: &str) -> Option<String> {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => return Some(format!("Invalid URL: {}", e)),
    };
    match (url.scheme(), url.host()) {
        ("http" | "https", Some(_)) => None,
        ("http" | "https", None) => Some("URL has no host".to_string()),
        (scheme, _) => Some(format!("Scheme must be http or https, not {}", scheme)),
    }
}

pub mod app;
pub mod config;
pub mod error;
pub mod prefs;

pub use app::App;
pub use config::{
    CacheConfig, Config, LocationConfig, Units, ValidationIssue, ValidationResult,
    WeatherConfig, API_KEY_ENV,
};
pub use error::{
    AppError, ConfigError, ForecastError, LocationError, NetworkError, ReqwestErrorExt,
    RusqliteErrorExt, StorageError,
};
pub use prefs::Preferences;

use anyhow::Result;

/// Initialize tracing/logging. `RUST_LOG` overrides the default `info` filter.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!("TheWeather core initialized");
    Ok(())
}

//! Builds the forecast layer from application configuration.

use std::sync::Arc;
use std::time::Duration;

use theweather_core::{AppError, CacheConfig, Config, LocationConfig, Units as ConfigUnits};
use theweather_forecast::{
    Coordinate, FixedLocation, ForecastCache, MemoryForecastCache, OpenWeatherClient,
    SqliteForecastCache, Units, WeatherStore,
};

use crate::error_mapping::weather_error;

pub fn forecast_units(units: ConfigUnits) -> Units {
    match units {
        ConfigUnits::Metric => Units::Metric,
        ConfigUnits::Imperial => Units::Imperial,
        ConfigUnits::Standard => Units::Standard,
    }
}

pub fn open_cache(config: &CacheConfig) -> Result<Box<dyn ForecastCache>, AppError> {
    if config.in_memory {
        tracing::info!("Using in-memory weather cache");
        return Ok(Box::new(MemoryForecastCache::new()));
    }

    let path = config.effective_path();
    let cache = SqliteForecastCache::new(&path).map_err(|e| weather_error(&e))?;
    tracing::info!("Opened weather cache at {}", path.display());
    Ok(Box::new(cache))
}

/// OpenWeatherMap client plus the configured cache.
pub fn build_store(config: &Config) -> Result<WeatherStore, AppError> {
    if !config.weather.has_api_key() {
        tracing::warn!("No OpenWeatherMap API key configured; fetches will be rejected");
    }

    let client = OpenWeatherClient::new_with_base_url(
        &config.weather.api_key,
        forecast_units(config.weather.units),
        &config.weather.base_url,
    )
    .map_err(|e| weather_error(&e))?;

    let cache = open_cache(&config.cache)?;
    Ok(WeatherStore::with_boxed_cache(Arc::new(client), cache))
}

pub fn configured_location(config: &LocationConfig) -> FixedLocation {
    FixedLocation(Coordinate::new(config.latitude, config.longitude))
}

pub fn location_timeout(config: &LocationConfig) -> Duration {
    Duration::from_secs(config.timeout_secs)
}

pub fn poll_interval(config: &Config) -> Duration {
    Duration::from_secs(config.weather.poll_interval_secs)
}

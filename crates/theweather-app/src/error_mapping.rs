//! Maps forecast-layer errors to theweather_core::AppError for consistent
//! user-facing messages.

use theweather_core::{
    AppError, ForecastError, LocationError as CoreLocationError, ReqwestErrorExt,
    RusqliteErrorExt, StorageError,
};
use theweather_forecast::{LocationError, WeatherError};

pub fn weather_error(e: &WeatherError) -> AppError {
    match e {
        WeatherError::Network(e) => AppError::Network(e.to_network_error()),
        WeatherError::Api { status, .. } if *status == 429 || *status >= 500 => {
            AppError::Forecast(ForecastError::ServiceUnavailable)
        }
        WeatherError::Api { status, message } => {
            AppError::Forecast(ForecastError::Rejected(format!("{}: {}", status, message)))
        }
        WeatherError::InvalidApiKey => AppError::Forecast(ForecastError::InvalidApiKey),
        WeatherError::Parse(msg) => AppError::Forecast(ForecastError::Malformed(msg.clone())),
        WeatherError::Cache(msg) => AppError::Storage(StorageError::Unavailable(msg.clone())),
        WeatherError::Database(e) => AppError::Storage(e.to_storage_error()),
        WeatherError::Location(e) => location_error(e),
    }
}

pub fn location_error(e: &LocationError) -> AppError {
    let mapped = match e {
        LocationError::PermissionDenied => CoreLocationError::PermissionDenied,
        LocationError::ServiceDisabled => CoreLocationError::ServiceDisabled,
        LocationError::Timeout => CoreLocationError::Timeout,
        LocationError::Other(msg) => CoreLocationError::Unavailable(msg.clone()),
    };
    AppError::Location(mapped)
}

//! Application error hierarchy.
//!
//! `Display` keeps the technical detail for logs. `user_message()` gives the
//! short text the weather screen shows next to "Unable to fetch weather data".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("network: {0}")]
    Network(#[from] NetworkError),

    #[error("forecast cache: {0}")]
    Storage(#[from] StorageError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("forecast: {0}")]
    Forecast(#[from] ForecastError),

    #[error("location: {0}")]
    Location(#[from] LocationError),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Forecast(e) => e.user_message(),
            AppError::Location(e) => e.user_message(),
            AppError::Io(_) => "Could not read or write local files.",
            AppError::Other(_) => "Something went wrong. Please try again.",
        }
    }
}

/// Transport-level failures talking to the forecast API.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("could not connect: {0}")]
    ConnectionFailed(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unreadable response: {0}")]
    InvalidResponse(String),

    #[error("offline")]
    Offline,
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "Could not reach the weather service.",
            NetworkError::Timeout => "The weather service took too long to answer.",
            NetworkError::Status { status, .. } if *status >= 500 => {
                "The weather service is having problems. Try again later."
            }
            NetworkError::Status { .. } => "The weather service refused the request.",
            NetworkError::InvalidResponse(_) => "The weather service sent an unreadable reply.",
            NetworkError::Offline => "You are offline. Check your internet connection.",
        }
    }
}

/// Local forecast cache failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot open cache: {0}")]
    Unavailable(String),

    #[error("cache query failed: {0}")]
    Query(String),

    #[error("cache file corrupt: {0}")]
    Corrupt(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Unavailable(_) => "Saved forecasts are unavailable.",
            StorageError::Query(_) => "Saved forecast could not be read.",
            StorageError::Corrupt(_) => "Saved forecasts are damaged. Delete the cache file.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("malformed config file: {0}")]
    Parse(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "The configuration has invalid values.",
            ConfigError::Parse(_) => "The configuration file could not be parsed.",
        }
    }
}

/// The forecast API answered, but not with a usable forecast.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("API key rejected")]
    InvalidApiKey,

    #[error("service unavailable")]
    ServiceUnavailable,

    #[error("malformed forecast: {0}")]
    Malformed(String),
}

impl ForecastError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ForecastError::Rejected(_) => "The forecast request was rejected.",
            ForecastError::InvalidApiKey => "The OpenWeatherMap API key is not valid.",
            ForecastError::ServiceUnavailable => "The weather service is busy. Try again later.",
            ForecastError::Malformed(_) => "The forecast could not be read.",
        }
    }
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("location services disabled")]
    ServiceDisabled,

    #[error("timed out")]
    Timeout,

    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => {
                "Location permission is required to show local weather."
            }
            LocationError::ServiceDisabled => "Turn on location services to show local weather.",
            LocationError::Timeout => "Could not find your location in time.",
            LocationError::Unavailable(_) => "Your location is unavailable right now.",
        }
    }
}

/// Classify a reqwest failure without consuming it.
pub trait ReqwestErrorExt {
    fn to_network_error(&self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn to_network_error(&self) -> NetworkError {
        if self.is_timeout() {
            return NetworkError::Timeout;
        }
        if let Some(status) = self.status() {
            return NetworkError::Status {
                status: status.as_u16(),
                message: self.to_string(),
            };
        }
        if self.is_decode() || self.is_body() {
            return NetworkError::InvalidResponse(self.to_string());
        }
        NetworkError::ConnectionFailed(self.to_string())
    }
}

/// Classify a SQLite failure without consuming it.
pub trait RusqliteErrorExt {
    fn to_storage_error(&self) -> StorageError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn to_storage_error(&self) -> StorageError {
        use rusqlite::ErrorCode;

        match self {
            rusqlite::Error::SqliteFailure(err, _)
                if matches!(err.code, ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase) =>
            {
                StorageError::Corrupt(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if matches!(
                    err.code,
                    ErrorCode::CannotOpen | ErrorCode::PermissionDenied | ErrorCode::ReadOnly
                ) =>
            {
                StorageError::Unavailable(self.to_string())
            }
            _ => StorageError::Query(self.to_string()),
        }
    }
}

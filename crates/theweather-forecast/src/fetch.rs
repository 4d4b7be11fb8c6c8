//! Outcome of a forecast operation.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::types::{ForecastSnapshot, WeatherError};

/// Tri-state result envelope: an operation is in progress, produced data,
/// or failed. Expected failures (network, bad payload) land in `Failure`
/// instead of being returned as `Err`.
///
/// The error is reference counted so states can be cloned into observer
/// snapshots.
#[derive(Debug, Clone)]
pub enum FetchState<T> {
    Loading,
    Success(T),
    Failure(Arc<WeatherError>),
}

impl<T> FetchState<T> {
    pub fn failure(error: WeatherError) -> Self {
        Self::Failure(Arc::new(error))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&WeatherError> {
        match self {
            Self::Failure(e) => Some(e),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchState<U> {
        match self {
            Self::Loading => FetchState::Loading,
            Self::Success(data) => FetchState::Success(f(data)),
            Self::Failure(e) => FetchState::Failure(e),
        }
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> From<Result<T, WeatherError>> for FetchState<T> {
    fn from(result: Result<T, WeatherError>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(e) => Self::failure(e),
        }
    }
}

/// A forecast outcome together with the moment it was published.
#[derive(Debug, Clone)]
pub struct TimestampedFetch {
    pub state: FetchState<ForecastSnapshot>,
    pub at: DateTime<Utc>,
}

impl TimestampedFetch {
    pub fn now(state: FetchState<ForecastSnapshot>) -> Self {
        Self {
            state,
            at: Utc::now(),
        }
    }

    pub fn loading() -> Self {
        Self::now(FetchState::Loading)
    }
}

impl Default for TimestampedFetch {
    fn default() -> Self {
        Self::loading()
    }
}

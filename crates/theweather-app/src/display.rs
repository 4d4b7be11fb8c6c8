//! What the weather screen should show for a given session state.

use chrono::{DateTime, Utc};
use theweather_core::{AppError, NetworkError};
use theweather_forecast::{FetchState, ForecastSnapshot, LocationError, LocationPermission};

use crate::error_mapping::weather_error;
use crate::session::SessionState;

const UNAVAILABLE_PREFIX: &str = "Unable to fetch weather data.";

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Loading,
    Ready {
        snapshot: ForecastSnapshot,
        /// Served from the local cache rather than a live fetch.
        stale: bool,
        offline: bool,
        updated_at: DateTime<Utc>,
    },
    Unavailable {
        message: String,
    },
    /// No data and the user has refused location access.
    NeedsPermission,
    /// No data and location services are switched off.
    NeedsLocationService,
}

impl DisplayState {
    /// Live data wins, then the cached snapshot, then prompts and errors.
    pub fn from_session(state: &SessionState) -> Self {
        let offline = !state.connected;

        if let FetchState::Success(snapshot) = &state.weather.state {
            return Self::Ready {
                snapshot: snapshot.clone(),
                stale: false,
                offline,
                updated_at: state.weather.at,
            };
        }

        if let Some(cached) = &state.cached {
            return Self::Ready {
                snapshot: cached.clone(),
                stale: true,
                offline,
                updated_at: state.weather.at,
            };
        }

        if state.location.is_none() {
            if state.permission == LocationPermission::Denied {
                return Self::NeedsPermission;
            }
            if state.location_error == Some(LocationError::ServiceDisabled) {
                return Self::NeedsLocationService;
            }
        }

        match &state.weather.state {
            FetchState::Failure(e) => {
                let hint = if offline {
                    AppError::Network(NetworkError::Offline).user_message()
                } else {
                    weather_error(e).user_message()
                };
                Self::Unavailable {
                    message: format!("{} {}", UNAVAILABLE_PREFIX, hint),
                }
            }
            _ => Self::Loading,
        }
    }

    pub fn snapshot(&self) -> Option<&ForecastSnapshot> {
        match self {
            Self::Ready { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }
}

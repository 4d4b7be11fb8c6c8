//! Forecast data layer for TheWeather
//!
//! Fetches the OpenWeatherMap 5-day forecast, keeps the latest result in a
//! single-row SQLite cache, and polls for fresh data on an interval.

pub mod cache;
pub mod client;
pub mod connectivity;
pub mod fetch;
pub mod format;
pub mod location;
pub mod mapper;
pub mod poller;
pub mod store;
pub mod types;

pub use cache::{CacheRow, ForecastCache, MemoryForecastCache, SqliteForecastCache};
pub use client::{ForecastSource, OpenWeatherClient, OPENWEATHER_BASE_URL};
pub use connectivity::{ConnectivityProbe, ConnectivitySignal};
pub use fetch::{FetchState, TimestampedFetch};
pub use location::{request_location, FixedLocation, LocationPermission, LocationProvider};
pub use poller::{PollingController, DEFAULT_POLL_INTERVAL};
pub use store::WeatherStore;
pub use types::*;

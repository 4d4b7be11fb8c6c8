//! Read-through forecast store over the single-row cache.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use crate::cache::{CacheRow, ForecastCache};
use crate::client::ForecastSource;
use crate::fetch::FetchState;
use crate::mapper::{row_from_snapshot, snapshot_from_row};
use crate::types::{Coordinate, ForecastSnapshot};

/// Combines the remote source with the cache.
///
/// [`get_forecast`](Self::get_forecast) prefers the cache and only goes to
/// the network on a miss. The cache has no age limit: once a row exists it
/// is served until [`refresh`](Self::refresh) replaces it. Callers never
/// touch the cache directly.
#[derive(Clone)]
pub struct WeatherStore {
    source: Arc<dyn ForecastSource>,
    cache: Arc<Mutex<Box<dyn ForecastCache>>>,
}

impl WeatherStore {
    pub fn new(source: Arc<dyn ForecastSource>, cache: impl ForecastCache + 'static) -> Self {
        Self::with_boxed_cache(source, Box::new(cache))
    }

    /// For caches picked at runtime (e.g. from configuration).
    pub fn with_boxed_cache(source: Arc<dyn ForecastSource>, cache: Box<dyn ForecastCache>) -> Self {
        Self {
            source,
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    /// Cached forecast if present, otherwise fetch and cache.
    pub async fn get_forecast(&self, coordinate: Coordinate) -> FetchState<ForecastSnapshot> {
        if let Some(row) = self.load_row().await {
            tracing::info!("Using cached weather data for {}", row.city_name);
            return FetchState::Success(snapshot_from_row(&row));
        }

        self.refresh(coordinate).await
    }

    /// Always fetch remotely; on success the cache row is replaced.
    ///
    /// A failed fetch leaves the cache untouched.
    pub async fn refresh(&self, coordinate: Coordinate) -> FetchState<ForecastSnapshot> {
        tracing::info!("Fetching and caching forecast for {}", coordinate);

        match self.source.fetch_forecast(coordinate).await {
            Ok(snapshot) => {
                self.store_row(&snapshot).await;
                FetchState::Success(snapshot)
            }
            Err(e) => {
                if e.is_network() {
                    tracing::warn!("Forecast service unreachable: {}", e);
                } else {
                    tracing::error!("Forecast fetch failed: {}", e);
                }
                FetchState::failure(e)
            }
        }
    }

    pub async fn has_cached_forecast(&self) -> bool {
        self.load_row().await.is_some()
    }

    pub async fn cached_forecast(&self) -> Option<ForecastSnapshot> {
        self.load_row().await.map(|row| snapshot_from_row(&row))
    }

    /// Read errors count as a miss.
    async fn load_row(&self) -> Option<CacheRow> {
        let cache = self.cache.clone();
        match tokio::task::spawn_blocking(move || cache.lock().latest_row()).await {
            Ok(Ok(row)) => row,
            Ok(Err(e)) => {
                tracing::warn!("Failed to read weather cache: {}", e);
                None
            }
            Err(e) => {
                tracing::error!("Weather cache read task failed: {}", e);
                None
            }
        }
    }

    /// Write errors are logged; the fetched snapshot is still returned.
    async fn store_row(&self, snapshot: &ForecastSnapshot) {
        let row = row_from_snapshot(snapshot, Utc::now().timestamp_millis());
        let city = row.city_name.clone();
        let cache = self.cache.clone();

        match tokio::task::spawn_blocking(move || cache.lock().insert_row(&row)).await {
            Ok(Ok(id)) => tracing::info!("Cached weather data for {} (row {})", city, id),
            Ok(Err(e)) => tracing::warn!("Failed to cache weather data: {}", e),
            Err(e) => tracing::error!("Weather cache write task failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::cache::{MemoryForecastCache, SqliteForecastCache};
    use crate::types::{City, Condition, ForecastEntry, MainReadings, WeatherError, Wind};

    fn pune() -> ForecastSnapshot {
        ForecastSnapshot {
            city: City {
                name: "Pune".to_string(),
                sunrise: 1_714_521_000,
                sunset: 1_714_564_200,
                ..City::default()
            },
            cnt: 1,
            cod: "200".to_string(),
            message: 0,
            list: vec![ForecastEntry {
                dt_txt: "2024-05-01 12:00:00".to_string(),
                main: MainReadings {
                    temp: 29.4,
                    humidity: 61,
                    pressure: 1008,
                    ..MainReadings::default()
                },
                weather: vec![Condition {
                    main: "Clouds".to_string(),
                    description: "overcast clouds".to_string(),
                    icon: "04d".to_string(),
                    ..Condition::default()
                }],
                wind: Wind {
                    speed: 3.2,
                    ..Wind::default()
                },
                ..ForecastEntry::default()
            }],
        }
    }

    /// Returns `pune()` or fails, counting calls either way.
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ForecastSource for CountingSource {
        async fn fetch_forecast(
            &self,
            _coordinate: Coordinate,
        ) -> Result<ForecastSnapshot, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(WeatherError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                })
            } else {
                Ok(pune())
            }
        }
    }

    /// A cache whose reads and writes always fail.
    struct BrokenCache;

    impl ForecastCache for BrokenCache {
        fn insert_row(&self, _row: &CacheRow) -> Result<i64, WeatherError> {
            Err(WeatherError::Cache("disk full".to_string()))
        }

        fn latest_row(&self) -> Result<Option<CacheRow>, WeatherError> {
            Err(WeatherError::Cache("locked".to_string()))
        }
    }

    fn here() -> Coordinate {
        Coordinate::new(18.5204, 73.8567)
    }

    #[tokio::test]
    async fn test_miss_fetches_and_returns_snapshot_verbatim() {
        let source = CountingSource::ok();
        let store = WeatherStore::new(source.clone(), SqliteForecastCache::in_memory().unwrap());

        let state = store.get_forecast(here()).await;

        assert_eq!(state.data(), Some(&pune()));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_miss_populates_cache_row() {
        let store = WeatherStore::new(CountingSource::ok(), MemoryForecastCache::new());
        store.get_forecast(here()).await;

        let row = store.load_row().await.expect("row written on success");
        assert_eq!(row.city_name, "Pune");
        assert_eq!(row.icon_id, "04d");
        assert_eq!(row.temperature, 29.4);
        assert_eq!(row.main_description, "Clouds");
        assert_eq!(row.description, "overcast clouds");
        assert_eq!(row.pressure, 1008);
        assert_eq!(row.humidity, 61);
        assert_eq!(row.wind_speed, 3.2);
        assert_eq!(row.date_time, "2024-05-01 12:00:00");
        assert_eq!(row.sunrise, 1_714_521_000);
        assert_eq!(row.sunset, 1_714_564_200);
        assert!(row.timestamp > 0);
    }

    #[tokio::test]
    async fn test_hit_never_calls_source() {
        let warm = WeatherStore::new(CountingSource::ok(), MemoryForecastCache::new());
        warm.get_forecast(here()).await;
        let row = warm.load_row().await.unwrap();

        let cache = MemoryForecastCache::new();
        cache.insert_row(&row).unwrap();
        let offline = CountingSource::failing();
        let store = WeatherStore::new(offline.clone(), cache);

        let state = store.get_forecast(here()).await;

        assert_eq!(offline.calls(), 0);
        let snapshot = state.into_data().expect("cache hit is a success");
        assert_eq!(snapshot, snapshot_from_row(&row));
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_unset() {
        let store = WeatherStore::new(CountingSource::failing(), MemoryForecastCache::new());

        let state = store.get_forecast(here()).await;

        assert!(matches!(
            state.error(),
            Some(WeatherError::Api { status: 503, .. })
        ));
        assert!(!store.has_cached_forecast().await);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_row() {
        let warm = WeatherStore::new(CountingSource::ok(), MemoryForecastCache::new());
        warm.get_forecast(here()).await;
        let before = warm.load_row().await.unwrap();

        let cache = MemoryForecastCache::new();
        cache.insert_row(&before).unwrap();
        let store = WeatherStore::new(CountingSource::failing(), cache);
        let stored_before = store.load_row().await.unwrap();

        assert!(store.refresh(here()).await.is_failure());
        assert_eq!(store.load_row().await.unwrap(), stored_before);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_warm_cache() {
        let source = CountingSource::ok();
        let store = WeatherStore::new(source.clone(), MemoryForecastCache::new());

        store.get_forecast(here()).await;
        store.get_forecast(here()).await;
        assert_eq!(source.calls(), 1);

        store.refresh(here()).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_cached_forecast_reads() {
        let store = WeatherStore::new(CountingSource::ok(), MemoryForecastCache::new());
        assert!(!store.has_cached_forecast().await);
        assert!(store.cached_forecast().await.is_none());

        store.get_forecast(here()).await;

        assert!(store.has_cached_forecast().await);
        let cached = store.cached_forecast().await.unwrap();
        assert_eq!(cached.city.name, "Pune");
        assert_eq!(cached.list.len(), 1);
    }

    #[tokio::test]
    async fn test_broken_cache_degrades_to_network() {
        let source = CountingSource::ok();
        let store = WeatherStore::new(source.clone(), BrokenCache);

        let state = store.get_forecast(here()).await;

        assert!(state.is_success());
        assert_eq!(source.calls(), 1);
        assert!(!store.has_cached_forecast().await);
    }
}
